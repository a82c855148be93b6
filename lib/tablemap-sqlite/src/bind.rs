//! Parameter binding and cell extraction for SQLite.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column as _, Decode, Row, Sqlite, Type, TypeInfo, ValueRef};
use tablemap::{Column, ColumnType, DaoError, Param, RowSource, Value};

/// Bind statement parameters, in order, to SqliteArguments.
pub fn bind_params<'q>(params: &[Param]) -> Result<SqliteArguments<'q>, DaoError> {
    let mut args = SqliteArguments::default();
    for param in params {
        match &param.value {
            // SQLite NULLs are untyped
            Value::Null => args.add(None::<String>),
            Value::Bool(b) => args.add(*b),
            Value::Int(n) => args.add(*n),
            Value::Float(n) => args.add(*n),
            Value::Text(s) => args.add(s.clone()),
            Value::Date(d) => args.add(*d),
            Value::Timestamp(ts) => args.add(*ts),
            Value::TimestampTz(dt) => args.add(*dt),
            // JSON is stored as its text
            Value::Json(json) => args.add(json.to_string()),
        }
        .map_err(DaoError::storage)?;
    }
    Ok(args)
}

/// A SQLite row viewed as a source of cells.
pub struct SqliteCells<'r>(pub &'r SqliteRow);

fn get<'r, T>(row: &'r SqliteRow, idx: usize, column: &Column) -> Result<T, DaoError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get::<T, _>(idx)
        .map_err(|e| DaoError::Mapping(format!("column {}: {}", column.name, e)))
}

impl RowSource for SqliteCells<'_> {
    fn cell(&self, column: &Column) -> Result<Value, DaoError> {
        let row = self.0;

        // Find the column index
        let idx = row
            .columns()
            .iter()
            .position(|c| c.name() == column.name)
            .ok_or_else(|| DaoError::Mapping(format!("column not found: {}", column.name)))?;

        let raw = row
            .try_get_raw(idx)
            .map_err(|e| DaoError::Mapping(format!("column {}: {}", column.name, e)))?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        // Storage class of this cell, not the declared column type
        let stored = raw.type_info().name().to_string();

        let value = match (column.kind, stored.as_str()) {
            (ColumnType::Boolean, _) => Value::Bool(get(row, idx, column)?),
            // Dates may have been written as full timestamps; keep the day
            (ColumnType::Date, _) => match get::<NaiveDate>(row, idx, column) {
                Ok(d) => Value::Date(d),
                Err(_) => Value::Date(get::<NaiveDateTime>(row, idx, column)?.date()),
            },
            (ColumnType::Timestamp, _) => match get::<NaiveDateTime>(row, idx, column) {
                Ok(ts) => Value::Timestamp(ts),
                Err(_) => Value::Timestamp(
                    get::<NaiveDate>(row, idx, column)?.and_time(NaiveTime::MIN),
                ),
            },
            (ColumnType::TimestampTz, _) => match get::<DateTime<Utc>>(row, idx, column) {
                Ok(dt) => Value::TimestampTz(dt),
                Err(_) => Value::TimestampTz(get::<NaiveDateTime>(row, idx, column)?.and_utc()),
            },
            (ColumnType::Json, _) => {
                let text: String = get(row, idx, column)?;
                let json = serde_json::from_str(&text).map_err(|e| {
                    DaoError::Mapping(format!("column {}: invalid JSON: {}", column.name, e))
                })?;
                Value::Json(json)
            }
            (ColumnType::Text, "INTEGER") => Value::Text(get::<i64>(row, idx, column)?.to_string()),
            (ColumnType::Text, "REAL") => Value::Text(get::<f64>(row, idx, column)?.to_string()),
            (_, "INTEGER") => Value::Int(get(row, idx, column)?),
            (_, "REAL") => Value::Float(get(row, idx, column)?),
            (_, "BLOB") => {
                return Err(DaoError::Mapping(format!(
                    "column {}: BLOB cells are not supported",
                    column.name
                )));
            }
            // Default: treat as string (TEXT and anything declared otherwise)
            _ => Value::Text(get(row, idx, column)?),
        };

        Ok(value)
    }
}
