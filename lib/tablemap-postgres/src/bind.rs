//! Typed parameter binding and cell extraction for PostgreSQL.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, Column as _, Decode, Postgres, Row, Type, TypeInfo};
use tablemap::{Column, ColumnType, DaoError, Param, RowSource, Value};

/// Bind statement parameters, in order, to PgArguments.
pub fn bind_params(params: &[Param]) -> Result<PgArguments, DaoError> {
    let mut args = PgArguments::default();
    for param in params {
        bind_param(&mut args, param)?;
    }
    Ok(args)
}

/// Bind a single parameter.
///
/// NULLs are bound with the type of their column so PostgreSQL can resolve
/// operators such as `date_col BETWEEN $1 AND $2`.
fn bind_param(args: &mut PgArguments, param: &Param) -> Result<(), DaoError> {
    match (&param.value, param.kind) {
        (Value::Null, kind) => bind_null(args, kind),
        (Value::Int(n), ColumnType::Integer) => match i32::try_from(*n) {
            Ok(n) => args.add(n),
            Err(_) => args.add(*n),
        },
        (Value::Int(n), ColumnType::Double) => args.add(*n as f64),
        (Value::Int(n), _) => args.add(*n),
        (Value::Bool(b), _) => args.add(*b),
        (Value::Float(n), _) => args.add(*n),
        (Value::Text(s), _) => args.add(s.as_str()),
        (Value::Date(d), _) => args.add(*d),
        (Value::Timestamp(ts), _) => args.add(*ts),
        (Value::TimestampTz(dt), _) => args.add(*dt),
        (Value::Json(json), _) => args.add(json.clone()),
    }
    .map_err(DaoError::storage)
}

fn bind_null(
    args: &mut PgArguments,
    kind: ColumnType,
) -> Result<(), sqlx::error::BoxDynError> {
    match kind {
        ColumnType::Text => args.add(None::<String>),
        ColumnType::Integer => args.add(None::<i32>),
        ColumnType::BigInt => args.add(None::<i64>),
        ColumnType::Double => args.add(None::<f64>),
        ColumnType::Boolean => args.add(None::<bool>),
        ColumnType::Date => args.add(None::<NaiveDate>),
        ColumnType::Timestamp => args.add(None::<NaiveDateTime>),
        ColumnType::TimestampTz => args.add(None::<DateTime<Utc>>),
        ColumnType::Json => args.add(None::<serde_json::Value>),
    }
}

/// A PostgreSQL row viewed as a source of cells.
pub struct PgCells<'r>(pub &'r PgRow);

fn get<'r, T>(row: &'r PgRow, idx: usize, column: &Column) -> Result<Option<T>, DaoError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx)
        .map_err(|e| DaoError::Mapping(format!("column {}: {}", column.name, e)))
}

impl RowSource for PgCells<'_> {
    fn cell(&self, column: &Column) -> Result<Value, DaoError> {
        let row = self.0;

        // Find the column index
        let idx = row
            .columns()
            .iter()
            .position(|c| c.name() == column.name)
            .ok_or_else(|| DaoError::Mapping(format!("column not found: {}", column.name)))?;

        let type_name = row.columns()[idx].type_info().name();

        // Temporal targets pick a getter by the field's type first; the
        // stored type alone may be wider or narrower than the field.
        let value = match (column.kind, type_name) {
            (ColumnType::Date, "TIMESTAMP") => get::<NaiveDateTime>(row, idx, column)?
                .map(|ts| Value::Date(ts.date()))
                .unwrap_or(Value::Null),
            (ColumnType::Date, "TIMESTAMPTZ") => get::<DateTime<Utc>>(row, idx, column)?
                .map(|dt| Value::Date(dt.date_naive()))
                .unwrap_or(Value::Null),
            (ColumnType::Timestamp, "TIMESTAMPTZ") => get::<DateTime<Utc>>(row, idx, column)?
                .map(|dt| Value::Timestamp(dt.naive_utc()))
                .unwrap_or(Value::Null),
            (ColumnType::Timestamp, "DATE") => get::<NaiveDate>(row, idx, column)?
                .map(|d| Value::Timestamp(d.and_time(NaiveTime::MIN)))
                .unwrap_or(Value::Null),
            (ColumnType::TimestampTz, "TIMESTAMP") => get::<NaiveDateTime>(row, idx, column)?
                .map(|ts| Value::TimestampTz(ts.and_utc()))
                .unwrap_or(Value::Null),
            (ColumnType::TimestampTz, "DATE") => get::<NaiveDate>(row, idx, column)?
                .map(|d| Value::TimestampTz(d.and_time(NaiveTime::MIN).and_utc()))
                .unwrap_or(Value::Null),
            (_, "DATE") => get::<NaiveDate>(row, idx, column)?.into(),
            (_, "TIMESTAMP") => get::<NaiveDateTime>(row, idx, column)?.into(),
            (_, "TIMESTAMPTZ") => get::<DateTime<Utc>>(row, idx, column)?.into(),
            (_, "BOOL") => get::<bool>(row, idx, column)?.into(),
            (_, "INT2") => get::<i16>(row, idx, column)?
                .map(|n| Value::Int(n.into()))
                .unwrap_or(Value::Null),
            (_, "INT4") => get::<i32>(row, idx, column)?.into(),
            (_, "INT8") => get::<i64>(row, idx, column)?.into(),
            (_, "FLOAT4") => get::<f32>(row, idx, column)?
                .map(|n| Value::Float(n.into()))
                .unwrap_or(Value::Null),
            (_, "FLOAT8") => get::<f64>(row, idx, column)?.into(),
            (_, "JSON" | "JSONB") => get::<serde_json::Value>(row, idx, column)?
                .map(Value::Json)
                .unwrap_or(Value::Null),
            // Default: treat as string (VARCHAR, TEXT, CHAR, etc.)
            _ => get::<String>(row, idx, column)?.into(),
        };

        Ok(value)
    }
}
