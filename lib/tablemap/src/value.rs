//! Cell values and their coercion to and from serde's data model.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as Json;

use crate::{ColumnType, DaoError};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A value read from, or bound to, a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(Json),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce a field's serialized form into a value for a column of `kind`.
    pub fn from_json(json: &Json, kind: ColumnType) -> Result<Self, DaoError> {
        if json.is_null() {
            return Ok(Value::Null);
        }

        let value = match kind {
            ColumnType::Json => Value::Json(json.clone()),
            ColumnType::Boolean => match json {
                Json::Bool(b) => Value::Bool(*b),
                other => return Err(mismatch(kind, other)),
            },
            ColumnType::Integer | ColumnType::BigInt => match json {
                Json::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Value::Int(i)
                    } else {
                        return Err(DaoError::Mapping(format!(
                            "{} does not fit a signed 64-bit column",
                            n
                        )));
                    }
                }
                Json::Bool(b) => Value::Int(i64::from(*b)),
                other => return Err(mismatch(kind, other)),
            },
            ColumnType::Double => match json {
                Json::Number(n) => match n.as_f64() {
                    Some(f) => Value::Float(f),
                    None => return Err(mismatch(kind, json)),
                },
                other => return Err(mismatch(kind, other)),
            },
            ColumnType::Date => Value::Date(parse_date(expect_str(json, kind)?)?),
            ColumnType::Timestamp => Value::Timestamp(parse_timestamp(expect_str(json, kind)?)?),
            ColumnType::TimestampTz => {
                let s = expect_str(json, kind)?;
                let dt = DateTime::parse_from_rfc3339(s)
                    .map_err(|e| DaoError::Mapping(format!("invalid timestamp {}: {}", s, e)))?;
                Value::TimestampTz(dt.with_timezone(&Utc))
            }
            ColumnType::Text => match json {
                Json::String(s) => Value::Text(s.clone()),
                Json::Number(n) => Value::Text(n.to_string()),
                Json::Bool(b) => Value::Text(b.to_string()),
                // Stored as text these could not be read back into the field
                other => {
                    return Err(DaoError::Mapping(format!(
                        "cannot store {} in a text column; declare it with #[column(kind = \"json\")]",
                        other
                    )));
                }
            },
        };

        Ok(value)
    }

    /// Convert a cell into serde's data model so it can be deserialized into
    /// the target field.
    pub fn into_json(self) -> Result<Json, DaoError> {
        let json = match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(b),
            Value::Int(n) => Json::Number(n.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Json::Number)
                .ok_or_else(|| DaoError::Mapping(format!("{} is not representable", f)))?,
            Value::Text(s) => Json::String(s),
            Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
            Value::Timestamp(ts) => Json::String(ts.format(TIMESTAMP_FORMAT).to_string()),
            // Use microsecond precision with Z to match chrono's serde format
            Value::TimestampTz(dt) => {
                Json::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
            }
            Value::Json(json) => json,
        };
        Ok(json)
    }

    /// Render the value as an SQL literal.
    ///
    /// Text is single-quoted with embedded quotes doubled; numbers are
    /// written as-is; dates and timestamps are truncated to `'yyyy-MM-dd'`.
    /// Only used to display statements, never to run them.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote(s),
            Value::Date(d) => quote(&d.format(DATE_FORMAT).to_string()),
            Value::Timestamp(ts) => quote(&ts.format(DATE_FORMAT).to_string()),
            Value::TimestampTz(dt) => quote(&dt.format(DATE_FORMAT).to_string()),
            Value::Json(json) => quote(&json.to_string()),
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn mismatch(kind: ColumnType, json: &Json) -> DaoError {
    DaoError::Mapping(format!("cannot store {} in a {} column", json, kind))
}

fn expect_str(json: &Json, kind: ColumnType) -> Result<&str, DaoError> {
    json.as_str().ok_or_else(|| mismatch(kind, json))
}

fn parse_date(s: &str) -> Result<NaiveDate, DaoError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DaoError::Mapping(format!("invalid date {}: {}", s, e)))
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DaoError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| DaoError::Mapping(format!("invalid timestamp {}: {}", s, e)))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::TimestampTz(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
