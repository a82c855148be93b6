//! Entity trait for database-agnostic table mapping.
//!
//! Types implementing `Entity` can be read and written by any supported
//! backend. Add `#[derive(Entity)]` next to serde's derives to generate the
//! implementation.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};

use crate::{DaoError, Value};

/// Storage type of a column, derived from the Rust type of its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Integer,
    BigInt,
    Double,
    Boolean,
    Date,
    Timestamp,
    TimestampTz,
    Json,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::TimestampTz => "timestamptz",
            ColumnType::Json => "json",
        };
        f.write_str(name)
    }
}

/// One persistent field of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Rust field name.
    pub field: &'static str,
    /// Column name in the table.
    pub name: &'static str,
    /// Key of the field in the type's serde representation.
    pub json_key: &'static str,
    pub kind: ColumnType,
    pub primary_key: bool,
    /// True when the column name came from `#[column(name = "...")]`.
    pub explicit: bool,
}

/// Trait for types that map onto a single table.
///
/// Generated by `#[derive(Entity)]`.
///
/// # Example
///
/// ```text
/// #[derive(Entity, Serialize, Deserialize)]
/// #[entity(table = "commandes")]
/// pub struct Commande {
///     #[primary_key]
///     pub id: Option<i64>,
///     #[column(name = "date_commande")]
///     pub date: Option<NaiveDate>,
///     pub montant: Option<f64>,
///     #[column(skip)]
///     pub cached_total: f64,
/// }
/// ```
///
/// # Naming
///
/// The table defaults to the lower-cased struct name and each column to its
/// field name (case preserved). Fields marked `#[column(skip)]` are not part
/// of the persistent shape and must be `#[serde(skip)]` or defaultable.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// The database table name for this type.
    fn table_name() -> &'static str;

    /// Persistent columns in declaration order.
    fn columns() -> &'static [Column];

    fn primary_key() -> Option<&'static Column> {
        Self::columns().iter().find(|column| column.primary_key)
    }

    /// The primary key column, or a configuration error for types that
    /// cannot be written.
    fn require_primary_key() -> Result<&'static Column, DaoError> {
        Self::primary_key().ok_or_else(|| {
            DaoError::Configuration(format!(
                "no primary key declared for table {}",
                Self::table_name()
            ))
        })
    }

    /// Columns written by an INSERT: everything but the primary key.
    fn insert_columns() -> Vec<&'static Column> {
        Self::columns()
            .iter()
            .filter(|column| !column.primary_key)
            .collect()
    }

    fn column(name: &str) -> Option<&'static Column> {
        Self::columns().iter().find(|column| column.name == name)
    }
}

/// Extract the current value of every column of `item`, in column order.
///
/// The item is serialized with serde and each column is looked up by its
/// `json_key`; absent keys (e.g. `skip_serializing_if`) read as NULL.
///
/// serde_json has no representation for non-finite floats: a NaN or
/// infinite `f64` serializes as `null` and is therefore written as NULL.
pub fn field_values<T: Entity>(item: &T) -> Result<Vec<(&'static Column, Value)>, DaoError> {
    let json = serde_json::to_value(item)?;
    let obj = json.as_object().ok_or_else(|| {
        DaoError::Mapping(format!(
            "expected {} to serialize as an object",
            T::table_name()
        ))
    })?;

    T::columns()
        .iter()
        .map(|column| {
            let value = match obj.get(column.json_key) {
                Some(json) => Value::from_json(json, column.kind)
                    .map_err(|e| DaoError::Mapping(format!("column {}: {}", column.name, e)))?,
                None => Value::Null,
            };
            Ok((column, value))
        })
        .collect()
}
