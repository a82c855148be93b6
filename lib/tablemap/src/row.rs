//! Row materialization.

use crate::{Column, DaoError, Entity, Value};

/// A result row that can yield cells by column.
///
/// Implemented by each backend for its driver's row type. The column carries
/// the target type so the backend can pick a matching accessor (notably for
/// dates and timestamps).
pub trait RowSource {
    fn cell(&self, column: &Column) -> Result<Value, DaoError>;
}

/// Build one `T` from a row.
///
/// Every persistent column is read by its resolved name, converted to
/// serde's data model and keyed by the field's serde name; the assembled
/// object is then deserialized into `T`.
pub fn materialize<T: Entity, R: RowSource + ?Sized>(row: &R) -> Result<T, DaoError> {
    let mut obj = serde_json::Map::new();

    for column in T::columns() {
        let value = row.cell(column)?.into_json()?;
        obj.insert(column.json_key.to_string(), value);
    }

    serde_json::from_value(serde_json::Value::Object(obj)).map_err(|e| {
        DaoError::Mapping(format!(
            "row does not fit {}: {}",
            T::table_name(),
            e
        ))
    })
}
