//! SQLite implementation for tablemap.
//!
//! This crate provides the SQLite executor for the tablemap data access
//! layer. SQLite columns are dynamically typed, so cells are read according
//! to the target field's column type rather than the declared column type.
//!
//! # Example
//!
//! ```text
//! use tablemap_sqlite::{Connect, Dao, SqlitePool};
//!
//! let dao = Dao::new(SqlitePool::connect("sqlite::memory:").await?);
//! dao.execute("CREATE TABLE clients (id INTEGER PRIMARY KEY, name TEXT)").await?;
//! dao.insert(&Client { id: None, name: Some("Jean".into()) }).await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod executor;

pub use bind::{SqliteCells, bind_params};
pub use executor::SqlitePool;

// Re-export core types for convenience
pub use tablemap::{
    Column, ColumnType, Connect, ConnectionConfig, Dao, DaoError, Entity, Page, Placeholder,
    Query, QueryExecutor, RowSource, Statement, Value,
};
