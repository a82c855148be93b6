//! PostgreSQL implementation for tablemap.
//!
//! This crate provides the PostgreSQL executor for the tablemap data access
//! layer. Statements are rendered with `$n` placeholders and every value is
//! bound as a typed parameter.
//!
//! # Usage
//!
//! ```text
//! use tablemap_postgres::{Connect, Dao, Entity, PgPool};
//!
//! #[derive(Entity, Serialize, Deserialize)]
//! #[entity(table = "clients")]
//! pub struct Client {
//!     #[primary_key]
//!     pub id: Option<i64>,
//!     pub name: Option<String>,
//! }
//!
//! let dao = Dao::new(PgPool::connect("postgres://localhost/shop").await?);
//! let clients: Vec<Client> = dao.find_all().await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod executor;

pub use bind::{PgCells, bind_params};
pub use executor::PgPool;

// Re-export core types for convenience
pub use tablemap::{
    Column, ColumnType, Connect, ConnectionConfig, Dao, DaoError, Entity, Page, Placeholder,
    Query, QueryExecutor, RowSource, Statement, Value,
};
