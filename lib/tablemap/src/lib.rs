//! Tablemap - Core traits for mapping plain structs onto relational tables.
//!
//! This crate provides the database-agnostic half of a small data access layer:
//! types describe their persistent shape once (via `#[derive(Entity)]`), and a
//! single generic [`Dao`] performs reads and writes for any such type.
//!
//! # Core Concepts
//!
//! - **Entity**: A struct with a table name, ordered columns and (for writes)
//!   a primary key.
//! - **Template**: An entity value whose non-null fields become predicates
//!   (`find_by_criteria`) or range bounds (`find_by_interval`).
//! - **Statement**: SQL text plus typed bound parameters, rendered in the
//!   placeholder style of the executor that will run it.
//!
//! # Traits
//!
//! - [`Entity`]: Metadata for a persistent type
//! - [`RowSource`]: A backend row that cells can be read from by column
//! - [`QueryExecutor`]: Runs statements against a backend
//! - [`Connect`]: Builds an executor from a [`ConnectionConfig`]

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

// Lets the derive macro's `::tablemap::` paths resolve inside this crate's tests.
extern crate self as tablemap;

mod connection;
mod dao;
mod entity;
mod error;
mod query;
mod row;
mod value;

pub use connection::{Connect, ConnectionConfig, DEFAULT_MAX_CONNECTIONS};
pub use dao::Dao;
pub use entity::{Column, ColumnType, Entity, field_values};
pub use error::DaoError;
pub use query::{
    Delete, Filter, Insert, Page, Param, Placeholder, Query, QueryExecutor, Statement, Update,
};
pub use row::{RowSource, materialize};
pub use value::Value;

// Re-export derive macro
// Note: Entity derive reads #[entity(table = ...)], #[column(...)] and #[primary_key]
pub use tablemap_derive::Entity;
