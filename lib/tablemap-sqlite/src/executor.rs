//! SQLite implementation of QueryExecutor.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::Deref;
use tablemap::{
    Connect, ConnectionConfig, DaoError, Entity, Placeholder, QueryExecutor, Statement,
    materialize,
};
use tracing::{debug, trace};

use crate::{SqliteCells, bind_params};

/// Wrapper around sqlx::SqlitePool that implements QueryExecutor.
#[derive(Clone, Debug)]
pub struct SqlitePool(sqlx::SqlitePool);

impl SqlitePool {
    /// Create a new SqlitePool from an sqlx SqlitePool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::SqlitePool.
    pub fn inner(&self) -> &sqlx::SqlitePool {
        &self.0
    }
}

impl Deref for SqlitePool {
    type Target = sqlx::SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[async_trait]
impl Connect for SqlitePool {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, DaoError> {
        let config = config.into();
        let url = config.url();

        // Every connection to an in-memory database opens a fresh one, so
        // such pools hold exactly one connection and never recycle it.
        let options = if is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections())
        };

        debug!(in_memory = is_in_memory(url), "connecting to SQLite");
        let pool = options.connect(url).await.map_err(DaoError::storage)?;
        Ok(Self(pool))
    }
}

#[async_trait]
impl QueryExecutor for SqlitePool {
    const PLACEHOLDER: Placeholder = Placeholder::Question;

    async fn fetch<T: Entity>(&self, statement: &Statement) -> Result<Vec<T>, DaoError> {
        trace!(sql = %statement.to_literal_sql(), "fetch");

        let args = bind_params(&statement.params)?;
        let rows = sqlx::query_with(&statement.sql, args)
            .fetch_all(&self.0)
            .await
            .map_err(DaoError::storage)?;

        rows.iter()
            .map(|row| materialize::<T, _>(&SqliteCells(row)))
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DaoError> {
        trace!(sql = %statement.to_literal_sql(), "execute");

        // Parameterless statements may be scripts of several statements.
        let result = if statement.params.is_empty() {
            sqlx::raw_sql(&statement.sql).execute(&self.0).await
        } else {
            let args = bind_params(&statement.params)?;
            sqlx::query_with(&statement.sql, args)
                .execute(&self.0)
                .await
        }
        .map_err(DaoError::storage)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://shop?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://shop.db"));
    }
}
