//! PostgreSQL implementation of QueryExecutor.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use std::ops::Deref;
use tablemap::{
    Connect, ConnectionConfig, DaoError, Entity, Placeholder, QueryExecutor, Statement,
    materialize,
};
use tracing::{debug, trace};

use crate::{PgCells, bind_params};

/// Wrapper around sqlx::PgPool that implements QueryExecutor.
#[derive(Clone, Debug)]
pub struct PgPool(sqlx::PgPool);

impl PgPool {
    /// Create a new PgPool from an sqlx PgPool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::PgPool.
    pub fn inner(&self) -> &sqlx::PgPool {
        &self.0
    }
}

impl Deref for PgPool {
    type Target = sqlx::PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl Connect for PgPool {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, DaoError> {
        let config = config.into();
        debug!(
            max_connections = config.max_connections(),
            "connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .connect(config.url())
            .await
            .map_err(DaoError::storage)?;
        Ok(Self(pool))
    }
}

#[async_trait]
impl QueryExecutor for PgPool {
    const PLACEHOLDER: Placeholder = Placeholder::Numbered;

    async fn fetch<T: Entity>(&self, statement: &Statement) -> Result<Vec<T>, DaoError> {
        trace!(sql = %statement.to_literal_sql(), "fetch");

        let args = bind_params(&statement.params)?;
        let rows = sqlx::query_with(&statement.sql, args)
            .fetch_all(&self.0)
            .await
            .map_err(DaoError::storage)?;

        rows.iter()
            .map(|row| materialize::<T, _>(&PgCells(row)))
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DaoError> {
        trace!(sql = %statement.to_literal_sql(), "execute");

        // Parameterless statements go through the simple protocol so that
        // caller-supplied scripts may hold several statements.
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
