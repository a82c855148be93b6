//! Generic data access object.
//!
//! `Dao` owns an executor and offers the same operation set for every
//! [`Entity`]: raw statements, full-table and criteria reads, interval reads,
//! and single-row writes keyed by primary key.

use tracing::debug;

use crate::{DaoError, Delete, Entity, Insert, Page, Query, QueryExecutor, Statement, Update};

/// Data access object over an injected executor.
#[derive(Debug, Clone)]
pub struct Dao<E> {
    executor: E,
}

impl<E: QueryExecutor> Dao<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Run a caller-supplied statement that returns no rows.
    pub async fn execute(&self, sql: &str) -> Result<u64, DaoError> {
        debug!(operation = "execute", "running raw statement");
        self.executor.execute(&Statement::raw(sql)).await
    }

    /// Run a caller-supplied query and materialize its rows as `T`.
    ///
    /// The query must return every column `T` maps.
    pub async fn find<T: Entity>(&self, sql: &str) -> Result<Vec<T>, DaoError> {
        debug!(operation = "find", table = T::table_name(), "running raw query");
        self.executor.fetch(&Statement::raw(sql)).await
    }

    pub async fn find_all<T: Entity>(&self) -> Result<Vec<T>, DaoError> {
        self.read("find_all", Query::<T>::new()).await
    }

    pub async fn find_all_paged<T: Entity>(&self, page: Page) -> Result<Vec<T>, DaoError> {
        self.read("find_all", Query::<T>::new().page(page)).await
    }

    /// Rows equal to any non-null field of `template`.
    ///
    /// Predicates are OR-joined: `{name: "Jean", email: "j@x"}` matches rows
    /// with either value. A template without values reads the whole table.
    pub async fn find_by_criteria<T: Entity>(&self, template: &T) -> Result<Vec<T>, DaoError> {
        self.read("find_by_criteria", Query::by_criteria(template)?)
            .await
    }

    pub async fn find_by_criteria_paged<T: Entity>(
        &self,
        template: &T,
        page: Page,
    ) -> Result<Vec<T>, DaoError> {
        self.read("find_by_criteria", Query::by_criteria(template)?.page(page))
            .await
    }

    /// Rows whose explicitly named column lies between the values held by
    /// `lower` and `upper`.
    ///
    /// Returns an empty list without querying when neither template holds a
    /// bound.
    pub async fn find_by_interval<T: Entity>(
        &self,
        lower: &T,
        upper: &T,
    ) -> Result<Vec<T>, DaoError> {
        match Query::by_interval(lower, upper)? {
            Some(query) => self.read("find_by_interval", query).await,
            None => {
                debug!(table = T::table_name(), "no interval bounds, skipping query");
                Ok(Vec::new())
            }
        }
    }

    pub async fn find_by_interval_paged<T: Entity>(
        &self,
        lower: &T,
        upper: &T,
        page: Page,
    ) -> Result<Vec<T>, DaoError> {
        match Query::by_interval(lower, upper)? {
            Some(query) => self.read("find_by_interval", query.page(page)).await,
            None => {
                debug!(table = T::table_name(), "no interval bounds, skipping query");
                Ok(Vec::new())
            }
        }
    }

    /// Insert `item`; the primary key is left for the database to assign.
    pub async fn insert<T: Entity>(&self, item: &T) -> Result<u64, DaoError> {
        let statement = Insert::new(item)?.build(E::PLACEHOLDER);
        self.write::<T>("insert", statement).await
    }

    /// Overwrite every non-key column of the row identified by `item`'s key.
    pub async fn update<T: Entity>(&self, item: &T) -> Result<u64, DaoError> {
        let statement = Update::new(item)?.build(E::PLACEHOLDER);
        self.write::<T>("update", statement).await
    }

    pub async fn delete<T: Entity>(&self, item: &T) -> Result<u64, DaoError> {
        let statement = Delete::new(item)?.build(E::PLACEHOLDER);
        self.write::<T>("delete", statement).await
    }

    async fn read<T: Entity>(
        &self,
        operation: &'static str,
        query: Query<T>,
    ) -> Result<Vec<T>, DaoError> {
        let statement = query.build(E::PLACEHOLDER);
        debug!(
            operation,
            table = T::table_name(),
            params = statement.params.len(),
            "reading"
        );
        self.executor.fetch(&statement).await
    }

    async fn write<T: Entity>(
        &self,
        operation: &'static str,
        statement: Statement,
    ) -> Result<u64, DaoError> {
        debug!(
            operation,
            table = T::table_name(),
            params = statement.params.len(),
            "writing"
        );
        self.executor.execute(&statement).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnType, Param, Placeholder};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    /// Records statements instead of running them.
    #[derive(Default)]
    struct Recorder {
        statements: Mutex<Vec<Statement>>,
    }

    impl Recorder {
        fn taken(&self) -> Vec<Statement> {
            self.statements.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueryExecutor for Recorder {
        const PLACEHOLDER: Placeholder = Placeholder::Question;

        async fn fetch<T: Entity>(&self, statement: &Statement) -> Result<Vec<T>, DaoError> {
            self.statements.lock().unwrap().push(statement.clone());
            Ok(Vec::new())
        }

        async fn execute(&self, statement: &Statement) -> Result<u64, DaoError> {
            self.statements.lock().unwrap().push(statement.clone());
            Ok(1)
        }
    }

    #[derive(Debug, Clone, Default, Entity, Serialize, Deserialize)]
    #[entity(table = "commandes")]
    struct Commande {
        #[primary_key]
        id: Option<i64>,
        #[column(name = "date_commande")]
        date: Option<NaiveDate>,
        montant: Option<f64>,
    }

    #[derive(Debug, Clone, Entity, Serialize, Deserialize)]
    struct Journal {
        line: String,
    }

    #[tokio::test]
    async fn insert_without_primary_key_issues_nothing() {
        let dao = Dao::new(Recorder::default());
        let err = dao
            .insert(&Journal {
                line: "x".to_string(),
            })
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert!(dao.executor().taken().is_empty());
    }

    #[tokio::test]
    async fn reads_without_key_are_allowed() {
        let dao = Dao::new(Recorder::default());
        let rows: Vec<Journal> = dao.find_all().await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(dao.executor().taken()[0].sql, "SELECT * FROM journal");
    }

    #[tokio::test]
    async fn empty_interval_issues_nothing() {
        let dao = Dao::new(Recorder::default());
        let rows = dao
            .find_by_interval(&Commande::default(), &Commande::default())
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert!(dao.executor().taken().is_empty());
    }

    #[tokio::test]
    async fn interval_paged_appends_limit() {
        let dao = Dao::new(Recorder::default());
        let lower = Commande {
            date: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        let upper = Commande {
            date: NaiveDate::from_ymd_opt(2024, 4, 30),
            ..Default::default()
        };

        dao.find_by_interval_paged(&lower, &upper, Page::new(2, 10))
            .await
            .unwrap();

        let taken = dao.executor().taken();
        assert_eq!(
            taken[0].sql,
            "SELECT * FROM commandes WHERE date_commande BETWEEN ? AND ? LIMIT 10 OFFSET 10"
        );
    }

    #[tokio::test]
    async fn writes_use_bound_parameters() {
        let dao = Dao::new(Recorder::default());
        let item = Commande {
            id: Some(10),
            date: NaiveDate::from_ymd_opt(2024, 7, 12),
            montant: Some(69.99),
        };

        dao.update(&item).await.unwrap();
        dao.delete(&item).await.unwrap();

        let taken = dao.executor().taken();
        assert_eq!(
            taken[0].sql,
            "UPDATE commandes SET date_commande = ?, montant = ? WHERE id = ?"
        );
        assert_eq!(taken[1].sql, "DELETE FROM commandes WHERE id = ?");
        assert_eq!(taken[1].params, vec![Param::new(10i64, ColumnType::BigInt)]);
    }

    #[tokio::test]
    async fn raw_statements_pass_through() {
        let dao = Dao::new(Recorder::default());
        dao.execute("DELETE FROM commandes").await.unwrap();
        let _: Vec<Commande> = dao.find("SELECT * FROM commandes WHERE montant > 5").await.unwrap();

        let taken = dao.executor().taken();
        assert_eq!(taken[0], Statement::raw("DELETE FROM commandes"));
        assert!(taken[1].params.is_empty());
    }
}
