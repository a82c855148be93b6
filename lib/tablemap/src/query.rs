//! Database-agnostic statement builders.
//!
//! Builders resolve everything they need from [`Entity`] metadata and the
//! values of template or payload instances, then render a [`Statement`] in
//! the placeholder style of the executor that will run it.

use crate::{Column, ColumnType, DaoError, Entity, Value, field_values};
use async_trait::async_trait;
use std::marker::PhantomData;

/// How bound parameters are spelled in SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`, `?`, ... (SQLite, MySQL)
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Numbered,
}

/// A bound parameter and the column type it is destined for.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub value: Value,
    pub kind: ColumnType,
}

impl Param {
    pub fn new(value: impl Into<Value>, kind: ColumnType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}

/// SQL text plus its bound parameters, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
    placeholder: Placeholder,
}

impl Statement {
    /// A caller-supplied statement with no parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            placeholder: Placeholder::Question,
        }
    }

    fn new(placeholder: Placeholder) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            placeholder,
        }
    }

    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn bind(&mut self, param: Param) {
        self.params.push(param);
        match self.placeholder {
            Placeholder::Question => self.sql.push('?'),
            Placeholder::Numbered => self.sql.push_str(&format!("${}", self.params.len())),
        }
    }

    /// The statement with every parameter inlined as a literal.
    ///
    /// For logging only: the result is not injection-safe.
    pub fn to_literal_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut params = self.params.iter();
        let mut chars = self.sql.chars().peekable();

        while let Some(c) = chars.next() {
            match (self.placeholder, c) {
                (Placeholder::Question, '?') => match params.next() {
                    Some(param) => out.push_str(&param.value.to_literal()),
                    None => out.push(c),
                },
                (Placeholder::Numbered, '$') if chars.peek().is_some_and(char::is_ascii_digit) => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        digits.push(d);
                    }
                    let param = digits
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|idx| self.params.get(idx));
                    match param {
                        Some(param) => out.push_str(&param.value.to_literal()),
                        None => {
                            out.push('$');
                            out.push_str(&digits);
                        }
                    }
                }
                _ => out.push(c),
            }
        }

        out
    }
}

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    size: u64,
}

impl Page {
    /// Create a page; a number or size of zero is raised to one.
    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        self.number.saturating_sub(1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> u64 {
        self.size.max(1)
    }
}

/// Filter conditions for queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// column = value
    Eq(&'static str, Param),
    /// column BETWEEN lower AND upper
    Between(&'static str, Param, Param),
}

/// A SELECT query builder.
///
/// Filters are disjunctive: a row is returned when any filter holds.
#[derive(Debug, Clone)]
pub struct Query<T> {
    /// The table to query.
    pub table: String,
    /// Filter conditions, joined with OR.
    pub filters: Vec<Filter>,
    pub page: Option<Page>,
    pub(crate) _marker: PhantomData<T>,
}

impl<T: Entity> Query<T> {
    /// Create a new query for the type's table.
    pub fn new() -> Self {
        Self::for_table(T::table_name())
    }

    /// Create a new query with an explicit table name.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            page: None,
            _marker: PhantomData,
        }
    }

    /// Build a query matching rows equal to any non-null field of `template`.
    pub fn by_criteria(template: &T) -> Result<Self, DaoError> {
        let mut query = Self::new();
        for (column, value) in field_values(template)? {
            if !value.is_null() {
                query = query.eq(column, value);
            }
        }
        Ok(query)
    }

    /// Build a range query from two boundary templates.
    ///
    /// Only columns with an explicit `#[column(name = ...)]` are candidates,
    /// and only when at least one template holds a value for them. A
    /// candidate whose bounds are equal is passed over in favour of a later
    /// one; if no later candidate exists the last equal one is used.
    /// Returns `None` when there is no candidate at all.
    pub fn by_interval(lower: &T, upper: &T) -> Result<Option<Self>, DaoError> {
        let lower_values = field_values(lower)?;
        let upper_values = field_values(upper)?;

        let mut chosen = None;
        for ((column, low), (_, high)) in lower_values.into_iter().zip(upper_values) {
            if !column.explicit || (low.is_null() && high.is_null()) {
                continue;
            }
            let equal = low == high;
            chosen = Some((column, low, high));
            if !equal {
                break;
            }
        }

        Ok(chosen.map(|(column, low, high)| Self::new().between(column, low, high)))
    }

    /// Add a filter condition.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an equality filter (shorthand for Filter::Eq).
    pub fn eq(self, column: &'static Column, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.name, Param::new(value, column.kind)))
    }

    /// Add a range filter; a NULL bound is bound as a typed NULL.
    pub fn between(
        self,
        column: &'static Column,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        self.filter(Filter::Between(
            column.name,
            Param::new(lower, column.kind),
            Param::new(upper, column.kind),
        ))
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn build(self, placeholder: Placeholder) -> Statement {
        let mut statement = Statement::new(placeholder);
        statement.push(&format!("SELECT * FROM {}", self.table));

        for (idx, filter) in self.filters.into_iter().enumerate() {
            statement.push(if idx == 0 { " WHERE " } else { " OR " });
            match filter {
                Filter::Eq(column, param) => {
                    statement.push(&format!("{} = ", column));
                    statement.bind(param);
                }
                Filter::Between(column, lower, upper) => {
                    statement.push(&format!("{} BETWEEN ", column));
                    statement.bind(lower);
                    statement.push(" AND ");
                    statement.bind(upper);
                }
            }
        }

        if let Some(page) = self.page {
            statement.push(&format!(" LIMIT {} OFFSET {}", page.limit(), page.offset()));
        }

        statement
    }
}

impl<T: Entity> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An INSERT builder. The primary key is left to the database.
#[derive(Debug, Clone)]
pub struct Insert<T> {
    pub table: String,
    pub values: Vec<(&'static str, Param)>,
    pub(crate) _marker: PhantomData<T>,
}

impl<T: Entity> Insert<T> {
    pub fn new(item: &T) -> Result<Self, DaoError> {
        // The key is not written, but a type without one is not writable.
        T::require_primary_key()?;

        let values: Vec<_> = field_values(item)?
            .into_iter()
            .filter(|(column, _)| !column.primary_key)
            .map(|(column, value)| (column.name, Param::new(value, column.kind)))
            .collect();

        if values.is_empty() {
            return Err(DaoError::Configuration(format!(
                "no insertable columns for table {}",
                T::table_name()
            )));
        }

        Ok(Self {
            table: T::table_name().to_string(),
            values,
            _marker: PhantomData,
        })
    }

    pub fn build(self, placeholder: Placeholder) -> Statement {
        let mut statement = Statement::new(placeholder);
        let columns: Vec<_> = self.values.iter().map(|(name, _)| *name).collect();
        statement.push(&format!(
            "INSERT INTO {} ({}) VALUES (",
            self.table,
            columns.join(", ")
        ));
        for (idx, (_, param)) in self.values.into_iter().enumerate() {
            if idx > 0 {
                statement.push(", ");
            }
            statement.bind(param);
        }
        statement.push(")");
        statement
    }
}

/// Locate the primary key column and its current, non-null value.
fn key_of<T: Entity>(values: &[(&'static Column, Value)]) -> Result<Param, DaoError> {
    let key = T::require_primary_key()?;
    let value = values
        .iter()
        .find(|(column, _)| column.primary_key)
        .map(|(_, value)| value.clone())
        .unwrap_or(Value::Null);

    if value.is_null() {
        return Err(DaoError::Configuration(format!(
            "primary key {} of table {} has no value",
            key.name,
            T::table_name()
        )));
    }

    Ok(Param::new(value, key.kind))
}

/// An UPDATE builder targeting one row by primary key.
#[derive(Debug, Clone)]
pub struct Update<T> {
    pub table: String,
    pub values: Vec<(&'static str, Param)>,
    pub key: (&'static str, Param),
    pub(crate) _marker: PhantomData<T>,
}

impl<T: Entity> Update<T> {
    pub fn new(item: &T) -> Result<Self, DaoError> {
        let fields = field_values(item)?;
        let key = key_of::<T>(&fields)?;
        let key_name = T::require_primary_key()?.name;

        let values: Vec<_> = fields
            .into_iter()
            .filter(|(column, _)| !column.primary_key)
            .map(|(column, value)| (column.name, Param::new(value, column.kind)))
            .collect();

        if values.is_empty() {
            return Err(DaoError::Configuration(format!(
                "no updatable columns for table {}",
                T::table_name()
            )));
        }

        Ok(Self {
            table: T::table_name().to_string(),
            values,
            key: (key_name, key),
            _marker: PhantomData,
        })
    }

    pub fn build(self, placeholder: Placeholder) -> Statement {
        let mut statement = Statement::new(placeholder);
        statement.push(&format!("UPDATE {} SET ", self.table));
        for (idx, (column, param)) in self.values.into_iter().enumerate() {
            if idx > 0 {
                statement.push(", ");
            }
            statement.push(&format!("{} = ", column));
            statement.bind(param);
        }
        let (key_name, key) = self.key;
        statement.push(&format!(" WHERE {} = ", key_name));
        statement.bind(key);
        statement
    }
}

/// A DELETE builder targeting one row by primary key.
#[derive(Debug, Clone)]
pub struct Delete<T> {
    pub table: String,
    pub key: (&'static str, Param),
    pub(crate) _marker: PhantomData<T>,
}

impl<T: Entity> Delete<T> {
    pub fn new(item: &T) -> Result<Self, DaoError> {
        let fields = field_values(item)?;
        let key = key_of::<T>(&fields)?;
        let key_name = T::require_primary_key()?.name;

        Ok(Self {
            table: T::table_name().to_string(),
            key: (key_name, key),
            _marker: PhantomData,
        })
    }

    pub fn build(self, placeholder: Placeholder) -> Statement {
        let mut statement = Statement::new(placeholder);
        let (key_name, key) = self.key;
        statement.push(&format!("DELETE FROM {} WHERE {} = ", self.table, key_name));
        statement.bind(key);
        statement
    }
}

/// Trait for executing statements against a database backend.
///
/// Implemented by database-specific pool types (e.g., PgPool, SqlitePool).
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Placeholder style the backend's driver expects.
    const PLACEHOLDER: Placeholder;

    /// Run a statement and materialize every returned row.
    ///
    /// Rows are collected eagerly; a mapping failure on any row fails the
    /// whole call.
    async fn fetch<T: Entity>(&self, statement: &Statement) -> Result<Vec<T>, DaoError>;

    /// Run a statement and return the number of rows affected.
    async fn execute(&self, statement: &Statement) -> Result<u64, DaoError>;
}
