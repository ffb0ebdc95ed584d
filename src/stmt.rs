use crate::bind::{bind_named, Mapping, Params, Record};
use crate::builder::NameTable;
use crate::mapper::Mapper;
use crate::query::{self, bind_all, column_names};
use crate::rows::{Row, Rows};
use crate::trace::span_for;
use crate::value::Value;
use futures::TryStreamExt;
use sqlx::any::{AnyQueryResult, AnyStatement};
use sqlx::{Any, Executor, Statement as _};
use std::sync::Arc;
use tracing::debug;

/// A prepared statement that remembers where each `?name` went.
///
/// Statements run on any SQLx executor, so one prepared on a [`Db`](crate::Db) can run on the
/// pool (`db.pool()`) or inside a transaction (`tx.conn()`).
///
/// # Examples
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use sqlx_named::Db;
///
/// # async fn example(db: Db) -> Result<(), Box<dyn std::error::Error>> {
/// let stmt = db.prepare("DELETE FROM users WHERE id = ?id").await?;
///
/// for id in [1, 2, 3] {
///     let mut args = HashMap::new();
///     args.insert("id", id);
///     stmt.exec_map(db.pool(), &args).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct Statement {
    inner: AnyStatement<'static>,
    names: NameTable,
    mapper: Arc<dyn Mapper>,
    trace: bool,
}

impl Statement {
    pub(crate) fn new(
        inner: AnyStatement<'static>,
        names: NameTable,
        mapper: Arc<dyn Mapper>,
        trace: bool,
    ) -> Self {
        Self {
            inner,
            names,
            mapper,
            trace,
        }
    }

    /// The rewritten SQL the statement was prepared with.
    pub fn sql(&self) -> &str {
        self.inner.sql()
    }

    /// Where each placeholder name was bound, fixed at prepare time.
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Executes the statement with positional arguments, one per marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the statement.
    pub async fn exec<'e, E>(&self, executor: E, args: Vec<Value>) -> crate::Result<AnyQueryResult>
    where
        E: Executor<'e, Database = Any>,
    {
        let q = bind_all(self.inner.query(), args);
        query::execute(executor, self.sql(), q, self.trace).await
    }

    /// Executes the statement, binding its placeholders from `map`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBindingKey`](crate::Error::MissingBindingKey) without touching
    /// `executor` when `map` lacks a name.
    pub async fn exec_map<'e, E>(
        &self,
        executor: E,
        map: &impl Mapping,
    ) -> crate::Result<AnyQueryResult>
    where
        E: Executor<'e, Database = Any>,
    {
        self.exec_named(executor, Params::Mapping(map)).await
    }

    /// Executes the statement, binding its placeholders from the fields of `record`.
    pub async fn exec_record<'e, E>(
        &self,
        executor: E,
        record: &impl Record,
    ) -> crate::Result<AnyQueryResult>
    where
        E: Executor<'e, Database = Any>,
    {
        self.exec_named(executor, Params::Record(record)).await
    }

    /// Binds `params` against the name table built at prepare time.
    pub async fn exec_named<'e, E>(
        &self,
        executor: E,
        params: Params<'_>,
    ) -> crate::Result<AnyQueryResult>
    where
        E: Executor<'e, Database = Any>,
    {
        let args = bind_named(&self.names, params)?;
        self.exec(executor, args).await
    }

    /// Runs the statement and returns a cursor over its rows.
    ///
    /// The column names come from the prepared statement, so they are known before any row
    /// is fetched.
    pub async fn query<'e, E>(&'e self, executor: E, args: Vec<Value>) -> crate::Result<Rows<'e>>
    where
        E: Executor<'e, Database = Any> + 'e,
    {
        debug!(sql = self.sql(), "query");
        let stream = bind_all(self.inner.query(), args)
            .fetch(executor)
            .map_err(crate::Error::from);
        Ok(Rows::new(
            column_names(&self.inner),
            stream,
            Arc::clone(&self.mapper),
            span_for(self.trace, self.sql()),
        ))
    }

    pub async fn query_map<'e, E>(
        &'e self,
        executor: E,
        map: &impl Mapping,
    ) -> crate::Result<Rows<'e>>
    where
        E: Executor<'e, Database = Any> + 'e,
    {
        self.query_named(executor, Params::Mapping(map)).await
    }

    pub async fn query_record<'e, E>(
        &'e self,
        executor: E,
        record: &impl Record,
    ) -> crate::Result<Rows<'e>>
    where
        E: Executor<'e, Database = Any> + 'e,
    {
        self.query_named(executor, Params::Record(record)).await
    }

    pub async fn query_named<'e, E>(
        &'e self,
        executor: E,
        params: Params<'_>,
    ) -> crate::Result<Rows<'e>>
    where
        E: Executor<'e, Database = Any> + 'e,
    {
        let args = bind_named(&self.names, params)?;
        self.query(executor, args).await
    }

    /// Runs the statement and returns its first row.
    ///
    /// # Errors
    ///
    /// No row at all is a [`sqlx::Error::RowNotFound`] database error.
    pub async fn query_row<'e, E>(&self, executor: E, args: Vec<Value>) -> crate::Result<Row>
    where
        E: Executor<'e, Database = Any>,
    {
        let q = bind_all(self.inner.query(), args);
        let row = query::fetch_one(executor, self.sql(), q, self.trace).await?;
        Ok(Row::new(row, Arc::clone(&self.mapper)))
    }

    pub async fn query_row_map<'e, E>(&self, executor: E, map: &impl Mapping) -> crate::Result<Row>
    where
        E: Executor<'e, Database = Any>,
    {
        self.query_row_named(executor, Params::Mapping(map)).await
    }

    pub async fn query_row_record<'e, E>(
        &self,
        executor: E,
        record: &impl Record,
    ) -> crate::Result<Row>
    where
        E: Executor<'e, Database = Any>,
    {
        self.query_row_named(executor, Params::Record(record)).await
    }

    pub async fn query_row_named<'e, E>(
        &self,
        executor: E,
        params: Params<'_>,
    ) -> crate::Result<Row>
    where
        E: Executor<'e, Database = Any>,
    {
        let args = bind_named(&self.names, params)?;
        self.query_row(executor, args).await
    }
}
