use crate::bind::{bind_template, Mapping, Params, Record};
use crate::builder::{build_query, PlaceholderStyle};
use crate::mapper::Mapper;
use crate::query::{self, bind_all};
use crate::rows::{Row, Rows};
use crate::stmt::Statement;
use crate::trace::{in_span, span_for, traced};
use crate::value::Value;
use sqlx::any::AnyQueryResult;
use sqlx::{Any, AnyConnection, Executor, Transaction};
use std::sync::Arc;
use tracing::debug;

/// A transaction that accepts `?name` placeholders.
///
/// Dropping a `Tx` without calling [`commit`](Tx::commit) rolls it back.
///
/// # Examples
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use sqlx_named::{Db, Value};
///
/// # async fn example(db: Db) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = db.begin().await?;
///
/// let mut args = HashMap::new();
/// args.insert("amount", Value::from(100));
/// args.insert("from_id", Value::from(1));
/// args.insert("to_id", Value::from(2));
///
/// tx.exec_map("UPDATE accounts SET balance = balance - ?amount WHERE id = ?from_id", &args)
///     .await?;
/// tx.exec_map("UPDATE accounts SET balance = balance + ?amount WHERE id = ?to_id", &args)
///     .await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
pub struct Tx {
    inner: Transaction<'static, Any>,
    mapper: Arc<dyn Mapper>,
    trace: bool,
    style: PlaceholderStyle,
}

impl Tx {
    pub(crate) fn new(
        inner: Transaction<'static, Any>,
        mapper: Arc<dyn Mapper>,
        trace: bool,
        style: PlaceholderStyle,
    ) -> Self {
        Self {
            inner,
            mapper,
            trace,
            style,
        }
    }

    /// The transaction's connection, for running [`Statement`]s inside it.
    pub fn conn(&mut self) -> &mut AnyConnection {
        &mut self.inner
    }

    pub fn mapper(&self) -> &Arc<dyn Mapper> {
        &self.mapper
    }

    /// Executes `sql` with positional arguments inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the statement. The transaction stays open
    /// either way.
    pub async fn exec(&mut self, sql: &str, args: Vec<Value>) -> crate::Result<AnyQueryResult> {
        let q = bind_all(sqlx::query::<Any>(sql), args);
        query::execute(&mut *self.inner, sql, q, self.trace).await
    }

    /// Executes `sql`, binding `?name` placeholders from `map`.
    pub async fn exec_map(
        &mut self,
        sql: &str,
        map: &impl Mapping,
    ) -> crate::Result<AnyQueryResult> {
        self.exec_named(sql, Params::Mapping(map)).await
    }

    /// Executes `sql`, binding `?name` placeholders from the fields of `record`.
    pub async fn exec_record(
        &mut self,
        sql: &str,
        record: &impl Record,
    ) -> crate::Result<AnyQueryResult> {
        self.exec_named(sql, Params::Record(record)).await
    }

    /// # Errors
    ///
    /// Binding errors are returned before anything reaches the transaction.
    pub async fn exec_named(
        &mut self,
        sql: &str,
        params: Params<'_>,
    ) -> crate::Result<AnyQueryResult> {
        let (sql, args) = bind_template(sql, self.style, params)?;
        self.exec(&sql, args).await
    }

    /// Runs `sql` and returns a cursor over its rows.
    ///
    /// The cursor borrows the transaction, so it must be dropped or exhausted before the next
    /// call on this `Tx`.
    pub async fn query(&mut self, sql: &str, args: Vec<Value>) -> crate::Result<Rows<'_>> {
        debug!(sql, "query");
        let span = span_for(self.trace, sql);
        let columns = in_span(span.as_ref(), query::columns(&mut *self.inner, sql)).await?;
        let stream = query::fetch(&mut *self.inner, sql.to_owned(), args);
        Ok(Rows::new(columns, stream, Arc::clone(&self.mapper), span))
    }

    pub async fn query_map(&mut self, sql: &str, map: &impl Mapping) -> crate::Result<Rows<'_>> {
        self.query_named(sql, Params::Mapping(map)).await
    }

    pub async fn query_record(
        &mut self,
        sql: &str,
        record: &impl Record,
    ) -> crate::Result<Rows<'_>> {
        self.query_named(sql, Params::Record(record)).await
    }

    pub async fn query_named(&mut self, sql: &str, params: Params<'_>) -> crate::Result<Rows<'_>> {
        let (sql, args) = bind_template(sql, self.style, params)?;
        self.query(&sql, args).await
    }

    /// Runs `sql` and returns its first row.
    ///
    /// # Errors
    ///
    /// No row at all is a [`sqlx::Error::RowNotFound`] database error.
    pub async fn query_row(&mut self, sql: &str, args: Vec<Value>) -> crate::Result<Row> {
        let q = bind_all(sqlx::query::<Any>(sql), args);
        let row = query::fetch_one(&mut *self.inner, sql, q, self.trace).await?;
        Ok(Row::new(row, Arc::clone(&self.mapper)))
    }

    pub async fn query_row_map(&mut self, sql: &str, map: &impl Mapping) -> crate::Result<Row> {
        self.query_row_named(sql, Params::Mapping(map)).await
    }

    pub async fn query_row_record(
        &mut self,
        sql: &str,
        record: &impl Record,
    ) -> crate::Result<Row> {
        self.query_row_named(sql, Params::Record(record)).await
    }

    pub async fn query_row_named(&mut self, sql: &str, params: Params<'_>) -> crate::Result<Row> {
        let (sql, args) = bind_template(sql, self.style, params)?;
        self.query_row(&sql, args).await
    }

    /// Prepares `sql` on the transaction's connection with a name table of its own.
    ///
    /// The statement is independent of any other prepared from the same template, including
    /// one prepared on the [`Db`](crate::Db) itself.
    pub async fn prepare(&mut self, sql: &str) -> crate::Result<Statement> {
        let built = build_query(sql, self.style)?;
        debug!(sql = %built.sql, "prepare");
        let prepared = traced(
            self.trace,
            &built.sql,
            (&mut *self.inner).prepare(&built.sql),
        )
        .await?;
        Ok(Statement::new(
            sqlx::Statement::to_owned(&prepared),
            built.names,
            Arc::clone(&self.mapper),
            self.trace,
        ))
    }

    /// Commits the transaction.
    pub async fn commit(self) -> crate::Result<()> {
        debug!("commit");
        Ok(self.inner.commit().await?)
    }

    /// Rolls the transaction back.
    pub async fn rollback(self) -> crate::Result<()> {
        debug!("rollback");
        Ok(self.inner.rollback().await?)
    }
}
