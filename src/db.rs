use crate::bind::{bind_template, Mapping, Params, Record};
use crate::builder::{build_query, PlaceholderStyle};
use crate::mapper::{CacheMapper, Mapper, SnakeMapper};
use crate::query::{self, bind_all};
use crate::rows::{Row, Rows};
use crate::stmt::Statement;
use crate::trace::{in_span, span_for, traced};
use crate::tx::Tx;
use crate::value::Value;
use sqlx::any::AnyQueryResult;
use sqlx::{Any, AnyPool, Executor};
use std::sync::Arc;
use tracing::debug;

/// Settings shared by a [`Db`] and every handle it hands out.
#[derive(Clone)]
pub struct DbOptions {
    mapper: Arc<dyn Mapper>,
    trace: bool,
    placeholder: Option<PlaceholderStyle>,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            mapper: Arc::new(CacheMapper::new(SnakeMapper)),
            trace: false,
            placeholder: None,
        }
    }
}

impl DbOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default cached snake-case mapper.
    pub fn with_mapper(mut self, mapper: impl Mapper + 'static) -> Self {
        self.mapper = Arc::new(mapper);
        self
    }

    /// Wraps every statement in a client span.
    pub fn enable_trace(mut self, enable: bool) -> Self {
        self.trace = enable;
        self
    }

    /// Overrides the positional marker syntax; [`Db::open`] otherwise infers it from the URL.
    pub fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder = Some(style);
        self
    }
}

/// A connection pool that accepts `?name` placeholders.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx_named::{Db, DbOptions, impl_record};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl_record!(User { id, name });
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// sqlx::any::install_default_drivers();
/// let db = Db::open("mysql://localhost/test", DbOptions::default()).await?;
///
/// let user = User { id: 42, name: "John Doe".into() };
/// let result = db
///     .exec_record("INSERT INTO users (id, name) VALUES (?id, ?name)", &user)
///     .await?;
/// println!("Inserted {} rows", result.rows_affected());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Db {
    pool: AnyPool,
    mapper: Arc<dyn Mapper>,
    trace: bool,
    style: PlaceholderStyle,
}

impl Db {
    /// Connects a pool to `url`. Drivers must already be installed, e.g. with
    /// `sqlx::any::install_default_drivers()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot connect.
    pub async fn open(url: &str, options: DbOptions) -> crate::Result<Self> {
        let style = options
            .placeholder
            .unwrap_or_else(|| PlaceholderStyle::from_url(url));
        let pool = AnyPool::connect(url).await?;
        Ok(Self::build(pool, options, style))
    }

    /// Wraps an existing pool. The placeholder style defaults to `?` unless set in `options`.
    pub fn from_pool(pool: AnyPool, options: DbOptions) -> Self {
        let style = options.placeholder.unwrap_or_default();
        Self::build(pool, options, style)
    }

    fn build(pool: AnyPool, options: DbOptions, style: PlaceholderStyle) -> Self {
        Self {
            pool,
            mapper: options.mapper,
            trace: options.trace,
            style,
        }
    }

    /// The underlying pool; pass it as the executor of a [`Statement`].
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn mapper(&self) -> &Arc<dyn Mapper> {
        &self.mapper
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace
    }

    /// Executes `sql` with positional arguments.
    ///
    /// `sql` must already use the driver's own markers; it is not rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the statement.
    pub async fn exec(&self, sql: &str, args: Vec<Value>) -> crate::Result<AnyQueryResult> {
        let q = bind_all(sqlx::query::<Any>(sql), args);
        query::execute(&self.pool, sql, q, self.trace).await
    }

    /// Executes `sql`, binding `?name` placeholders from `map`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBindingKey`](crate::Error::MissingBindingKey) when `map` has no
    /// entry for a placeholder, and a database error if the statement fails. Nothing is sent
    /// to the database when binding fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::collections::HashMap;
    /// use sqlx_named::Db;
    ///
    /// # async fn example(db: Db) -> Result<(), Box<dyn std::error::Error>> {
    /// let mut args = HashMap::new();
    /// args.insert("id", 42);
    /// let result = db.exec_map("DELETE FROM users WHERE id = ?id", &args).await?;
    /// println!("Deleted {} rows", result.rows_affected());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn exec_map(&self, sql: &str, map: &impl Mapping) -> crate::Result<AnyQueryResult> {
        self.exec_named(sql, Params::Mapping(map)).await
    }

    /// Executes `sql`, binding `?name` placeholders from the fields of `record`.
    ///
    /// # Errors
    ///
    /// As [`exec_map`](Db::exec_map), with a missing field reported as a missing key.
    pub async fn exec_record(
        &self,
        sql: &str,
        record: &impl Record,
    ) -> crate::Result<AnyQueryResult> {
        self.exec_named(sql, Params::Record(record)).await
    }

    /// Executes `sql` with arguments whose kind is only known at run time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgumentKind`](crate::Error::InvalidArgumentKind) for
    /// [`Params::Positional`], before the template is looked at.
    pub async fn exec_named(&self, sql: &str, params: Params<'_>) -> crate::Result<AnyQueryResult> {
        let (sql, args) = bind_template(sql, self.style, params)?;
        self.exec(&sql, args).await
    }

    /// Runs `sql` with positional arguments and returns a cursor over its rows.
    ///
    /// The statement is prepared first, so an invalid query fails here rather than on the
    /// first [`Rows::next`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database rejects the query.
    pub async fn query(&self, sql: &str, args: Vec<Value>) -> crate::Result<Rows<'_>> {
        debug!(sql, "query");
        let span = span_for(self.trace, sql);
        let columns = in_span(span.as_ref(), query::columns(&self.pool, sql)).await?;
        let stream = query::fetch(&self.pool, sql.to_owned(), args);
        Ok(Rows::new(columns, stream, Arc::clone(&self.mapper), span))
    }

    /// Runs `sql`, binding `?name` placeholders from `map`.
    pub async fn query_map(&self, sql: &str, map: &impl Mapping) -> crate::Result<Rows<'_>> {
        self.query_named(sql, Params::Mapping(map)).await
    }

    /// Runs `sql`, binding `?name` placeholders from the fields of `record`.
    pub async fn query_record(&self, sql: &str, record: &impl Record) -> crate::Result<Rows<'_>> {
        self.query_named(sql, Params::Record(record)).await
    }

    pub async fn query_named(&self, sql: &str, params: Params<'_>) -> crate::Result<Rows<'_>> {
        let (sql, args) = bind_template(sql, self.style, params)?;
        self.query(&sql, args).await
    }

    /// Runs `sql` and returns its first row.
    ///
    /// # Errors
    ///
    /// No row at all is a [`sqlx::Error::RowNotFound`] database error.
    pub async fn query_row(&self, sql: &str, args: Vec<Value>) -> crate::Result<Row> {
        let q = bind_all(sqlx::query::<Any>(sql), args);
        let row = query::fetch_one(&self.pool, sql, q, self.trace).await?;
        Ok(Row::new(row, Arc::clone(&self.mapper)))
    }

    pub async fn query_row_map(&self, sql: &str, map: &impl Mapping) -> crate::Result<Row> {
        self.query_row_named(sql, Params::Mapping(map)).await
    }

    pub async fn query_row_record(&self, sql: &str, record: &impl Record) -> crate::Result<Row> {
        self.query_row_named(sql, Params::Record(record)).await
    }

    pub async fn query_row_named(&self, sql: &str, params: Params<'_>) -> crate::Result<Row> {
        let (sql, args) = bind_template(sql, self.style, params)?;
        self.query_row(&sql, args).await
    }

    /// Prepares `sql` on the pool. The statement keeps its own name table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot prepare the rewritten SQL.
    pub async fn prepare(&self, sql: &str) -> crate::Result<Statement> {
        let built = build_query(sql, self.style)?;
        debug!(sql = %built.sql, "prepare");
        let prepared = traced(self.trace, &built.sql, self.pool.prepare(&built.sql)).await?;
        Ok(Statement::new(
            sqlx::Statement::to_owned(&prepared),
            built.names,
            Arc::clone(&self.mapper),
            self.trace,
        ))
    }

    /// Starts a transaction carrying this pool's mapper, tracing flag and placeholder style.
    pub async fn begin(&self) -> crate::Result<Tx> {
        debug!("begin");
        let inner = self.pool.begin().await?;
        Ok(Tx::new(inner, Arc::clone(&self.mapper), self.trace, self.style))
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
