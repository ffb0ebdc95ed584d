//! Result rows addressed by canonical field name.

use crate::mapper::Mapper;
use crate::trace::in_span;
use futures::stream::BoxStream;
use futures::{Stream, TryStreamExt};
use sqlx::any::AnyRow;
use sqlx::{Any, Column, Decode, Row as _, Type};
use std::fmt;
use std::sync::Arc;
use tracing::Span;

/// Types that can be built from a [`Row`].
///
/// ```
/// use sqlx_named::{FromNamedRow, Row};
///
/// struct User {
///     id: i64,
///     user_name: String,
/// }
///
/// impl FromNamedRow for User {
///     fn from_named_row(row: &Row) -> sqlx_named::Result<Self> {
///         Ok(User {
///             id: row.get("ID")?,
///             user_name: row.get("UserName")?,
///         })
///     }
/// }
/// ```
pub trait FromNamedRow: Sized {
    fn from_named_row(row: &Row) -> crate::Result<Self>;
}

/// A single result row plus the mapper of the handle that produced it.
pub struct Row {
    inner: AnyRow,
    mapper: Arc<dyn Mapper>,
}

impl Row {
    pub(crate) fn new(inner: AnyRow, mapper: Arc<dyn Mapper>) -> Self {
        Self { inner, mapper }
    }

    /// Reads the column mapped from `field` (`CreatedAt` reads `created_at` with the snake
    /// mapper).
    pub fn get<T>(&self, field: &str) -> crate::Result<T>
    where
        T: for<'r> Decode<'r, Any> + Type<Any>,
    {
        let column = self.mapper.obj_to_table(field);
        self.get_column(&column)
    }

    /// Reads a column by its name in the result set, bypassing the mapper.
    pub fn get_column<T>(&self, column: &str) -> crate::Result<T>
    where
        T: for<'r> Decode<'r, Any> + Type<Any>,
    {
        Ok(self.inner.try_get(column)?)
    }

    /// Column names as the database reported them.
    pub fn columns(&self) -> Vec<&str> {
        self.inner
            .columns()
            .iter()
            .map(|column| column.name())
            .collect()
    }

    /// Canonical field names of the row's columns, in column order.
    pub fn fields(&self) -> Vec<String> {
        self.columns()
            .into_iter()
            .map(|column| self.mapper.table_to_obj(column))
            .collect()
    }

    pub fn scan<T: FromNamedRow>(&self) -> crate::Result<T> {
        T::from_named_row(self)
    }

    pub fn as_any_row(&self) -> &AnyRow {
        &self.inner
    }

    pub fn into_inner(self) -> AnyRow {
        self.inner
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("columns", &self.columns())
            .finish_non_exhaustive()
    }
}

/// A cursor over the rows of one query.
///
/// Rows are pulled from the database as [`next`](Rows::next) is called, so a `Rows` keeps its
/// connection busy until it is exhausted or dropped. The column names are known up front, even
/// for a result with no rows.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx_named::Db;
///
/// # async fn example(db: Db) -> Result<(), Box<dyn std::error::Error>> {
/// let mut rows = db.query("SELECT id, user_name FROM users", vec![]).await?;
/// println!("fields: {:?}", rows.fields());
/// while let Some(row) = rows.next().await? {
///     let name: String = row.get("UserName")?;
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Rows<'c> {
    columns: Vec<String>,
    stream: BoxStream<'c, crate::Result<AnyRow>>,
    mapper: Arc<dyn Mapper>,
    span: Option<Span>,
}

impl<'c> Rows<'c> {
    pub(crate) fn new(
        columns: Vec<String>,
        stream: impl Stream<Item = crate::Result<AnyRow>> + Send + 'c,
        mapper: Arc<dyn Mapper>,
        span: Option<Span>,
    ) -> Self {
        Self {
            columns,
            stream: Box::pin(stream),
            mapper,
            span,
        }
    }

    /// Result column names as the database reported them.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Canonical field names of the result columns, in column order.
    pub fn fields(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| self.mapper.table_to_obj(column))
            .collect()
    }

    /// Advances the cursor. `Ok(None)` means the result set is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if fetching the next row fails.
    pub async fn next(&mut self) -> crate::Result<Option<Row>> {
        let row = in_span(self.span.as_ref(), self.stream.try_next()).await?;
        Ok(row.map(|row| Row::new(row, Arc::clone(&self.mapper))))
    }

    /// Reads every remaining row.
    pub async fn collect(mut self) -> crate::Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Builds a `T` from every remaining row.
    pub async fn scan_all<T: FromNamedRow>(mut self) -> crate::Result<Vec<T>> {
        let mut scanned = Vec::new();
        while let Some(row) = self.next().await? {
            scanned.push(row.scan()?);
        }
        Ok(scanned)
    }
}

impl fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}
