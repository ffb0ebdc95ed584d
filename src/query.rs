use crate::trace::traced;
use crate::value::Value;
use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use sqlx::any::{AnyArguments, AnyQueryResult, AnyRow, AnyStatement};
use sqlx::query::Query;
use sqlx::{Any, Column, Executor, Statement as _};
use tracing::debug;

/// Type alias for SQLx Query with `Any` arguments
pub type Q<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Binds one value onto a query.
pub fn bind_value(q: Q<'_>, value: Value) -> Q<'_> {
    match value {
        Value::Null => q.bind(None::<String>),
        Value::Bool(v) => q.bind(v),
        Value::Int(v) => q.bind(v),
        Value::Float(v) => q.bind(v),
        Value::Text(v) => q.bind(v),
        Value::Bytes(v) => q.bind(v),
    }
}

/// Binds `args` onto a query in order.
pub fn bind_all(mut q: Q<'_>, args: Vec<Value>) -> Q<'_> {
    for value in args {
        q = bind_value(q, value);
    }
    q
}

/// Executes `q` on `executor`, inside a client span when `trace` is set.
///
/// `sql` is the driver-ready text of `q`; it labels the span and the log line.
pub(crate) async fn execute<'e, E>(
    executor: E,
    sql: &str,
    q: Q<'_>,
    trace: bool,
) -> crate::Result<AnyQueryResult>
where
    E: Executor<'e, Database = Any>,
{
    debug!(sql, "exec");
    Ok(traced(trace, sql, q.execute(executor)).await?)
}

pub(crate) async fn fetch_one<'e, E>(
    executor: E,
    sql: &str,
    q: Q<'_>,
    trace: bool,
) -> crate::Result<AnyRow>
where
    E: Executor<'e, Database = Any>,
{
    debug!(sql, "query row");
    Ok(traced(trace, sql, q.fetch_one(executor)).await?)
}

/// Result column names of `sql`, known without fetching a row.
pub(crate) async fn columns<'e, E>(executor: E, sql: &str) -> crate::Result<Vec<String>>
where
    E: Executor<'e, Database = Any>,
{
    let statement = executor.prepare(sql).await?;
    Ok(column_names(&statement))
}

pub(crate) fn column_names(statement: &AnyStatement<'_>) -> Vec<String> {
    statement
        .columns()
        .iter()
        .map(|column| column.name().to_owned())
        .collect()
}

/// Streams the rows of `sql`, which the stream owns along with `args`.
pub(crate) fn fetch<'c, E>(
    executor: E,
    sql: String,
    args: Vec<Value>,
) -> impl Stream<Item = crate::Result<AnyRow>> + Send + 'c
where
    E: Executor<'c, Database = Any> + 'c,
{
    try_stream! {
        let q = bind_all(sqlx::query::<Any>(&sql), args);
        let mut rows = q.fetch(executor);
        while let Some(row) = rows.try_next().await? {
            yield row;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn test_bind_all_keeps_sql() {
        let q = bind_all(
            sqlx::query::<Any>("SELECT ?, ?, ?"),
            vec![Value::from(1), Value::from("s"), Value::Null],
        );
        assert_eq!(q.sql(), "SELECT ?, ?, ?");
    }
}
