mod common;

use common::{memory_db, user, INSERT_USER};
use sqlx_named::{DbOptions, Error, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Records the fields of every span this crate opens.
#[derive(Clone, Default)]
struct SpanLog(Arc<Mutex<Vec<HashMap<String, String>>>>);

impl SpanLog {
    fn spans(&self) -> Vec<HashMap<String, String>> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct Fields(HashMap<String, String>);

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for SpanLog {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if !attrs.metadata().target().starts_with("sqlx_named") {
            return;
        }
        let mut fields = Fields::default();
        attrs.record(&mut fields);
        self.0.lock().unwrap().push(fields.0);
    }
}

fn capture() -> (SpanLog, tracing::subscriber::DefaultGuard) {
    let log = SpanLog::default();
    let subscriber = tracing_subscriber::registry().with(log.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (log, guard)
}

#[tokio::test]
async fn test_span_per_statement_when_enabled() {
    let db = memory_db(DbOptions::new().enable_trace(true)).await;
    let (log, _guard) = capture();

    db.exec_record(INSERT_USER, &user(1, "alice", 31))
        .await
        .unwrap();

    let spans = log.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["otel.name"], "INSERT");
    assert_eq!(spans[0]["otel.kind"], "client");
    assert_eq!(
        spans[0]["db.statement"],
        "INSERT INTO users (id, user_name, age) VALUES (?, ?, ?)"
    );
}

#[tokio::test]
async fn test_no_spans_when_disabled() {
    let db = memory_db(DbOptions::default()).await;
    let (log, _guard) = capture();

    db.exec_record(INSERT_USER, &user(1, "alice", 31))
        .await
        .unwrap();
    let stmt = db
        .prepare("SELECT id FROM users WHERE id = ?id")
        .await
        .unwrap();
    let pairs = [("id", Value::from(1))];
    stmt.query_record(db.pool(), &pairs).await.unwrap();

    assert!(log.spans().is_empty());
}

#[tokio::test]
async fn test_binding_failure_opens_no_span() {
    let db = memory_db(DbOptions::new().enable_trace(true)).await;
    let (log, _guard) = capture();

    let args: HashMap<&str, Value> = HashMap::new();
    let err = db.exec_map(INSERT_USER, &args).await.unwrap_err();

    assert!(matches!(err, Error::MissingBindingKey(_)));
    assert!(log.spans().is_empty());
}

#[tokio::test]
async fn test_span_does_not_mask_driver_error() {
    let db = memory_db(DbOptions::new().enable_trace(true)).await;
    let (log, _guard) = capture();

    let err = db
        .exec("DELETE FROM missing_table", vec![])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(_)));
    let spans = log.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["otel.name"], "DELETE");
}

#[tokio::test]
async fn test_prepare_and_statement_calls_are_traced() {
    let db = memory_db(DbOptions::new().enable_trace(true)).await;
    let (log, _guard) = capture();

    let stmt = db.prepare(INSERT_USER).await.unwrap();
    stmt.exec_record(db.pool(), &user(1, "alice", 31))
        .await
        .unwrap();

    let spans = log.spans();
    assert_eq!(spans.len(), 2);
    for span in &spans {
        assert_eq!(span["otel.name"], "INSERT");
        assert_eq!(span["db.statement"], stmt.sql());
    }
}

#[tokio::test]
async fn test_cursor_reuses_one_span_across_rows() {
    let db = memory_db(DbOptions::new().enable_trace(true)).await;
    db.exec_record(INSERT_USER, &user(1, "alice", 31))
        .await
        .unwrap();
    db.exec_record(INSERT_USER, &user(2, "bob", 40))
        .await
        .unwrap();
    let (log, _guard) = capture();

    let mut rows = db
        .query("SELECT id FROM users ORDER BY id", vec![])
        .await
        .unwrap();
    let mut read = 0;
    while rows.next().await.unwrap().is_some() {
        read += 1;
    }

    assert_eq!(read, 2);
    let spans = log.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["otel.name"], "SELECT");
    assert_eq!(spans[0]["db.statement"], "SELECT id FROM users ORDER BY id");
}
