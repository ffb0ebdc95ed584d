use std::future::Future;
use tracing::{info_span, Instrument, Span};

/// Client span for one statement, named after its first token (`SELECT`, `insert`, ...).
///
/// The parent is whatever span is current for the caller.
pub(crate) fn client_span(sql: &str) -> Span {
    let operation = sql.split_whitespace().next().unwrap_or(sql);
    info_span!(
        "sql",
        otel.name = %operation,
        otel.kind = "client",
        db.statement = %sql
    )
}

/// The span for `sql` when tracing is enabled.
pub(crate) fn span_for(enabled: bool, sql: &str) -> Option<Span> {
    enabled.then(|| client_span(sql))
}

/// Runs `fut` inside `span`, or bare when there is none.
pub(crate) async fn in_span<F: Future>(span: Option<&Span>, fut: F) -> F::Output {
    match span {
        Some(span) => fut.instrument(span.clone()).await,
        None => fut.await,
    }
}

/// Runs `fut` inside a client span when `enabled`; otherwise no span is created.
pub(crate) async fn traced<F: Future>(enabled: bool, sql: &str, fut: F) -> F::Output {
    in_span(span_for(enabled, sql).as_ref(), fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_traced_passes_output_through() {
        let ok: Result<u32, &str> = traced(true, "SELECT 1", async { Ok(1) }).await;
        assert_eq!(ok, Ok(1));
        let err: Result<u32, &str> = traced(true, "SELECT 1", async { Err("boom") }).await;
        assert_eq!(err, Err("boom"));
        let plain = traced(false, "", async { 5 }).await;
        assert_eq!(plain, 5);
    }

    #[test]
    fn test_span_only_when_enabled() {
        assert!(span_for(false, "SELECT 1").is_none());
        assert!(span_for(true, "SELECT 1").is_some());
    }
}
