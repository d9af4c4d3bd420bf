//! Per-request accounting of document store traffic.
//!
//! `RetryingStore` opens a `store.call` span for every attempt it makes. The
//! layer here reads each span's `op` and `attempt` fields and tallies them into
//! [`StoreCallStats`] scoped to the current request by [`store_call_scope`].

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::{span, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

const STORE_CALL_SPAN: &str = "store.call";

pub const STORE_CALLS_HEADER: &str = "x-store-calls";

tokio::task_local! {
    static STORE_CALLS: Arc<StoreCallStats>;
}

/// Running totals for one request.
#[derive(Debug, Default)]
pub struct StoreCallStats {
    reads: AtomicU32,
    writes: AtomicU32,
    retries: AtomicU32,
}

impl StoreCallStats {
    fn record(&self, call: &StoreCallFields) {
        let counter = if call.write {
            &self.writes
        } else {
            &self.reads
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if call.retry {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StoreCalls {
        StoreCalls {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Store attempts made so far. A retried call counts once per attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub reads: u32,
    pub writes: u32,
    pub retries: u32,
}

impl StoreCalls {
    pub fn total(&self) -> u32 {
        self.reads + self.writes
    }
}

impl fmt::Display for StoreCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={}; writes={}; retries={}",
            self.reads, self.writes, self.retries
        )
    }
}

/// Store traffic of the request being handled, or None outside a request scope.
pub fn current_store_calls() -> Option<StoreCalls> {
    STORE_CALLS.try_with(|stats| stats.snapshot()).ok()
}

#[derive(Default)]
struct StoreCallFields {
    write: bool,
    retry: bool,
}

impl Visit for StoreCallFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "op" {
            self.write = matches!(value, "put" | "delete");
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "attempt" {
            self.retry = value > 1;
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
}

/// Tallies `store.call` spans into the request's [`StoreCallStats`].
///
/// Store futures are awaited on the handler's task, which is where the
/// task-local lives. Spans disabled by the active filter are never seen.
pub struct StoreCallLayer;

impl<S> Layer<S> for StoreCallLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
        if attrs.metadata().name() != STORE_CALL_SPAN {
            return;
        }
        let mut fields = StoreCallFields::default();
        attrs.record(&mut fields);
        let _ = STORE_CALLS.try_with(|stats| stats.record(&fields));
    }
}

/// Gives each request a fresh [`StoreCallStats`]. Must wrap the TraceLayer so
/// the response log can read the totals.
pub async fn store_call_scope(request: Request<Body>, next: Next) -> Response {
    STORE_CALLS
        .scope(Arc::default(), next.run(request))
        .await
}

/// Reports the request's store traffic in the `X-Store-Calls` header.
pub async fn store_calls_header(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    if let Some(calls) = current_store_calls() {
        if let Ok(value) = HeaderValue::from_str(&calls.to_string()) {
            response.headers_mut().insert(STORE_CALLS_HEADER, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_reads_writes_and_retries_tallied() {
        let stats = Arc::new(StoreCallStats::default());
        let subscriber = tracing_subscriber::registry().with(StoreCallLayer);

        STORE_CALLS.sync_scope(stats.clone(), || {
            tracing::subscriber::with_default(subscriber, || {
                let _get = tracing::info_span!("store.call", op = "get", attempt = 1u32).entered();
                let _put = tracing::info_span!("store.call", op = "put", attempt = 1u32).entered();
                let _again =
                    tracing::info_span!("store.call", op = "put", attempt = 2u32).entered();
                let _other = tracing::info_span!("http_request", op = "delete").entered();
            });
            assert_eq!(current_store_calls().map(|c| c.total()), Some(3));
        });

        assert_eq!(
            stats.snapshot(),
            StoreCalls {
                reads: 1,
                writes: 2,
                retries: 1
            }
        );
    }

    #[test]
    fn test_header_format() {
        let calls = StoreCalls {
            reads: 2,
            writes: 1,
            retries: 0,
        };
        assert_eq!(calls.to_string(), "reads=2; writes=1; retries=0");
    }

    #[test]
    fn test_nothing_outside_request_scope() {
        assert_eq!(current_store_calls(), None);
    }
}
