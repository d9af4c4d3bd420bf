//! Timeout and single-retry wrapper for any [`DocumentStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use super::{Collection, Document, DocumentStore, FieldFilter, StoreError};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Bounds every call by a timeout and retries once on a transient error.
///
/// Each attempt runs in a `store.call` span so callers can count store round
/// trips per request.
#[derive(Debug, Clone)]
pub struct RetryingStore {
    inner: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn attempt<T>(
        &self,
        op: &'static str,
        collection: Collection,
        attempt: u32,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let span = tracing::info_span!(
            "store.call",
            op = op,
            collection = collection.as_str(),
            attempt = attempt
        );
        match tokio::time::timeout(self.timeout, fut).instrument(span).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    async fn call<T, F, Fut>(
        &self,
        op: &'static str,
        collection: Collection,
        mut make: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match self.attempt(op, collection, 1, make()).await {
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    op = op,
                    collection = %collection,
                    error = %e,
                    "transient store error, retrying once"
                );
                self.attempt(op, collection, 2, make()).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl DocumentStore for RetryingStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.call("get", collection, || self.inner.get(collection, id))
            .await
    }

    async fn list(
        &self,
        collection: Collection,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        self.call("list", collection, || self.inner.list(collection, filter))
            .await
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<(), StoreError> {
        self.call("put", collection, || {
            self.inner.put(collection, id, body.clone())
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        self.call("delete", collection, || self.inner.delete(collection, id))
            .await
    }
}
