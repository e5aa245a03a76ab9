//! # Cached reads
//!
//! [`ApiClient::query`] is the generic fetch: given a [`QuerySpec`] (cache key,
//! endpoint, optional token) it answers from the cache while the entry is
//! fresh, otherwise it issues a GET, retries a failure up to
//! [`ApiClient::query_retries`] times, stores the payload and decodes it.
//!
//! Reads of one key that overlap share a single request: later readers wait
//! for the first and then find its result in the cache.
//!
//! [`ApiClient::refetch`] skips the freshness check. [`ApiClient::query_cancellable`]
//! ties the read to an [`AbortRegistration`]; an aborted read leaves the cache
//! as it was.

use futures::future::{AbortRegistration, Abortable};
use serde::de::DeserializeOwned;
use serde_json::Value;
use store::QueryKey;

use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::transport::{Method, RequestBody, Transport};

/// What to read and where to cache it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySpec {
    pub key: QueryKey,
    pub endpoint: Endpoint,
    pub token: Option<String>,
}

impl QuerySpec {
    pub fn new(key: impl Into<QueryKey>, endpoint: impl Into<Endpoint>) -> Self {
        Self {
            key: key.into(),
            endpoint: endpoint.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Error,
    Success,
}

/// Snapshot a view renders from: the last data (kept while reloading) plus
/// the status of the latest attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::loading(None)
    }
}

impl<T> QueryState<T> {
    pub fn loading(previous: Option<T>) -> Self {
        Self {
            status: QueryStatus::Loading,
            data: previous,
            error: None,
        }
    }

    /// Fold a finished attempt in, keeping `previous` data on error.
    pub fn settled(result: Result<T>, previous: Option<T>) -> Self {
        match result {
            Ok(data) => Self {
                status: QueryStatus::Success,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                status: QueryStatus::Error,
                data: previous,
                error: Some(error),
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }
}

impl<T: Transport> ApiClient<T> {
    /// Read through the cache.
    pub async fn query<R: DeserializeOwned>(&self, spec: &QuerySpec) -> Result<R> {
        if let Some(value) = self.cache().fresh(&spec.key) {
            tracing::debug!(key = %spec.key, "query cache hit");
            return Ok(serde_json::from_value(value)?);
        }
        let _turn = self.inflight().acquire(&spec.key).await;
        if let Some(value) = self.cache().fresh(&spec.key) {
            tracing::debug!(key = %spec.key, "query joined in-flight read");
            return Ok(serde_json::from_value(value)?);
        }
        self.refetch(spec).await
    }

    /// Read from the network and overwrite the cache entry.
    pub async fn refetch<R: DeserializeOwned>(&self, spec: &QuerySpec) -> Result<R> {
        let value = self.fetch_value(spec).await?;
        self.cache().set(spec.key.clone(), value.clone());
        Ok(serde_json::from_value(value)?)
    }

    /// [`query`](Self::query) that resolves to [`ApiError::Cancelled`] once
    /// the matching `AbortHandle` fires.
    pub async fn query_cancellable<R: DeserializeOwned>(
        &self,
        spec: &QuerySpec,
        registration: AbortRegistration,
    ) -> Result<R> {
        Abortable::new(self.query(spec), registration)
            .await
            .unwrap_or(Err(ApiError::Cancelled))
    }

    /// Whatever the cache holds for `key`, fresh or stale.
    pub fn cached<R: DeserializeOwned>(&self, key: &QueryKey) -> Option<R> {
        self.cache()
            .get(key)
            .and_then(|entry| serde_json::from_value(entry.data).ok())
    }

    async fn fetch_value(&self, spec: &QuerySpec) -> Result<Value> {
        let mut attempt = 0;
        loop {
            let result = async {
                let request = self.build_request(
                    Method::Get,
                    &spec.endpoint,
                    spec.token.as_deref(),
                    RequestBody::Empty,
                )?;
                let response = self.send(request).await?;
                crate::client::decode::<Value>(&response.body)
            }
            .await;
            match result {
                Err(e) if attempt < self.query_retries() && !e.is_cancelled() => {
                    attempt += 1;
                    tracing::warn!(key = %spec.key, error = %e, attempt, "query failed, retrying");
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ApiBase;
    use crate::mock::MockTransport;
    use futures::future::AbortHandle;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use store::QueryCache;

    fn client(transport: &MockTransport) -> ApiClient<MockTransport> {
        ApiClient::new(transport.clone(), ApiBase::new("https://h.io").unwrap())
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_network() {
        let transport = MockTransport::new();
        transport.respond_json(200, json!([{ "id": 1, "name": "Jawa Barat" }]));
        let client = client(&transport);
        let spec = QuerySpec::new("provinces", "provinces");

        let first: Value = client.query(&spec).await.unwrap();
        let second: Value = client.query(&spec).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_reads_share_one_request() {
        let transport = MockTransport::new().yielding();
        transport.respond_json(200, json!([{ "id": 1 }]));
        let client = client(&transport);
        let spec = QuerySpec::new("jobs", "jobs");

        let (first, second) = futures::join!(client.query::<Value>(&spec), client.query::<Value>(&spec));
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(transport.request_count(), 1);
        assert_eq!(client.inflight().len(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_reads_of_different_keys_both_fetch() {
        let transport = MockTransport::new().yielding();
        let client = client(&transport);
        let jobs = QuerySpec::new("jobs", "jobs");
        let videos = QuerySpec::new("videos", "videos");

        let (a, b) = futures::join!(client.query::<Value>(&jobs), client.query::<Value>(&videos));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let now = Arc::new(AtomicU64::new(0));
        let clock_now = now.clone();
        let cache = QueryCache::new().with_clock(Arc::new(move || clock_now.load(Ordering::SeqCst)));
        let transport = MockTransport::new();
        transport
            .respond_json(200, json!({ "v": 1 }))
            .respond_json(200, json!({ "v": 2 }));
        let client = client(&transport).with_cache(cache);
        let spec = QuerySpec::new(["jobs", "1"], "jobs/1");

        let first: Value = client.query(&spec).await.unwrap();
        now.fetch_add(Duration::from_secs(301).as_millis() as u64, Ordering::SeqCst);
        let second: Value = client.query(&spec).await.unwrap();

        assert_eq!(first, json!({ "v": 1 }));
        assert_eq!(second, json!({ "v": 2 }));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_filter_keys_are_evicted() {
        let now = Arc::new(AtomicU64::new(0));
        let clock_now = now.clone();
        let cache = QueryCache::new().with_clock(Arc::new(move || clock_now.load(Ordering::SeqCst)));
        let transport = MockTransport::new();
        let client = client(&transport).with_cache(cache);
        let search = |i: usize| {
            QuerySpec::new(
                QueryKey::from("jobs").with(format!("search={i}")),
                Endpoint::new("jobs").with_param("search", i),
            )
        };

        for i in 0..50 {
            let _: Value = client.query(&search(i)).await.unwrap();
        }
        assert_eq!(client.cache().len(), 50);

        now.fetch_add(Duration::from_secs(60 * 60).as_millis() as u64, Ordering::SeqCst);
        for i in 100..105 {
            let _: Value = client.query(&search(i)).await.unwrap();
        }
        assert_eq!(client.cache().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_read_is_retried_once() {
        let transport = MockTransport::new();
        transport
            .fail("connection reset")
            .respond_json(200, json!(["ok"]));
        let client = client(&transport);

        let data: Vec<String> = client.query(&QuerySpec::new("videos", "videos")).await.unwrap();
        assert_eq!(data, vec!["ok"]);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_error_surfaces_after_retry() {
        let transport = MockTransport::new();
        transport
            .respond_json(500, json!({}))
            .respond_json(503, json!({ "message": "maintenance" }));
        let client = client(&transport);
        let spec = QuerySpec::new("videos", "videos");

        let err = client.query::<Value>(&spec).await.unwrap_err();
        assert_eq!(err.user_message(), "maintenance");
        assert_eq!(transport.request_count(), 2);
        assert!(client.cache().get(&spec.key).is_none());
    }

    #[tokio::test]
    async fn test_refetch_bypasses_fresh_entry() {
        let transport = MockTransport::new();
        transport
            .respond_json(200, json!(1))
            .respond_json(200, json!(2));
        let client = client(&transport);
        let spec = QuerySpec::new("count", "jobs/count");

        let _: u32 = client.query(&spec).await.unwrap();
        let refreshed: u32 = client.refetch(&spec).await.unwrap();
        assert_eq!(refreshed, 2);
        assert_eq!(client.cached::<u32>(&spec.key), Some(2));
    }

    #[tokio::test]
    async fn test_token_controls_authorization_header() {
        let transport = MockTransport::new();
        let client = client(&transport);

        let _: Value = client.query(&QuerySpec::new("public", "jobs")).await.unwrap();
        let _: Value = client
            .query(&QuerySpec::new("private", "users").with_token("abc"))
            .await
            .unwrap();

        let requests = transport.requests();
        assert!(requests[0].header("Authorization").is_none());
        assert_eq!(requests[1].header("Authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_aborted_query_leaves_cache_untouched() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();

        let spec = QuerySpec::new("jobs", "jobs");
        let err = client
            .query_cancellable::<Value>(&spec, registration)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(client.cache().is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_query_state_keeps_previous_data_on_error() {
        let state = QueryState::settled(Err(ApiError::Cancelled), Some(3));
        assert!(state.is_error());
        assert_eq!(state.data, Some(3));

        let state = QueryState::settled(Ok(4), Some(3));
        assert!(state.is_success());
        assert_eq!(state.data, Some(4));

        assert!(QueryState::<u8>::default().is_loading());
    }
}
