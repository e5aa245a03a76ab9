//! # `ApiClient`: the one handle every operation goes through
//!
//! Holds the transport, the normalized base URL, the auth scheme, the query
//! cache and the invalidation map. Clones are cheap and share the transport
//! and the cache, so the UI can hand a clone to every hook.
//!
//! The operations themselves live next to their concern:
//!
//! | Module | Operations |
//! |--------|-----------|
//! | [`crate::query`] | `query`, `refetch`, `query_cancellable`, `cached` |
//! | [`crate::mutation`] | `mutate` |
//! | [`crate::upload`] | `upload` |
//! | [`crate::admin`] | typed admin reads and actions |

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use store::{InvalidationMap, QueryCache};

use crate::auth::AuthScheme;
use crate::coalesce::Coalescer;
use crate::endpoint::{ApiBase, Endpoint};
use crate::error::{ApiError, Result};
use crate::settings::Settings;
use crate::transport::{
    DynTransport, HttpRequest, HttpResponse, Method, ReqwestTransport, RequestBody, Transport,
};
use crate::upload::UploadOptions;

pub struct ApiClient<T = ReqwestTransport> {
    transport: Arc<T>,
    base: ApiBase,
    scheme: AuthScheme,
    cache: QueryCache,
    invalidations: Arc<InvalidationMap>,
    query_retries: u32,
    upload: UploadOptions,
    inflight: Arc<Coalescer>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            base: self.base.clone(),
            scheme: self.scheme,
            cache: self.cache.clone(),
            invalidations: self.invalidations.clone(),
            query_retries: self.query_retries,
            upload: self.upload.clone(),
            inflight: self.inflight.clone(),
        }
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base)
            .field("scheme", &self.scheme)
            .field("cache", &self.cache)
            .finish()
    }
}

impl<T> PartialEq for ApiClient<T> {
    /// Two handles are equal when they share a transport and a base URL.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.transport, &other.transport) && self.base == other.base
    }
}

impl ApiClient<ReqwestTransport> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new(), ApiBase::new(&settings.api.url)?)
            .with_scheme(settings.api.scheme)
            .with_cache(QueryCache::with_policy(settings.cache_policy()))
            .with_query_retries(settings.query.retries)
            .with_upload_options(settings.upload_options()?))
    }

    /// Build from [`Settings::load`].
    pub fn from_env() -> Result<Self> {
        Self::from_settings(&Settings::load()?)
    }
}

impl<T> ApiClient<T> {
    pub fn new(transport: T, base: ApiBase) -> Self {
        Self {
            transport: Arc::new(transport),
            base,
            scheme: AuthScheme::default(),
            cache: QueryCache::new(),
            invalidations: Arc::new(InvalidationMap::admin_defaults()),
            query_retries: 1,
            upload: UploadOptions::default(),
            inflight: Arc::new(Coalescer::default()),
        }
    }

    pub fn with_scheme(mut self, scheme: AuthScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_invalidations(mut self, map: InvalidationMap) -> Self {
        self.invalidations = Arc::new(map);
        self
    }

    /// Automatic retries of a failed read before the error surfaces.
    pub fn with_query_retries(mut self, retries: u32) -> Self {
        self.query_retries = retries;
        self
    }

    pub fn with_upload_options(mut self, options: UploadOptions) -> Self {
        self.upload = options;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn invalidations(&self) -> &InvalidationMap {
        &self.invalidations
    }

    pub fn query_retries(&self) -> u32 {
        self.query_retries
    }

    pub fn upload_options(&self) -> &UploadOptions {
        &self.upload
    }

    pub(crate) fn inflight(&self) -> &Coalescer {
        &self.inflight
    }

    /// Assemble a request: absolute URL, JSON accept header and, when a token
    /// is given, the `Authorization` header.
    pub fn build_request(
        &self,
        method: Method,
        endpoint: &Endpoint,
        token: Option<&str>,
        body: RequestBody,
    ) -> Result<HttpRequest> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        headers.extend(self.scheme.header(token));
        Ok(HttpRequest {
            method,
            url: self.base.url(endpoint)?,
            headers,
            body,
        })
    }
}

impl<T: Transport + 'static> ApiClient<T> {
    /// Same client, cache and settings, with the transport type erased.
    pub fn into_dyn(self) -> ApiClient<DynTransport> {
        ApiClient {
            transport: Arc::new(DynTransport::from_shared(self.transport)),
            base: self.base,
            scheme: self.scheme,
            cache: self.cache,
            invalidations: self.invalidations,
            query_retries: self.query_retries,
            upload: self.upload,
            inflight: self.inflight,
        }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Send a request, turning non-2xx responses into [`ApiError::Status`].
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "api request");
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// One-shot JSON request with no caching.
    pub async fn request_json<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &Endpoint,
        token: Option<&str>,
        body: RequestBody,
    ) -> Result<R> {
        let request = self.build_request(method, endpoint, token, body)?;
        let response = self.send(request).await?;
        decode(&response.body)
    }
}

/// Decode a response body; an empty body reads as JSON `null`.
pub(crate) fn decode<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use serde_json::json;

    fn client(transport: &MockTransport) -> ApiClient<MockTransport> {
        ApiClient::new(transport.clone(), ApiBase::new("https://h.io/api").unwrap())
    }

    #[tokio::test]
    async fn test_authorization_only_with_token() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let endpoint = Endpoint::from("provinces");

        let _: Value = client
            .request_json(Method::Get, &endpoint, None, RequestBody::Empty)
            .await
            .unwrap();
        let _: Value = client
            .request_json(Method::Get, &endpoint, Some("secret"), RequestBody::Empty)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].header("Authorization"), None);
        assert_eq!(requests[1].header("Authorization"), Some("Bearer secret"));
        assert_eq!(requests[1].url, "https://h.io/api/provinces");
    }

    #[tokio::test]
    async fn test_token_scheme_is_configurable() {
        let transport = MockTransport::new();
        let client = client(&transport).with_scheme(AuthScheme::Token);
        let _: Value = client
            .request_json(Method::Get, &Endpoint::from("users"), Some("t"), RequestBody::Empty)
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].header("Authorization"), Some("Token t"));
    }

    #[tokio::test]
    async fn test_non_success_becomes_status_error() {
        let transport = MockTransport::new();
        transport.respond_json(404, json!({ "message": "Job not found" }));
        let client = client(&transport);

        let err = client
            .request_json::<Value>(Method::Get, &Endpoint::from("jobs/9"), None, RequestBody::Empty)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 404,
                message: Some("Job not found".into())
            }
        );
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Value = decode(b"").unwrap();
        assert_eq!(value, Value::Null);
        assert!(decode::<()>(b" \n").is_ok());
        assert!(matches!(decode::<Vec<u8>>(b"{"), Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_erased_client_shares_cache() {
        let transport = MockTransport::new();
        transport.respond_json(200, json!(["Aceh"]));
        let client = client(&transport);
        let erased = client.clone().into_dyn();

        let endpoint = Endpoint::from("provinces");
        let value: Value = erased
            .request_json(Method::Get, &endpoint, None, RequestBody::Empty)
            .await
            .unwrap();
        assert_eq!(value, json!(["Aceh"]));
        assert_eq!(transport.request_count(), 1);

        erased.cache().set("provinces".into(), value);
        assert_eq!(client.cache().len(), 1);
    }

    #[test]
    fn test_clones_share_cache() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let other = client.clone();
        other.cache().set("jobs".into(), json!([]));
        assert_eq!(client.cache().len(), 1);
        assert_eq!(client, other);
    }
}
