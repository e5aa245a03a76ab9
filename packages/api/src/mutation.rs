//! # Mutations: create, update, delete and resource actions
//!
//! A [`Mutation`] names a resource collection (`"jobs"`), which is both the
//! URL segment and the cache-key prefix to invalidate. [`ApiClient::mutate`]
//! sends it and then:
//!
//! - **on success** invalidates every cached query under the prefixes the
//!   client's [`InvalidationMap`](store::InvalidationMap) lists for the
//!   resource, raises a success toast and returns the decoded body with the
//!   optional redirect target;
//! - **on failure** raises an error toast and returns the error, leaving the
//!   cache alone.
//!
//! Payloads that implement [`Validate`] can be checked up front with
//! [`Mutation::validated`]; a rejected payload never reaches the network.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use store::{FieldError, Validate};

use crate::client::{decode, ApiClient};
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::notify::{Notifier, Toast};
use crate::transport::{Method, RequestBody, Transport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update { id: String },
    Delete { id: String },
    /// A custom action on an endpoint of the resource, e.g. `jobs/7/toggle-status`.
    Action { method: Method, endpoint: Endpoint },
}

/// Toast texts and navigation for one mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationOptions {
    pub redirect: Option<String>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

impl MutationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    resource: String,
    kind: MutationKind,
    body: Option<Value>,
    token: Option<String>,
    options: MutationOptions,
    rejected: Vec<FieldError>,
}

impl Mutation {
    fn new(resource: &str, kind: MutationKind, body: Option<Value>) -> Self {
        Self {
            resource: resource.to_string(),
            kind,
            body,
            token: None,
            options: MutationOptions::default(),
            rejected: Vec::new(),
        }
    }

    /// POST `<resource>`.
    pub fn create<B: Serialize>(resource: &str, body: &B) -> Result<Self> {
        Ok(Self::new(resource, MutationKind::Create, Some(serde_json::to_value(body)?)))
    }

    /// PUT `<resource>/<id>`.
    pub fn update<B: Serialize>(resource: &str, id: impl ToString, body: &B) -> Result<Self> {
        Ok(Self::new(
            resource,
            MutationKind::Update { id: id.to_string() },
            Some(serde_json::to_value(body)?),
        ))
    }

    /// DELETE `<resource>/<id>`.
    pub fn delete(resource: &str, id: impl ToString) -> Self {
        Self::new(resource, MutationKind::Delete { id: id.to_string() }, None)
    }

    /// `method` on an arbitrary path; invalidates like any other mutation of `resource`.
    pub fn action(resource: &str, method: Method, endpoint: impl Into<Endpoint>) -> Self {
        Self::new(
            resource,
            MutationKind::Action {
                method,
                endpoint: endpoint.into(),
            },
            None,
        )
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_options(mut self, options: MutationOptions) -> Self {
        self.options = options;
        self
    }

    /// Run client-side validation; problems are reported by [`ApiClient::mutate`].
    pub fn validated(mut self, draft: &impl Validate) -> Self {
        self.rejected = draft.validate();
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn kind(&self) -> &MutationKind {
        &self.kind
    }

    pub fn options(&self) -> &MutationOptions {
        &self.options
    }

    pub fn method(&self) -> Method {
        match &self.kind {
            MutationKind::Create => Method::Post,
            MutationKind::Update { .. } => Method::Put,
            MutationKind::Delete { .. } => Method::Delete,
            MutationKind::Action { method, .. } => *method,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match &self.kind {
            MutationKind::Create => Endpoint::new(&self.resource),
            MutationKind::Update { id } | MutationKind::Delete { id } => {
                Endpoint::new(&self.resource).segment(id)
            }
            MutationKind::Action { endpoint, .. } => endpoint.clone(),
        }
    }

    fn default_success_message(&self) -> &'static str {
        match self.kind {
            MutationKind::Create => "Created successfully",
            MutationKind::Update { .. } => "Updated successfully",
            MutationKind::Delete { .. } => "Deleted successfully",
            MutationKind::Action { .. } => "Saved successfully",
        }
    }
}

/// Result of a successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationOutcome<R> {
    pub data: R,
    /// Where the caller should navigate next, if anywhere.
    pub redirect: Option<String>,
}

impl<T: Transport> ApiClient<T> {
    pub async fn mutate<R: DeserializeOwned>(
        &self,
        mutation: &Mutation,
        notifier: &impl Notifier,
    ) -> Result<MutationOutcome<R>> {
        let result = self.run_mutation(mutation).await;
        match &result {
            Ok(_) => {
                let message = mutation
                    .options
                    .success_message
                    .clone()
                    .unwrap_or_else(|| mutation.default_success_message().to_string());
                notifier.notify(Toast::success(message));
            }
            Err(e) => {
                tracing::warn!(resource = %mutation.resource, error = %e, "mutation failed");
                let message = mutation
                    .options
                    .error_message
                    .clone()
                    .unwrap_or_else(|| e.user_message());
                notifier.notify(Toast::error(message));
            }
        }
        result
    }

    async fn run_mutation<R: DeserializeOwned>(
        &self,
        mutation: &Mutation,
    ) -> Result<MutationOutcome<R>> {
        if !mutation.rejected.is_empty() {
            return Err(ApiError::Validation(mutation.rejected.clone()));
        }
        let body = match &mutation.body {
            Some(value) => RequestBody::Json(value.clone()),
            None => RequestBody::Empty,
        };
        let request = self.build_request(
            mutation.method(),
            &mutation.endpoint(),
            mutation.token.as_deref(),
            body,
        )?;
        let response = self.send(request).await?;

        // The server state changed even if the body turns out to be unreadable.
        let invalidated = self
            .cache()
            .invalidate_resource(self.invalidations(), &mutation.resource);
        tracing::info!(
            resource = %mutation.resource,
            method = mutation.method().as_str(),
            invalidated,
            "mutation applied"
        );

        Ok(MutationOutcome {
            data: decode(&response.body)?,
            redirect: mutation.options.redirect.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ApiBase;
    use crate::mock::{MockTransport, RecordingNotifier};
    use crate::notify::ToastLevel;
    use serde_json::json;
    use store::models::ContactDraft;
    use store::{InvalidationMap, QueryKey};

    fn client(transport: &MockTransport) -> ApiClient<MockTransport> {
        ApiClient::new(transport.clone(), ApiBase::new("https://h.io/api").unwrap())
    }

    fn seed(client: &ApiClient<MockTransport>, keys: &[QueryKey]) {
        for key in keys {
            client.cache().set(key.clone(), json!([]));
        }
    }

    #[tokio::test]
    async fn test_create_invalidates_resource_prefix_only() {
        let transport = MockTransport::new();
        transport.respond_json(201, json!({ "id": 5, "title": "QA Engineer" }));
        let client = client(&transport);
        seed(
            &client,
            &[
                QueryKey::from("jobs"),
                QueryKey::from(["jobs", "status=active"]),
                QueryKey::from("companies"),
                QueryKey::from("job-categories"),
            ],
        );
        let notifier = RecordingNotifier::default();

        let mutation = Mutation::create("jobs", &json!({ "title": "QA Engineer" }))
            .unwrap()
            .with_token("t")
            .with_options(MutationOptions::new().redirect("/admin/jobs"));
        let outcome: MutationOutcome<Value> = client.mutate(&mutation, &notifier).await.unwrap();

        assert_eq!(outcome.data["id"], 5);
        assert_eq!(outcome.redirect.as_deref(), Some("/admin/jobs"));

        let cache = client.cache();
        assert!(cache.is_stale(&QueryKey::from("jobs")));
        assert!(cache.is_stale(&QueryKey::from(["jobs", "status=active"])));
        assert!(!cache.is_stale(&QueryKey::from("companies")));
        assert!(!cache.is_stale(&QueryKey::from("job-categories")));

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://h.io/api/jobs");
        assert_eq!(request.body, RequestBody::Json(json!({ "title": "QA Engineer" })));
        assert_eq!(notifier.toasts(), vec![Toast::success("Created successfully")]);
    }

    #[tokio::test]
    async fn test_article_mutation_widens_invalidation() {
        let transport = MockTransport::new();
        let client = client(&transport);
        seed(
            &client,
            &[
                QueryKey::from("articles"),
                QueryKey::from(["article", "cv-tips"]),
                QueryKey::from(["admin-articles", "page=1"]),
                QueryKey::from("authors"),
            ],
        );

        let mutation = Mutation::update("articles", 3, &json!({ "title": "CV tips" })).unwrap();
        let _: MutationOutcome<Value> = client
            .mutate(&mutation, &RecordingNotifier::default())
            .await
            .unwrap();

        let cache = client.cache();
        assert!(cache.is_stale(&QueryKey::from("articles")));
        assert!(cache.is_stale(&QueryKey::from(["article", "cv-tips"])));
        assert!(cache.is_stale(&QueryKey::from(["admin-articles", "page=1"])));
        assert!(!cache.is_stale(&QueryKey::from("authors")));
        assert_eq!(transport.requests()[0].url, "https://h.io/api/articles/3");
        assert_eq!(transport.requests()[0].method, Method::Put);
    }

    #[tokio::test]
    async fn test_custom_invalidation_map() {
        let transport = MockTransport::new();
        let client = client(&transport)
            .with_invalidations(InvalidationMap::new().with("companies", ["jobs"]));
        seed(&client, &[QueryKey::from(["jobs", "company=2"])]);

        let _: MutationOutcome<Value> = client
            .mutate(&Mutation::delete("companies", 2), &RecordingNotifier::default())
            .await
            .unwrap();
        assert!(client.cache().is_stale(&QueryKey::from(["jobs", "company=2"])));
    }

    #[tokio::test]
    async fn test_failure_keeps_cache_and_raises_error_toast() {
        let transport = MockTransport::new();
        transport.respond_json(409, json!({ "message": "Slug already exists" }));
        let client = client(&transport);
        seed(&client, &[QueryKey::from("companies")]);
        let notifier = RecordingNotifier::default();

        let result: Result<MutationOutcome<Value>> = client
            .mutate(
                &Mutation::create("companies", &json!({ "name": "Acme" })).unwrap(),
                &notifier,
            )
            .await;

        assert_eq!(result.unwrap_err().status(), Some(409));
        assert!(!client.cache().is_stale(&QueryKey::from("companies")));
        assert_eq!(notifier.toasts(), vec![Toast::error("Slug already exists")]);
    }

    #[tokio::test]
    async fn test_custom_messages() {
        let transport = MockTransport::new();
        transport.respond_empty(204).fail("offline");
        let client = client(&transport);
        let notifier = RecordingNotifier::default();
        let options = MutationOptions::new()
            .success_message("Video removed")
            .error_message("Could not remove video");

        let deleted: MutationOutcome<Value> = client
            .mutate(
                &Mutation::delete("videos", 8).with_options(options.clone()),
                &notifier,
            )
            .await
            .unwrap();
        assert_eq!(deleted.data, Value::Null);

        let failed: Result<MutationOutcome<Value>> = client
            .mutate(&Mutation::delete("videos", 9).with_options(options), &notifier)
            .await;
        assert!(failed.is_err());

        let toasts = notifier.toasts();
        assert_eq!(toasts[0], Toast::success("Video removed"));
        assert_eq!(toasts[1].level, ToastLevel::Error);
        assert_eq!(toasts[1].message, "Could not remove video");
        assert_eq!(transport.requests()[0].method, Method::Delete);
        assert_eq!(transport.requests()[0].url, "https://h.io/api/videos/8");
    }

    #[tokio::test]
    async fn test_invalid_payload_never_sent() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let notifier = RecordingNotifier::default();
        let draft = ContactDraft {
            name: "Sari".into(),
            email: "sari".into(),
            subject: None,
            message: "Hello".into(),
        };

        let err = client
            .mutate::<Value>(
                &Mutation::create("contacts", &draft).unwrap().validated(&draft),
                &notifier,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(ref fields) if fields.len() == 1));
        assert_eq!(transport.request_count(), 0);
        assert_eq!(notifier.toasts(), vec![Toast::error("Invalid email address")]);
    }

    #[test]
    fn test_action_endpoint() {
        let mutation = Mutation::action("jobs", Method::Patch, "jobs/7/toggle-status");
        assert_eq!(mutation.method(), Method::Patch);
        assert_eq!(mutation.endpoint().path(), "jobs/7/toggle-status");
        assert_eq!(mutation.resource(), "jobs");
    }

    #[tokio::test]
    async fn test_item_id_is_one_segment() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let notifier = RecordingNotifier::default();

        let _: MutationOutcome<Value> = client
            .mutate(&Mutation::delete("articles", "a/b?c"), &notifier)
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].url, "https://h.io/api/articles/a%2Fb%3Fc");
    }
}
