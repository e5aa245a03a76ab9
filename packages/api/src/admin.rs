//! Typed operations for the admin screens, built on [`query`](ApiClient::query)
//! and [`mutate`](ApiClient::mutate).

use serde::de::DeserializeOwned;
use serde_json::Value;
use store::models::{Contact, ContactDraft, Job, JobFilter, Page};
use store::QueryKey;

use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::mutation::{Mutation, MutationOptions};
use crate::notify::Notifier;
use crate::query::QuerySpec;
use crate::resources::Resource;
use crate::transport::{Method, RequestBody, Transport};

impl Resource {
    /// Read spec for the whole collection.
    pub fn list_spec(&self) -> QuerySpec {
        QuerySpec::new(self.key(), self.endpoint())
    }

    /// Read spec for one record.
    pub fn item_spec(&self, id: impl std::fmt::Display + Clone) -> QuerySpec {
        QuerySpec::new(self.item_key(id.clone()), self.item_endpoint(id))
    }
}

/// Spec for the job list under `filter`; every filter gets its own cache entry.
pub fn jobs_spec(filter: &JobFilter) -> QuerySpec {
    QuerySpec::new(
        filter.query_key(),
        Endpoint::new("jobs").with_params(filter.to_pairs()),
    )
}

/// Jobs of one company, cached under `jobs` so job mutations refresh it.
pub fn company_jobs_spec(company_id: i64) -> QuerySpec {
    QuerySpec::new(
        QueryKey::from("jobs").with(format!("company={company_id}")),
        Endpoint::new("companies").segment(company_id).segment("jobs"),
    )
}

impl<T: Transport> ApiClient<T> {
    /// Cached read of a whole collection.
    pub async fn list<R: DeserializeOwned>(&self, resource: Resource, token: Option<&str>) -> Result<R> {
        self.query(&resource.list_spec().with_optional_token(token.map(str::to_string)))
            .await
    }

    pub async fn list_jobs(&self, filter: &JobFilter, token: Option<&str>) -> Result<Page<Job>> {
        self.query(&jobs_spec(filter).with_optional_token(token.map(str::to_string)))
            .await
    }

    pub async fn job(&self, id: i64, token: Option<&str>) -> Result<Job> {
        self.query(&Resource::Jobs.item_spec(id).with_optional_token(token.map(str::to_string)))
            .await
    }

    pub async fn company_jobs(&self, company_id: i64, token: Option<&str>) -> Result<Vec<Job>> {
        self.query(&company_jobs_spec(company_id).with_optional_token(token.map(str::to_string)))
            .await
    }

    /// Flip a job between active and draft.
    pub async fn toggle_job_status(&self, id: i64, token: &str, notifier: &impl Notifier) -> Result<Job> {
        let endpoint = Resource::Jobs.item_endpoint(id).segment("toggle-status");
        let mutation = Mutation::action("jobs", Method::Patch, endpoint)
            .with_token(token)
            .with_options(MutationOptions::new().success_message("Job status updated"));
        Ok(self.mutate(&mutation, notifier).await?.data)
    }

    /// Count a public page view. Anonymous and never cached.
    pub async fn record_view(&self, resource: Resource, id: impl std::fmt::Display) -> Result<()> {
        let endpoint = resource.item_endpoint(id).segment("view");
        let _: Value = self
            .request_json(Method::Post, &endpoint, None, RequestBody::Empty)
            .await?;
        Ok(())
    }

    /// Send the public contact form after validating it.
    pub async fn submit_contact(&self, draft: &ContactDraft, notifier: &impl Notifier) -> Result<Contact> {
        let mutation = Mutation::create(Resource::Contacts.as_str(), draft)?
            .validated(draft)
            .with_options(
                MutationOptions::new().success_message("Thank you, your message has been sent"),
            );
        Ok(self.mutate(&mutation, notifier).await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ApiBase;
    use crate::mock::{MockTransport, RecordingNotifier};
    use crate::notify::Toast;
    use serde_json::json;
    use store::models::JobStatus;

    fn client(transport: &MockTransport) -> ApiClient<MockTransport> {
        ApiClient::new(transport.clone(), ApiBase::new("https://h.io/").unwrap())
    }

    #[tokio::test]
    async fn test_list_jobs_uses_filter_in_url_and_key() {
        let transport = MockTransport::new();
        transport.respond_json(
            200,
            json!({ "rows": [{ "id": 1, "title": "Rust Engineer", "status": "active" }], "count": 1 }),
        );
        let client = client(&transport);
        let filter = JobFilter {
            status: Some(JobStatus::Active),
            page: Some(2),
            ..JobFilter::default()
        };

        let page = client.list_jobs(&filter, Some("t")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].status, JobStatus::Active);
        assert_eq!(transport.requests()[0].url, "https://h.io/api/jobs?status=active&page=2");
        assert!(client
            .cache()
            .get(&QueryKey::from(["jobs", "status=active", "page=2"]))
            .is_some());
    }

    #[tokio::test]
    async fn test_toggle_status_refreshes_job_views() {
        let transport = MockTransport::new();
        transport
            .respond_json(200, json!([{ "id": 7, "title": "Designer", "status": "active" }]))
            .respond_json(200, json!({ "id": 7, "title": "Designer", "status": "draft" }));
        let client = client(&transport);
        let notifier = RecordingNotifier::default();

        let jobs = client.company_jobs(3, None).await.unwrap();
        assert_eq!(jobs.len(), 1);
        let key = company_jobs_spec(3).key;
        assert!(!client.cache().is_stale(&key));

        let job = client.toggle_job_status(7, "t", &notifier).await.unwrap();
        assert_eq!(job.status, JobStatus::Draft);
        assert!(client.cache().is_stale(&key));

        let request = &transport.requests()[1];
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.url, "https://h.io/api/jobs/7/toggle-status");
        assert_eq!(notifier.toasts(), vec![Toast::success("Job status updated")]);
    }

    #[tokio::test]
    async fn test_record_view_is_anonymous() {
        let transport = MockTransport::new();
        transport.respond_empty(204);
        let client = client(&transport);

        client.record_view(Resource::Articles, "cv-tips").await.unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://h.io/api/articles/cv-tips/view");
        assert!(request.header("Authorization").is_none());
        assert!(client.cache().is_empty());
    }

    #[tokio::test]
    async fn test_slugs_stay_inside_their_route() {
        let transport = MockTransport::new();
        transport.respond_empty(204).respond_json(200, json!({ "id": 4 }));
        let client = client(&transport);

        client.record_view(Resource::Articles, "c#-tips").await.unwrap();
        let _: Value = client.query(&Resource::Articles.item_spec("what?now")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://h.io/api/articles/c%23-tips/view");
        assert_eq!(requests[1].url, "https://h.io/api/articles/what%3Fnow");
        assert!(client
            .cache()
            .get(&QueryKey::from(["articles", "what?now"]))
            .is_some());
    }

    #[tokio::test]
    async fn test_submit_contact() {
        let transport = MockTransport::new();
        transport.respond_json(
            201,
            json!({ "id": 11, "name": "Sari", "email": "sari@mail.id", "message": "Halo" }),
        );
        let client = client(&transport);
        let notifier = RecordingNotifier::default();
        let draft = ContactDraft {
            name: "Sari".into(),
            email: "sari@mail.id".into(),
            subject: None,
            message: "Halo".into(),
        };

        let contact = client.submit_contact(&draft, &notifier).await.unwrap();
        assert_eq!(contact.id, 11);
        assert!(!contact.is_read);
        assert_eq!(transport.requests()[0].url, "https://h.io/api/contacts");
    }

    #[tokio::test]
    async fn test_generic_list_and_item() {
        let transport = MockTransport::new();
        transport
            .respond_json(200, json!([{ "id": 1, "name": "Aceh" }]))
            .respond_json(200, json!({ "id": 2, "title": "Ops", "status": "filled" }));
        let client = client(&transport);

        let provinces: Vec<Value> = client.list(Resource::Provinces, None).await.unwrap();
        assert_eq!(provinces.len(), 1);
        let job = client.job(2, None).await.unwrap();
        assert_eq!(job.status, JobStatus::Filled);
        assert!(client.cache().get(&QueryKey::from(["jobs", "2"])).is_some());
        assert_eq!(transport.requests()[1].url, "https://h.io/api/jobs/2");
    }
}
