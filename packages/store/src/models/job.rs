//! Job postings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::company::{Category, Company, Province};
use crate::key::QueryKey;
use crate::validate::{self, FieldError, Validate};

/// Publication state of a job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Draft,
    Active,
    Expired,
    Filled,
    /// A status this client does not know yet.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
            JobStatus::Filled => "filled",
            JobStatus::Unknown => "unknown",
        }
    }

    /// The state the toggle endpoint moves a job into.
    pub fn toggled(&self) -> JobStatus {
        match self {
            JobStatus::Active => JobStatus::Draft,
            _ => JobStatus::Active,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub province_id: Option<i64>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub submission_email: Option<String>,
    #[serde(default)]
    pub submission_guidelines: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub province: Option<Province>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating or updating a job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub company_id: Option<i64>,
    pub category_id: Option<i64>,
    pub province_id: Option<i64>,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub submission_email: Option<String>,
    pub submission_guidelines: Option<String>,
}

impl Validate for JobDraft {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validate::required(&mut errors, "title", &self.title);
        validate::required(&mut errors, "description", &self.description);
        if self.company_id.is_none() {
            errors.push(FieldError::new("company_id", "Company is required"));
        }
        if self.category_id.is_none() {
            errors.push(FieldError::new("category_id", "Category is required"));
        }
        if let Some(email) = self.submission_email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate::email(&mut errors, "submission_email", email);
        }
        validate::non_negative(&mut errors, "salary_min", self.salary_min);
        validate::non_negative(&mut errors, "salary_max", self.salary_max);
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                errors.push(FieldError::new(
                    "salary_max",
                    "Maximum salary must not be lower than minimum salary",
                ));
            }
        }
        errors
    }
}

/// Filter state of the job list view.
///
/// Converts both to query-string parameters and to cache-key parts, so each
/// distinct filter gets its own cache entry under the `jobs` prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl JobFilter {
    /// Non-empty filter values as `(name, value)` pairs, in a stable order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                pairs.push((name.to_string(), value));
            }
        };
        push("search", self.search.as_ref().map(|s| s.trim().to_string()));
        push("status", self.status.map(|s| s.as_str().to_string()));
        push("category_id", self.category_id.map(|v| v.to_string()));
        push("province_id", self.province_id.map(|v| v.to_string()));
        push("company_id", self.company_id.map(|v| v.to_string()));
        push("page", self.page.map(|v| v.to_string()));
        push("limit", self.limit.map(|v| v.to_string()));
        pairs
    }

    /// Cache key for the list view under this filter, e.g. `[jobs, status=active, page=2]`.
    pub fn query_key(&self) -> QueryKey {
        self.to_pairs()
            .into_iter()
            .fold(QueryKey::from("jobs"), |key, (name, value)| {
                key.with(format!("{name}={value}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_decodes_with_missing_optionals() {
        let job: Job = serde_json::from_value(json!({
            "id": 3,
            "title": "Backend Engineer",
            "status": "active",
            "submission_email": "jobs@acme.test",
            "unknown_column": true
        }))
        .unwrap();
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.submission_email.as_deref(), Some("jobs@acme.test"));
        assert!(job.submission_guidelines.is_none());
        assert_eq!(job.views, 0);
    }

    #[test]
    fn test_unknown_status_keeps_the_page_readable() {
        let jobs: Vec<Job> = serde_json::from_value(json!([
            { "id": 1, "title": "Designer", "status": "active" },
            { "id": 2, "title": "Analyst", "status": "archived" }
        ]))
        .unwrap();
        assert_eq!(jobs[0].status, JobStatus::Active);
        assert_eq!(jobs[1].status, JobStatus::Unknown);
        assert_eq!(jobs[1].status.toggled(), JobStatus::Active);
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(JobStatus::Active.toggled(), JobStatus::Draft);
        assert_eq!(JobStatus::Draft.toggled(), JobStatus::Active);
        assert_eq!(JobStatus::Expired.toggled(), JobStatus::Active);
        assert_eq!(serde_json::to_value(JobStatus::Filled).unwrap(), json!("filled"));
    }

    #[test]
    fn test_draft_validation() {
        let draft = JobDraft {
            title: "  ".into(),
            description: "Build things".into(),
            company_id: Some(1),
            category_id: None,
            salary_min: Some(5000),
            salary_max: Some(1000),
            submission_email: Some("not-an-email".into()),
            ..Default::default()
        };
        let fields: Vec<String> = draft.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["title", "category_id", "submission_email", "salary_max"]
        );

        let ok = JobDraft {
            title: "Engineer".into(),
            description: "Build things".into(),
            company_id: Some(1),
            category_id: Some(2),
            submission_email: Some(String::new()),
            ..Default::default()
        };
        assert!(ok.validate().is_empty());
    }

    #[test]
    fn test_filter_pairs_and_key() {
        let filter = JobFilter {
            search: Some(" rust ".into()),
            status: Some(JobStatus::Active),
            page: Some(2),
            ..Default::default()
        };
        assert_eq!(
            filter.to_pairs(),
            vec![
                ("search".to_string(), "rust".to_string()),
                ("status".to_string(), "active".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(
            filter.query_key(),
            QueryKey::from(["jobs", "search=rust", "status=active", "page=2"])
        );
        assert_eq!(JobFilter::default().query_key(), QueryKey::from("jobs"));
    }
}
