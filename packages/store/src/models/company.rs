use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{self, FieldError, Validate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub province_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub province_id: Option<i64>,
}

impl Validate for CompanyDraft {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validate::required(&mut errors, "name", &self.name);
        if let Some(email) = non_blank(&self.email) {
            validate::email(&mut errors, "email", email);
        }
        if let Some(website) = non_blank(&self.website) {
            validate::url(&mut errors, "website", website);
        }
        errors
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Shared shape of `job-categories` and `article-categories`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_draft_validation() {
        let draft = CompanyDraft {
            name: "Acme".into(),
            email: Some("careers@acme.io".into()),
            website: Some("  ".into()),
            ..Default::default()
        };
        assert!(draft.is_valid());

        let bad = CompanyDraft {
            name: String::new(),
            website: Some("acme.io".into()),
            ..Default::default()
        };
        let fields: Vec<String> = bad.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "website"]);
    }
}
