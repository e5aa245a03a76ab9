use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{self, FieldError, Validate};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    #[default]
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// A message submitted through the public contact form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

impl Validate for ContactDraft {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validate::required(&mut errors, "name", &self.name);
        if self.email.trim().is_empty() {
            validate::required(&mut errors, "email", &self.email);
        } else {
            validate::email(&mut errors, "email", &self.email);
        }
        validate::required(&mut errors, "message", &self.message);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = User {
            id: 1,
            email: "admin@jobdesk.id".into(),
            name: None,
            role: UserRole::Admin,
            created_at: None,
        };
        assert_eq!(user.display_name(), "admin@jobdesk.id");
    }

    #[test]
    fn test_contact_draft_validation() {
        let draft = ContactDraft {
            name: "Budi".into(),
            email: "budi@".into(),
            subject: None,
            message: " ".into(),
        };
        let errors = draft.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Invalid email address");
        assert_eq!(errors[1].field, "message");
    }
}
