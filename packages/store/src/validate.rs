//! Client-side form validation run before a create/update request is sent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single rejected field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Implemented by every create/update payload.
pub trait Validate {
    /// All problems found; empty when the payload may be submitted.
    fn validate(&self) -> Vec<FieldError>;

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

pub fn required(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "This field is required"));
    }
}

pub fn email(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if !is_email(value) {
        errors.push(FieldError::new(field, "Invalid email address"));
    }
}

pub fn url(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    let value = value.trim();
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    if rest.map_or(true, str::is_empty) {
        errors.push(FieldError::new(field, "Must be an http(s) URL"));
    }
}

pub fn non_negative(errors: &mut Vec<FieldError>, field: &str, value: Option<i64>) {
    if value.is_some_and(|v| v < 0) {
        errors.push(FieldError::new(field, "Must not be negative"));
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
