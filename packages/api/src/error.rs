//! Errors returned by every client operation.

use serde_json::Value;
use store::FieldError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure of a request, a decode, an upload or a local precondition.
///
/// `Clone` so hook state can keep the last error next to the last data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("request failed with status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("chunk {index} of {total} failed: {source}")]
    Upload {
        index: usize,
        total: usize,
        source: Box<ApiError>,
    },
    #[error("upload finished without a file descriptor")]
    IncompleteUpload,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("validation failed for {}", fields(.0))]
    Validation(Vec<FieldError>),
    #[error("settings error: {0}")]
    Settings(String),
}

fn fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    /// Build a status error from a non-2xx response body, keeping the API's
    /// `message` (or `detail`, or `error`) when it sent one.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body).ok().and_then(|v| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|field| v.get(field).and_then(Value::as_str).map(str::to_string))
        });
        ApiError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Upload { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Text suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Status { status: 401, .. } => "Your session has expired, please sign in again".into(),
            ApiError::Status { status: 403, .. } => "You are not allowed to do that".into(),
            ApiError::Status { status: 404, .. } => "Not found".into(),
            ApiError::Status { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                "Something went wrong, please try again".into()
            }
            ApiError::Upload { source, .. } => format!("Upload failed: {}", source.user_message()),
            ApiError::Validation(errors) => errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Please check the form".into()),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(e: config::ConfigError) -> Self {
        ApiError::Settings(e.to_string())
    }
}
