//! # Endpoints and the API base URL
//!
//! The configured base URL may or may not already end in `/api`
//! (`https://host`, `https://host/`, `https://host/api`, `https://host/api/`).
//! [`ApiBase`] strips that ambiguity once, so every request resolves to
//! `<root>/api/<path>`.
//!
//! An [`Endpoint`] is a path relative to the API plus query parameters. Plain
//! strings convert into parameterless endpoints; [`Endpoint::from_query`]
//! flattens any serializable object into parameters. Ids and slugs go through
//! [`Endpoint::segment`], which escapes them as one path segment each.

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Normalized API base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiBase {
    root: String,
}

impl ApiBase {
    pub fn new(raw: &str) -> Result<Self> {
        let mut root = raw.trim().trim_end_matches('/');
        if let Some(stripped) = root.strip_suffix("/api") {
            root = stripped.trim_end_matches('/');
        }
        Url::parse(root).map_err(|e| ApiError::InvalidConfig(format!("api url {raw:?}: {e}")))?;
        Ok(Self {
            root: root.to_string(),
        })
    }

    /// Scheme and host (plus any path prefix), without the `/api` segment.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Absolute URL for `endpoint`.
    pub fn url(&self, endpoint: &Endpoint) -> Result<String> {
        let mut url = Url::parse(&format!("{}/api/{}", self.root, endpoint.path))
            .map_err(|e| ApiError::InvalidInput(format!("endpoint {:?}: {e}", endpoint.path)))?;
        if !endpoint.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidInput(format!("api url {} has no path", self.root)))?
                .pop_if_empty()
                .extend(&endpoint.segments);
        }
        if !endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&endpoint.query);
        }
        Ok(url.to_string())
    }
}

/// A path under the API root plus query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: String,
    /// Escaped when the URL is built.
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim().trim_start_matches('/');
        let path = path.strip_prefix("api/").unwrap_or(path);
        Self {
            path: path.to_string(),
            segments: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Append one path segment. `/`, `?` and `#` in `part` are escaped, so
    /// a slug can never reach a different route.
    pub fn segment(mut self, part: impl ToString) -> Self {
        self.segments.push(part.to_string());
        self
    }

    /// Flatten a serializable object into query parameters: nulls are
    /// dropped, arrays repeat the parameter, nested objects are sent as JSON.
    pub fn from_query<Q: Serialize>(path: impl AsRef<str>, query: &Q) -> Result<Self> {
        let mut endpoint = Self::new(path);
        match serde_json::to_value(query)? {
            Value::Object(map) => {
                for (name, value) in map {
                    endpoint.push_value(&name, value);
                }
            }
            Value::Null => {}
            other => {
                return Err(ApiError::InvalidInput(format!(
                    "query parameters must be an object, got {other}"
                )))
            }
        }
        Ok(endpoint)
    }

    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    fn push_value(&mut self, name: &str, value: Value) {
        match value {
            Value::Null => {}
            Value::String(s) => self.query.push((name.to_string(), s)),
            Value::Array(items) => {
                for item in items {
                    self.push_value(name, item);
                }
            }
            Value::Object(_) => self.query.push((name.to_string(), value.to_string())),
            scalar => self.query.push((name.to_string(), scalar.to_string())),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Endpoint {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
