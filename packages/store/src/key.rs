//! # Query keys
//!
//! A [`QueryKey`] identifies one cached read. Keys are ordered lists of string
//! parts: the first part names the resource (`"jobs"`), later parts scope the
//! entry (an id, or the filter state of a list view). A plain string converts
//! into a single-part key, arrays and vectors into multi-part keys.
//!
//! Invalidation works on prefixes: `["jobs"]` is a prefix of
//! `["jobs", "page=2"]` and of `["jobs", "42"]`, but not of `["job-categories"]`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a cached query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// The resource segment, if the key has any parts.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Append a scoping part, returning the extended key.
    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    /// True when every part of `prefix` matches the leading parts of `self`.
    ///
    /// An empty prefix matches every key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<&str> for QueryKey {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for QueryKey {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl<S: Into<String>> From<Vec<S>> for QueryKey {
    fn from(value: Vec<S>) -> Self {
        Self::new(value)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for QueryKey {
    fn from(value: [S; N]) -> Self {
        Self::new(value)
    }
}
