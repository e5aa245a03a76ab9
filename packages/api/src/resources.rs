//! REST collections the admin panel consumes.

use std::fmt;
use std::str::FromStr;

use store::QueryKey;

use crate::endpoint::Endpoint;
use crate::error::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Jobs,
    Companies,
    Authors,
    Articles,
    ArticleCategories,
    JobCategories,
    Scholarships,
    Videos,
    Users,
    Contacts,
    Provinces,
    Upload,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Resource::Jobs,
        Resource::Companies,
        Resource::Authors,
        Resource::Articles,
        Resource::ArticleCategories,
        Resource::JobCategories,
        Resource::Scholarships,
        Resource::Videos,
        Resource::Users,
        Resource::Contacts,
        Resource::Provinces,
        Resource::Upload,
    ];

    /// URL segment, also the cache-key prefix of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Jobs => "jobs",
            Resource::Companies => "companies",
            Resource::Authors => "authors",
            Resource::Articles => "articles",
            Resource::ArticleCategories => "article-categories",
            Resource::JobCategories => "job-categories",
            Resource::Scholarships => "scholarships",
            Resource::Videos => "videos",
            Resource::Users => "users",
            Resource::Contacts => "contacts",
            Resource::Provinces => "provinces",
            Resource::Upload => "upload",
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.as_str())
    }

    pub fn item_endpoint(&self, id: impl fmt::Display) -> Endpoint {
        self.endpoint().segment(id)
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::from(self.as_str())
    }

    pub fn item_key(&self, id: impl fmt::Display) -> QueryKey {
        self.key().with(id.to_string())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ApiError::InvalidInput(format!("unknown resource: {s}")))
    }
}
