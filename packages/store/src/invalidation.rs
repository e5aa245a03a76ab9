//! Declarative map from a mutated resource to the cache-key prefixes it dirties.
//!
//! A mutation on `R` always invalidates keys under `[R]`. Extra prefixes are
//! registered per resource, e.g. a change to `articles` also dirties the
//! single-article views (`article`) and the admin listing (`admin-articles`).

use std::collections::HashMap;

use crate::key::QueryKey;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvalidationMap {
    related: HashMap<String, Vec<QueryKey>>,
}

impl InvalidationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map used by the admin client.
    pub fn admin_defaults() -> Self {
        Self::new().with("articles", ["article", "admin-articles"])
    }

    /// Register extra prefixes to invalidate when `resource` changes.
    pub fn with<I, K>(mut self, resource: &str, prefixes: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<QueryKey>,
    {
        let entry = self.related.entry(resource.to_string()).or_default();
        for prefix in prefixes {
            let prefix = prefix.into();
            if !entry.contains(&prefix) {
                entry.push(prefix);
            }
        }
        self
    }

    /// Every prefix to invalidate after a mutation on `resource`, starting
    /// with the resource itself.
    pub fn targets(&self, resource: &str) -> Vec<QueryKey> {
        let own = QueryKey::from(resource);
        let mut targets = vec![own.clone()];
        if let Some(related) = self.related.get(resource) {
            targets.extend(related.iter().filter(|k| **k != own).cloned());
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_include_resource_itself() {
        let map = InvalidationMap::new();
        assert_eq!(map.targets("jobs"), vec![QueryKey::from("jobs")]);
    }

    #[test]
    fn test_admin_defaults_widen_articles() {
        let map = InvalidationMap::admin_defaults();
        assert_eq!(
            map.targets("articles"),
            vec![
                QueryKey::from("articles"),
                QueryKey::from("article"),
                QueryKey::from("admin-articles"),
            ]
        );
        assert_eq!(map.targets("videos"), vec![QueryKey::from("videos")]);
    }

    #[test]
    fn test_with_deduplicates() {
        let map = InvalidationMap::new()
            .with("companies", ["jobs"])
            .with("companies", ["jobs", "companies"]);
        assert_eq!(
            map.targets("companies"),
            vec![QueryKey::from("companies"), QueryKey::from("jobs")]
        );
    }
}
