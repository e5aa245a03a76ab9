//! `use_query`: a cached read bound to a component.
//!
//! The read restarts when the [`QuerySpec`] changes, when the session token
//! changes and whenever the cache reports the spec's key invalidated, e.g.
//! after a mutation of the same resource. A restart drops the in-flight
//! request.

use api::{ApiError, QuerySpec, QueryState};
use dioxus::prelude::*;
use serde::de::DeserializeOwned;
use store::{CacheEvent, QueryCache, QueryKey};
use tokio::sync::broadcast::error::RecvError;

use crate::provider::{use_api, use_session};

pub struct UseQuery<T: 'static> {
    state: Signal<QueryState<T>>,
    key: Signal<QueryKey>,
    revision: Signal<u64>,
    cache: CopyValue<QueryCache>,
}

impl<T> Clone for UseQuery<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for UseQuery<T> {}

impl<T: Clone + 'static> UseQuery<T> {
    pub fn state(&self) -> QueryState<T> {
        self.state.read().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.read().data.clone()
    }

    pub fn error(&self) -> Option<ApiError> {
        self.state.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading()
    }

    pub fn is_error(&self) -> bool {
        self.state.read().is_error()
    }

    pub fn is_success(&self) -> bool {
        self.state.read().is_success()
    }

    /// Read again from the network, ignoring freshness.
    pub fn refetch(&self) {
        let key = self.key.peek().clone();
        // A cached key restarts through the invalidation event.
        if !self.cache.peek().invalidate(&key) {
            let mut revision = self.revision;
            revision += 1;
        }
    }
}

/// Read `spec` through the shared cache. The session token is attached unless
/// the spec carries its own.
pub fn use_query<T>(spec: QuerySpec) -> UseQuery<T>
where
    T: DeserializeOwned + Clone + 'static,
{
    let api = use_api();
    let session = use_session();
    let mut state = use_signal(QueryState::<T>::default);
    let mut key = use_signal(|| spec.key.clone());
    let mut revision = use_signal(|| 0u64);
    let cache = use_hook(|| CopyValue::new(api.cache().clone()));

    let client = api.clone();
    let _ = use_resource(use_reactive((&spec,), move |(spec,)| {
        let _ = revision();
        let client = client.clone();
        if *key.peek() != spec.key {
            key.set(spec.key.clone());
        }
        let spec = match spec.token {
            Some(_) => spec,
            None => spec.with_optional_token(session().token),
        };
        async move {
            let previous = state.peek().data.clone();
            state.set(QueryState::loading(previous.clone()));
            let result = client.query::<T>(&spec).await;
            if let Err(e) = &result {
                tracing::warn!(key = %spec.key, error = %e, "query failed");
            }
            state.set(QueryState::settled(result, previous));
        }
    }));

    use_future(move || {
        let cache = api.cache().clone();
        async move {
            let mut events = cache.subscribe();
            loop {
                match events.recv().await {
                    Ok(CacheEvent::Invalidated(changed)) if changed == *key.peek() => revision += 1,
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => revision += 1,
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });

    UseQuery {
        state,
        key,
        revision,
        cache,
    }
}
