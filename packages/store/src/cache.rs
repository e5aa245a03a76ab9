//! # Query cache: shared, injectable store of fetched data
//!
//! [`QueryCache`] maps a [`QueryKey`] to the last JSON payload fetched for it,
//! the time it was written and an "invalidated" flag. Clones share the same
//! entries, so one cache is built per client (or per test) and handed to every
//! reader and writer.
//!
//! ## Lifetimes
//!
//! | Window | Default | Effect |
//! |--------|---------|--------|
//! | [`CachePolicy::stale_time`] | 5 min | Younger, non-invalidated entries are *fresh* and served without I/O. |
//! | [`CachePolicy::gc_time`] | 10 min | Older entries are evicted when read, on every write, or by [`purge_expired`](QueryCache::purge_expired). |
//!
//! ## Subscribers
//!
//! Every write, invalidation and eviction is published as a [`CacheEvent`] on a
//! broadcast channel. Hook instances subscribe to refetch when their key goes
//! stale.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::clock::{system_clock, Clock};
use crate::invalidation::InvalidationMap;
use crate::key::QueryKey;

const EVENT_CAPACITY: usize = 64;

/// Freshness and retention windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub gc_time: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            gc_time: Duration::from_secs(10 * 60),
        }
    }
}

/// Snapshot of one cache entry.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedQuery {
    pub data: Value,
    /// Milliseconds since the epoch (per the cache clock) of the last write.
    pub updated_at: u64,
    pub is_stale: bool,
}

/// Change notification published to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
    Evicted(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Updated(key) | CacheEvent::Invalidated(key) | CacheEvent::Evicted(key) => {
                key
            }
        }
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    data: Value,
    updated_at: u64,
    invalidated: bool,
}

/// In-memory query cache shared by every reader and writer of a client.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, CacheEntry>>>,
    policy: CachePolicy,
    clock: Clock,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_policy(CachePolicy::default())
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("policy", &self.policy)
            .field("len", &self.len())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            policy,
            clock: system_clock(),
            events,
        }
    }

    /// Replace the clock. Meant for tests that need to advance time.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Receive every subsequent [`CacheEvent`].
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Look up an entry, evicting it first if it outlived the retention window.
    pub fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        let now = (self.clock)();
        let mut entries = self.entries();
        let entry = entries.get(key)?;
        if self.is_expired(entry, now) {
            entries.remove(key);
            drop(entries);
            tracing::debug!(%key, "evicted expired cache entry");
            self.publish(CacheEvent::Evicted(key.clone()));
            return None;
        }
        Some(CachedQuery {
            data: entry.data.clone(),
            updated_at: entry.updated_at,
            is_stale: self.entry_is_stale(entry, now),
        })
    }

    /// The cached payload, only when it is still fresh.
    pub fn fresh(&self, key: &QueryKey) -> Option<Value> {
        self.get(key).filter(|q| !q.is_stale).map(|q| q.data)
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.get(key).map(|q| q.is_stale).unwrap_or(true)
    }

    /// Store a payload and mark it fresh. Expired entries are swept first.
    pub fn set(&self, key: QueryKey, data: Value) {
        let now = (self.clock)();
        let evicted = {
            let mut entries = self.entries();
            let evicted = self.sweep(&mut entries, now);
            entries.insert(
                key.clone(),
                CacheEntry {
                    data,
                    updated_at: now,
                    invalidated: false,
                },
            );
            evicted
        };
        self.publish_evictions(evicted);
        self.publish(CacheEvent::Updated(key));
    }

    /// Mark a single entry stale. Returns whether the key was cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let found = match self.entries().get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        };
        if found {
            self.publish(CacheEvent::Invalidated(key.clone()));
        }
        found
    }

    /// Mark every entry whose key starts with `prefix` stale.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let touched: Vec<QueryKey> = {
            let mut entries = self.entries();
            entries
                .iter_mut()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, entry)| {
                    entry.invalidated = true;
                    key.clone()
                })
                .collect()
        };
        for key in &touched {
            self.publish(CacheEvent::Invalidated(key.clone()));
        }
        tracing::debug!(%prefix, count = touched.len(), "invalidated cache prefix");
        touched.len()
    }

    /// Invalidate everything a mutation of `resource` may have changed.
    pub fn invalidate_resource(&self, map: &InvalidationMap, resource: &str) -> usize {
        map.targets(resource)
            .iter()
            .map(|prefix| self.invalidate_prefix(prefix))
            .sum()
    }

    pub fn remove(&self, key: &QueryKey) -> Option<Value> {
        let removed = self.entries().remove(key).map(|e| e.data);
        if removed.is_some() {
            self.publish(CacheEvent::Evicted(key.clone()));
        }
        removed
    }

    /// Drop every entry older than the retention window.
    pub fn purge_expired(&self) -> usize {
        let now = (self.clock)();
        let evicted = self.sweep(&mut self.entries(), now);
        let count = evicted.len();
        self.publish_evictions(evicted);
        count
    }

    pub fn clear(&self) {
        let keys: Vec<QueryKey> = self.entries().drain().map(|(key, _)| key).collect();
        for key in keys {
            self.publish(CacheEvent::Evicted(key));
        }
    }

    /// Cached keys in sorted order.
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry_is_stale(&self, entry: &CacheEntry, now: u64) -> bool {
        entry.invalidated || age(entry, now) >= self.policy.stale_time
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        age(entry, now) > self.policy.gc_time
    }

    fn sweep(&self, entries: &mut HashMap<QueryKey, CacheEntry>, now: u64) -> Vec<QueryKey> {
        let expired: Vec<QueryKey> = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "swept expired cache entries");
        }
        expired
    }

    fn publish_evictions(&self, keys: Vec<QueryKey>) {
        for key in keys {
            self.publish(CacheEvent::Evicted(key));
        }
    }

    fn publish(&self, event: CacheEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

fn age(entry: &CacheEntry, now: u64) -> Duration {
    Duration::from_millis(now.saturating_sub(entry.updated_at))
}
