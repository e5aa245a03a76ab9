//! Per-key in-flight lock: concurrent reads of one key wait for the first
//! fetch instead of each hitting the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use store::QueryKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct Coalescer {
    inflight: Mutex<HashMap<QueryKey, Arc<AsyncMutex<()>>>>,
}

/// Held while one reader fetches a key. Dropping it lets the next one in.
pub(crate) struct InflightGuard<'a> {
    owner: &'a Coalescer,
    key: QueryKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Coalescer {
    pub(crate) async fn acquire(&self, key: &QueryKey) -> InflightGuard<'_> {
        let lock = Arc::clone(
            self.map()
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        );
        InflightGuard {
            owner: self,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, Arc<AsyncMutex<()>>>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self.owner.map();
        // Only the map still holds the lock: nobody is waiting for this key.
        if map.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(&self.key);
        }
    }
}
