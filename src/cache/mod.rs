//! Time-bound response cache keyed by request identity.
//!
//! Expiry is lazy: an entry is only removed when a read finds it too old.
//! There is no size bound, so keys must come from a small, fixed set
//! (page resources, admin listings).

mod fetcher;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::logger::lock;
use crate::runtime::Runtime;

pub use fetcher::{CachedFetcher, FetchOutcome, OFFLINE_NOTICE};

/// Default freshness window.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at_ms: u64,
}

pub struct ResponseCache<R: Runtime> {
    runtime: Arc<R>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<R: Runtime> ResponseCache<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self {
            runtime,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached data if it is no older than `max_age`.
    /// An older entry is removed.
    pub fn get(&self, key: &str, max_age: Duration) -> Option<Value> {
        let now = self.runtime.now_ms();
        let mut entries = lock(&self.entries);

        let entry = entries.get(key)?;
        if is_fresh(entry, now, max_age) {
            return Some(entry.data.clone());
        }

        debug!("Cache entry for {} expired", key);
        entries.remove(key);
        None
    }

    /// Stores `data` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, data: Value) {
        let entry = CacheEntry {
            data,
            stored_at_ms: self.runtime.now_ms(),
        };
        lock(&self.entries).insert(key.to_string(), entry);
    }

    /// Returns whatever is stored under `key`, regardless of age.
    pub fn peek_stale(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).map(|e| e.data.clone())
    }

    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        lock(&self.entries).remove(key)
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Fresh lookup that keeps an expired entry for stale fallback.
    pub(crate) fn fresh(&self, key: &str, max_age: Duration) -> Option<Value> {
        let now = self.runtime.now_ms();
        lock(&self.entries)
            .get(key)
            .filter(|entry| is_fresh(entry, now, max_age))
            .map(|entry| entry.data.clone())
    }
}

fn is_fresh(entry: &CacheEntry, now_ms: u64, max_age: Duration) -> bool {
    u128::from(now_ms.saturating_sub(entry.stored_at_ms)) <= max_age.as_millis()
}
