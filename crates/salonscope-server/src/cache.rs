//! In-memory keyed store with lazy freshness checks.
//!
//! Entries are replaced wholesale and never evicted. A stale entry stays in
//! the map, is ignored by [`TtlCache::get_fresh`], and is overwritten by the
//! next [`TtlCache::put`] for its key.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub data: V,
    pub timestamp: DateTime<Utc>,
}

/// `true` while `entry` is younger than `window` at `now`.
pub fn is_fresh<V>(entry: &CacheEntry<V>, window: Duration, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(entry.timestamp);
    chrono::Duration::from_std(window).map_or(true, |window| age < window)
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `key` regardless of age.
    pub async fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Entry for `key` only if it is younger than `window`.
    pub async fn get_fresh(&self, key: &str, window: Duration) -> Option<CacheEntry<V>> {
        self.get(key)
            .await
            .filter(|entry| is_fresh(entry, window, Utc::now()))
    }

    /// Stores `data` stamped with the current time, replacing any previous entry.
    pub async fn put(&self, key: impl Into<String>, data: V) -> CacheEntry<V> {
        self.put_at(key, data, Utc::now()).await
    }

    pub(crate) async fn put_at(
        &self,
        key: impl Into<String>,
        data: V,
        timestamp: DateTime<Utc>,
    ) -> CacheEntry<V> {
        let entry = CacheEntry { data, timestamp };
        self.entries
            .lock()
            .await
            .insert(key.into(), entry.clone());
        entry
    }

    pub async fn remove(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.lock().await.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    #[test]
    fn is_fresh_inside_and_outside_window() {
        let now = Utc::now();
        let entry = CacheEntry {
            data: (),
            timestamp: now - chrono::Duration::minutes(14),
        };
        assert!(is_fresh(&entry, WINDOW, now));

        let stale = CacheEntry {
            data: (),
            timestamp: now - chrono::Duration::minutes(15),
        };
        assert!(!is_fresh(&stale, WINDOW, now));
    }

    #[test]
    fn zero_window_is_never_fresh() {
        let now = Utc::now();
        let entry = CacheEntry {
            data: (),
            timestamp: now,
        };
        assert!(!is_fresh(&entry, Duration::ZERO, now));
    }

    #[tokio::test]
    async fn put_then_get_fresh_returns_same_data() {
        let cache = TtlCache::new();
        let stored = cache.put("Shibuya_massage", vec![1, 2, 3]).await;
        let fetched = cache
            .get_fresh("Shibuya_massage", WINDOW)
            .await
            .expect("fresh entry");
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn stale_entry_is_kept_but_not_served_fresh() {
        let cache = TtlCache::new();
        let old = Utc::now() - chrono::Duration::minutes(20);
        cache.put_at("Shibuya_massage", "old", old).await;

        assert!(cache.get_fresh("Shibuya_massage", WINDOW).await.is_none());
        let raw = cache.get("Shibuya_massage").await.expect("entry retained");
        assert_eq!(raw.data, "old");
    }

    #[tokio::test]
    async fn put_overwrites_wholesale() {
        let cache = TtlCache::new();
        cache.put("task-1", vec!["a"]).await;
        cache.put("task-1", vec!["b", "c"]).await;
        assert_eq!(cache.get("task-1").await.map(|e| e.data), Some(vec!["b", "c"]));
    }

    #[tokio::test]
    async fn remove_drops_entry() {
        let cache = TtlCache::new();
        cache.put("task-1", 1).await;
        assert!(cache.remove("task-1").await.is_some());
        assert!(cache.get("task-1").await.is_none());
    }
}
