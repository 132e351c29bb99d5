//! Cache store seam
//!
//! The order pipeline only needs get / set-with-TTL / delete over string values.
//! [`MemoryCacheStore`] is the in-process implementation; a networked store
//! plugs in behind the same trait.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::CacheError;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Writes between two sweeps of expired entries
pub const SWEEP_INTERVAL: usize = 256;

/// In-process TTL store
///
/// Expired entries are dropped when read and by a sweep every
/// [`SWEEP_INTERVAL`] writes, so keys that are never read again do not pile up.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    writes: AtomicUsize,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until touched
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::trace!(removed, remaining = self.entries.len(), "Cache swept");
        }
        removed
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let written = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if written % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let removed = keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryCacheStore::new();
        store
            .set("a", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(store.contains_key("a"));

        let removed = store
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store = MemoryCacheStore::new();
        store.set("a", "1".into(), Duration::ZERO).await.unwrap();
        assert!(!store.contains_key("a"));
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unread_expired_entries_are_swept() {
        let store = MemoryCacheStore::new();
        for i in 0..1000 {
            store
                .set(&format!("k{i}"), "v".into(), Duration::ZERO)
                .await
                .unwrap();
        }
        assert!(store.len() <= SWEEP_INTERVAL, "len = {}", store.len());
    }

    #[tokio::test]
    async fn test_purge_keeps_live_entries() {
        let store = MemoryCacheStore::new();
        store
            .set("live", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();
        store.set("gone", "2".into(), Duration::ZERO).await.unwrap();

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains_key("live"));
    }
}
