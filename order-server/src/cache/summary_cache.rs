//! Cache-aside wrapper
//!
//! Reads: cache hit → decoded value; miss, read error or undecodable entry →
//! loader, then best-effort write-back. Loader errors are returned and never
//! cached. Writes: keys are deleted, failures only logged.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::CacheError;
use super::keys::CacheKey;
use super::store::CacheStore;

#[derive(Clone)]
pub struct SummaryCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SummaryCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw, self.ttl).await
    }

    pub async fn get_or_load<T, E, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.to_string();

        match self.read::<T>(&key).await {
            Ok(Some(value)) => {
                tracing::trace!(key = %key, "Cache hit");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache read failed, loading from source"),
        }

        let value = loader().await?;

        if let Err(e) = self.write(&key, &value).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
        Ok(value)
    }

    pub async fn invalidate(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        match self.store.delete(keys).await {
            Ok(removed) => tracing::debug!(requested = keys.len(), removed, "Cache invalidated"),
            Err(e) => tracing::warn!(error = %e, "Cache invalidation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::CacheResource;
    use crate::cache::store::MemoryCacheStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose every call fails
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    fn key() -> CacheKey {
        CacheKey::new(1, None, CacheResource::Order(7))
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = SummaryCache::new(Arc::new(MemoryCacheStore::new()), Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<Vec<i64>, CacheError> = cache
                .get_or_load(&key(), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.invalidate(&[key().to_string()]).await;
        let _: Result<Vec<i64>, CacheError> = cache
            .get_or_load(&key(), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(vec![4])
            })
            .await;
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_broken_store_falls_back_to_source() {
        let cache = SummaryCache::new(Arc::new(BrokenStore), Duration::from_secs(60));
        let value: Result<String, CacheError> = cache
            .get_or_load(&key(), || async { Ok("fresh".to_string()) })
            .await;
        assert_eq!(value.unwrap(), "fresh");
        cache.invalidate(&[key().to_string()]).await;
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = Arc::new(MemoryCacheStore::new());
        store
            .set(&key().to_string(), "not json".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = SummaryCache::new(store, Duration::from_secs(60));

        let value: Result<i64, CacheError> = cache.get_or_load(&key(), || async { Ok(42) }).await;
        assert_eq!(value.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = SummaryCache::new(store.clone(), Duration::from_secs(60));

        let value: Result<i64, String> = cache
            .get_or_load(&key(), || async { Err("db down".to_string()) })
            .await;
        assert!(value.is_err());
        assert!(store.is_empty());
    }
}
