use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use tteutgyeop_types::DateKey;

use crate::error::{CacheError, EngineError};

/// Daily values outlive the day by another day to cover client clock skew
/// around midnight.
pub const DAILY_TTL: Duration = Duration::from_secs(48 * 60 * 60);

const KEY_PREFIX: &str = "tteutgyeop";

pub fn answer_key(date_key: &DateKey) -> String {
    format!("{KEY_PREFIX}:answer:{date_key}")
}

pub fn rank_key(date_key: &DateKey, top_k: usize) -> String {
    format!("{KEY_PREFIX}:rank:{date_key}:{top_k}")
}

/// String key/value store with expiry.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;

    fn put(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Process-local [`Cache`]. Expired entries are dropped lazily on read.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CachedValue>>,
}

#[derive(Clone, Debug)]
struct CachedValue {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.value.clone()));
        match hit {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            CachedValue {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

/// Memoizes per-day values as JSON in a [`Cache`].
///
/// The backing cache is only an optimization: read and write failures are
/// logged and the value is rebuilt (and returned) anyway.
pub struct DailyCache<C> {
    backend: Arc<C>,
    ttl: Duration,
}

impl<C> Clone for DailyCache<C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            ttl: self.ttl,
        }
    }
}

impl<C: Cache> DailyCache<C> {
    pub fn new(backend: Arc<C>) -> Self {
        Self::with_ttl(backend, DAILY_TTL)
    }

    pub fn with_ttl(backend: Arc<C>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Cached value under `key`, treating any failure as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("cache read for {key} failed: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                let err = CacheError::Decode {
                    key: key.to_string(),
                    source,
                };
                warn!("{err}");
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(source) => {
                let err = CacheError::Encode {
                    key: key.to_string(),
                    source,
                };
                warn!("{err}");
                return;
            }
        };
        if let Err(err) = self.backend.put(key, raw, self.ttl).await {
            warn!("cache write for {key} failed: {err}");
        }
    }

    /// Return the cached value or build, store, and return a fresh one.
    ///
    /// Concurrent first calls may each build; the value is a pure function
    /// of the key, so the last write wins without changing the result.
    /// Build errors are returned and nothing is stored.
    pub async fn get_or_build<T, F, Fut>(&self, key: &str, build: F) -> Result<T, EngineError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        if let Some(value) = self.get(key).await {
            debug!("cache hit for {key}");
            return Ok(value);
        }
        debug!("cache miss for {key}");
        let value = build().await?;
        self.put(key, &value).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that fails every call.
    struct BrokenCache;

    impl Cache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    #[test]
    fn keys_are_namespaced_per_day() {
        let key = DateKey::parse("2025-03-01").unwrap();
        assert_eq!(answer_key(&key), "tteutgyeop:answer:2025-03-01");
        assert_eq!(rank_key(&key, 3000), "tteutgyeop:rank:2025-03-01:3000");
    }

    #[tokio::test]
    async fn builds_once_then_serves_from_cache() {
        let cache = DailyCache::new(Arc::new(MemoryCache::new()));
        let builds = AtomicUsize::new(0);
        for _ in 0..3 {
            let value: Vec<u32> = cache
                .get_or_build("k", || async {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn build_errors_are_not_cached() {
        let backend = Arc::new(MemoryCache::new());
        let cache = DailyCache::new(Arc::clone(&backend));
        let result: Result<u32, _> = cache
            .get_or_build("k", || async {
                Err(EngineError::DataUnavailable("offline".into()))
            })
            .await;
        assert!(matches!(result, Err(EngineError::DataUnavailable(_))));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn backend_failures_fall_back_to_building() {
        let cache = DailyCache::new(Arc::new(BrokenCache));
        let value: String = cache
            .get_or_build("k", || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "fresh");
    }

    #[tokio::test]
    async fn corrupt_entries_are_rebuilt() {
        let backend = Arc::new(MemoryCache::new());
        backend
            .put("k", "{not json".into(), DAILY_TTL)
            .await
            .unwrap();
        let cache = DailyCache::new(Arc::clone(&backend));
        let value: u32 = cache.get_or_build("k", || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let backend = MemoryCache::new();
        backend
            .put("k", "1".into(), Duration::from_millis(0))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(backend.is_empty());
    }
}
