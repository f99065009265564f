//! In-memory TTL cache backed by `DashMap` for concurrent access, and a
//! [`PriceSource`] wrapper that memoizes fetched series in it.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::series::{DateRange, PriceSeries};
use crate::source::{FetchError, PriceSource};

/// A single cached value with its expiration time.
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with time-to-live expiration.
///
/// Values are stored as-is and cloned out on `get`. Expired entries are
/// lazily evicted on the next `get` call for that key.
pub struct MemoryCache<V = String> {
    store: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> MemoryCache<V> {
    /// Creates a new cache with the given time-to-live for entries.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.store.get(key)?;
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts or overwrites a cache entry. The entry expires after the configured TTL.
    pub fn set(&self, key: String, value: V) {
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        self.store.clear();
    }
}

/// Memoizes successful fetches by `(symbol, start, end)`. Failures are not cached.
pub struct CachedSource<S> {
    inner: S,
    cache: MemoryCache<PriceSeries>,
}

impl<S: PriceSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: MemoryCache::new(ttl),
        }
    }

    fn key(symbol: &str, range: &DateRange) -> String {
        format!("{}|{}|{}", symbol, range.start, range.end)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        let key = Self::key(symbol, &range);
        if let Some(series) = self.cache.get(&key) {
            tracing::debug!("cache hit: {}", key);
            return Ok(series);
        }

        let series = self.inner.fetch(symbol, range).await?;
        self.cache.set(key, series.clone());
        Ok(series)
    }
}
