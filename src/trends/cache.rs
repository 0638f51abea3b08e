//! Signal Cache
//!
//! TTL cache in front of any [`ResourceSource`]. Only successful fetches are
//! cached, so a failing resource is retried on the next poll.

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::source::{RawSignal, ResourceError, ResourceSource};
use crate::config::Config;

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: f64,
}

/// Caching decorator over a resource source
#[derive(Clone)]
pub struct CachedSource {
    inner: Arc<dyn ResourceSource>,
    cache: Cache<String, Vec<RawSignal>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn ResourceSource>, max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self {
            inner,
            cache,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wrap `inner` when caching is enabled in `config`, otherwise return it unchanged
    pub fn wrap(inner: Arc<dyn ResourceSource>, config: &Config) -> Arc<dyn ResourceSource> {
        if config.cache_enabled {
            Arc::new(Self::new(
                inner,
                config.cache_max_entries,
                Duration::from_secs(config.cache_ttl_secs),
            ))
        } else {
            inner
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            entries: self.cache.entry_count(),
            hits,
            misses,
            hit_rate_percent: if total > 0 {
                (hits as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        }
    }

    pub async fn invalidate(&self, uri: &str) {
        self.cache.invalidate(uri).await;
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[async_trait]
impl ResourceSource for CachedSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<RawSignal>, ResourceError> {
        if let Some(signals) = self.cache.get(uri).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Signal cache HIT: {}", uri);
            return Ok(signals);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Signal cache MISS: {}", uri);

        let signals = self.inner.fetch(uri).await?;
        self.cache.insert(uri.to_string(), signals.clone()).await;
        Ok(signals)
    }

    fn name(&self) -> &str {
        "cached"
    }
}
