//! `DashMap` Cache - In-Process Backend
//!
//! A concurrent in-memory store for single-instance deployments and tests.
//! Entries expire lazily on read; `cleanup_expired` sweeps the rest.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::CacheError;
use crate::traits::CacheBackend;

/// Cache entry with expiration tracking
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Concurrent in-memory `CacheBackend`
///
/// Expiry follows the tokio clock, so tests can drive it with
/// `tokio::time::pause` / `advance`.
pub struct DashMapCache {
    map: Arc<DashMap<String, CacheEntry>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    sets: Arc<AtomicU64>,
}

impl DashMapCache {
    pub fn new() -> Self {
        info!("Initializing DashMap Cache (concurrent HashMap)");

        Self {
            map: Arc::new(DashMap::new()),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            sets: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        self.map.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            debug!(count = removed, "[DashMap] Cleaned up expired entries");
        }
        removed
    }

    /// Time left before `key` expires, `None` if absent or expired
    #[must_use]
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.map
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.expires_at.saturating_duration_since(Instant::now()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// (hits, misses, sets)
    #[must_use]
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.sets.load(Ordering::Relaxed),
        )
    }
}

impl Default for DashMapCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for DashMapCache {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let Some(entry) = self.map.get(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Err(CacheError::not_found(key));
        };

        if entry.is_expired() {
            drop(entry); // Release read lock
            self.map.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Err(CacheError::not_found(key));
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(entry.value.clone())
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.map.insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        self.sets.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, ttl_secs = %ttl.as_secs(), "[DashMap] Cached key with TTL");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.map.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let test_key = "health_check_dashmap";
        let test_value = b"health_check_value";

        if self
            .set_with_ttl(test_key, test_value, Duration::from_secs(60))
            .await
            .is_err()
        {
            return false;
        }
        let healthy = matches!(self.get(test_key).await, Ok(retrieved) if retrieved == test_value);
        let _ = self.remove(test_key).await;
        healthy
    }

    fn name(&self) -> &'static str {
        "DashMap"
    }
}
