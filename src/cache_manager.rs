//! Cache Manager - Origin-to-Cache Bridge
//!
//! One manager per resource type. It knows how to repopulate its entry from
//! the origin (`set_cache`) and how to read it back (`get_cache`); it never
//! decides between the two. That is the content service's job.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::codecs::PayloadCodec;
use crate::error::CacheError;
use crate::resource::Resource;
use crate::traits::{CacheBackend, CacheCodec, OriginClient};

/// Cache Manager - `set_cache` / `get_cache` for one resource type
pub struct CacheManager<R: Resource> {
    origin: Arc<dyn OriginClient>,
    backend: Arc<dyn CacheBackend>,
    codec: PayloadCodec,
    /// Statistics
    hits: AtomicU64,
    misses: AtomicU64,
    invalid: AtomicU64,
    sets: AtomicU64,
    set_failures: AtomicU64,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> CacheManager<R> {
    pub fn new(origin: Arc<dyn OriginClient>, backend: Arc<dyn CacheBackend>, codec: PayloadCodec) -> Self {
        Self {
            origin,
            backend,
            codec,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalid: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            set_failures: AtomicU64::new(0),
            _resource: PhantomData,
        }
    }

    /// TTL written with every entry of this resource
    #[must_use]
    pub fn ttl(&self) -> Duration {
        R::KIND.ttl()
    }

    /// Fetch the current list from the origin and store it
    ///
    /// # Errors
    ///
    /// * `CacheError::Origin` - the origin failed; nothing was written
    /// * `CacheError::Backend` - the write failed
    pub async fn set_cache(&self, args: &R::Args) -> Result<(), CacheError> {
        let key = R::cache_key(args);

        let list = match R::fetch(self.origin.as_ref(), args).await {
            Ok(list) => list,
            Err(e) => {
                self.set_failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "[CacheManager] Origin fetch failed, cache left untouched");
                return Err(e.into());
            }
        };

        // Origin payloads always serialize; a failure here only skips the write.
        let payload = match self.codec.serialize(&list) {
            Ok(payload) => payload,
            Err(e) => {
                error!(key = %key, codec = self.codec.name(), error = %e, "[CacheManager] Failed to encode payload");
                return Ok(());
            }
        };

        if let Err(e) = self.backend.set_with_ttl(&key, &payload, self.ttl()).await {
            self.set_failures.fetch_add(1, Ordering::Relaxed);
            error!(key = %key, backend = self.backend.name(), error = %e, "[CacheManager] Failed to set cache");
            return Err(e);
        }

        self.sets.fetch_add(1, Ordering::Relaxed);
        debug!(
            key = %key,
            items = R::item_count(&list),
            ttl_secs = self.ttl().as_secs(),
            "[CacheManager] Cache refreshed from origin"
        );
        Ok(())
    }

    /// Load and decode the cached list
    ///
    /// # Errors
    ///
    /// * `CacheError::NotFound` - nothing cached (or expired)
    /// * `CacheError::InvalidCache` - the payload does not decode
    /// * `CacheError::Backend` - the read failed
    pub async fn get_cache(&self, args: &R::Args) -> Result<R::List, CacheError> {
        let key = R::cache_key(args);

        let payload = match self.backend.get(&key).await {
            Ok(payload) => payload,
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, error = %e, "[CacheManager] Failed to get cache");
                return Err(e);
            }
        };

        match self.codec.deserialize::<R::List>(&payload) {
            Ok(list) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(list)
            }
            Err(e) => {
                self.invalid.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, codec = self.codec.name(), error = %e, "[CacheManager] Cached payload does not decode");
                Err(CacheError::InvalidCache {
                    resource: R::KIND.name(),
                })
            }
        }
    }

    /// Drop the cached entry (ops and test tooling)
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store rejects the delete.
    pub async fn delete_cache(&self, args: &R::Args) -> Result<(), CacheError> {
        let key = R::cache_key(args);
        self.backend.remove(&key).await.inspect_err(|e| {
            error!(key = %key, error = %e, "[CacheManager] Failed to delete cache");
        })
    }

    /// Get cache manager statistics
    pub fn get_stats(&self) -> CacheManagerStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let invalid = self.invalid.load(Ordering::Relaxed);
        let reads = hits + misses + invalid;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if reads > 0 {
            (hits as f64 / reads as f64) * 100.0
        } else {
            0.0
        };

        CacheManagerStats {
            resource: R::KIND.name(),
            hits,
            misses,
            invalid,
            sets: self.sets.load(Ordering::Relaxed),
            set_failures: self.set_failures.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

/// Cache Manager statistics
#[derive(Debug, Clone)]
pub struct CacheManagerStats {
    pub resource: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub invalid: u64,
    pub sets: u64,
    pub set_failures: u64,
    pub hit_rate: f64,
}
