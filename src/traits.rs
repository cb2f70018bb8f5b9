//! Collaborator Traits
//!
//! The core only talks to its collaborators through these traits:
//!
//! - `CacheCodec`: pluggable payload serialization
//! - `CacheBackend`: key-value store with per-key TTL
//! - `OriginClient`: the slow upstream content source
//! - `JobQueue`: transport for refresh jobs
//!
//! # Example: Custom Backend
//!
//! ```rust,ignore
//! use content_feeder::{CacheBackend, CacheError, async_trait};
//! use std::time::Duration;
//!
//! struct MyStore {
//!     // Your implementation
//! }
//!
//! #[async_trait]
//! impl CacheBackend for MyStore {
//!     async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
//!         // Your implementation
//!     }
//!
//!     async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
//!         // Your implementation
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<(), CacheError> {
//!         // Your implementation
//!     }
//!
//!     async fn health_check(&self) -> bool {
//!         // Your implementation
//!     }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::error::{CacheError, JobError, OriginError};
use crate::jobs::Job;
use crate::models::{CatalogListResponse, PageListResponse, SubListResponse};

/// Trait for cache payload serialization/deserialization
///
/// Implementations must be `Send + Sync + Debug` so a codec can be shared by
/// every cache manager.
pub trait CacheCodec: Send + Sync + Debug {
    /// Serialize a value to bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented by this codec.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize bytes to a value
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid encoding of `T`.
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;

    /// Name used for logging
    fn name(&self) -> &'static str;
}

/// Key-value store holding serialized list responses
///
/// The store is shared between serving tasks and workers; implementations
/// provide their own synchronization. TTL is the only eviction mechanism the
/// feeder relies on.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the payload stored under `key`
    ///
    /// # Returns
    ///
    /// * `Ok(bytes)` - Payload found
    /// * `Err(CacheError::NotFound)` - Key not found or expired
    /// * `Err(CacheError::Backend)` - Store failure
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    /// Store `value` under `key`, replacing any previous payload
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Check if the store is operational
    async fn health_check(&self) -> bool;

    /// Name used for logging
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Upstream content source
///
/// Timeouts and circuit breaking are the client's own policy; the core only
/// sees an `OriginError`.
#[async_trait]
pub trait OriginClient: Send + Sync {
    /// Fetch the whole catalog
    async fn get_catalog(&self) -> Result<CatalogListResponse, OriginError>;

    /// Fetch the chapter list of one catalog entry
    async fn get_sub_list(&self, title_id: &str) -> Result<SubListResponse, OriginError>;

    /// Fetch the pages of one chapter
    async fn get_page_list(&self, title_id: &str, chapter: f32) -> Result<PageListResponse, OriginError>;
}

/// Transport for refresh jobs
///
/// Delivery is best effort; retries and persistence are up to the
/// implementation.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Push `job` onto `queue`
    async fn enqueue(&self, queue: &str, job: Job) -> Result<(), JobError>;

    /// Pop the next job from `queue`, waiting at most `wait`
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    async fn dequeue(&self, queue: &str, wait: Duration) -> Result<Option<Job>, JobError>;

    /// Name used for logging
    fn name(&self) -> &'static str {
        "unknown"
    }
}
