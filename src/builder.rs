//! Application Context Builder
//!
//! Wires the collaborators once at process start. Anything not supplied falls
//! back to the configured default.
//!
//! # Example: Using Default Collaborators
//!
//! ```rust,no_run
//! use content_feeder::AppContextBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContextBuilder::new().build().await?;
//!     let catalog = ctx.catalog_service().get_catalog().await;
//!     Ok(())
//! }
//! ```
//!
//! # Example: In-Process Backends
//!
//! ```rust,ignore
//! use content_feeder::{AppContextBuilder, DashMapCache, LocalJobQueue};
//! use std::sync::Arc;
//!
//! let ctx = AppContextBuilder::new()
//!     .with_backend(Arc::new(DashMapCache::new()))
//!     .with_queue(Arc::new(LocalJobQueue::new()))
//!     .with_origin(Arc::new(MyOrigin::new()))
//!     .build()
//!     .await?;
//! ```

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::AppContext;
use crate::config::FeederConfig;
use crate::origin::HttpOriginClient;
use crate::traits::{CacheBackend, JobQueue, OriginClient};

/// Builder for [`AppContext`]
///
/// # Default Behavior
///
/// - **Backend**: `RedisCache` on `config.redis_url` (feature `redis`), else `DashMapCache`
/// - **Queue**: `RedisJobQueue` on `config.redis_url` (feature `redis`), else `LocalJobQueue`
/// - **Origin**: `HttpOriginClient` on `config.origin_base_url`
#[derive(Default)]
pub struct AppContextBuilder {
    config: Option<FeederConfig>,
    backend: Option<Arc<dyn CacheBackend>>,
    origin: Option<Arc<dyn OriginClient>>,
    queue: Option<Arc<dyn JobQueue>>,
}

impl AppContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of `FeederConfig::from_env()`
    #[must_use]
    pub fn with_config(mut self, config: FeederConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Arc<dyn OriginClient>) -> Self {
        self.origin = Some(origin);
        self
    }

    #[must_use]
    pub fn with_queue(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Build the context, connecting default collaborators as needed
    ///
    /// # Errors
    ///
    /// Returns an error if the environment does not parse or a default
    /// collaborator cannot connect.
    pub async fn build(self) -> Result<AppContext> {
        let config = match self.config {
            Some(config) => config,
            None => FeederConfig::from_env()?,
        };

        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&config).await?,
        };
        let queue = match self.queue {
            Some(queue) => queue,
            None => default_queue(&config).await?,
        };
        let origin: Arc<dyn OriginClient> = match self.origin {
            Some(origin) => origin,
            None => Arc::new(HttpOriginClient::from_config(&config)?),
        };

        info!(
            backend = backend.name(),
            queue = queue.name(),
            worker_queue = %config.worker_queue,
            codec = ?config.codec,
            "Content feeder context initialized"
        );

        Ok(AppContext::assemble(config, backend, origin, queue))
    }
}

#[cfg(feature = "redis")]
async fn default_backend(config: &FeederConfig) -> Result<Arc<dyn CacheBackend>> {
    Ok(Arc::new(crate::backends::RedisCache::with_url(&config.redis_url).await?))
}

#[cfg(not(feature = "redis"))]
async fn default_backend(_: &FeederConfig) -> Result<Arc<dyn CacheBackend>> {
    Ok(Arc::new(crate::backends::DashMapCache::new()))
}

#[cfg(feature = "redis")]
async fn default_queue(config: &FeederConfig) -> Result<Arc<dyn JobQueue>> {
    Ok(Arc::new(crate::jobs::RedisJobQueue::with_url(&config.redis_url).await?))
}

#[cfg(not(feature = "redis"))]
async fn default_queue(_: &FeederConfig) -> Result<Arc<dyn JobQueue>> {
    Ok(Arc::new(crate::jobs::LocalJobQueue::new()))
}
