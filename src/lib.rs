//! Content Feeder
//!
//! Serves a catalog, its chapter lists and chapter page lists from a slow
//! upstream with a cache-aside strategy:
//! - **Cache hit**: the cached list is post-processed and returned
//! - **Cache miss or corrupt entry**: the list is fetched from the origin for
//!   this request and a refresh job repopulates the cache in the background
//! - **Post-processing**: popular/latest catalog partition, canonical chapter
//!   numbers, advertising pages filtered out
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use content_feeder::{AppContext, PageListRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::from_env().await?;
//!
//!     match ctx.page_list_service().get_page_list(&PageListRequest::new("bleach", 650.0)).await {
//!         Ok(pages) => tracing::info!(count = pages.len(), "pages"),
//!         Err(e) => tracing::warn!(status = e.status_code(), error = %e, "request failed"),
//!     }
//!
//!     // Worker side: drain refresh jobs until shutdown
//!     let worker = ctx.worker_pool().start();
//!     tokio::signal::ctrl_c().await?;
//!     worker.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ContentService ─▶ CacheManager ─▶ CacheBackend (Redis / DashMap)
//!       │ miss
//!       ├─▶ OriginClient (HTTP)
//!       └─▶ RefreshDispatcher ─▶ JobQueue ─▶ WorkerPool ─▶ CacheManager::set_cache
//! ```

use std::sync::Arc;

use anyhow::Result;

pub mod backends;
pub mod builder;
pub mod cache_manager;
pub mod codecs;
pub mod config;
pub mod error;
pub mod jobs;
pub mod keys;
pub mod models;
pub mod origin;
pub mod resource;
pub mod service;
pub mod traits;
pub mod validation;

pub use backends::DashMapCache;
#[cfg(feature = "redis")]
pub use backends::RedisCache;
pub use builder::AppContextBuilder;
pub use cache_manager::{CacheManager, CacheManagerStats};
pub use codecs::{JsonCodec, PayloadCodec};
#[cfg(feature = "msgpack")]
pub use codecs::MsgPackCodec;
pub use config::{ContentRules, FeederConfig};
pub use error::{CacheError, JobError, OriginError, ServiceError, ValidationErrors};
#[cfg(feature = "redis")]
pub use jobs::RedisJobQueue;
pub use jobs::{Job, JobArgs, LocalJobQueue, RefreshDispatcher, WorkerHandle, WorkerPool};
pub use keys::{ResourceKind, canonical_ordering};
pub use models::{
    CatalogEntry, CatalogPartition, Chapter, Page, PageListRequest, SubListRequest,
};
pub use origin::HttpOriginClient;
pub use resource::{Catalog, PageList, Resource, SubList};
pub use service::{CatalogService, ContentService, PageListService, SubListService};
pub use traits::{CacheBackend, CacheCodec, JobQueue, OriginClient};

// Re-export async_trait for implementors of the collaborator traits
pub use async_trait::async_trait;

/// Explicit dependency container, built once at process start
///
/// Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<FeederConfig>,
    backend: Arc<dyn CacheBackend>,
    origin: Arc<dyn OriginClient>,
    queue: Arc<dyn JobQueue>,
    dispatcher: Arc<RefreshDispatcher>,
    catalog_cache: Arc<CacheManager<Catalog>>,
    sub_list_cache: Arc<CacheManager<SubList>>,
    page_list_cache: Arc<CacheManager<PageList>>,
    catalog_service: Arc<CatalogService>,
    sub_list_service: Arc<SubListService>,
    page_list_service: Arc<PageListService>,
}

impl AppContext {
    /// Build with configuration and collaborators taken from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the environment does not parse or Redis is unreachable.
    pub async fn from_env() -> Result<Self> {
        AppContextBuilder::new().build().await
    }

    #[must_use]
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    pub(crate) fn assemble(
        config: FeederConfig,
        backend: Arc<dyn CacheBackend>,
        origin: Arc<dyn OriginClient>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        let rules = Arc::new(config.rules.clone());
        let dispatcher = Arc::new(
            RefreshDispatcher::new(Arc::clone(&queue), config.worker_queue.clone())
                .with_dedup_window(config.refresh_dedup_window),
        );

        let catalog_cache = Arc::new(CacheManager::<Catalog>::new(Arc::clone(&origin), Arc::clone(&backend), config.codec));
        let sub_list_cache = Arc::new(CacheManager::<SubList>::new(Arc::clone(&origin), Arc::clone(&backend), config.codec));
        let page_list_cache = Arc::new(CacheManager::<PageList>::new(Arc::clone(&origin), Arc::clone(&backend), config.codec));

        let catalog_service = Arc::new(ContentService::new(
            Arc::clone(&origin),
            Arc::clone(&catalog_cache),
            Arc::clone(&dispatcher),
            Arc::clone(&rules),
        ));
        let sub_list_service = Arc::new(ContentService::new(
            Arc::clone(&origin),
            Arc::clone(&sub_list_cache),
            Arc::clone(&dispatcher),
            Arc::clone(&rules),
        ));
        let page_list_service = Arc::new(ContentService::new(
            Arc::clone(&origin),
            Arc::clone(&page_list_cache),
            Arc::clone(&dispatcher),
            rules,
        ));

        Self {
            config: Arc::new(config),
            backend,
            origin,
            queue,
            dispatcher,
            catalog_cache,
            sub_list_cache,
            page_list_cache,
            catalog_service,
            sub_list_service,
            page_list_service,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn CacheBackend> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn origin(&self) -> Arc<dyn OriginClient> {
        Arc::clone(&self.origin)
    }

    #[must_use]
    pub fn queue(&self) -> Arc<dyn JobQueue> {
        Arc::clone(&self.queue)
    }

    #[must_use]
    pub fn dispatcher(&self) -> Arc<RefreshDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    #[must_use]
    pub fn catalog_cache(&self) -> Arc<CacheManager<Catalog>> {
        Arc::clone(&self.catalog_cache)
    }

    #[must_use]
    pub fn sub_list_cache(&self) -> Arc<CacheManager<SubList>> {
        Arc::clone(&self.sub_list_cache)
    }

    #[must_use]
    pub fn page_list_cache(&self) -> Arc<CacheManager<PageList>> {
        Arc::clone(&self.page_list_cache)
    }

    #[must_use]
    pub fn catalog_service(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog_service)
    }

    #[must_use]
    pub fn sub_list_service(&self) -> Arc<SubListService> {
        Arc::clone(&self.sub_list_service)
    }

    #[must_use]
    pub fn page_list_service(&self) -> Arc<PageListService> {
        Arc::clone(&self.page_list_service)
    }

    /// Worker pool on the configured queue with the three refresh handlers
    #[must_use]
    pub fn worker_pool(&self) -> WorkerPool {
        let mut pool = WorkerPool::new(
            Arc::clone(&self.queue),
            self.config.worker_queue.clone(),
            self.config.worker_concurrency,
        );
        jobs::register_refresh_handlers(&mut pool, self);
        pool
    }

    /// Cache manager statistics, one entry per resource
    #[must_use]
    pub fn cache_stats(&self) -> Vec<CacheManagerStats> {
        vec![
            self.catalog_cache.get_stats(),
            self.sub_list_cache.get_stats(),
            self.page_list_cache.get_stats(),
        ]
    }

    /// `true` when the cache backend answers
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }
}
