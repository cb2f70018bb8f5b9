//! Content Service - cache-aside with async refresh
//!
//! ```text
//! get(args)
//!   ├─ CacheManager::get_cache ── Ok ──────────────────────────────┐
//!   └─ Err (miss or corrupt)                                        │
//!        ├─ OriginClient fetch ── Err ──▶ ServiceError::Generic     │
//!        └─ Ok ──▶ RefreshDispatcher (best effort) ─────────────────┤
//!                                                                   ▼
//!                       empty ──▶ NotFound, else Resource::post_process
//! ```

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cache_manager::CacheManager;
use crate::config::ContentRules;
use crate::error::ServiceError;
use crate::jobs::RefreshDispatcher;
use crate::models::{CatalogPartition, Chapter, Page, PageListRequest, SubListRequest};
use crate::resource::{Catalog, PageList, Resource, SubList};
use crate::traits::OriginClient;

/// Read path of one resource type
pub struct ContentService<R: Resource> {
    origin: Arc<dyn OriginClient>,
    cache_manager: Arc<CacheManager<R>>,
    dispatcher: Arc<RefreshDispatcher>,
    rules: Arc<ContentRules>,
}

pub type CatalogService = ContentService<Catalog>;
pub type SubListService = ContentService<SubList>;
pub type PageListService = ContentService<PageList>;

impl<R: Resource> ContentService<R> {
    pub fn new(
        origin: Arc<dyn OriginClient>,
        cache_manager: Arc<CacheManager<R>>,
        dispatcher: Arc<RefreshDispatcher>,
        rules: Arc<ContentRules>,
    ) -> Self {
        Self {
            origin,
            cache_manager,
            dispatcher,
            rules,
        }
    }

    /// Serve `args` from cache, falling back to the origin on miss
    ///
    /// # Errors
    ///
    /// * `ServiceError::Generic` - cache missed and the origin failed
    /// * `ServiceError::NotFound` - nothing left to return
    pub async fn get(&self, args: &R::Args) -> Result<R::Output, ServiceError> {
        let list = match self.cache_manager.get_cache(args).await {
            Ok(list) => {
                debug!(key = %R::cache_key(args), "[ContentService] Served from cache");
                list
            }
            Err(cache_err) => {
                debug!(key = %R::cache_key(args), reason = %cache_err, "[ContentService] Cache unusable, falling back to origin");
                self.fetch_and_refresh(args).await?
            }
        };

        if R::item_count(&list) == 0 {
            return Err(ServiceError::not_found(R::KIND.name()));
        }

        R::post_process(list, &self.rules)
    }

    async fn fetch_and_refresh(&self, args: &R::Args) -> Result<R::List, ServiceError> {
        let list = R::fetch(self.origin.as_ref(), args).await.map_err(|e| {
            error!(key = %R::cache_key(args), error = %e, "[ContentService] Origin fetch failed");
            ServiceError::Generic
        })?;

        if let Err(e) = self.dispatcher.enqueue_refresh::<R>(args).await {
            warn!(key = %R::cache_key(args), error = %e, "[ContentService] Refresh not enqueued, next request will miss again");
        }

        Ok(list)
    }

    #[must_use]
    pub fn cache_manager(&self) -> &Arc<CacheManager<R>> {
        &self.cache_manager
    }
}

impl ContentService<Catalog> {
    /// Catalog split into popular and latest entries
    ///
    /// # Errors
    ///
    /// See [`ContentService::get`]; an empty catalog is `NotFound("manga")`.
    pub async fn get_catalog(&self) -> Result<CatalogPartition, ServiceError> {
        self.get(&()).await
    }
}

impl ContentService<SubList> {
    /// Chapters of one catalog entry
    ///
    /// # Errors
    ///
    /// See [`ContentService::get`]; no chapters is `NotFound("chapter")`.
    pub async fn get_sub_list(&self, request: &SubListRequest) -> Result<Vec<Chapter>, ServiceError> {
        self.get(request).await
    }
}

impl ContentService<PageList> {
    /// Pages of one chapter without advertising pages
    ///
    /// # Errors
    ///
    /// See [`ContentService::get`]; no page left after filtering is
    /// `NotFound("content")`.
    pub async fn get_page_list(&self, request: &PageListRequest) -> Result<Vec<Page>, ServiceError> {
        self.get(request).await
    }
}
