//! Refresh job handlers
//!
//! Each handler decodes its arguments and calls `set_cache` on the matching
//! cache manager. A failed refresh is reported and dropped; the next miss
//! enqueues another.

use std::sync::Arc;

use tracing::debug;

use super::WorkerPool;
use crate::cache_manager::CacheManager;
use crate::error::JobError;
use crate::resource::{Catalog, PageList, Resource, SubList};
use crate::AppContext;

/// Register the refresh handler of resource `R`
pub fn register_refresh<R: Resource>(pool: &mut WorkerPool, manager: Arc<CacheManager<R>>) {
    let job_name = R::KIND.job_name();
    pool.register(job_name, move |args| {
        let manager = Arc::clone(&manager);
        async move {
            let args = R::args_from_job(&args)?;
            debug!(job = job_name, args = ?args, "[Worker] Refreshing cache");
            manager
                .set_cache(&args)
                .await
                .map_err(|source| JobError::Handler {
                    job: job_name.to_string(),
                    source,
                })
        }
    });
}

/// Register the catalog, sub-list and page-list refresh handlers
pub fn register_refresh_handlers(pool: &mut WorkerPool, ctx: &AppContext) {
    register_refresh::<Catalog>(pool, ctx.catalog_cache());
    register_refresh::<SubList>(pool, ctx.sub_list_cache());
    register_refresh::<PageList>(pool, ctx.page_list_cache());
}
