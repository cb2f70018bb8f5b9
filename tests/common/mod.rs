//! Common utilities for integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scripted origin with per-method call counters
//! - A queue that always rejects jobs
//! - Context setup on in-process backends
//! - Test data generators

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use content_feeder::models::{
    CatalogItem, CatalogListResponse, PageItem, PageListResponse, SubListItem, SubListResponse,
};
use content_feeder::{
    AppContext, DashMapCache, FeederConfig, Job, JobError, JobQueue, LocalJobQueue, OriginClient,
    OriginError, async_trait, canonical_ordering,
};
use parking_lot::Mutex;

pub const QUEUE: &str = "mangindo-worker-default";

/// Get Redis URL from environment or use default
pub fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

/// Create a test identifier with a unique suffix
pub fn test_key(name: &str) -> String {
    format!("test_{}_{}", name, rand::random::<u32>())
}

/// Origin answering from scripted responses
///
/// Unscripted resources answer `Status(404)`.
#[derive(Default)]
pub struct ScriptedOrigin {
    catalog: Mutex<Option<Result<CatalogListResponse, OriginError>>>,
    sub_lists: Mutex<HashMap<String, Result<SubListResponse, OriginError>>>,
    page_lists: Mutex<HashMap<String, Result<PageListResponse, OriginError>>>,
    pub catalog_calls: AtomicUsize,
    pub sub_list_calls: AtomicUsize,
    pub page_list_calls: AtomicUsize,
}

impl ScriptedOrigin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_catalog(&self, response: Result<CatalogListResponse, OriginError>) {
        *self.catalog.lock() = Some(response);
    }

    pub fn set_sub_list(&self, title_id: &str, response: Result<SubListResponse, OriginError>) {
        self.sub_lists.lock().insert(title_id.to_string(), response);
    }

    pub fn set_page_list(&self, title_id: &str, chapter: f32, response: Result<PageListResponse, OriginError>) {
        self.page_lists
            .lock()
            .insert(page_key(title_id, chapter), response);
    }

    pub fn total_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
            + self.sub_list_calls.load(Ordering::SeqCst)
            + self.page_list_calls.load(Ordering::SeqCst)
    }
}

fn page_key(title_id: &str, chapter: f32) -> String {
    format!("{title_id}|{}", canonical_ordering(chapter))
}

#[async_trait]
impl OriginClient for ScriptedOrigin {
    async fn get_catalog(&self) -> Result<CatalogListResponse, OriginError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog
            .lock()
            .clone()
            .unwrap_or(Err(OriginError::Status(404)))
    }

    async fn get_sub_list(&self, title_id: &str) -> Result<SubListResponse, OriginError> {
        self.sub_list_calls.fetch_add(1, Ordering::SeqCst);
        self.sub_lists
            .lock()
            .get(title_id)
            .cloned()
            .unwrap_or(Err(OriginError::Status(404)))
    }

    async fn get_page_list(&self, title_id: &str, chapter: f32) -> Result<PageListResponse, OriginError> {
        self.page_list_calls.fetch_add(1, Ordering::SeqCst);
        self.page_lists
            .lock()
            .get(&page_key(title_id, chapter))
            .cloned()
            .unwrap_or(Err(OriginError::Status(404)))
    }
}

/// Queue that rejects every job
#[derive(Default)]
pub struct FailingQueue {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl JobQueue for FailingQueue {
    async fn enqueue(&self, queue: &str, job: Job) -> Result<(), JobError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(JobError::Enqueue {
            job: job.name,
            queue: queue.to_string(),
            source: anyhow::anyhow!("queue is down"),
        })
    }

    async fn dequeue(&self, _queue: &str, wait: Duration) -> Result<Option<Job>, JobError> {
        tokio::time::sleep(wait).await;
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "Failing"
    }
}

/// Everything a test needs to inspect after a call
pub struct TestEnv {
    pub ctx: AppContext,
    pub origin: Arc<ScriptedOrigin>,
    pub backend: Arc<DashMapCache>,
    pub queue: Arc<LocalJobQueue>,
}

impl TestEnv {
    /// Jobs waiting on the default queue, by name
    pub fn pending_job_names(&self) -> Vec<String> {
        self.queue
            .pending(QUEUE)
            .into_iter()
            .map(|job| job.name)
            .collect()
    }
}

pub fn test_config(popular: &[&str], ads: &[&str]) -> FeederConfig {
    FeederConfig::default()
        .with_popular_tags(popular.iter().copied())
        .with_ad_tags(ads.iter().copied())
        .with_worker(QUEUE, 4)
}

/// Context on `DashMapCache` + `LocalJobQueue` + `ScriptedOrigin`
pub async fn setup_env(config: FeederConfig) -> TestEnv {
    let origin = ScriptedOrigin::new();
    let backend = Arc::new(DashMapCache::new());
    let queue = Arc::new(LocalJobQueue::new());

    let ctx = AppContext::builder()
        .with_config(config)
        .with_backend(backend.clone())
        .with_origin(origin.clone())
        .with_queue(queue.clone())
        .build()
        .await
        .expect("Failed to build context");

    TestEnv {
        ctx,
        origin,
        backend,
        queue,
    }
}

/// Context whose queue rejects every job
pub async fn setup_env_with_failing_queue(config: FeederConfig) -> (AppContext, Arc<ScriptedOrigin>, Arc<FailingQueue>) {
    let origin = ScriptedOrigin::new();
    let queue = Arc::new(FailingQueue::default());

    let ctx = AppContext::builder()
        .with_config(config)
        .with_backend(Arc::new(DashMapCache::new()))
        .with_origin(origin.clone())
        .with_queue(queue.clone())
        .build()
        .await
        .expect("Failed to build context");

    (ctx, origin, queue)
}

/// Generate test data
pub mod test_data {
    use super::*;

    pub fn catalog_item(title_id: &str) -> CatalogItem {
        CatalogItem {
            id: format!("id-{title_id}"),
            title: title_id.replace('_', " "),
            title_id: title_id.to_string(),
            icon_url: format!("http://img/{title_id}.jpg"),
            ..CatalogItem::default()
        }
    }

    pub fn catalog(title_ids: &[&str]) -> CatalogListResponse {
        CatalogListResponse {
            items: title_ids.iter().map(|id| catalog_item(id)).collect(),
        }
    }

    pub fn sub_list(title_id: &str, numbers: &[f32]) -> SubListResponse {
        SubListResponse {
            items: numbers
                .iter()
                .map(|number| SubListItem {
                    number: *number,
                    title: format!("Chapter {number}"),
                    title_id: title_id.to_string(),
                    modified_date: "2018-01-01".to_string(),
                })
                .collect(),
        }
    }

    pub fn page_list(urls: &[&str]) -> PageListResponse {
        PageListResponse {
            items: urls
                .iter()
                .zip(1..)
                .map(|(url, page)| PageItem {
                    url: (*url).to_string(),
                    page,
                })
                .collect(),
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    use tokio::time::{Duration, sleep};

    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }

    false
}
