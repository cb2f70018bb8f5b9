//! Refresh job dispatcher
//!
//! Fire-and-forget: the serving path hands a refresh to the queue and moves on.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::Job;
use crate::error::JobError;
use crate::resource::Resource;
use crate::traits::JobQueue;

/// Recently enqueued cache keys
///
/// Markers older than the window are swept at most once per window, so the
/// map only holds keys enqueued during roughly the last two windows.
struct DedupWindow {
    window: Duration,
    recent: DashMap<String, Instant>,
    last_sweep: Mutex<Instant>,
}

impl DedupWindow {
    fn new(window: Duration) -> Self {
        Self {
            window,
            recent: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Record `key` and report whether a refresh should go out
    fn claim(&self, key: &str, now: Instant) -> bool {
        self.sweep(now);

        let mut fresh = false;
        self.recent
            .entry(key.to_string())
            .and_modify(|last| {
                if now.duration_since(*last) >= self.window {
                    *last = now;
                    fresh = true;
                }
            })
            .or_insert_with(|| {
                fresh = true;
                now
            });
        fresh
    }

    fn release(&self, key: &str) {
        self.recent.remove(key);
    }

    fn sweep(&self, now: Instant) {
        {
            let mut last_sweep = self.last_sweep.lock();
            if now.duration_since(*last_sweep) < self.window {
                return;
            }
            *last_sweep = now;
        }

        let before = self.recent.len();
        self.recent.retain(|_, last| now.duration_since(*last) < self.window);
        let removed = before.saturating_sub(self.recent.len());
        if removed > 0 {
            debug!(removed, remaining = self.recent.len(), "[Dispatcher] Swept expired refresh markers");
        }
    }
}

/// Enqueues cache refresh jobs for the worker
pub struct RefreshDispatcher {
    queue: Arc<dyn JobQueue>,
    queue_name: String,
    dedup: Option<DedupWindow>,
}

impl RefreshDispatcher {
    pub fn new(queue: Arc<dyn JobQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
            dedup: None,
        }
    }

    /// Suppress repeated refreshes of one key inside `window`
    ///
    /// `None` (or a zero window) keeps every miss enqueueing its own job.
    #[must_use]
    pub fn with_dedup_window(mut self, window: Option<Duration>) -> Self {
        self.dedup = window.filter(|window| !window.is_zero()).map(DedupWindow::new);
        self
    }

    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Number of cache keys currently held by the dedup window
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.dedup.as_ref().map_or(0, |dedup| dedup.recent.len())
    }

    /// Enqueue the refresh job of resource `R` for `args`
    ///
    /// # Errors
    ///
    /// Returns `JobError::Enqueue` if the queue rejects the job.
    pub async fn enqueue_refresh<R: Resource>(&self, args: &R::Args) -> Result<(), JobError> {
        let key = R::cache_key(args);
        let job_name = R::KIND.job_name();

        let claimed = self.dedup.as_ref().is_none_or(|dedup| dedup.claim(&key, Instant::now()));
        if !claimed {
            debug!(key = %key, job = job_name, "[Dispatcher] Refresh already enqueued recently, skipping");
            return Ok(());
        }

        let job = Job::new(job_name, R::job_args(args));
        let job_id = job.id;

        if let Err(e) = self.queue.enqueue(&self.queue_name, job).await {
            if let Some(dedup) = &self.dedup {
                dedup.release(&key);
            }
            warn!(key = %key, job = job_name, queue = %self.queue_name, error = %e, "[Dispatcher] Failed to enqueue refresh");
            return Err(e);
        }

        debug!(key = %key, job = job_name, id = %job_id, queue = %self.queue_name, "[Dispatcher] Refresh enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JOB_ARG_CHAPTER, JOB_ARG_TITLE_ID, LocalJobQueue};
    use crate::models::PageListRequest;
    use crate::resource::{Catalog, PageList};

    #[tokio::test]
    async fn test_enqueues_named_job_with_args() {
        let queue = Arc::new(LocalJobQueue::new());
        let dispatcher = RefreshDispatcher::new(queue.clone(), "default");

        dispatcher
            .enqueue_refresh::<PageList>(&PageListRequest::new("bleach", 650.0))
            .await
            .unwrap();

        let jobs = queue.pending("default");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "SetPageListCacheJob");
        assert_eq!(jobs[0].args[JOB_ARG_TITLE_ID], "bleach");
        assert_eq!(jobs[0].args[JOB_ARG_CHAPTER].as_f64(), Some(650.0));
    }

    #[tokio::test]
    async fn test_without_window_every_miss_enqueues() {
        let queue = Arc::new(LocalJobQueue::new());
        let dispatcher = RefreshDispatcher::new(queue.clone(), "default");

        for _ in 0..3 {
            dispatcher.enqueue_refresh::<Catalog>(&()).await.unwrap();
        }
        assert_eq!(queue.len("default"), 3);
    }

    #[tokio::test]
    async fn test_window_collapses_repeated_refreshes() {
        let queue = Arc::new(LocalJobQueue::new());
        let dispatcher = RefreshDispatcher::new(queue.clone(), "default")
            .with_dedup_window(Some(Duration::from_secs(60)));

        for _ in 0..3 {
            dispatcher.enqueue_refresh::<Catalog>(&()).await.unwrap();
        }
        dispatcher
            .enqueue_refresh::<PageList>(&PageListRequest::new("bleach", 1.0))
            .await
            .unwrap();

        assert_eq!(queue.len("default"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reopens_after_elapsing() {
        let queue = Arc::new(LocalJobQueue::new());
        let dispatcher = RefreshDispatcher::new(queue.clone(), "default")
            .with_dedup_window(Some(Duration::from_millis(10)));

        dispatcher.enqueue_refresh::<Catalog>(&()).await.unwrap();
        dispatcher.enqueue_refresh::<Catalog>(&()).await.unwrap();
        tokio::time::advance(Duration::from_millis(20)).await;
        dispatcher.enqueue_refresh::<Catalog>(&()).await.unwrap();

        assert_eq!(queue.len("default"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_markers_are_swept() {
        let queue = Arc::new(LocalJobQueue::new());
        let dispatcher = RefreshDispatcher::new(queue.clone(), "default")
            .with_dedup_window(Some(Duration::from_millis(10)));

        for chapter in 0..5000u16 {
            dispatcher
                .enqueue_refresh::<PageList>(&PageListRequest::new("bleach", f32::from(chapter)))
                .await
                .unwrap();
        }
        assert_eq!(dispatcher.tracked_keys(), 5000);

        tokio::time::advance(Duration::from_millis(50)).await;
        dispatcher
            .enqueue_refresh::<PageList>(&PageListRequest::new("naruto", 1.0))
            .await
            .unwrap();

        assert_eq!(dispatcher.tracked_keys(), 1);
        assert_eq!(queue.len("default"), 5001);
    }

    #[tokio::test]
    async fn test_failed_enqueue_releases_marker() {
        struct RejectingQueue;

        #[async_trait::async_trait]
        impl JobQueue for RejectingQueue {
            async fn enqueue(&self, queue: &str, job: Job) -> Result<(), JobError> {
                Err(JobError::Enqueue {
                    job: job.name,
                    queue: queue.to_string(),
                    source: anyhow::anyhow!("queue is down"),
                })
            }

            async fn dequeue(&self, _queue: &str, _wait: Duration) -> Result<Option<Job>, JobError> {
                Ok(None)
            }

            fn name(&self) -> &'static str {
                "Rejecting"
            }
        }

        let dispatcher = RefreshDispatcher::new(Arc::new(RejectingQueue), "default")
            .with_dedup_window(Some(Duration::from_secs(60)));

        assert!(dispatcher.enqueue_refresh::<Catalog>(&()).await.is_err());
        assert_eq!(dispatcher.tracked_keys(), 0);
    }
}
