//! Worker pool
//!
//! Pulls jobs from one queue and routes them to handlers by job name. At most
//! `concurrency` handlers run at once. Shutdown is checked between polls, so
//! stopping waits for the current poll (at most one second) and then for
//! in-flight handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{Job, JobArgs};
use crate::error::JobError;
use crate::traits::JobQueue;

/// Boxed job handler
pub type JobHandler = Arc<dyn Fn(JobArgs) -> BoxFuture<'static, Result<(), JobError>> + Send + Sync>;

const DEQUEUE_WAIT: Duration = Duration::from_secs(1);
const ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// Name-routed job consumer
pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    queue_name: String,
    concurrency: usize,
    handlers: HashMap<String, JobHandler>,
}

impl WorkerPool {
    pub fn new(queue: Arc<dyn JobQueue>, queue_name: impl Into<String>, concurrency: usize) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
            concurrency: concurrency.max(1),
            handlers: HashMap::new(),
        }
    }

    /// Route jobs named `name` to `handler`, replacing any previous handler
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(JobArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let handler: JobHandler =
            Arc::new(move |args| -> BoxFuture<'static, Result<(), JobError>> { Box::pin(handler(args)) });
        self.handlers.insert(name.into(), handler);
    }

    /// Names with a registered handler, sorted
    #[must_use]
    pub fn registered_jobs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Run one job inline
    ///
    /// # Errors
    ///
    /// Returns `JobError::UnknownJob` for an unregistered name, or whatever
    /// the handler returns.
    pub async fn process_job(&self, job: Job) -> Result<(), JobError> {
        let handler = self
            .handlers
            .get(&job.name)
            .cloned()
            .ok_or_else(|| JobError::UnknownJob(job.name.clone()))?;
        handler(job.args).await
    }

    /// Start consuming in the background
    #[must_use]
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let concurrency = self.concurrency;

        info!(
            queue = %self.queue_name,
            backend = self.queue.name(),
            concurrency,
            jobs = ?self.registered_jobs(),
            "[Worker] Starting"
        );

        let task = tokio::spawn(run_loop(Arc::new(self), Arc::clone(&semaphore), shutdown_rx));

        WorkerHandle {
            shutdown_tx,
            task,
            semaphore,
            concurrency,
        }
    }
}

async fn run_loop(pool: Arc<WorkerPool>, semaphore: Arc<Semaphore>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let permit = tokio::select! {
            _ = shutdown_rx.changed() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        if *shutdown_rx.borrow() {
            break;
        }

        // Not raced against shutdown: a popped job must reach a handler.
        let next = pool.queue.dequeue(&pool.queue_name, DEQUEUE_WAIT).await;

        let job = match next {
            Ok(Some(job)) => job,
            Ok(None) => continue,
            Err(e) => {
                warn!(queue = %pool.queue_name, error = %e, "[Worker] Dequeue failed, backing off");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            let _permit = permit;
            let name = job.name.clone();
            let id = job.id;
            match pool.process_job(job).await {
                Ok(()) => debug!(job = %name, id = %id, "[Worker] Job done"),
                Err(e) => error!(job = %name, id = %id, error = %e, "[Worker] Job failed"),
            }
        });
    }

    info!(queue = %pool.queue_name, "[Worker] Stopped pulling jobs");
}

/// Handle on a running worker pool
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl WorkerHandle {
    /// Stop pulling jobs and wait for in-flight handlers to finish
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "[Worker] Consumer loop panicked");
        }

        let permits = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
        if self.semaphore.acquire_many(permits).await.is_ok() {
            info!("[Worker] Drained in-flight jobs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::LocalJobQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_process_job_routes_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(Arc::new(LocalJobQueue::new()), "default", 2);
        let counter = Arc::clone(&calls);
        pool.register("Ping", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        pool.process_job(Job::new("Ping", JobArgs::new())).await.unwrap();
        let err = pool.process_job(Job::new("Pong", JobArgs::new())).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, JobError::UnknownJob(name) if name == "Pong"));
    }

    #[tokio::test]
    async fn test_started_pool_drains_queue() {
        let queue = Arc::new(LocalJobQueue::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(queue.clone(), "default", 4);
        let counter = Arc::clone(&calls);
        pool.register("Ping", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let handle = pool.start();
        for _ in 0..5 {
            queue.enqueue("default", Job::new("Ping", JobArgs::new())).await.unwrap();
        }

        for _ in 0..100 {
            if calls.load(Ordering::SeqCst) == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.stop().await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(queue.is_empty("default"));
    }

    /// Queue whose single job arrives only after a slow poll
    struct SlowQueue {
        job: parking_lot::Mutex<Option<Job>>,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl JobQueue for SlowQueue {
        async fn enqueue(&self, _queue: &str, job: Job) -> Result<(), JobError> {
            *self.job.lock() = Some(job);
            Ok(())
        }

        async fn dequeue(&self, _queue: &str, wait: Duration) -> Result<Option<Job>, JobError> {
            tokio::time::sleep(self.delay.min(wait)).await;
            Ok(self.job.lock().take())
        }
    }

    #[tokio::test]
    async fn test_stop_keeps_job_popped_during_shutdown() {
        let queue = Arc::new(SlowQueue {
            job: parking_lot::Mutex::new(Some(Job::new("Ping", JobArgs::new()))),
            delay: Duration::from_millis(100),
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(queue.clone(), "default", 1);
        let counter = Arc::clone(&calls);
        pool.register("Ping", move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let handle = pool.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(queue.job.lock().is_none());
    }
}
