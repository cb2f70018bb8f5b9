//! In-process job queue
//!
//! FIFO queues kept in memory. Jobs are lost on restart, which is acceptable
//! for refresh jobs: the next miss enqueues another one.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use super::Job;
use crate::error::JobError;
use crate::traits::JobQueue;

/// In-memory `JobQueue`, one FIFO per queue name
#[derive(Default)]
pub struct LocalJobQueue {
    queues: Mutex<HashMap<String, VecDeque<Job>>>,
    notify: Notify,
}

impl LocalJobQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting on `queue`
    #[must_use]
    pub fn len(&self, queue: &str) -> usize {
        self.queues.lock().get(queue).map_or(0, VecDeque::len)
    }

    #[must_use]
    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }

    /// Snapshot of the jobs waiting on `queue`, oldest first
    #[must_use]
    pub fn pending(&self, queue: &str) -> Vec<Job> {
        self.queues
            .lock()
            .get(queue)
            .map(|jobs| jobs.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn pop(&self, queue: &str) -> Option<Job> {
        self.queues.lock().get_mut(queue).and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl JobQueue for LocalJobQueue {
    async fn enqueue(&self, queue: &str, job: Job) -> Result<(), JobError> {
        debug!(queue = %queue, job = %job.name, id = %job.id, "[LocalQueue] Enqueued job");
        self.queues
            .lock()
            .entry(queue.to_string())
            .or_default()
            .push_back(job);
        // One wakeup per job; a stored permit covers a consumer between pop and wait.
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, queue: &str, wait: Duration) -> Result<Option<Job>, JobError> {
        let deadline = Instant::now() + wait;

        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.pop(queue) {
                return Ok(Some(job));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            if tokio::time::timeout(deadline - now, notified).await.is_err() {
                return Ok(self.pop(queue));
            }
        }
    }

    fn name(&self) -> &'static str {
        "Local"
    }
}
