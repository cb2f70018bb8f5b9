//! Redis job queue
//!
//! One Redis list per queue name. Producers `LPUSH` JSON-encoded jobs,
//! consumers poll with `RPOP`, so jobs come out in FIFO order and survive a
//! worker restart.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::Job;
use crate::error::JobError;
use crate::traits::JobQueue;

const DEFAULT_NAMESPACE: &str = "feeder";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Redis-backed `JobQueue` with `ConnectionManager` for automatic reconnection
pub struct RedisJobQueue {
    conn_manager: ConnectionManager,
    namespace: String,
}

impl RedisJobQueue {
    /// Connect to `redis_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis client cannot be created or connection fails.
    pub async fn with_url(redis_url: &str) -> Result<Self> {
        info!(redis_url = %redis_url, "Initializing Redis job queue");

        let client = Client::open(redis_url)
            .with_context(|| format!("Failed to create Redis client with URL: {redis_url}"))?;
        let conn_manager = ConnectionManager::new(client)
            .await
            .context("Failed to establish Redis connection manager")?;

        let mut conn = conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis PING health check failed")?;

        Ok(Self {
            conn_manager,
            namespace: DEFAULT_NAMESPACE.to_string(),
        })
    }

    /// Prefix for the queue lists (`{namespace}:queue:{name}`)
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn list_key(&self, queue: &str) -> String {
        format!("{}:queue:{queue}", self.namespace)
    }

    async fn pop(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.conn_manager.clone();
        conn.rpop(key, None).await
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, queue: &str, job: Job) -> Result<(), JobError> {
        let key = self.list_key(queue);
        let payload = serde_json::to_string(&job)?;
        let mut conn = self.conn_manager.clone();

        let _: () = conn.lpush(&key, payload).await.map_err(|e| JobError::Enqueue {
            job: job.name.clone(),
            queue: queue.to_string(),
            source: e.into(),
        })?;

        debug!(key = %key, job = %job.name, id = %job.id, "[RedisQueue] Enqueued job");
        Ok(())
    }

    async fn dequeue(&self, queue: &str, wait: Duration) -> Result<Option<Job>, JobError> {
        let key = self.list_key(queue);
        let deadline = Instant::now() + wait;

        loop {
            let raw = self.pop(&key).await.map_err(|e| JobError::Dequeue {
                queue: queue.to_string(),
                source: e.into(),
            })?;

            if let Some(raw) = raw {
                match serde_json::from_str::<Job>(&raw) {
                    Ok(job) => return Ok(Some(job)),
                    Err(e) => {
                        // Poison message: drop it and keep polling.
                        warn!(key = %key, error = %e, "[RedisQueue] Dropping undecodable job");
                        continue;
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    fn name(&self) -> &'static str {
        "Redis"
    }
}
