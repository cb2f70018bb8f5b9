//! Refresh jobs
//!
//! A cache miss answers the caller straight from the origin and leaves the
//! cache repopulation to a background job:
//!
//! ```text
//! ContentService ── miss ──▶ RefreshDispatcher ──▶ JobQueue ──▶ WorkerPool ──▶ CacheManager::set_cache
//! ```
//!
//! Jobs carry an untyped, string-keyed argument map so any queue transport can
//! ship them as JSON; handlers re-validate argument shape on the way out.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod dispatcher;
pub mod handlers;
pub mod local_queue;
#[cfg(feature = "redis")]
pub mod redis_queue;
pub mod worker;

pub use dispatcher::RefreshDispatcher;
pub use handlers::register_refresh_handlers;
pub use local_queue::LocalJobQueue;
#[cfg(feature = "redis")]
pub use redis_queue::RedisJobQueue;
pub use worker::{WorkerHandle, WorkerPool};

/// Untyped job arguments
pub type JobArgs = serde_json::Map<String, serde_json::Value>;

pub const JOB_ARG_TITLE_ID: &str = "JobArg_TitleId";
pub const JOB_ARG_CHAPTER: &str = "JobArg_Chapter";

/// One unit of work on a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub args: JobArgs,
    pub enqueued_at_ms: u64,
}

impl Job {
    pub fn new(name: impl Into<String>, args: JobArgs) -> Self {
        let enqueued_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            args,
            enqueued_at_ms,
        }
    }
}
