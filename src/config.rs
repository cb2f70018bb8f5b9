//! Feeder configuration
//!
//! Everything is read from environment variables with sensible defaults, the
//! same way the Redis backend picks up `REDIS_URL`.
//!
//! | Variable                      | Default                       |
//! |-------------------------------|-------------------------------|
//! | `REDIS_URL`                   | `redis://127.0.0.1:6379`      |
//! | `ORIGIN_SERVER_BASE_URL`      | `http://127.0.0.1:8080`       |
//! | `ORIGIN_TIMEOUT_MS`           | `3000`                        |
//! | `POPULAR_MANGA_TAGS`          | empty                         |
//! | `ADS_CONTENT_TAGS`            | empty                         |
//! | `WORKER_QUEUE`                | `mangindo-worker-default`     |
//! | `WORKER_CONCURRENCY`          | `10`                          |
//! | `REFRESH_DEDUP_WINDOW_SECS`   | unset (disabled)              |
//! | `CACHE_CODEC`                 | `json`                        |

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::codecs::PayloadCodec;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_ORIGIN_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_WORKER_QUEUE: &str = "mangindo-worker-default";
pub const DEFAULT_WORKER_CONCURRENCY: usize = 10;
pub const DEFAULT_ORIGIN_TIMEOUT: Duration = Duration::from_millis(3000);

/// Business rules applied after a fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRules {
    /// Catalog ids listed as popular (exact match)
    pub popular_tags: Vec<String>,
    /// URL substrings marking advertising pages
    pub ad_tags: Vec<String>,
}

impl ContentRules {
    #[must_use]
    pub fn new(popular_tags: Vec<String>, ad_tags: Vec<String>) -> Self {
        Self {
            popular_tags,
            ad_tags,
        }
    }

    #[must_use]
    pub fn is_popular(&self, title_id: &str) -> bool {
        self.popular_tags.iter().any(|tag| tag == title_id)
    }

    #[must_use]
    pub fn is_ad_url(&self, url: &str) -> bool {
        self.ad_tags.iter().any(|tag| url.contains(tag.as_str()))
    }
}

/// Process-wide settings, built once at startup
#[derive(Debug, Clone)]
pub struct FeederConfig {
    pub redis_url: String,
    pub origin_base_url: String,
    pub origin_timeout: Duration,
    pub rules: ContentRules,
    pub worker_queue: String,
    pub worker_concurrency: usize,
    /// Skip re-enqueueing a refresh for the same key inside this window
    pub refresh_dedup_window: Option<Duration>,
    pub codec: PayloadCodec,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            origin_base_url: DEFAULT_ORIGIN_BASE_URL.to_string(),
            origin_timeout: DEFAULT_ORIGIN_TIMEOUT,
            rules: ContentRules::default(),
            worker_queue: DEFAULT_WORKER_QUEUE.to_string(),
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
            refresh_dedup_window: None,
            codec: PayloadCodec::default(),
        }
    }
}

impl FeederConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let origin_timeout = match get("ORIGIN_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number(&raw, "ORIGIN_TIMEOUT_MS")?),
            None => defaults.origin_timeout,
        };
        let worker_concurrency = match get("WORKER_CONCURRENCY") {
            Some(raw) => parse_number::<usize>(&raw, "WORKER_CONCURRENCY")?.max(1),
            None => defaults.worker_concurrency,
        };
        let refresh_dedup_window = match get("REFRESH_DEDUP_WINDOW_SECS") {
            Some(raw) => {
                let secs: u64 = parse_number(&raw, "REFRESH_DEDUP_WINDOW_SECS")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };
        let codec = match get("CACHE_CODEC") {
            Some(raw) => raw
                .parse::<PayloadCodec>()
                .context("Could not parse key: CACHE_CODEC")?,
            None => defaults.codec,
        };

        Ok(Self {
            redis_url: get("REDIS_URL").unwrap_or(defaults.redis_url),
            origin_base_url: get("ORIGIN_SERVER_BASE_URL").unwrap_or(defaults.origin_base_url),
            origin_timeout,
            rules: ContentRules::new(
                get("POPULAR_MANGA_TAGS").map(|raw| split_tags(&raw)).unwrap_or_default(),
                get("ADS_CONTENT_TAGS").map(|raw| split_tags(&raw)).unwrap_or_default(),
            ),
            worker_queue: get("WORKER_QUEUE").unwrap_or(defaults.worker_queue),
            worker_concurrency,
            refresh_dedup_window,
            codec,
        })
    }

    #[must_use]
    pub fn with_redis_url(mut self, redis_url: impl Into<String>) -> Self {
        self.redis_url = redis_url.into();
        self
    }

    #[must_use]
    pub fn with_origin(mut self, base_url: impl Into<String>, timeout: Duration) -> Self {
        self.origin_base_url = base_url.into();
        self.origin_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_popular_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.popular_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_ad_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.ad_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_worker(mut self, queue: impl Into<String>, concurrency: usize) -> Self {
        self.worker_queue = queue.into();
        self.worker_concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_refresh_dedup_window(mut self, window: Option<Duration>) -> Self {
        self.refresh_dedup_window = window;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: PayloadCodec) -> Self {
        self.codec = codec;
        self
    }
}

fn parse_number<T>(raw: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Could not parse key: {key}, value: {raw}"))
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}
