//! Cache Backend Implementations
//!
//! # Available Backends
//!
//! - **`DashMap`** - In-process concurrent map with TTL tracking (single instance, tests)
//! - **Redis** - Shared store for every serving instance and the worker (feature: `redis`)
//!
//! Neither backend evicts by capacity; an entry lives until its TTL elapses or
//! it is deleted.
//!
//! # Usage
//!
//! ```rust,no_run
//! use content_feeder::backends::{DashMapCache, RedisCache};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let local = DashMapCache::new();
//! let shared = RedisCache::with_url("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

pub mod dashmap_cache;
#[cfg(feature = "redis")]
pub mod redis_cache;

pub use dashmap_cache::DashMapCache;
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;
