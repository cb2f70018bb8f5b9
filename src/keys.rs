//! Cache keys and TTLs
//!
//! Keys are bit-exact: other deployments (and fixtures) read the same entries.

use std::time::Duration;

pub const CATALOG_CACHE_KEY: &str = "CatalogCache";
pub const SUB_LIST_CACHE_PREFIX: &str = "SubListCache";
pub const PAGE_LIST_CACHE_PREFIX: &str = "PageListCache";

/// Resource families served by the feeder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Whole catalog - 1 hour TTL
    Catalog,
    /// Chapter list of one entry - 30 minutes TTL
    SubList,
    /// Pages of one chapter - 48 hours TTL (published chapters rarely change)
    PageList,
}

impl ResourceKind {
    /// Convert kind to its cache TTL
    #[must_use]
    pub fn ttl(self) -> Duration {
        match self {
            Self::Catalog => Duration::from_secs(60 * 60),
            Self::SubList => Duration::from_secs(30 * 60),
            Self::PageList => Duration::from_secs(48 * 60 * 60),
        }
    }

    /// Name used in `NotFound` and `invalid ... cache` messages
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Catalog => "manga",
            Self::SubList => "chapter",
            Self::PageList => "content",
        }
    }

    /// Refresh job routed to the worker for this kind
    #[must_use]
    pub fn job_name(self) -> &'static str {
        match self {
            Self::Catalog => "SetCatalogCacheJob",
            Self::SubList => "SetSubListCacheJob",
            Self::PageList => "SetPageListCacheJob",
        }
    }
}

/// Canonical decimal string of an ordering value
///
/// Four decimals, then trailing zeros and a trailing point are trimmed:
/// `650.0 -> "650"`, `650.1 -> "650.1"`.
#[must_use]
pub fn canonical_ordering(value: f32) -> String {
    let formatted = format!("{value:.4}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[must_use]
pub fn catalog_key() -> String {
    CATALOG_CACHE_KEY.to_string()
}

#[must_use]
pub fn sub_list_key(title_id: &str) -> String {
    format!("{SUB_LIST_CACHE_PREFIX}|{title_id}")
}

#[must_use]
pub fn page_list_key(title_id: &str, chapter: f32) -> String {
    format!(
        "{PAGE_LIST_CACHE_PREFIX}|{title_id}|{}",
        canonical_ordering(chapter)
    )
}
