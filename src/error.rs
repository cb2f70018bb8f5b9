//! Error types
//!
//! Each layer owns its error enum:
//!
//! - [`CacheError`]: key-value store and cache manager failures
//! - [`OriginError`]: upstream fetch failures
//! - [`JobError`]: job queue and worker handler failures
//! - [`ServiceError`]: the only error kinds surfaced to callers of the content services

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by cache backends and cache managers
#[derive(Debug, Error)]
pub enum CacheError {
    /// Key is absent or its TTL elapsed
    #[error("cache miss for key {key}")]
    NotFound { key: String },

    /// Payload exists but could not be decoded
    #[error("invalid {resource} cache")]
    InvalidCache { resource: &'static str },

    /// Origin fetch failed while repopulating the cache
    #[error(transparent)]
    Origin(#[from] OriginError),

    /// Store failure (connection, protocol, ...)
    #[error("{backend} backend failure: {source}")]
    Backend {
        backend: &'static str,
        source: anyhow::Error,
    },
}

impl CacheError {
    pub(crate) fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub(crate) fn backend(backend: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            backend,
            source: source.into(),
        }
    }

    /// `true` when the error is a plain miss
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by an [`OriginClient`](crate::traits::OriginClient)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OriginError {
    #[error("origin server error: {0}")]
    Transport(String),

    #[error("origin server error: request timed out after {0:?}")]
    Timeout(Duration),

    #[error("origin server error: unexpected status {0}")]
    Status(u16),

    #[error("invalid JSON response from origin server: {0}")]
    InvalidResponse(String),
}

/// Errors raised while enqueuing, dequeuing or running jobs
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to enqueue {job} job on {queue}: {source}")]
    Enqueue {
        job: String,
        queue: String,
        source: anyhow::Error,
    },

    #[error("failed to dequeue from {queue}: {source}")]
    Dequeue { queue: String, source: anyhow::Error },

    #[error("can not get argument {argument} for {job} job")]
    InvalidArgument { job: String, argument: &'static str },

    #[error("no handler registered for {0} job")]
    UnknownJob(String),

    #[error("{job} job failed: {source}")]
    Handler { job: String, source: CacheError },

    #[error("failed to encode job payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Field name to message map produced by request validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub BTreeMap<String, String>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join(", "))
    }
}

/// Outward-facing errors of the content services
///
/// `Generic` never carries upstream detail; the detail is logged where it is
/// swallowed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Something went wrong")]
    Generic,

    #[error("Could not find {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(ValidationErrors),
}

impl ServiceError {
    pub(crate) fn not_found(kind: &str) -> Self {
        Self::NotFound(kind.to_string())
    }

    /// HTTP status code the transport layer should answer with
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Generic => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_messages() {
        assert_eq!(ServiceError::Generic.to_string(), "Something went wrong");
        assert_eq!(
            ServiceError::not_found("content").to_string(),
            "Could not find content"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::Generic.status_code(), 500);
        assert_eq!(ServiceError::not_found("manga").status_code(), 404);
        assert_eq!(
            ServiceError::Validation(ValidationErrors::default()).status_code(),
            400
        );
    }

    #[test]
    fn test_invalid_cache_message() {
        let err = CacheError::InvalidCache {
            resource: "chapter",
        };
        assert_eq!(err.to_string(), "invalid chapter cache");
        assert!(!err.is_not_found());
        assert!(CacheError::not_found("CatalogCache").is_not_found());
    }

    #[test]
    fn test_validation_errors_join_in_field_order() {
        let mut errors = ValidationErrors::default();
        errors.insert("title_id", "title_id cannot be blank");
        errors.insert("chapter", "chapter must be a number");
        assert_eq!(
            ServiceError::Validation(errors).to_string(),
            "chapter must be a number, title_id cannot be blank"
        );
    }
}
