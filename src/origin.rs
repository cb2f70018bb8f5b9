//! HTTP origin client
//!
//! Talks to the upstream content server:
//!
//! | Resource  | Endpoint                                                    |
//! |-----------|-------------------------------------------------------------|
//! | catalog   | `{base}/official/2016/main.php`                             |
//! | sub-list  | `{base}/official/2016/chapter_list.php?manga={id}`          |
//! | page list | `{base}/official/2016/image_list.php?manga={id}&chapter={n}`|

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::FeederConfig;
use crate::error::OriginError;
use crate::models::{CatalogListResponse, PageListResponse, SubListResponse};
use crate::traits::OriginClient;

const CATALOG_PATH: &str = "/official/2016/main.php";
const SUB_LIST_PATH: &str = "/official/2016/chapter_list.php";
const PAGE_LIST_PATH: &str = "/official/2016/image_list.php";

/// `OriginClient` over HTTP with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpOriginClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpOriginClient {
    /// Build a client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend init).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build origin HTTP client")?;

        info!(base_url = %base_url, timeout_ms = timeout.as_millis(), "Initializing origin client");
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Build a client from `ORIGIN_SERVER_BASE_URL` / `ORIGIN_TIMEOUT_MS`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &FeederConfig) -> Result<Self> {
        Self::new(config.origin_base_url.clone(), config.origin_timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, OriginError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "[Origin] Unexpected status");
            return Err(OriginError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(&e))?;
        serde_json::from_slice(&body).map_err(|e| {
            debug!(url = %url, error = %e, "[Origin] Error when decoding origin response");
            OriginError::InvalidResponse(e.to_string())
        })
    }

    fn transport_error(&self, error: &reqwest::Error) -> OriginError {
        if error.is_timeout() {
            OriginError::Timeout(self.timeout)
        } else {
            OriginError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl OriginClient for HttpOriginClient {
    async fn get_catalog(&self) -> Result<CatalogListResponse, OriginError> {
        self.get_json(CATALOG_PATH, &[]).await
    }

    async fn get_sub_list(&self, title_id: &str) -> Result<SubListResponse, OriginError> {
        self.get_json(SUB_LIST_PATH, &[("manga", title_id.to_string())]).await
    }

    async fn get_page_list(&self, title_id: &str, chapter: f32) -> Result<PageListResponse, OriginError> {
        self.get_json(
            PAGE_LIST_PATH,
            &[("manga", title_id.to_string()), ("chapter", format!("{chapter:.6}"))],
        )
        .await
    }
}
