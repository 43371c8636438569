//! HTTP client for the search generation backend.
//!
//! A thin request/response wrapper: no retries, no caching. Looping lives in
//! the poller and the evidence refresher.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use super::{EvidenceStats, SearchBackend, SearchRecord, SearchRequest};
use crate::error::backend_message;
use crate::{Result, ScoutError};

const STATS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SearchClientConfig {
  pub base_url: String,
  pub timeout: Duration,
}

impl Default for SearchClientConfig {
  fn default() -> Self {
    Self { base_url: crate::config::PRODUCTION_SEARCH_URL.to_string(), timeout: Duration::from_secs(30) }
  }
}

impl From<&crate::Config> for SearchClientConfig {
  fn from(config: &crate::Config) -> Self {
    Self { base_url: config.search_url(), timeout: config.request_timeout() }
  }
}

#[derive(Debug, Deserialize)]
struct CreateSearchResponse {
  request_id: String,
}

pub struct HttpSearchClient {
  client: Client,
  config: SearchClientConfig,
}

impl HttpSearchClient {
  pub fn new(config: SearchClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .user_agent(format!("scout/{}", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| ScoutError::config(format!("Failed to create HTTP client: {e}")))?;

    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Evidence finder statistics. Never fails: any problem yields the
  /// "unavailable" placeholder so callers can always render something.
  pub async fn evidence_stats(&self) -> EvidenceStats {
    let url = self.url("/api/evidence/stats");
    let result = async {
      let response = self.client.get(&url).timeout(STATS_TIMEOUT).send().await?;
      let response = check_status(response).await?;
      Ok::<_, ScoutError>(response.json::<EvidenceStats>().await?)
    }
    .await;

    match result {
      Ok(stats) => stats,
      Err(e) => {
        tracing::warn!(error = %e, url = %url, "failed to fetch evidence stats");
        EvidenceStats::unavailable()
      }
    }
  }
}

/// Turn a non-2xx response into `ScoutError::Backend` with the server's message.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  let message = backend_message(status.as_u16(), &body);
  tracing::debug!(status = status.as_u16(), body = %body, "backend returned an error");
  Err(ScoutError::backend(status.as_u16(), message))
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
  async fn create_search(&self, prompt: &str, max_candidates: u32) -> Result<String> {
    let request = SearchRequest::new(prompt, max_candidates);
    let response = self.client.post(self.url("/api/search")).json(&request).send().await?;
    let response = check_status(response).await?;

    let created: CreateSearchResponse = response.json().await?;
    tracing::debug!(request_id = %created.request_id, "search created");
    Ok(created.request_id)
  }

  async fn get_search_result(&self, request_id: &str) -> Result<SearchRecord> {
    let response = self.client.get(self.url(&format!("/api/search/{request_id}"))).send().await?;
    let response = check_status(response).await?;
    Ok(response.json().await?)
  }
}
