use std::time::Duration;

use super::{SearchBackend, SearchRecord, SearchStatus};
use crate::config::PollSettings;
use crate::{Result, ScoutError};

/// Waits for a search to reach a terminal state.
///
/// Attempts are spaced by a constant interval with no backoff. The first
/// attempt fires immediately. Once `max_attempts` fetches have come back
/// `processing`, the next attempt fails with `ScoutError::Timeout` without
/// touching the network.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
  interval: Duration,
  max_attempts: u32,
}

impl Default for Poller {
  fn default() -> Self {
    Self::from(&PollSettings::default())
  }
}

impl From<&PollSettings> for Poller {
  fn from(settings: &PollSettings) -> Self {
    Self::new(settings.interval(), settings.max_attempts)
  }
}

impl Poller {
  pub fn new(interval: Duration, max_attempts: u32) -> Self {
    Self { interval, max_attempts }
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }

  pub async fn poll(&self, backend: &dyn SearchBackend, request_id: &str) -> Result<SearchRecord> {
    let mut attempt: u32 = 0;

    loop {
      attempt += 1;
      if attempt > self.max_attempts {
        tracing::warn!(request_id, attempts = attempt, "search poll budget exhausted");
        return Err(ScoutError::Timeout { attempts: attempt });
      }

      let record = backend.get_search_result(request_id).await?;
      tracing::debug!(request_id, attempt, status = ?record.status, "polled search");

      match record.status {
        SearchStatus::Completed => return Ok(record),
        SearchStatus::Failed => {
          let message = record.error.filter(|e| !e.is_empty()).unwrap_or_else(|| "Search failed".to_string());
          return Err(ScoutError::search_failed(message));
        }
        SearchStatus::Processing => tokio::time::sleep(self.interval).await,
      }
    }
  }
}
