use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{SearchBackend, SearchRecord};
use crate::config::PollSettings;

/// How an evidence refresh ended. None of these are errors.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceOutcome {
  /// A poll returned at least one candidate with evidence links
  Enriched(SearchRecord),
  /// The tick budget ran out without evidence showing up
  Exhausted { attempts: u32 },
  /// A newer search superseded this one
  Cancelled,
}

/// Best-effort follow-up poll for evidence links that the backend computes
/// after the main result completes.
///
/// Each tick waits one interval and then fetches, so the first fetch happens
/// one interval after start. Fetch errors are swallowed and the loop keeps going.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceRefresher {
  interval: Duration,
  max_attempts: u32,
}

impl Default for EvidenceRefresher {
  fn default() -> Self {
    Self::from(&PollSettings::default())
  }
}

impl From<&PollSettings> for EvidenceRefresher {
  fn from(settings: &PollSettings) -> Self {
    Self::new(settings.evidence_interval(), settings.evidence_max_attempts)
  }
}

impl EvidenceRefresher {
  pub fn new(interval: Duration, max_attempts: u32) -> Self {
    Self { interval, max_attempts }
  }

  /// Only worth running for a record that already has candidates.
  pub fn applies_to(record: &SearchRecord) -> bool {
    !record.candidates.is_empty()
  }

  pub async fn run(
    &self,
    backend: &dyn SearchBackend,
    request_id: &str,
    cancel: &CancellationToken,
  ) -> EvidenceOutcome {
    for attempt in 1..=self.max_attempts {
      tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          tracing::debug!(request_id, attempt, "evidence refresh cancelled");
          return EvidenceOutcome::Cancelled;
        }
        _ = tokio::time::sleep(self.interval) => {}
      }

      match backend.get_search_result(request_id).await {
        Ok(record) if record.has_evidence() => {
          tracing::info!(request_id, attempt, "evidence arrived");
          return EvidenceOutcome::Enriched(record);
        }
        Ok(_) => tracing::debug!(request_id, attempt, max = self.max_attempts, "no evidence yet"),
        Err(e) => tracing::debug!(request_id, attempt, error = %e, "evidence poll failed, continuing"),
      }
    }

    tracing::debug!(request_id, attempts = self.max_attempts, "evidence refresh timed out");
    EvidenceOutcome::Exhausted { attempts: self.max_attempts }
  }
}
