use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::tracking;
use crate::search::evidence::EvidenceOutcome;
use crate::search::{Candidate, SearchRecord};
use crate::userdata::{HistoryItem, TrackedPerson};

/// What the results view currently shows. Results and error never coexist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DisplayState {
  #[default]
  Idle,
  Results(SearchRecord),
  Error(String),
}

/// Lifecycle of the most recent search
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
  #[default]
  Idle,
  Submitted,
  Polling,
  Completed,
  EvidencePolling,
  EvidenceEnriched,
  CompletedFinal,
  Failed,
  TimedOut,
}

/// Result of picking an entry from the history list
#[derive(Debug, Clone, PartialEq)]
pub enum HistorySelection {
  /// Stored results, shown again without a request
  ShowResults(SearchRecord),
  /// Stored error, shown again
  ShowError(String),
  /// Nothing stored; run the query again
  Rerun(String),
}

/// Client-side view of one user's searching session.
///
/// Every mutation happens through `&mut self` from a single task; the
/// evidence refresher hands back whole records rather than touching this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionState {
  #[serde(default)]
  pub history: Vec<HistoryItem>,
  #[serde(default)]
  pub tracked: Vec<TrackedPerson>,
  #[serde(default)]
  pub display: DisplayState,
  #[serde(default)]
  pub phase: SearchPhase,
  #[serde(default)]
  pub current_query: Option<String>,
  /// Id of the matching record on the user-data backend, if one was created
  #[serde(default)]
  pub linked_search_id: Option<i64>,
}

impl SessionState {
  pub fn new() -> Self {
    Self::default()
  }

  /// A new submission clears the previous display and linkage.
  pub fn begin(&mut self, query: &str) {
    self.current_query = Some(query.to_string());
    self.display = DisplayState::Idle;
    self.linked_search_id = None;
    self.phase = SearchPhase::Submitted;
  }

  pub fn set_phase(&mut self, phase: SearchPhase) {
    self.phase = phase;
  }

  pub fn displayed_record(&self) -> Option<&SearchRecord> {
    match &self.display {
      DisplayState::Results(record) => Some(record),
      _ => None,
    }
  }

  pub fn displayed_error(&self) -> Option<&str> {
    match &self.display {
      DisplayState::Error(message) => Some(message),
      _ => None,
    }
  }

  pub fn record_success(&mut self, query: &str, record: SearchRecord) -> &HistoryItem {
    self.display = DisplayState::Results(record.clone());
    self.phase = SearchPhase::Completed;
    self.prepend_history(query, Some(record), None)
  }

  pub fn record_failure(&mut self, query: &str, message: &str, timed_out: bool) -> &HistoryItem {
    self.display = DisplayState::Error(message.to_string());
    self.phase = if timed_out { SearchPhase::TimedOut } else { SearchPhase::Failed };
    self.prepend_history(query, None, Some(message.to_string()))
  }

  fn prepend_history(
    &mut self,
    query: &str,
    results: Option<SearchRecord>,
    error: Option<String>,
  ) -> &HistoryItem {
    let now = Utc::now();
    let item = HistoryItem {
      id: self.unique_history_id(now.timestamp_millis()),
      query: query.to_string(),
      timestamp: now,
      results,
      error,
    };
    self.history.insert(0, item);
    &self.history[0]
  }

  fn unique_history_id(&self, millis: i64) -> String {
    let base = millis.to_string();
    let taken = |id: &str| self.history.iter().any(|h| h.id == id);
    if !taken(&base) {
      return base;
    }
    (1..).map(|n| format!("{base}-{n}")).find(|id| !taken(id)).unwrap_or(base)
  }

  /// Swap in an evidence-enriched record. Ignored unless it belongs to the
  /// request currently on screen.
  pub fn apply_evidence(&mut self, record: SearchRecord) -> bool {
    let matches =
      self.displayed_record().is_some_and(|current| current.request_id == record.request_id);
    if !matches {
      return false;
    }

    if let Some(item) = self
      .history
      .iter_mut()
      .find(|h| h.results.as_ref().is_some_and(|r| r.request_id == record.request_id))
    {
      item.results = Some(record.clone());
    }

    self.display = DisplayState::Results(record);
    self.phase = SearchPhase::EvidenceEnriched;
    true
  }

  pub fn finish_evidence(&mut self, outcome: EvidenceOutcome) -> bool {
    match outcome {
      EvidenceOutcome::Enriched(record) => self.apply_evidence(record),
      EvidenceOutcome::Exhausted { .. } => {
        if self.phase == SearchPhase::EvidencePolling {
          self.phase = SearchPhase::CompletedFinal;
        }
        false
      }
      EvidenceOutcome::Cancelled => false,
    }
  }

  /// End a completed search without (further) evidence polling: results
  /// that already carry evidence count as enriched, the rest are final.
  pub fn settle_evidence(&mut self) {
    if !matches!(self.phase, SearchPhase::Completed | SearchPhase::EvidencePolling) {
      return;
    }
    self.phase = if self.displayed_record().is_some_and(SearchRecord::has_evidence) {
      SearchPhase::EvidenceEnriched
    } else {
      SearchPhase::CompletedFinal
    };
  }

  /// Closing the results view forgets the linked record id and any error.
  pub fn close_results(&mut self) {
    self.display = DisplayState::Idle;
    self.linked_search_id = None;
  }

  pub fn select_history(&mut self, id: &str) -> Option<HistorySelection> {
    let item = self.history.iter().find(|h| h.id == id)?.clone();
    self.current_query = Some(item.query.clone());

    let selection = if let Some(results) = item.results {
      self.display = DisplayState::Results(results.clone());
      HistorySelection::ShowResults(results)
    } else if let Some(error) = item.error {
      self.display = DisplayState::Error(error.clone());
      HistorySelection::ShowError(error)
    } else {
      HistorySelection::Rerun(item.query)
    };
    Some(selection)
  }

  pub fn clear_history(&mut self) {
    self.history.clear();
  }

  pub fn delete_history_item(&mut self, id: &str) -> bool {
    let before = self.history.len();
    self.history.retain(|h| h.id != id);
    self.history.len() != before
  }

  pub fn toggle_tracking(&mut self, candidate: &Candidate, today: NaiveDate) -> TrackedPerson {
    let query = self.current_query.clone().unwrap_or_default();
    tracking::toggle(&mut self.tracked, candidate, &query, today)
  }

  pub fn toggle_tracked(&mut self, person_id: &str) -> Option<TrackedPerson> {
    let person = self.tracked.iter_mut().find(|p| p.id == person_id)?;
    person.is_tracking = !person.is_tracking;
    Some(person.clone())
  }

  pub fn remove_tracked(&mut self, person_id: &str) -> Option<TrackedPerson> {
    let index = self.tracked.iter().position(|p| p.id == person_id)?;
    Some(self.tracked.remove(index))
  }

  pub fn is_tracking(&self, candidate: &Candidate) -> bool {
    let key = candidate.identity_key();
    self.tracked.iter().any(|p| p.id == key && p.is_tracking)
  }

  /// Replace both lists with what the backend has for the signed-in user.
  pub fn load_user_data(&mut self, history: Vec<HistoryItem>, tracked: Vec<TrackedPerson>) {
    self.history = history;
    self.tracked = tracked;
  }

  /// Without an identity nothing user-specific is kept.
  pub fn sign_out(&mut self) {
    self.history.clear();
    self.tracked.clear();
    self.linked_search_id = None;
  }
}
