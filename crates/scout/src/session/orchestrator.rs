//! Drives one user's searches end to end: create, poll, reconcile, and the
//! evidence follow-up, plus the best-effort writes to the user-data backend.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::reconciler::{HistorySelection, SearchPhase, SessionState};
use crate::auth::Identity;
use crate::config::Config;
use crate::search::evidence::{EvidenceOutcome, EvidenceRefresher};
use crate::search::poller::Poller;
use crate::search::{Candidate, SearchBackend, SearchRecord};
use crate::userdata::{PersonRecordRequest, SearchRecordRequest, TrackedPerson, UserDataStore};
use crate::{Result, ScoutError};

const EASTER_EGG_QUERY: &str = "find my perfect wife";

/// True for the one query that is answered without a search.
pub fn is_easter_egg(query: &str) -> bool {
  query.trim().to_lowercase() == EASTER_EGG_QUERY
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
  /// Short-circuited; nothing was sent and history is untouched
  EasterEgg,
  Completed(SearchRecord),
  Failed { message: String, timed_out: bool },
}

/// What opening a history entry led to
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
  Results(SearchRecord),
  Error(String),
  Rerun(SubmitOutcome),
}

struct SignedInUser {
  store: Arc<dyn UserDataStore>,
  identity: Identity,
}

pub struct SearchOrchestrator {
  search: Arc<dyn SearchBackend>,
  user: Option<SignedInUser>,
  poller: Poller,
  refresher: EvidenceRefresher,
  max_candidates: u32,
  state: SessionState,
  evidence_cancel: Option<CancellationToken>,
}

impl SearchOrchestrator {
  pub fn new(search: Arc<dyn SearchBackend>) -> Self {
    Self {
      search,
      user: None,
      poller: Poller::default(),
      refresher: EvidenceRefresher::default(),
      max_candidates: 2,
      state: SessionState::new(),
      evidence_cancel: None,
    }
  }

  pub fn with_config(mut self, config: &Config) -> Self {
    self.poller = Poller::from(&config.poll);
    self.refresher = EvidenceRefresher::from(&config.poll);
    self.max_candidates = config.max_candidates;
    self
  }

  pub fn with_polling(mut self, poller: Poller, refresher: EvidenceRefresher) -> Self {
    self.poller = poller;
    self.refresher = refresher;
    self
  }

  pub fn with_max_candidates(mut self, max_candidates: u32) -> Self {
    self.max_candidates = max_candidates;
    self
  }

  pub fn with_user(mut self, store: Arc<dyn UserDataStore>, identity: Identity) -> Self {
    self.user = Some(SignedInUser { store, identity });
    self
  }

  pub fn with_state(mut self, state: SessionState) -> Self {
    self.state = state;
    self
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn into_state(self) -> SessionState {
    self.state
  }

  pub fn identity(&self) -> Option<&Identity> {
    self.user.as_ref().map(|u| &u.identity)
  }

  /// Run a query to a terminal state.
  ///
  /// Backend failures and poll timeouts are not errors here: they come back
  /// as `SubmitOutcome::Failed` after being recorded in history. Only input
  /// validation fails the call itself.
  pub async fn submit(&mut self, query: &str) -> Result<SubmitOutcome> {
    let query = query.trim();
    if query.is_empty() {
      return Err(ScoutError::validation("Search query cannot be empty"));
    }
    if is_easter_egg(query) {
      tracing::debug!("easter egg query, skipping search");
      return Ok(SubmitOutcome::EasterEgg);
    }

    self.cancel_evidence();
    self.state.begin(query);

    match self.run_search(query).await {
      Ok(record) => {
        tracing::info!(request_id = %record.request_id, candidates = record.candidates.len(), "search completed");
        self.state.record_success(query, record.clone());
        self.save_latest_history().await;
        Ok(SubmitOutcome::Completed(record))
      }
      Err(e) => {
        let message = e.to_string();
        let timed_out = e.is_timeout();
        tracing::warn!(error = %message, timed_out, "search did not complete");
        self.state.record_failure(query, &message, timed_out);
        Ok(SubmitOutcome::Failed { message, timed_out })
      }
    }
  }

  async fn run_search(&mut self, query: &str) -> Result<SearchRecord> {
    let request_id = self.search.create_search(query, self.max_candidates).await?;
    tracing::debug!(%request_id, "search created");

    self.link_search_record(&request_id, query).await;

    self.state.set_phase(SearchPhase::Polling);
    self.poller.poll(self.search.as_ref(), &request_id).await
  }

  /// Mirror the search on the user-data backend. Failure only loses the link.
  async fn link_search_record(&mut self, request_id: &str, query: &str) {
    let Some(user) = &self.user else {
      return;
    };

    let request = SearchRecordRequest {
      request_id: request_id.to_string(),
      prompt: query.to_string(),
      filters: serde_json::json!({}),
    };
    match user.store.create_search_record(&request).await {
      Ok(record) => self.state.linked_search_id = Some(record.id),
      Err(e) => {
        tracing::warn!(request_id, error = %e, "failed to create search record");
        self.state.linked_search_id = None;
      }
    }
  }

  async fn save_latest_history(&self) {
    let (Some(user), Some(item)) = (&self.user, self.state.history.first()) else {
      return;
    };
    if let Err(e) = user.store.save_history_item(&user.identity.user_id, item).await {
      tracing::warn!(item_id = %item.id, error = %e, "failed to save history item");
    }
  }

  fn evidence_target(&self) -> Option<String> {
    self
      .state
      .displayed_record()
      .filter(|record| EvidenceRefresher::applies_to(record))
      .map(|record| record.request_id.clone())
  }

  /// Replace the previous refresher's token with a fresh one.
  fn next_evidence_token(&mut self) -> CancellationToken {
    self.cancel_evidence();
    let token = CancellationToken::new();
    self.evidence_cancel = Some(token.clone());
    token
  }

  pub fn cancel_evidence(&mut self) {
    if let Some(token) = self.evidence_cancel.take() {
      token.cancel();
    }
  }

  /// Wait for evidence on the displayed results and fold it in.
  ///
  /// Returns `None` when there is nothing to refresh.
  pub async fn refresh_evidence(&mut self) -> Option<EvidenceOutcome> {
    let request_id = self.evidence_target()?;
    let cancel = self.next_evidence_token();
    self.state.set_phase(SearchPhase::EvidencePolling);

    let outcome = self.refresher.run(self.search.as_ref(), &request_id, &cancel).await;
    self.apply_evidence_outcome(outcome.clone());
    Some(outcome)
  }

  /// Background variant of [`refresh_evidence`](Self::refresh_evidence).
  /// The caller hands the outcome back through `apply_evidence_outcome`.
  pub fn spawn_evidence_refresh(&mut self) -> Option<JoinHandle<EvidenceOutcome>> {
    let request_id = self.evidence_target()?;
    let cancel = self.next_evidence_token();
    self.state.set_phase(SearchPhase::EvidencePolling);

    let backend = Arc::clone(&self.search);
    let refresher = self.refresher;
    Some(tokio::spawn(async move { refresher.run(backend.as_ref(), &request_id, &cancel).await }))
  }

  pub fn apply_evidence_outcome(&mut self, outcome: EvidenceOutcome) -> bool {
    self.state.finish_evidence(outcome)
  }

  /// Stop any refresher and close out the lifecycle of the current results.
  pub fn skip_evidence(&mut self) {
    self.cancel_evidence();
    self.state.settle_evidence();
  }

  /// Toggle tracking for a candidate from the displayed results.
  pub async fn track(&mut self, candidate: &Candidate) -> TrackedPerson {
    let person = self.state.toggle_tracking(candidate, Utc::now().date_naive());

    if let Some(user) = &self.user {
      if person.is_tracking {
        if let Some(search_id) = self.state.linked_search_id {
          let request = PersonRecordRequest::from(candidate);
          if let Err(e) = user.store.add_person_to_search(search_id, &request).await {
            tracing::warn!(search_id, person = %person.id, error = %e, "failed to add person to search record");
          }
        }
      }
      self.save_tracked(&person).await;
    }

    person
  }

  pub async fn toggle_tracked(&mut self, person_id: &str) -> Option<TrackedPerson> {
    let person = self.state.toggle_tracked(person_id)?;
    self.save_tracked(&person).await;
    Some(person)
  }

  pub async fn remove_tracked(&mut self, person_id: &str) -> Option<TrackedPerson> {
    let person = self.state.remove_tracked(person_id)?;
    if let Some(user) = &self.user {
      if let Err(e) = user.store.delete_tracked_person(&user.identity.user_id, person_id).await {
        tracing::warn!(person = person_id, error = %e, "failed to delete tracked person");
      }
    }
    Some(person)
  }

  async fn save_tracked(&self, person: &TrackedPerson) {
    let Some(user) = &self.user else {
      return;
    };
    if let Err(e) = user.store.save_tracked_person(&user.identity.user_id, person).await {
      tracing::warn!(person = %person.id, error = %e, "failed to save tracked person");
    }
  }

  pub async fn clear_history(&mut self) {
    self.state.clear_history();
    if let Some(user) = &self.user {
      if let Err(e) = user.store.clear_history(&user.identity.user_id).await {
        tracing::warn!(error = %e, "failed to clear remote history");
      }
    }
  }

  pub async fn delete_history_item(&mut self, item_id: &str) -> bool {
    if !self.state.delete_history_item(item_id) {
      return false;
    }
    if let Some(user) = &self.user {
      if let Err(e) = user.store.delete_history_item(&user.identity.user_id, item_id).await {
        tracing::warn!(item_id, error = %e, "failed to delete remote history item");
      }
    }
    true
  }

  /// Open a history entry. Stored results and errors are shown as they
  /// were; an entry with neither runs its query again.
  pub async fn open_history(&mut self, item_id: &str) -> Result<Option<HistoryView>> {
    let view = match self.state.select_history(item_id) {
      None => return Ok(None),
      Some(HistorySelection::ShowResults(record)) => HistoryView::Results(record),
      Some(HistorySelection::ShowError(message)) => HistoryView::Error(message),
      Some(HistorySelection::Rerun(query)) => HistoryView::Rerun(self.submit(&query).await?),
    };
    Ok(Some(view))
  }

  /// Replace local lists with the signed-in user's data. Without a user
  /// both lists are emptied.
  pub async fn load_user_data(&mut self) -> Result<()> {
    let Some(user) = &self.user else {
      self.state.sign_out();
      return Ok(());
    };

    let history = user.store.load_history(&user.identity.user_id).await?;
    let tracked = user.store.load_tracked_people(&user.identity.user_id).await?;
    tracing::debug!(history = history.len(), tracked = tracked.len(), "loaded user data");
    self.state.load_user_data(history, tracked);
    Ok(())
  }

  pub fn sign_out(&mut self) {
    self.cancel_evidence();
    self.user = None;
    self.state.sign_out();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_easter_egg_matching() {
    assert!(is_easter_egg("find my perfect wife"));
    assert!(is_easter_egg("  Find My PERFECT Wife \n"));
    assert!(!is_easter_egg("find my perfect wife please"));
    assert!(!is_easter_egg("find a cto"));
  }
}
