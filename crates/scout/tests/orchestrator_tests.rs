
use mock_search::{candidate, completed, failed, processing, with_evidence, MockSearchBackend, Reply};
use scout::search::evidence::{EvidenceOutcome, EvidenceRefresher};
use scout::search::poller::Poller;
use scout::session::{HistoryView, SearchOrchestrator, SearchPhase, SubmitOutcome};
use scout::ScoutError;
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(backend: &Arc<MockSearchBackend>) -> SearchOrchestrator {
  SearchOrchestrator::new(backend.clone()).with_polling(
    Poller::new(Duration::from_secs(2), 60),
    EvidenceRefresher::new(Duration::from_secs(2), 30),
  )
}

fn script(processing_replies: usize, last: Reply) -> Vec<Reply> {
  let mut replies: Vec<Reply> = (0..processing_replies).map(|_| processing()).collect();
  replies.push(last);
  replies
}

#[tokio::test(start_paused = true)]
async fn test_easter_egg_short_circuits() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(Vec::new())]));
  let mut orchestrator = orchestrator(&backend);

  let outcome = orchestrator.submit("  Find My Perfect WIFE ").await.unwrap();

  assert_eq!(outcome, SubmitOutcome::EasterEgg);
  assert_eq!(backend.creates(), 0);
  assert_eq!(backend.fetches(), 0);
  assert!(orchestrator.state().history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_blank_query_is_rejected() {
  let backend = Arc::new(MockSearchBackend::new(Vec::new()));
  let mut orchestrator = orchestrator(&backend);

  let err = orchestrator.submit("   ").await.unwrap_err();
  assert!(matches!(err, ScoutError::Validation { .. }));
  assert_eq!(backend.creates(), 0);
  assert!(orchestrator.state().history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_completes_on_last_allowed_attempt() {
  let backend = Arc::new(MockSearchBackend::new(script(59, completed(vec![candidate("Ada Park", None)]))));
  let mut orchestrator = orchestrator(&backend);

  let outcome = orchestrator.submit("fintech cto").await.unwrap();

  let SubmitOutcome::Completed(record) = outcome else {
    panic!("expected completion");
  };
  assert_eq!(record.request_id, "req-1");
  assert_eq!(backend.fetches(), 60);

  let state = orchestrator.state();
  assert_eq!(state.history.len(), 1);
  assert_eq!(state.history[0].query, "fintech cto");
  assert_eq!(state.history[0].results.as_ref(), Some(&record));
  assert_eq!(state.displayed_record(), Some(&record));
  assert_eq!(state.phase, SearchPhase::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_times_out_after_sixty_fetches() {
  let backend = Arc::new(MockSearchBackend::new(vec![processing()]));
  let mut orchestrator = orchestrator(&backend);

  let started = tokio::time::Instant::now();
  let outcome = orchestrator.submit("fintech cto").await.unwrap();

  assert_eq!(
    outcome,
    SubmitOutcome::Failed { message: "Search timeout - please try again".to_string(), timed_out: true }
  );
  assert_eq!(backend.fetches(), 60);
  assert_eq!(started.elapsed(), Duration::from_secs(120));

  let state = orchestrator.state();
  assert_eq!(state.history.len(), 1);
  assert!(state.history[0].results.is_none());
  assert_eq!(state.history[0].error.as_deref(), Some("Search timeout - please try again"));
  assert_eq!(state.displayed_error(), Some("Search timeout - please try again"));
  assert_eq!(state.phase, SearchPhase::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_uses_server_message_or_default() {
  let backend = Arc::new(MockSearchBackend::new(script(2, failed(Some("Apollo quota exceeded")))));
  let mut orchestrator = orchestrator(&backend);

  let outcome = orchestrator.submit("fintech cto").await.unwrap();
  assert_eq!(outcome, SubmitOutcome::Failed { message: "Apollo quota exceeded".to_string(), timed_out: false });

  backend.reset(vec![failed(None)]);
  let outcome = orchestrator.submit("fintech cto again").await.unwrap();
  assert_eq!(outcome, SubmitOutcome::Failed { message: "Search failed".to_string(), timed_out: false });

  let state = orchestrator.state();
  assert_eq!(state.history.len(), 2);
  assert_eq!(state.history[0].query, "fintech cto again");
  assert_eq!(state.phase, SearchPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_create_failure_is_recorded() {
  let backend = Arc::new(MockSearchBackend::failing_create());
  let mut orchestrator = orchestrator(&backend);

  let outcome = orchestrator.submit("fintech cto").await.unwrap();

  assert_eq!(outcome, SubmitOutcome::Failed { message: "Search service unavailable".to_string(), timed_out: false });
  assert_eq!(backend.fetches(), 0);
  assert_eq!(orchestrator.state().history.len(), 1);
  assert_eq!(orchestrator.state().history[0].error.as_deref(), Some("Search service unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_error_during_poll_is_fatal() {
  let backend = Arc::new(MockSearchBackend::new(vec![processing(), Reply::Error("connection reset".to_string())]));
  let mut orchestrator = orchestrator(&backend);

  let outcome = orchestrator.submit("fintech cto").await.unwrap();

  assert_eq!(outcome, SubmitOutcome::Failed { message: "Network error: connection reset".to_string(), timed_out: false });
  assert_eq!(backend.fetches(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_prepends_one_history_item() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![candidate("Ada Park", None)])]));
  let mut orchestrator = orchestrator(&backend);

  for (n, query) in ["first", "second", "third"].into_iter().enumerate() {
    orchestrator.submit(query).await.unwrap();
    assert_eq!(orchestrator.state().history.len(), n + 1);
    assert_eq!(orchestrator.state().history[0].query, query);
  }

  let ids: std::collections::HashSet<_> = orchestrator.state().history.iter().map(|h| h.id.clone()).collect();
  assert_eq!(ids.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_evidence_replaces_displayed_record() {
  let plain = vec![candidate("Ada Park", None)];
  let enriched = vec![with_evidence(candidate("Ada Park", None))];
  let backend = Arc::new(MockSearchBackend::new(vec![
    completed(plain.clone()),
    completed(plain.clone()),
    Reply::Error("502 from upstream".to_string()),
    completed(enriched),
  ]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("fintech cto").await.unwrap();

  let started = tokio::time::Instant::now();
  let outcome = orchestrator.refresh_evidence().await.unwrap();

  let EvidenceOutcome::Enriched(record) = outcome else {
    panic!("expected evidence");
  };
  assert_eq!(started.elapsed(), Duration::from_secs(6));
  assert_eq!(backend.fetches(), 4);
  assert!(record.has_evidence());

  let state = orchestrator.state();
  assert_eq!(state.displayed_record(), Some(&record));
  assert_eq!(state.history[0].results.as_ref(), Some(&record));
  assert_eq!(state.phase, SearchPhase::EvidenceEnriched);
}

#[tokio::test(start_paused = true)]
async fn test_evidence_gives_up_silently_after_thirty_ticks() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![candidate("Ada Park", None)])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("fintech cto").await.unwrap();
  let before = orchestrator.state().displayed_record().cloned();

  let outcome = orchestrator.refresh_evidence().await.unwrap();

  assert_eq!(outcome, EvidenceOutcome::Exhausted { attempts: 30 });
  assert_eq!(backend.fetches(), 1 + 30);
  assert_eq!(orchestrator.state().displayed_record().cloned(), before);
  assert_eq!(orchestrator.state().phase, SearchPhase::CompletedFinal);
}

#[tokio::test(start_paused = true)]
async fn test_no_evidence_refresh_without_candidates() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(Vec::new())]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("fintech cto").await.unwrap();

  assert!(orchestrator.refresh_evidence().await.is_none());
  assert!(orchestrator.spawn_evidence_refresh().is_none());
  assert_eq!(backend.fetches(), 1);

  orchestrator.skip_evidence();
  assert_eq!(orchestrator.state().phase, SearchPhase::CompletedFinal);
}

#[tokio::test(start_paused = true)]
async fn test_skipping_evidence_settles_phase() {
  let ada = candidate("Ada Park", None);
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![with_evidence(ada.clone())])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("fintech cto").await.unwrap();
  orchestrator.skip_evidence();
  assert_eq!(orchestrator.state().phase, SearchPhase::EvidenceEnriched);

  backend.reset(vec![completed(vec![ada])]);
  orchestrator.submit("fintech cto").await.unwrap();
  let handle = orchestrator.spawn_evidence_refresh().unwrap();
  assert_eq!(orchestrator.state().phase, SearchPhase::EvidencePolling);

  orchestrator.skip_evidence();
  assert_eq!(handle.await.unwrap(), EvidenceOutcome::Cancelled);
  assert_eq!(orchestrator.state().phase, SearchPhase::CompletedFinal);
}

#[tokio::test(start_paused = true)]
async fn test_new_search_cancels_running_refresher() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![candidate("Ada Park", None)])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("first").await.unwrap();

  let handle = orchestrator.spawn_evidence_refresh().unwrap();
  orchestrator.submit("second").await.unwrap();

  assert_eq!(handle.await.unwrap(), EvidenceOutcome::Cancelled);
  assert!(!orchestrator.apply_evidence_outcome(EvidenceOutcome::Cancelled));
  assert_eq!(orchestrator.state().displayed_record().unwrap().request_id, "req-2");
}

#[tokio::test(start_paused = true)]
async fn test_stale_evidence_is_not_applied() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![candidate("Ada Park", None)])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("first").await.unwrap();
  orchestrator.submit("second").await.unwrap();

  let mut stale = orchestrator.state().history[1].results.clone().unwrap();
  stale.candidates = vec![with_evidence(candidate("Ada Park", None))];

  assert!(!orchestrator.apply_evidence_outcome(EvidenceOutcome::Enriched(stale)));
  assert_eq!(orchestrator.state().displayed_record().unwrap().request_id, "req-2");
  assert!(!orchestrator.state().displayed_record().unwrap().has_evidence());
}

#[tokio::test(start_paused = true)]
async fn test_history_selection_routes_by_stored_content() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![candidate("Ada Park", None)])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("works").await.unwrap();
  let ok_id = orchestrator.state().history[0].id.clone();

  let fetches = backend.fetches();
  let view = orchestrator.open_history(&ok_id).await.unwrap().unwrap();
  assert!(matches!(view, HistoryView::Results(ref r) if r.request_id == "req-1"));
  assert_eq!(backend.fetches(), fetches);

  backend.reset(vec![failed(Some("No matching people"))]);
  orchestrator.submit("breaks").await.unwrap();
  let err_id = orchestrator.state().history[0].id.clone();

  let fetches = backend.fetches();
  let view = orchestrator.open_history(&err_id).await.unwrap().unwrap();
  assert_eq!(view, HistoryView::Error("No matching people".to_string()));
  assert_eq!(orchestrator.state().displayed_error(), Some("No matching people"));
  assert_eq!(backend.fetches(), fetches);

  assert!(orchestrator.open_history("missing").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_history_entry_without_payload_reruns() {
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![candidate("Ada Park", None)])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("legacy query").await.unwrap();

  let mut state = orchestrator.into_state();
  state.history[0].results = None;
  state.history[0].error = None;
  let id = state.history[0].id.clone();

  let mut orchestrator = SearchOrchestrator::new(backend.clone()).with_state(state);
  let view = orchestrator.open_history(&id).await.unwrap().unwrap();

  assert!(matches!(view, HistoryView::Rerun(SubmitOutcome::Completed(_))));
  assert_eq!(backend.creates(), 2);
  assert_eq!(orchestrator.state().history.len(), 2);
  assert_eq!(orchestrator.state().history[0].query, "legacy query");
}

#[tokio::test(start_paused = true)]
async fn test_tracking_toggle_flips_without_duplicates() {
  let ada = candidate("Ada Park", Some("ada@ledgerly.io"));
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![ada.clone()])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("fintech cto").await.unwrap();

  let person = orchestrator.track(&ada).await;
  assert!(person.is_tracking);
  assert_eq!(person.id, "ada@ledgerly.io");
  assert_eq!(person.tracking_reason, "Added from search: \"fintech cto\"");

  assert!(!orchestrator.track(&ada).await.is_tracking);
  assert!(orchestrator.track(&ada).await.is_tracking);
  assert_eq!(orchestrator.state().tracked.len(), 1);
  assert!(orchestrator.state().is_tracking(&ada));

  assert!(orchestrator.remove_tracked("ada@ledgerly.io").await.is_some());
  assert!(orchestrator.state().tracked.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_clears_history_and_tracking() {
  let ada = candidate("Ada Park", None);
  let backend = Arc::new(MockSearchBackend::new(vec![completed(vec![ada.clone()])]));
  let mut orchestrator = orchestrator(&backend);
  orchestrator.submit("fintech cto").await.unwrap();
  orchestrator.track(&ada).await;

  orchestrator.sign_out();

  assert!(orchestrator.state().history.is_empty());
  assert!(orchestrator.state().tracked.is_empty());
  assert!(orchestrator.identity().is_none());
}
