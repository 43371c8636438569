use anyhow::Result;

use super::Context;
use crate::display;
use crate::output;
use crate::search::evidence::{EvidenceOutcome, EvidenceRefresher};
use crate::session::{SearchOrchestrator, SubmitOutcome};
use crate::ScoutError;

pub async fn handle(ctx: &Context, query: String, max: Option<u32>, no_evidence: bool) -> Result<()> {
  if max == Some(0) {
    return Err(ScoutError::validation("--max must be at least 1").into());
  }

  let mut orchestrator = ctx.orchestrator()?;
  if let Some(max) = max {
    orchestrator = orchestrator.with_max_candidates(max);
  }

  run(&mut orchestrator, &query, no_evidence).await?;
  ctx.save(&orchestrator)
}

/// Submit a query and report the outcome, saving nothing.
pub(crate) async fn run(orchestrator: &mut SearchOrchestrator, query: &str, no_evidence: bool) -> Result<()> {
  output::info(&format!("Searching for \"{}\"...", query.trim()));
  let outcome = orchestrator.submit(query).await?;
  report(orchestrator, outcome, no_evidence).await;
  Ok(())
}

pub(crate) async fn report(orchestrator: &mut SearchOrchestrator, outcome: SubmitOutcome, no_evidence: bool) {
  match outcome {
    SubmitOutcome::EasterEgg => output::spotlight("You already found her"),
    SubmitOutcome::Failed { message, timed_out } => {
      output::spotlight(&message);
      if timed_out {
        output::info("The search is still running on the server; try again in a moment");
      }
    }
    SubmitOutcome::Completed(record) => {
      display::display_search_record(&record, orchestrator.state());
      output::success(&format!("Found {} candidate(s)", record.candidates.len()));

      if no_evidence || !EvidenceRefresher::applies_to(&record) || record.has_evidence() {
        orchestrator.skip_evidence();
        return;
      }
      wait_for_evidence(orchestrator).await;
    }
  }
}

async fn wait_for_evidence(orchestrator: &mut SearchOrchestrator) {
  let Some(handle) = orchestrator.spawn_evidence_refresh() else {
    orchestrator.skip_evidence();
    return;
  };
  output::info("Looking for evidence links (Ctrl-C to skip)...");

  tokio::select! {
    joined = handle => match joined {
      Ok(outcome) => {
        let enriched = match &outcome {
          EvidenceOutcome::Enriched(record) => Some(record.clone()),
          _ => None,
        };
        if orchestrator.apply_evidence_outcome(outcome) {
          if let Some(record) = enriched {
            output::success("Evidence arrived");
            display::display_search_record(&record, orchestrator.state());
          }
        } else {
          output::info("No evidence links yet");
        }
      }
      Err(e) => {
        tracing::warn!(error = %e, "evidence task failed");
        orchestrator.skip_evidence();
      }
    },
    _ = tokio::signal::ctrl_c() => {
      orchestrator.skip_evidence();
      output::warn("Stopped waiting for evidence");
    }
  }
}
