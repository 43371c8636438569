use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::Context;
use crate::display;
use crate::output;
use crate::session::HistoryView;

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryAction {
  /// List past searches, newest first
  List,
  /// Show the stored results or error of a past search
  Show {
    /// History item id
    id: String,
  },
  /// Forget every past search
  Clear,
  /// Forget one past search
  Delete {
    /// History item id
    id: String,
  },
}

pub async fn handle(ctx: &Context, action: Option<HistoryAction>) -> Result<()> {
  let mut orchestrator = ctx.orchestrator()?;

  match action.unwrap_or(HistoryAction::List) {
    HistoryAction::List => display::display_history(&orchestrator.state().history),
    HistoryAction::Show { id } => {
      let view = orchestrator.open_history(&id).await?.ok_or_else(|| anyhow!("No history item with id {id}"))?;
      match view {
        HistoryView::Results(record) => display::display_search_record(&record, orchestrator.state()),
        HistoryView::Error(message) => output::spotlight(&message),
        HistoryView::Rerun(outcome) => {
          output::info("Nothing stored for this search, ran it again");
          super::search::report(&mut orchestrator, outcome, false).await;
        }
      }
    }
    HistoryAction::Clear => {
      orchestrator.clear_history().await;
      output::success("Search history cleared");
    }
    HistoryAction::Delete { id } => {
      if !orchestrator.delete_history_item(&id).await {
        return Err(anyhow!("No history item with id {id}"));
      }
      output::success(&format!("Deleted history item {id}"));
    }
  }

  ctx.save(&orchestrator)
}
