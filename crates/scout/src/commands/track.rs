use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::Context;
use crate::display;
use crate::output;

#[derive(Subcommand, Debug, Clone)]
pub enum TrackAction {
  /// List tracked people
  List,
  /// Start tracking a candidate from the current results
  Add {
    /// Candidate email, or name when no email is shown
    key: String,
  },
  /// Flip tracking for a candidate in the current results or an entry in the list
  Toggle {
    /// Candidate email or name, or tracked person id
    key: String,
  },
  /// Drop someone from the tracking list
  Remove {
    /// Tracked person id
    id: String,
  },
}

pub async fn handle(ctx: &Context, action: Option<TrackAction>) -> Result<()> {
  let mut orchestrator = ctx.orchestrator()?;

  match action.unwrap_or(TrackAction::List) {
    TrackAction::List => display::display_tracked(&orchestrator.state().tracked),
    TrackAction::Add { key } => {
      let candidate = orchestrator
        .state()
        .displayed_record()
        .and_then(|record| record.find_candidate(&key))
        .cloned()
        .ok_or_else(|| anyhow!("No candidate '{key}' in the current results"))?;

      if orchestrator.state().is_tracking(&candidate) {
        output::info(&format!("Already tracking {}", candidate.name));
      } else {
        let person = orchestrator.track(&candidate).await;
        output::success(&format!("Now tracking {}", person.name));
      }
    }
    TrackAction::Toggle { key } => {
      let candidate = orchestrator
        .state()
        .displayed_record()
        .and_then(|record| record.find_candidate(&key))
        .cloned();

      let person = match candidate {
        Some(candidate) => orchestrator.track(&candidate).await,
        None => orchestrator
          .toggle_tracked(&key)
          .await
          .ok_or_else(|| anyhow!("No candidate or tracked person '{key}'"))?,
      };
      let verb = if person.is_tracking { "Now tracking" } else { "Paused tracking" };
      output::success(&format!("{verb} {}", person.name));
    }
    TrackAction::Remove { id } => {
      let person = orchestrator.remove_tracked(&id).await.ok_or_else(|| anyhow!("No tracked person '{id}'"))?;
      output::success(&format!("Removed {} from tracking", person.name));
    }
  }

  ctx.save(&orchestrator)
}
