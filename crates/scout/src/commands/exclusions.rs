use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::Context;
use crate::display;
use crate::output;

#[derive(Subcommand, Debug, Clone)]
pub enum ExclusionAction {
  /// List excluded LinkedIn profiles
  List,
  /// Keep a LinkedIn profile out of future results
  Add { linkedin_url: String },
  /// Allow an excluded profile again
  Remove { linkedin_url: String },
}

pub async fn handle(ctx: &Context, action: Option<ExclusionAction>) -> Result<()> {
  let identity = ctx.identity()?.ok_or_else(|| anyhow!("Sign in with `scout login` to manage exclusions"))?;
  let client = ctx.user_client(Some(&identity))?;

  match action.unwrap_or(ExclusionAction::List) {
    ExclusionAction::List => display::display_exclusions(&client.list_exclusions().await?),
    ExclusionAction::Add { linkedin_url } => {
      let exclusion = client.add_exclusion(&linkedin_url).await?;
      output::success(&format!("Excluded {}", exclusion.linkedin_url));
    }
    ExclusionAction::Remove { linkedin_url } => {
      client.remove_exclusion(&linkedin_url).await?;
      output::success(&format!("Removed exclusion for {linkedin_url}"));
    }
  }

  Ok(())
}
