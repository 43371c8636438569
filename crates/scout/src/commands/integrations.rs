use anyhow::{anyhow, Result};
use clap::Subcommand;

use super::Context;
use crate::display;
use crate::integrations::hubspot::{self, HubSpotClient, OAuthStateStore};
use crate::integrations::IntegrationRegistry;
use crate::output;

#[derive(Subcommand, Debug, Clone)]
pub enum IntegrationAction {
  /// Show available integrations
  List,
  /// Connect an integration (HubSpot prints an authorization link)
  Connect { id: String },
  /// Disconnect an integration
  Disconnect { id: String },
  /// Finish a HubSpot authorization with the URL the browser was sent back to
  Callback { url: String },
}

pub async fn handle(ctx: &Context, action: Option<IntegrationAction>) -> Result<()> {
  let mut registry = IntegrationRegistry::load_from(&ctx.home)?;

  match action.unwrap_or(IntegrationAction::List) {
    IntegrationAction::List => display::display_integrations(registry.all()),
    IntegrationAction::Connect { id } if id == "hubspot" => {
      if ctx.config.hubspot.client_id.is_empty() {
        return Err(anyhow!("Set hubspot.client_id in config.yaml before connecting HubSpot"));
      }
      let state = OAuthStateStore::at(&ctx.home).issue()?;
      let url = hubspot::authorize_url(&ctx.config.hubspot, &state)?;
      output::info("Open this link to authorize HubSpot, then run `scout integrations callback <url>`:");
      println!("{url}");
    }
    IntegrationAction::Connect { id } => {
      let integration = registry.set_connected(&id, true)?.name.clone();
      registry.save()?;
      output::success(&format!("{integration} connected"));
    }
    IntegrationAction::Disconnect { id } => {
      let integration = registry.set_connected(&id, false)?.name.clone();
      registry.save()?;
      output::success(&format!("{integration} disconnected"));
    }
    IntegrationAction::Callback { url } => {
      let client =
        HubSpotClient::new(&ctx.config.integration_url(), ctx.config.hubspot.clone(), ctx.config.request_timeout())?;
      let token = client.complete_callback(&url, &OAuthStateStore::at(&ctx.home)).await?;
      tracing::debug!(token_type = ?token.token_type, expires_in = ?token.expires_in, "hubspot token issued");

      registry.set_connected("hubspot", true)?;
      registry.save()?;
      output::success("Successfully connected to HubSpot!");
    }
  }

  Ok(())
}
