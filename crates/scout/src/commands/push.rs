use anyhow::{anyhow, Result};

use super::Context;
use crate::integrations::hubspot::{CrmContact, HubSpotClient};
use crate::integrations::IntegrationRegistry;
use crate::output;

/// Send a tracked person to HubSpot. A failed push is reported, not fatal.
pub async fn handle(ctx: &Context, person_id: String) -> Result<()> {
  let registry = IntegrationRegistry::load_from(&ctx.home)?;
  if !registry.is_connected("hubspot") {
    return Err(anyhow!("HubSpot is not connected. Run `scout integrations connect hubspot` first."));
  }

  let session = ctx.sessions().load_session()?;
  let person = session
    .tracked
    .iter()
    .find(|p| p.id == person_id)
    .ok_or_else(|| anyhow!("No tracked person '{person_id}'"))?;

  let client =
    HubSpotClient::new(&ctx.config.integration_url(), ctx.config.hubspot.clone(), ctx.config.request_timeout())?;
  match client.push_contact(&CrmContact::from(person)).await {
    Ok(()) => output::success(&format!("Pushed {} to HubSpot", person.name)),
    Err(e) => {
      tracing::warn!(person = %person.id, error = %e, "CRM push failed");
      output::warn(&format!("Could not push {} to HubSpot: {e}", person.name));
    }
  }

  Ok(())
}
