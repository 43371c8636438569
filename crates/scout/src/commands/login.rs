use anyhow::Result;

use super::Context;
use crate::auth::Identity;
use crate::output;

/// Record the identity issued by the auth provider, pull that user's data,
/// and optionally run the search that was waiting on sign-in.
pub async fn handle(
  ctx: &Context,
  user_id: String,
  token: String,
  email: Option<String>,
  then_search: Option<String>,
) -> Result<()> {
  let identity = Identity { user_id, token, email };
  ctx.auth().save(&identity)?;
  output::success(&format!("Signed in as {}", identity.email.as_deref().unwrap_or(&identity.user_id)));

  let mut orchestrator = ctx.orchestrator()?;
  if let Err(e) = orchestrator.load_user_data().await {
    tracing::warn!(error = %e, "failed to load user data");
    output::warn("Could not load your saved history and tracked people");
  }

  if let Some(query) = then_search {
    super::search::run(&mut orchestrator, &query, false).await?;
  }

  ctx.save(&orchestrator)
}
