use anyhow::Result;

use super::Context;
use crate::output;

pub async fn handle(ctx: &Context) -> Result<()> {
  let mut orchestrator = ctx.orchestrator()?;
  orchestrator.sign_out();
  ctx.auth().clear()?;
  ctx.save(&orchestrator)?;

  output::success("Signed out");
  Ok(())
}
