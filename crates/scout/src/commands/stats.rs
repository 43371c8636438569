use anyhow::Result;

use super::Context;
use crate::display;

pub async fn handle(ctx: &Context) -> Result<()> {
  let stats = ctx.search_client()?.evidence_stats().await;
  display::display_stats(&stats);
  Ok(())
}
