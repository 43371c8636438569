use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use scout::commands::{
  self, exclusions::ExclusionAction, history::HistoryAction, integrations::IntegrationAction,
  track::TrackAction, Context,
};
use scout::config::Environment;
use scout::output;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Find people by describing them, then track the ones worth following")]
#[command(version)]
struct Cli {
  /// Backend environment (production or local)
  #[arg(long, global = true, env = "SCOUT_ENV")]
  env: Option<Environment>,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Describe the person you are looking for
  Search {
    /// Natural-language description, e.g. "fintech CTO in Berlin"
    query: String,
    /// Maximum number of candidates to ask for
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    max: Option<u32>,
    /// Do not wait for evidence links after results arrive
    #[arg(long)]
    no_evidence: bool,
  },
  /// Browse past searches
  History {
    #[command(subcommand)]
    action: Option<HistoryAction>,
  },
  /// Manage tracked people
  Track {
    #[command(subcommand)]
    action: Option<TrackAction>,
  },
  /// Store the identity issued by the auth provider
  Login {
    #[arg(long)]
    user_id: String,
    #[arg(long, env = "SCOUT_TOKEN", hide_env_values = true)]
    token: String,
    #[arg(long)]
    email: Option<String>,
    /// Run this search once signed in
    #[arg(long)]
    then_search: Option<String>,
  },
  /// Forget the stored identity and the user's local data
  Logout,
  /// Connect or disconnect CRM and messaging integrations
  Integrations {
    #[command(subcommand)]
    action: Option<IntegrationAction>,
  },
  /// Push a tracked person to HubSpot
  Push {
    /// Tracked person id
    id: String,
  },
  /// Manage LinkedIn profiles excluded from results
  Exclusions {
    #[command(subcommand)]
    action: Option<ExclusionAction>,
  },
  /// Show evidence finder health
  Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  // RUST_LOG wins when set
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if cli.verbose {
      EnvFilter::new("scout=debug,warn")
    } else {
      EnvFilter::new("scout=warn,error")
    }
  });
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let ctx = Context::load(cli.env)?;

  let result = match cli.command {
    Commands::Search { query, max, no_evidence } => commands::search::handle(&ctx, query, max, no_evidence).await,
    Commands::History { action } => commands::history::handle(&ctx, action).await,
    Commands::Track { action } => commands::track::handle(&ctx, action).await,
    Commands::Login { user_id, token, email, then_search } => {
      commands::login::handle(&ctx, user_id, token, email, then_search).await
    }
    Commands::Logout => commands::logout::handle(&ctx).await,
    Commands::Integrations { action } => commands::integrations::handle(&ctx, action).await,
    Commands::Push { id } => commands::push::handle(&ctx, id).await,
    Commands::Exclusions { action } => commands::exclusions::handle(&ctx, action).await,
    Commands::Stats => commands::stats::handle(&ctx).await,
  };

  if let Err(e) = result {
    output::error(&format!("{e:#}"));
    std::process::exit(1);
  }
  Ok(())
}
