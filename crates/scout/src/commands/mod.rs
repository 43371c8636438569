use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthStore, Identity};
use crate::config::{scout_home, Environment};
use crate::search::client::{HttpSearchClient, SearchClientConfig};
use crate::session::{SearchOrchestrator, SessionManager};
use crate::userdata::client::{HttpUserDataClient, UserDataClientConfig};
use crate::Config;

pub mod exclusions;
pub mod history;
pub mod integrations;
pub mod login;
pub mod logout;
pub mod push;
pub mod search;
pub mod stats;
pub mod track;

/// Everything a command needs to reach local state and the backends
pub struct Context {
  pub config: Config,
  pub home: PathBuf,
}

impl Context {
  pub fn load(environment: Option<Environment>) -> Result<Self> {
    let home = scout_home()?;
    let mut config = Config::load()?;
    if let Some(environment) = environment {
      config.environment = environment;
    }
    tracing::debug!(home = %home.display(), environment = ?config.environment, "loaded config");
    Ok(Self { config, home })
  }

  pub fn auth(&self) -> AuthStore {
    AuthStore::at(&self.home)
  }

  pub fn sessions(&self) -> SessionManager {
    SessionManager::at(&self.home)
  }

  pub fn identity(&self) -> Result<Option<Identity>> {
    Ok(self.auth().load()?)
  }

  pub fn search_client(&self) -> Result<HttpSearchClient> {
    Ok(HttpSearchClient::new(SearchClientConfig::from(&self.config))?)
  }

  pub fn user_client(&self, identity: Option<&Identity>) -> Result<HttpUserDataClient> {
    Ok(HttpUserDataClient::new(UserDataClientConfig::from(&self.config), identity)?)
  }

  /// Orchestrator over the saved session, signed in when credentials exist.
  pub fn orchestrator(&self) -> Result<SearchOrchestrator> {
    let state = self.sessions().load_session()?;
    let mut orchestrator = SearchOrchestrator::new(Arc::new(self.search_client()?))
      .with_config(&self.config)
      .with_state(state);

    if let Some(identity) = self.identity()? {
      let store = Arc::new(self.user_client(Some(&identity))?);
      orchestrator = orchestrator.with_user(store, identity);
    }
    Ok(orchestrator)
  }

  pub fn save(&self, orchestrator: &SearchOrchestrator) -> Result<()> {
    self.sessions().save_session(orchestrator.state())?;
    Ok(())
  }
}
