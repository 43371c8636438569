//! Configuration management for scout
//!
//! Settings come from `config.yaml` in the scout home directory when present,
//! then environment overrides are applied on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Result, ScoutError};

pub const PRODUCTION_SEARCH_URL: &str = "https://knowledge-gpt-siuq.onrender.com";
pub const PRODUCTION_USER_API_URL: &str = "https://development-knowledge-gpt.onrender.com";
pub const LOCAL_BACKEND_URL: &str = "http://localhost:3001";

/// Which set of backend base URLs to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Production,
  Local,
}

impl std::str::FromStr for Environment {
  type Err = ScoutError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "production" | "prod" => Ok(Environment::Production),
      "local" | "dev" => Ok(Environment::Local),
      other => Err(ScoutError::config(format!(
        "Unknown environment: {other}. Use 'production' or 'local'"
      ))),
    }
  }
}

/// Poll loop budgets for the primary search and the evidence follow-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
  #[serde(default = "default_interval_ms")]
  pub interval_ms: u64,
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  #[serde(default = "default_interval_ms")]
  pub evidence_interval_ms: u64,
  #[serde(default = "default_evidence_max_attempts")]
  pub evidence_max_attempts: u32,
}

fn default_interval_ms() -> u64 {
  2000
}
fn default_max_attempts() -> u32 {
  60
}
fn default_evidence_max_attempts() -> u32 {
  30
}

impl Default for PollSettings {
  fn default() -> Self {
    Self {
      interval_ms: default_interval_ms(),
      max_attempts: default_max_attempts(),
      evidence_interval_ms: default_interval_ms(),
      evidence_max_attempts: default_evidence_max_attempts(),
    }
  }
}

impl PollSettings {
  pub fn interval(&self) -> Duration {
    Duration::from_millis(self.interval_ms)
  }

  pub fn evidence_interval(&self) -> Duration {
    Duration::from_millis(self.evidence_interval_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSpotSettings {
  #[serde(default)]
  pub client_id: String,
  #[serde(default = "default_redirect_uri")]
  pub redirect_uri: String,
  #[serde(default = "default_scopes")]
  pub scopes: Vec<String>,
  #[serde(default = "default_authorize_url")]
  pub authorize_url: String,
}

fn default_redirect_uri() -> String {
  "http://localhost:5173/oauth/hubspot/callback".to_string()
}
fn default_scopes() -> Vec<String> {
  vec!["crm.objects.contacts.write".to_string(), "crm.objects.contacts.read".to_string()]
}
fn default_authorize_url() -> String {
  "https://app.hubspot.com/oauth/authorize".to_string()
}

impl Default for HubSpotSettings {
  fn default() -> Self {
    Self {
      client_id: String::new(),
      redirect_uri: default_redirect_uri(),
      scopes: default_scopes(),
      authorize_url: default_authorize_url(),
    }
  }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub environment: Environment,
  /// Search generation backend; derived from `environment` when unset
  #[serde(default)]
  pub search_url: Option<String>,
  /// User-data backend; derived from `environment` when unset
  #[serde(default)]
  pub user_api_url: Option<String>,
  /// OAuth / CRM backend; falls back to the user-data backend
  #[serde(default)]
  pub integration_url: Option<String>,
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
  #[serde(default = "default_max_candidates")]
  pub max_candidates: u32,
  #[serde(default)]
  pub poll: PollSettings,
  #[serde(default)]
  pub hubspot: HubSpotSettings,
}

fn default_request_timeout_secs() -> u64 {
  30
}
fn default_max_candidates() -> u32 {
  2
}

impl Default for Config {
  fn default() -> Self {
    Self {
      environment: Environment::default(),
      search_url: None,
      user_api_url: None,
      integration_url: None,
      request_timeout_secs: default_request_timeout_secs(),
      max_candidates: default_max_candidates(),
      poll: PollSettings::default(),
      hubspot: HubSpotSettings::default(),
    }
  }
}

impl Config {
  /// Load from the scout home directory, then apply environment overrides.
  pub fn load() -> Result<Self> {
    let path = scout_home()?.join("config.yaml");
    let mut config = Self::from_file(&path)?;
    config.apply_env_overrides()?;
    Ok(config)
  }

  /// Read a config file; a missing file yields the defaults.
  pub fn from_file(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
  }

  pub fn apply_env_overrides(&mut self) -> Result<()> {
    if let Ok(env) = std::env::var("SCOUT_ENV") {
      self.environment = env.parse()?;
    }
    if let Ok(url) = std::env::var("SCOUT_SEARCH_URL") {
      self.search_url = Some(url);
    }
    if let Ok(url) = std::env::var("SCOUT_USER_API_URL") {
      self.user_api_url = Some(url);
    }
    self.validate()
  }

  pub fn validate(&self) -> Result<()> {
    if self.poll.max_attempts == 0 {
      return Err(ScoutError::config("poll.max_attempts must be at least 1"));
    }
    if self.max_candidates == 0 {
      return Err(ScoutError::config("max_candidates must be at least 1"));
    }
    for url in [&self.search_url, &self.user_api_url, &self.integration_url].into_iter().flatten() {
      url::Url::parse(url).map_err(|e| ScoutError::config(format!("Invalid URL '{url}': {e}")))?;
    }
    Ok(())
  }

  pub fn search_url(&self) -> String {
    self.search_url.clone().unwrap_or_else(|| match self.environment {
      Environment::Production => PRODUCTION_SEARCH_URL.to_string(),
      Environment::Local => LOCAL_BACKEND_URL.to_string(),
    })
  }

  pub fn user_api_url(&self) -> String {
    self.user_api_url.clone().unwrap_or_else(|| match self.environment {
      Environment::Production => PRODUCTION_USER_API_URL.to_string(),
      Environment::Local => LOCAL_BACKEND_URL.to_string(),
    })
  }

  pub fn integration_url(&self) -> String {
    self.integration_url.clone().unwrap_or_else(|| self.user_api_url())
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

/// Directory holding config, credentials and the session snapshot.
///
/// `SCOUT_HOME` wins, otherwise `~/.scout`.
pub fn scout_home() -> Result<PathBuf> {
  if let Ok(dir) = std::env::var("SCOUT_HOME") {
    return Ok(PathBuf::from(dir));
  }

  dirs::home_dir()
    .map(|home| home.join(".scout"))
    .ok_or_else(|| ScoutError::config("Could not determine home directory"))
}
