use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, ScoutError};

pub mod hubspot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Integration {
  pub id: String,
  pub name: String,
  pub description: String,
  pub is_connected: bool,
  pub connect_url: String,
}

fn builtin_integrations() -> Vec<Integration> {
  vec![
    Integration {
      id: "hubspot".to_string(),
      name: "HubSpot".to_string(),
      description: "Sync contacts and leads automatically to your HubSpot CRM".to_string(),
      is_connected: false,
      connect_url: "https://app.hubspot.com/oauth/authorize".to_string(),
    },
    Integration {
      id: "slack".to_string(),
      name: "Slack".to_string(),
      description: "Get notifications and updates directly in your Slack workspace".to_string(),
      is_connected: false,
      connect_url: "https://slack.com/oauth/v2/authorize".to_string(),
    },
  ]
}

/// Known integrations and their connection flags, kept in `integrations.json`.
pub struct IntegrationRegistry {
  path: PathBuf,
  integrations: Vec<Integration>,
}

impl IntegrationRegistry {
  pub fn load_from(dir: &Path) -> Result<Self> {
    let path = dir.join("integrations.json");
    let mut integrations = builtin_integrations();

    if path.exists() {
      let saved: Vec<Integration> = serde_json::from_str(&fs::read_to_string(&path)?)?;
      for integration in &mut integrations {
        if let Some(stored) = saved.iter().find(|s| s.id == integration.id) {
          integration.is_connected = stored.is_connected;
        }
      }
    }

    Ok(Self { path, integrations })
  }

  pub fn save(&self) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.path, serde_json::to_string_pretty(&self.integrations)?)?;
    Ok(())
  }

  pub fn all(&self) -> &[Integration] {
    &self.integrations
  }

  pub fn get(&self, id: &str) -> Option<&Integration> {
    self.integrations.iter().find(|i| i.id == id)
  }

  pub fn is_connected(&self, id: &str) -> bool {
    self.get(id).is_some_and(|i| i.is_connected)
  }

  pub fn set_connected(&mut self, id: &str, connected: bool) -> Result<&Integration> {
    let integration = self
      .integrations
      .iter_mut()
      .find(|i| i.id == id)
      .ok_or_else(|| ScoutError::validation(format!("Unknown integration: {id}")))?;
    integration.is_connected = connected;
    Ok(integration)
  }
}
