//! HubSpot OAuth and CRM contact push.
//!
//! The authorize step writes a random `state` next to the other scout files;
//! the callback must present the same value before any code is exchanged.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::config::HubSpotSettings;
use crate::search::client::check_status;
use crate::userdata::TrackedPerson;
use crate::{Result, ScoutError};

/// Token payload returned by the integration backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubSpotToken {
  pub access_token: String,
  #[serde(default)]
  pub refresh_token: Option<String>,
  #[serde(default)]
  pub expires_in: Option<u64>,
  #[serde(default)]
  pub token_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
  code: &'a str,
  redirect_uri: &'a str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CrmContact {
  pub name: String,
  pub title: String,
  pub company: String,
  pub email: Option<String>,
  pub source: String,
}

impl From<&TrackedPerson> for CrmContact {
  fn from(person: &TrackedPerson) -> Self {
    let email = person.id.contains('@').then(|| person.id.clone());
    Self {
      name: person.name.clone(),
      title: person.title.clone(),
      company: person.company.clone(),
      email,
      source: person.tracking_reason.clone(),
    }
  }
}

/// Pending `state` values for in-flight authorizations
pub struct OAuthStateStore {
  path: PathBuf,
}

impl OAuthStateStore {
  pub fn at(dir: &Path) -> Self {
    Self { path: dir.join("hubspot_oauth_state") }
  }

  pub fn issue(&self) -> Result<String> {
    let state = uuid::Uuid::new_v4().simple().to_string();
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.path, &state)?;
    Ok(state)
  }

  pub fn peek(&self) -> Result<Option<String>> {
    if !self.path.exists() {
      return Ok(None);
    }
    Ok(Some(fs::read_to_string(&self.path)?.trim().to_string()))
  }

  pub fn clear(&self) -> Result<()> {
    if self.path.exists() {
      fs::remove_file(&self.path)?;
    }
    Ok(())
  }
}

/// Build the URL the user opens to grant access.
pub fn authorize_url(settings: &HubSpotSettings, state: &str) -> Result<Url> {
  let mut url = Url::parse(&settings.authorize_url)
    .map_err(|e| ScoutError::config(format!("Invalid HubSpot authorize URL: {e}")))?;
  url
    .query_pairs_mut()
    .append_pair("client_id", &settings.client_id)
    .append_pair("redirect_uri", &settings.redirect_uri)
    .append_pair("scope", &settings.scopes.join(" "))
    .append_pair("state", state);
  Ok(url)
}

/// Extract the authorization code from a callback URL, checking the
/// provider error and the CSRF state first.
pub fn verify_callback(callback: &str, expected_state: Option<&str>) -> Result<String> {
  let url = Url::parse(callback).map_err(|e| ScoutError::oauth(format!("Invalid callback URL: {e}")))?;
  let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

  if let Some(error) = params.get("error") {
    let message = params.get("error_description").unwrap_or(error);
    return Err(ScoutError::oauth(message.clone()));
  }

  let code = params
    .get("code")
    .filter(|c| !c.is_empty())
    .ok_or_else(|| ScoutError::oauth("No authorization code received"))?;

  match (expected_state, params.get("state")) {
    (Some(expected), Some(state)) if expected == state => Ok(code.clone()),
    _ => Err(ScoutError::oauth("Invalid state parameter - possible CSRF attack")),
  }
}

pub struct HubSpotClient {
  client: Client,
  base_url: String,
  settings: HubSpotSettings,
}

impl HubSpotClient {
  pub fn new(base_url: &str, settings: HubSpotSettings, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| ScoutError::config(format!("Failed to create HTTP client: {e}")))?;
    Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), settings })
  }

  pub async fn exchange_code(&self, code: &str) -> Result<HubSpotToken> {
    let request = TokenExchangeRequest { code, redirect_uri: &self.settings.redirect_uri };
    let response = self
      .client
      .post(format!("{}/api/hubspot/oauth/token", self.base_url))
      .json(&request)
      .send()
      .await?;

    let response = check_status(response).await.map_err(|e| match e {
      ScoutError::Backend { message, .. } if message.starts_with("HTTP error!") => {
        ScoutError::oauth("Failed to exchange code for token")
      }
      ScoutError::Backend { message, .. } => ScoutError::oauth(message),
      other => other,
    })?;

    Ok(response.json().await?)
  }

  /// Run the whole callback: verify, exchange, and always drop the pending state.
  pub async fn complete_callback(&self, callback: &str, states: &OAuthStateStore) -> Result<HubSpotToken> {
    let expected = states.peek()?;
    let result = match verify_callback(callback, expected.as_deref()) {
      Ok(code) => self.exchange_code(&code).await,
      Err(e) => Err(e),
    };
    states.clear()?;
    result
  }

  pub async fn push_contact(&self, contact: &CrmContact) -> Result<()> {
    let response =
      self.client.post(format!("{}/api/hubspot/contacts", self.base_url)).json(contact).send().await?;
    check_status(response).await?;
    Ok(())
  }
}
