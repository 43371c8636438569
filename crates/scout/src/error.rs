use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Error, Debug)]
pub enum ScoutError {
  #[error("Network error: {message}")]
  Network { message: String },

  #[error("{message}")]
  Backend { status: u16, message: String },

  #[error("{message}")]
  SearchFailed { message: String },

  #[error("Search timeout - please try again")]
  Timeout { attempts: u32 },

  #[error("Invalid input: {message}")]
  Validation { message: String },

  #[error("Failed to decode response: {message}")]
  Decode { message: String },

  #[error("OAuth failed: {message}")]
  OAuth { message: String },

  #[error("Configuration error: {message}")]
  Config { message: String },

  #[error("Stored credentials unusable: {message}")]
  Credentials { message: String },

  #[error("Not signed in")]
  Unauthenticated,

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl ScoutError {
  pub fn network(message: impl Into<String>) -> Self {
    Self::Network { message: message.into() }
  }

  pub fn backend(status: u16, message: impl Into<String>) -> Self {
    Self::Backend { status, message: message.into() }
  }

  pub fn search_failed(message: impl Into<String>) -> Self {
    Self::SearchFailed { message: message.into() }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation { message: message.into() }
  }

  pub fn decode(message: impl Into<String>) -> Self {
    Self::Decode { message: message.into() }
  }

  pub fn oauth(message: impl Into<String>) -> Self {
    Self::OAuth { message: message.into() }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config { message: message.into() }
  }

  pub fn credentials(message: impl Into<String>) -> Self {
    Self::Credentials { message: message.into() }
  }

  /// True for the poll-budget outcome, as opposed to a backend-reported failure.
  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::Timeout { .. })
  }
}

impl From<reqwest::Error> for ScoutError {
  fn from(error: reqwest::Error) -> Self {
    if error.is_decode() {
      Self::decode(error.to_string())
    } else {
      Self::network(error.to_string())
    }
  }
}

impl From<serde_json::Error> for ScoutError {
  fn from(error: serde_json::Error) -> Self {
    Self::decode(error.to_string())
  }
}

impl From<serde_yaml::Error> for ScoutError {
  fn from(error: serde_yaml::Error) -> Self {
    Self::config(error.to_string())
  }
}

/// Pull a human-readable message out of a failed response body.
///
/// Prefers the JSON `detail` field, then `error`, then the raw text, and
/// finally a generic status line when the body is empty.
pub fn backend_message(status: u16, body: &str) -> String {
  if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
    for field in ["detail", "error"] {
      if let Some(message) = value.get(field).and_then(|v| v.as_str()) {
        if !message.is_empty() {
          return message.to_string();
        }
      }
    }
  }

  let trimmed = body.trim();
  if trimmed.is_empty() {
    format!("HTTP error! status: {status}")
  } else {
    trimmed.to_string()
  }
}
