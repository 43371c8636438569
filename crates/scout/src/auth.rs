//! Authenticated identity handed to us by the external auth provider.
//!
//! scout never runs a sign-in flow itself: `scout login` records the user id
//! and bearer token the provider issued, `scout logout` forgets them. The
//! token is encrypted at rest with a per-home AES-256-GCM key.

use aes_gcm::{
  aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng},
  Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, ScoutError};

const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
  pub user_id: String,
  pub token: String,
  #[serde(default)]
  pub email: Option<String>,
}

/// On-disk shape of `credentials.json`; the token is base64(nonce || ciphertext).
#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
  user_id: String,
  encrypted_token: String,
  #[serde(default)]
  email: Option<String>,
}

/// AES key kept next to the credentials as `master.key`.
struct CryptoManager {
  key_path: PathBuf,
}

impl CryptoManager {
  fn at(dir: &Path) -> Self {
    Self { key_path: dir.join("master.key") }
  }

  fn generate_key(&self) -> Result<()> {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);

    if let Some(parent) = self.key_path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.key_path, STANDARD.encode(key))?;
    restrict_permissions(&self.key_path)?;

    tracing::debug!("generated credential key at {}", self.key_path.display());
    Ok(())
  }

  fn load_key(&self) -> Result<[u8; 32]> {
    let key_b64 = fs::read_to_string(&self.key_path)?;
    let key_bytes = STANDARD
      .decode(key_b64.trim())
      .map_err(|e| ScoutError::credentials(format!("Unreadable key file: {e}")))?;

    let key: [u8; 32] = key_bytes.try_into().map_err(|_| ScoutError::credentials("Invalid key length"))?;
    Ok(key)
  }

  fn encrypt_value(&self, value: &str) -> Result<String> {
    if !self.key_path.exists() {
      self.generate_key()?;
    }
    let key_bytes = self.load_key()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);
    let ciphertext = cipher
      .encrypt(&nonce, value.as_bytes())
      .map_err(|e| ScoutError::credentials(format!("Encryption failed: {e}")))?;

    let mut combined = nonce.to_vec();
    combined.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(combined))
  }

  fn decrypt_value(&self, encrypted_value: &str) -> Result<String> {
    let key_bytes = self.load_key()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let combined = STANDARD
      .decode(encrypted_value)
      .map_err(|e| ScoutError::credentials(format!("Invalid encrypted data: {e}")))?;
    if combined.len() < NONCE_LEN {
      return Err(ScoutError::credentials("Invalid encrypted data"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let plaintext = cipher
      .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
      .map_err(|e| ScoutError::credentials(format!("Decryption failed: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| ScoutError::credentials(e.to_string()))
  }
}

fn restrict_permissions(path: &Path) -> Result<()> {
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
  }
  #[cfg(not(unix))]
  let _ = path;
  Ok(())
}

/// Stores the current identity as `credentials.json` in the scout home.
pub struct AuthStore {
  path: PathBuf,
  crypto: CryptoManager,
}

impl AuthStore {
  pub fn at(dir: &Path) -> Self {
    Self { path: dir.join("credentials.json"), crypto: CryptoManager::at(dir) }
  }

  pub fn load(&self) -> Result<Option<Identity>> {
    if !self.path.exists() {
      return Ok(None);
    }

    let content = fs::read_to_string(&self.path)?;
    let stored: StoredIdentity = serde_json::from_str(&content)?;
    let token = self.crypto.decrypt_value(&stored.encrypted_token)?;

    Ok(Some(Identity { user_id: stored.user_id, token, email: stored.email }))
  }

  pub fn save(&self, identity: &Identity) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }

    let stored = StoredIdentity {
      user_id: identity.user_id.clone(),
      encrypted_token: self.crypto.encrypt_value(&identity.token)?,
      email: identity.email.clone(),
    };
    fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
    restrict_permissions(&self.path)
  }

  /// Forget the identity. The key stays so a later login reuses it.
  pub fn clear(&self) -> Result<()> {
    if self.path.exists() {
      fs::remove_file(&self.path)?;
    }
    Ok(())
  }
}
