use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

pub mod orchestrator;
pub mod reconciler;
pub mod tracking;

pub use orchestrator::{is_easter_egg, HistoryView, SearchOrchestrator, SubmitOutcome};
pub use reconciler::{DisplayState, HistorySelection, SearchPhase, SessionState};

/// Persists the session snapshot between CLI invocations
pub struct SessionManager {
  session_dir: PathBuf,
}

impl SessionManager {
  pub fn new() -> Result<Self> {
    Ok(Self::at(&crate::config::scout_home()?))
  }

  pub fn at(dir: &Path) -> Self {
    Self { session_dir: dir.to_path_buf() }
  }

  fn session_file(&self) -> PathBuf {
    self.session_dir.join("session.json")
  }

  pub fn save_session(&self, session: &SessionState) -> Result<()> {
    fs::create_dir_all(&self.session_dir)?;
    let json = serde_json::to_string_pretty(session)?;
    fs::write(self.session_file(), json)?;
    Ok(())
  }

  /// Missing file means a fresh session.
  pub fn load_session(&self) -> Result<SessionState> {
    let session_file = self.session_file();
    if !session_file.exists() {
      return Ok(SessionState::new());
    }

    let json = fs::read_to_string(session_file)?;
    Ok(serde_json::from_str(&json)?)
  }

  pub fn clear_session(&self) -> Result<()> {
    let session_file = self.session_file();
    if session_file.exists() {
      fs::remove_file(session_file)?;
    }
    Ok(())
  }
}
