pub mod auth;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod integrations;
pub mod output;
pub mod search;
pub mod session;
pub mod userdata;

// Re-export commonly used types for easier testing
pub use config::Config;
pub use error::{Result, ScoutError};
pub use search::{Candidate, SearchBackend, SearchRecord, SearchStatus};
pub use session::{SearchOrchestrator, SessionManager, SessionState, SubmitOutcome};
pub use userdata::{HistoryItem, TrackedPerson, UserDataStore};
