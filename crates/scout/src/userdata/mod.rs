use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::{decode, BehavioralData, Candidate, LinkedinProfile, SearchRecord};
use crate::Result;

pub mod client;

/// One search attempt as shown in the history list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryItem {
  pub id: String,
  pub query: String,
  #[serde(default = "Utc::now", deserialize_with = "decode::timestamp")]
  pub timestamp: DateTime<Utc>,
  #[serde(default)]
  pub results: Option<SearchRecord>,
  #[serde(default)]
  pub error: Option<String>,
}

/// A candidate the user chose to follow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPerson {
  /// Identity key of the candidate (email, else name)
  pub id: String,
  pub name: String,
  pub title: String,
  pub company: String,
  pub profile_photo: String,
  /// `YYYY-MM-DD`
  pub tracked_since: String,
  /// `YYYY-MM-DD`
  pub last_event: String,
  pub is_tracking: bool,
  pub tracking_reason: String,
  #[serde(default, deserialize_with = "decode::percent")]
  pub cmi: u8,
  #[serde(default, deserialize_with = "decode::percent")]
  pub rbfs: u8,
  #[serde(default, deserialize_with = "decode::percent")]
  pub ias: u8,
}

/// Body of `POST /api/search/create`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecordRequest {
  pub request_id: String,
  pub prompt: String,
  #[serde(default)]
  pub filters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecordResponse {
  pub id: i64,
  pub request_id: String,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub prompt: String,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/search/{id}/people`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonRecordRequest {
  pub name: String,
  pub title: String,
  pub company: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub linkedin_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub profile_photo_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  pub accuracy: u8,
  pub reasons: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub linkedin_profile: Option<LinkedinProfile>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub behavioral_data: Option<BehavioralData>,
}

impl From<&Candidate> for PersonRecordRequest {
  fn from(candidate: &Candidate) -> Self {
    // Only the profile summary is sent; experience/education stay local.
    let linkedin_profile = candidate
      .linkedin_profile
      .as_ref()
      .and_then(|p| p.summary.clone())
      .map(|summary| LinkedinProfile { summary: Some(summary), ..LinkedinProfile::default() });

    Self {
      name: candidate.name.clone(),
      title: candidate.title.clone(),
      company: candidate.company.clone(),
      email: candidate.email.clone(),
      linkedin_url: candidate.linkedin_url.clone(),
      profile_photo_url: candidate.profile_photo_url.clone(),
      location: candidate.location.clone(),
      accuracy: candidate.accuracy,
      reasons: candidate.reasons.clone(),
      linkedin_profile,
      behavioral_data: candidate.behavioral_data.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonRecordResponse {
  pub id: i64,
  pub search_id: i64,
  pub name: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub company: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

/// A LinkedIn profile excluded from future results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exclusion {
  pub id: i64,
  pub linkedin_url: String,
  pub created_at: DateTime<Utc>,
}

/// User-data backend abstraction. Every per-user call is keyed by the
/// authenticated user id.
#[async_trait]
pub trait UserDataStore: Send + Sync {
  async fn create_search_record(&self, request: &SearchRecordRequest) -> Result<SearchRecordResponse>;

  async fn add_person_to_search(
    &self,
    search_id: i64,
    person: &PersonRecordRequest,
  ) -> Result<PersonRecordResponse>;

  async fn load_history(&self, user_id: &str) -> Result<Vec<HistoryItem>>;

  async fn save_history_item(&self, user_id: &str, item: &HistoryItem) -> Result<()>;

  async fn delete_history_item(&self, user_id: &str, item_id: &str) -> Result<()>;

  async fn clear_history(&self, user_id: &str) -> Result<()>;

  async fn load_tracked_people(&self, user_id: &str) -> Result<Vec<TrackedPerson>>;

  async fn save_tracked_person(&self, user_id: &str, person: &TrackedPerson) -> Result<()>;

  async fn delete_tracked_person(&self, user_id: &str, person_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tracked_person_uses_camel_case() {
    let person = TrackedPerson {
      id: "ada@ledgerly.io".to_string(),
      name: "Ada Park".to_string(),
      title: "CTO".to_string(),
      company: "Ledgerly".to_string(),
      profile_photo: "https://media.licdn.com/ada.jpg".to_string(),
      tracked_since: "2025-07-30".to_string(),
      last_event: "2025-07-30".to_string(),
      is_tracking: true,
      tracking_reason: "Added from search: \"fintech cto\"".to_string(),
      cmi: 80,
      rbfs: 55,
      ias: 70,
    };

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(json["isTracking"], true);
    assert_eq!(json["trackedSince"], "2025-07-30");
    assert_eq!(json["profilePhoto"], "https://media.licdn.com/ada.jpg");
  }

  #[test]
  fn test_person_request_sends_only_profile_summary() {
    let candidate: Candidate = serde_json::from_value(serde_json::json!({
      "name": "Ada Park",
      "title": "CTO",
      "company": "Ledgerly",
      "accuracy": 88,
      "reasons": ["Scaled payments infra"],
      "linkedin_profile": {"summary": "Builder", "experience": [{"company": "Stripe"}]}
    }))
    .unwrap();

    let request = PersonRecordRequest::from(&candidate);
    let profile = request.linkedin_profile.unwrap();
    assert_eq!(profile.summary.as_deref(), Some("Builder"));
    assert!(profile.experience.is_empty());

    let json = serde_json::to_value(PersonRecordRequest::from(&candidate)).unwrap();
    assert!(json.get("email").is_none());
  }

  #[test]
  fn test_remote_history_and_tracked_decode_loosely() {
    let item: HistoryItem = serde_json::from_value(serde_json::json!({
      "id": "1722333333000",
      "query": "designer in Lisbon",
      "timestamp": "2025-07-30T10:00:00.5",
      "results": null,
      "error": "Search failed"
    }))
    .unwrap();
    assert_eq!(item.timestamp.to_rfc3339(), "2025-07-30T10:00:00.500+00:00");

    let person: TrackedPerson = serde_json::from_value(serde_json::json!({
      "id": "ada@ledgerly.io",
      "name": "Ada Park",
      "title": "CTO",
      "company": "Ledgerly",
      "profilePhoto": "",
      "trackedSince": "2025-07-30",
      "lastEvent": "2025-07-30",
      "isTracking": true,
      "trackingReason": "",
      "cmi": 79.6,
      "rbfs": 55
    }))
    .unwrap();
    assert_eq!((person.cmi, person.rbfs, person.ias), (80, 55, 0));
  }
}
