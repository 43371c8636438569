use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use decode::null_as_default;

pub mod client;
pub mod decode;
pub mod evidence;
pub mod poller;

/// Body of `POST /api/search`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
  pub prompt: String,
  pub max_candidates: u32,
  pub include_linkedin: bool,
  pub include_posts: bool,
}

impl SearchRequest {
  pub fn new(prompt: impl Into<String>, max_candidates: u32) -> Self {
    Self { prompt: prompt.into(), max_candidates, include_linkedin: true, include_posts: false }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
  Processing,
  Completed,
  Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonFilters {
  #[serde(default, deserialize_with = "null_as_default")]
  pub person_titles: Vec<String>,
  #[serde(default)]
  pub include_similar_titles: Option<bool>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub person_seniorities: Vec<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub person_locations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrganizationFilters {
  #[serde(default, deserialize_with = "null_as_default")]
  pub q_organization_keyword_tags: Vec<String>,
}

/// Filters the backend derived from the prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchFilters {
  #[serde(default, deserialize_with = "null_as_default")]
  pub person_filters: PersonFilters,
  #[serde(default, deserialize_with = "null_as_default")]
  pub organization_filters: OrganizationFilters,
  #[serde(default, deserialize_with = "null_as_default")]
  pub reasoning: String,
}

/// One poll response for a search request. Always replaced as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRecord {
  pub request_id: String,
  pub status: SearchStatus,
  #[serde(default, deserialize_with = "null_as_default")]
  pub prompt: String,
  #[serde(default)]
  pub filters: Option<SearchFilters>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub candidates: Vec<Candidate>,
  #[serde(default)]
  pub estimated_count: Option<u32>,
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default = "Utc::now", deserialize_with = "decode::timestamp")]
  pub created_at: DateTime<Utc>,
  #[serde(default, deserialize_with = "decode::optional_timestamp")]
  pub completed_at: Option<DateTime<Utc>>,
}

impl SearchRecord {
  /// True once any candidate carries at least one evidence link.
  pub fn has_evidence(&self) -> bool {
    self.candidates.iter().any(Candidate::has_evidence)
  }

  pub fn find_candidate(&self, key: &str) -> Option<&Candidate> {
    self.candidates.iter().find(|c| c.identity_key() == key)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LinkedinProfile {
  #[serde(default)]
  pub summary: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub experience: Vec<serde_json::Value>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub education: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
  #[serde(default, deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub company: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default, deserialize_with = "decode::percent")]
  pub accuracy: u8,
  #[serde(default, deserialize_with = "null_as_default")]
  pub reasons: Vec<String>,
  #[serde(default)]
  pub linkedin_url: Option<String>,
  #[serde(default)]
  pub profile_photo_url: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub linkedin_profile: Option<LinkedinProfile>,
  #[serde(default)]
  pub behavioral_data: Option<BehavioralData>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub evidence_urls: Vec<EvidenceUrl>,
  #[serde(default)]
  pub evidence_summary: Option<String>,
  #[serde(default)]
  pub evidence_confidence: Option<f64>,
}

impl Candidate {
  /// Email when present, otherwise name. Not guaranteed unique.
  pub fn identity_key(&self) -> &str {
    match self.email.as_deref() {
      Some(email) if !email.trim().is_empty() => email,
      _ => &self.name,
    }
  }

  pub fn has_evidence(&self) -> bool {
    !self.evidence_urls.is_empty()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Score {
  #[serde(default, deserialize_with = "decode::percent")]
  pub score: u8,
  #[serde(default, deserialize_with = "null_as_default")]
  pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BehavioralScores {
  /// Commitment Momentum Index
  #[serde(default, deserialize_with = "null_as_default")]
  pub cmi: Score,
  /// Risk-Barrier Focus Score
  #[serde(default, deserialize_with = "null_as_default")]
  pub rbfs: Score,
  /// Identity Alignment Signal
  #[serde(default, deserialize_with = "null_as_default")]
  pub ias: Score,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehavioralData {
  #[serde(default, deserialize_with = "null_as_default")]
  pub behavioral_insight: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub scores: BehavioralScores,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EvidenceType {
  NewsArticle,
  CompanyPage,
  SocialMedia,
  Publication,
  Interview,
  Profile,
  Other(String),
}

impl From<String> for EvidenceType {
  fn from(tag: String) -> Self {
    match tag.as_str() {
      "news_article" => EvidenceType::NewsArticle,
      "company_page" => EvidenceType::CompanyPage,
      "social_media" => EvidenceType::SocialMedia,
      "publication" => EvidenceType::Publication,
      "interview" => EvidenceType::Interview,
      "profile" => EvidenceType::Profile,
      _ => EvidenceType::Other(tag),
    }
  }
}

impl From<EvidenceType> for String {
  fn from(kind: EvidenceType) -> Self {
    kind.as_str().to_string()
  }
}

impl EvidenceType {
  pub fn as_str(&self) -> &str {
    match self {
      EvidenceType::NewsArticle => "news_article",
      EvidenceType::CompanyPage => "company_page",
      EvidenceType::SocialMedia => "social_media",
      EvidenceType::Publication => "publication",
      EvidenceType::Interview => "interview",
      EvidenceType::Profile => "profile",
      EvidenceType::Other(tag) => tag,
    }
  }
}

impl Default for EvidenceType {
  fn default() -> Self {
    EvidenceType::Other("other".to_string())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfidenceLevel {
  High,
  Medium,
  Low,
  #[default]
  Unknown,
}

impl From<String> for ConfidenceLevel {
  fn from(tag: String) -> Self {
    match tag.to_ascii_lowercase().as_str() {
      "high" => ConfidenceLevel::High,
      "medium" => ConfidenceLevel::Medium,
      "low" => ConfidenceLevel::Low,
      _ => ConfidenceLevel::Unknown,
    }
  }
}

impl From<ConfidenceLevel> for String {
  fn from(level: ConfidenceLevel) -> Self {
    level.as_str().to_string()
  }
}

impl ConfidenceLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      ConfidenceLevel::High => "high",
      ConfidenceLevel::Medium => "medium",
      ConfidenceLevel::Low => "low",
      ConfidenceLevel::Unknown => "unknown",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceUrl {
  pub url: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub evidence_type: EvidenceType,
  #[serde(default, deserialize_with = "null_as_default")]
  pub relevance_score: f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub confidence_level: ConfidenceLevel,
  #[serde(default, deserialize_with = "null_as_default")]
  pub supporting_explanation: String,
}

/// Evidence finder health as reported by `GET /api/evidence/stats`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceStats {
  pub finder_status: FinderStatus,
  pub diversity_metrics: DiversityMetrics,
  pub performance_metrics: PerformanceMetrics,
  pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinderStatus {
  Available,
  Unavailable,
  Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiversityMetrics {
  pub total_domains: u64,
  pub unique_sources: u64,
  pub domain_coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PerformanceMetrics {
  pub average_processing_time: f64,
  pub success_rate: f64,
  pub total_evidence_found: u64,
  #[serde(default)]
  pub evidence_types_distribution: std::collections::HashMap<String, u64>,
}

impl EvidenceStats {
  /// Placeholder shown when the stats endpoint cannot be reached.
  pub fn unavailable() -> Self {
    Self {
      finder_status: FinderStatus::Unavailable,
      diversity_metrics: DiversityMetrics::default(),
      performance_metrics: PerformanceMetrics::default(),
      last_updated: Utc::now(),
    }
  }
}

/// Search generation backend abstraction
#[async_trait]
pub trait SearchBackend: Send + Sync {
  /// Start a search and return the backend-assigned request id
  async fn create_search(&self, prompt: &str, max_candidates: u32) -> Result<String>;

  /// Fetch the current state of a search, once
  async fn get_search_result(&self, request_id: &str) -> Result<SearchRecord>;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(name: &str, email: Option<&str>) -> Candidate {
    serde_json::from_value(serde_json::json!({
      "name": name,
      "title": "CTO",
      "company": "Acme",
      "email": email,
      "accuracy": 91,
      "reasons": ["Led platform team"]
    }))
    .unwrap()
  }

  #[test]
  fn test_identity_key_prefers_email() {
    assert_eq!(candidate("Ada", Some("ada@acme.io")).identity_key(), "ada@acme.io");
    assert_eq!(candidate("Ada", None).identity_key(), "Ada");
    assert_eq!(candidate("Ada", Some("  ")).identity_key(), "Ada");
  }

  #[test]
  fn test_processing_record_without_candidates() {
    let record: SearchRecord = serde_json::from_str(
      r#"{"request_id":"req-1","status":"processing","prompt":"cto","created_at":"2025-07-30T10:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(record.status, SearchStatus::Processing);
    assert!(record.candidates.is_empty());
    assert!(!record.has_evidence());
  }

  #[test]
  fn test_null_candidates_decode_as_empty() {
    let record: SearchRecord = serde_json::from_str(
      r#"{"request_id":"req-1","status":"failed","candidates":null,"error":"quota","created_at":"2025-07-30T10:00:00Z"}"#,
    )
    .unwrap();
    assert!(record.candidates.is_empty());
    assert_eq!(record.error.as_deref(), Some("quota"));
  }

  #[test]
  fn test_evidence_type_unknown_tag_survives() {
    let evidence: EvidenceUrl = serde_json::from_value(serde_json::json!({
      "url": "https://example.com/talk",
      "title": "Keynote",
      "description": "Conference talk",
      "evidence_type": "conference_talk",
      "relevance_score": 0.8,
      "confidence_level": "high",
      "supporting_explanation": "Speaks about hiring"
    }))
    .unwrap();
    assert_eq!(evidence.evidence_type, EvidenceType::Other("conference_talk".to_string()));
    assert_eq!(evidence.confidence_level, ConfidenceLevel::High);

    let json = serde_json::to_value(&evidence).unwrap();
    assert_eq!(json["evidence_type"], "conference_talk");
  }

  #[test]
  fn test_fractional_scores_are_rounded() {
    let candidate: Candidate = serde_json::from_value(serde_json::json!({
      "name": "Ada Park",
      "accuracy": 87.5,
      "behavioral_data": {
        "behavioral_insight": "Moves fast",
        "scores": {
          "cmi": {"score": 72.4, "explanation": "Ships weekly"},
          "rbfs": {"score": null, "explanation": null},
          "ias": {"score": 120, "explanation": "Founder energy"}
        }
      }
    }))
    .unwrap();
    assert_eq!(candidate.accuracy, 88);

    let scores = candidate.behavioral_data.unwrap().scores;
    assert_eq!((scores.cmi.score, scores.rbfs.score, scores.ias.score), (72, 0, 100));
    assert_eq!(scores.rbfs.explanation, "");
  }

  #[test]
  fn test_naive_timestamps_decode_as_utc() {
    let record: SearchRecord = serde_json::from_str(
      r#"{"request_id":"req-1","status":"completed","created_at":"2025-07-30T10:00:00.123456","completed_at":"2025-07-30T10:00:20"}"#,
    )
    .unwrap();
    assert_eq!(record.created_at.to_rfc3339(), "2025-07-30T10:00:00.123456+00:00");
    assert_eq!(record.completed_at.unwrap().to_rfc3339(), "2025-07-30T10:00:20+00:00");
  }

  #[test]
  fn test_missing_or_garbled_timestamps_do_not_fail() {
    let record: SearchRecord =
      serde_json::from_str(r#"{"request_id":"req-1","status":"processing","completed_at":"soon"}"#).unwrap();
    assert!(record.completed_at.is_none());

    let record: SearchRecord =
      serde_json::from_str(r#"{"request_id":"req-1","status":"processing","created_at":null}"#).unwrap();
    assert_eq!(record.status, SearchStatus::Processing);
  }

  #[test]
  fn test_null_fields_decode_as_defaults() {
    let record: SearchRecord = serde_json::from_value(serde_json::json!({
      "request_id": "req-1",
      "status": "completed",
      "prompt": null,
      "filters": {"person_filters": null, "organization_filters": null, "reasoning": null},
      "created_at": "2025-07-30T10:00:00Z",
      "candidates": [{
        "name": "Ada Park",
        "title": null,
        "company": null,
        "accuracy": null,
        "reasons": null,
        "evidence_urls": [{
          "url": "https://example.com/profile",
          "title": null,
          "description": null,
          "evidence_type": null,
          "relevance_score": null,
          "confidence_level": null,
          "supporting_explanation": null
        }]
      }]
    }))
    .unwrap();

    assert_eq!(record.prompt, "");
    let candidate = &record.candidates[0];
    assert_eq!((candidate.title.as_str(), candidate.company.as_str(), candidate.accuracy), ("", "", 0));
    assert!(candidate.has_evidence());
    let evidence = &candidate.evidence_urls[0];
    assert_eq!(evidence.confidence_level, ConfidenceLevel::Unknown);
    assert_eq!(evidence.relevance_score, 0.0);
  }

  #[test]
  fn test_unknown_confidence_level() {
    let level: ConfidenceLevel = serde_json::from_str("\"very_high\"").unwrap();
    assert_eq!(level, ConfidenceLevel::Unknown);
    let level: ConfidenceLevel = serde_json::from_str("\"Medium\"").unwrap();
    assert_eq!(level, ConfidenceLevel::Medium);
    assert_eq!(serde_json::to_string(&ConfidenceLevel::Low).unwrap(), "\"low\"");
  }

  #[test]
  fn test_evidence_type_known_tag() {
    let kind: EvidenceType = serde_json::from_str("\"news_article\"").unwrap();
    assert_eq!(kind, EvidenceType::NewsArticle);
  }

  #[test]
  fn test_search_request_defaults() {
    let request = SearchRequest::new("find a cto", 2);
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["include_linkedin"], true);
    assert_eq!(json["include_posts"], false);
    assert_eq!(json["max_candidates"], 2);
  }
}
