//! HTTP client for the user-data backend (history, tracked people, search
//! records and exclusions).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::{
  Exclusion, HistoryItem, PersonRecordRequest, PersonRecordResponse, SearchRecordRequest,
  SearchRecordResponse, TrackedPerson, UserDataStore,
};
use crate::auth::Identity;
use crate::search::client::check_status;
use crate::{Result, ScoutError};

#[derive(Debug, Clone)]
pub struct UserDataClientConfig {
  pub base_url: String,
  pub timeout: Duration,
}

impl From<&crate::Config> for UserDataClientConfig {
  fn from(config: &crate::Config) -> Self {
    Self { base_url: config.user_api_url(), timeout: config.request_timeout() }
  }
}

pub struct HttpUserDataClient {
  client: Client,
  base_url: Url,
  token: Option<String>,
}

impl HttpUserDataClient {
  pub fn new(config: UserDataClientConfig, identity: Option<&Identity>) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| ScoutError::config(format!("Failed to create HTTP client: {e}")))?;

    let base_url = Url::parse(&config.base_url)
      .map_err(|e| ScoutError::config(format!("Invalid user API URL '{}': {e}", config.base_url)))?;

    Ok(Self { client, base_url, token: identity.map(|i| i.token.clone()) })
  }

  fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  /// Join path segments onto the base URL, percent-encoding each one.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
    let response = self.authed(builder).send().await?;
    check_status(response).await
  }

  async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
    Ok(self.send(builder).await?.json().await?)
  }

  pub async fn list_exclusions(&self) -> Result<Vec<Exclusion>> {
    self.send_json(self.client.get(self.url(&["api", "exclusions"]))).await
  }

  pub async fn add_exclusion(&self, linkedin_url: &str) -> Result<Exclusion> {
    let body = serde_json::json!({ "linkedin_url": linkedin_url });
    self.send_json(self.client.post(self.url(&["api", "exclusions"])).json(&body)).await
  }

  pub async fn remove_exclusion(&self, linkedin_url: &str) -> Result<()> {
    let body = serde_json::json!({ "linkedin_url": linkedin_url });
    self.send(self.client.delete(self.url(&["api", "exclusions"])).json(&body)).await?;
    Ok(())
  }
}

#[async_trait]
impl UserDataStore for HttpUserDataClient {
  async fn create_search_record(&self, request: &SearchRecordRequest) -> Result<SearchRecordResponse> {
    self.send_json(self.client.post(self.url(&["api", "search", "create"])).json(request)).await
  }

  async fn add_person_to_search(
    &self,
    search_id: i64,
    person: &PersonRecordRequest,
  ) -> Result<PersonRecordResponse> {
    let url = self.url(&["api", "search", &search_id.to_string(), "people"]);
    self.send_json(self.client.post(url).json(person)).await
  }

  async fn load_history(&self, user_id: &str) -> Result<Vec<HistoryItem>> {
    self.send_json(self.client.get(self.url(&["api", "users", user_id, "history"]))).await
  }

  async fn save_history_item(&self, user_id: &str, item: &HistoryItem) -> Result<()> {
    let url = self.url(&["api", "users", user_id, "history"]);
    self.send(self.client.post(url).json(item)).await?;
    Ok(())
  }

  async fn delete_history_item(&self, user_id: &str, item_id: &str) -> Result<()> {
    let url = self.url(&["api", "users", user_id, "history", item_id]);
    self.send(self.client.delete(url)).await?;
    Ok(())
  }

  async fn clear_history(&self, user_id: &str) -> Result<()> {
    self.send(self.client.delete(self.url(&["api", "users", user_id, "history"]))).await?;
    Ok(())
  }

  async fn load_tracked_people(&self, user_id: &str) -> Result<Vec<TrackedPerson>> {
    self.send_json(self.client.get(self.url(&["api", "users", user_id, "tracked"]))).await
  }

  async fn save_tracked_person(&self, user_id: &str, person: &TrackedPerson) -> Result<()> {
    let url = self.url(&["api", "users", user_id, "tracked", &person.id]);
    self.send(self.client.put(url).json(person)).await?;
    Ok(())
  }

  async fn delete_tracked_person(&self, user_id: &str, person_id: &str) -> Result<()> {
    let url = self.url(&["api", "users", user_id, "tracked", person_id]);
    self.send(self.client.delete(url)).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};

  fn client_for(server: &Server) -> HttpUserDataClient {
    let identity = Identity { user_id: "u1".to_string(), token: "secret".to_string(), email: None };
    HttpUserDataClient::new(
      UserDataClientConfig { base_url: server.url(), timeout: Duration::from_secs(5) },
      Some(&identity),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn test_create_search_record_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("POST", "/api/search/create")
      .match_header("authorization", "Bearer secret")
      .match_body(Matcher::PartialJson(serde_json::json!({"request_id": "req-1", "prompt": "cto"})))
      .with_status(201)
      .with_header("content-type", "application/json")
      .with_body(r#"{"id": 17, "request_id": "req-1", "status": "processing", "prompt": "cto"}"#)
      .create_async()
      .await;

    let request = SearchRecordRequest {
      request_id: "req-1".to_string(),
      prompt: "cto".to_string(),
      filters: serde_json::json!({}),
    };
    let record = client_for(&server).create_search_record(&request).await.unwrap();
    assert_eq!(record.id, 17);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_add_person_error_surfaces_message() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/api/search/17/people")
      .with_status(403)
      .with_body(r#"{"error": "Search does not belong to user"}"#)
      .create_async()
      .await;

    let candidate: crate::search::Candidate =
      serde_json::from_value(serde_json::json!({"name": "Ada Park"})).unwrap();
    let err = client_for(&server)
      .add_person_to_search(17, &PersonRecordRequest::from(&candidate))
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "Search does not belong to user");
  }

  #[tokio::test]
  async fn test_save_tracked_person_puts_by_id() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("PUT", "/api/users/u1/tracked/Ada%20Park")
      .match_body(Matcher::PartialJson(serde_json::json!({"isTracking": false})))
      .with_status(200)
      .create_async()
      .await;

    let person = TrackedPerson {
      id: "Ada Park".to_string(),
      name: "Ada Park".to_string(),
      title: "CTO".to_string(),
      company: "Ledgerly".to_string(),
      profile_photo: String::new(),
      tracked_since: "2025-07-30".to_string(),
      last_event: "2025-07-30".to_string(),
      is_tracking: false,
      tracking_reason: String::new(),
      cmi: 60,
      rbfs: 45,
      ias: 60,
    };
    client_for(&server).save_tracked_person("u1", &person).await.unwrap();
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_exclusions_roundtrip_endpoints() {
    let mut server = Server::new_async().await;
    let list = server
      .mock("GET", "/api/exclusions")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"[{"id": 1, "linkedin_url": "https://linkedin.com/in/ada", "created_at": "2025-07-30T10:00:00Z"}]"#,
      )
      .create_async()
      .await;
    let remove = server
      .mock("DELETE", "/api/exclusions")
      .match_body(Matcher::Json(serde_json::json!({"linkedin_url": "https://linkedin.com/in/ada"})))
      .with_status(204)
      .create_async()
      .await;

    let client = client_for(&server);
    let exclusions = client.list_exclusions().await.unwrap();
    assert_eq!(exclusions.len(), 1);
    client.remove_exclusion(&exclusions[0].linkedin_url).await.unwrap();

    list.assert_async().await;
    remove.assert_async().await;
  }
}
