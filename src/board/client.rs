//! Job-board API client.
//!
//! A stateless request/response wrapper: no retries and no caching here,
//! failures surface as typed errors for the caller to handle.

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::Config;

use super::api_types::ApiEnvelope;
use super::types::{Comment, Job, JobDraft, JobPatch, Reply};

/// Errors surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// A required field was missing before the request was ever issued.
  #[error("missing required field: {field}")]
  Validation { field: &'static str },

  /// The backend was unreachable or answered without success.
  #[error("request failed: {0}")]
  Transport(String),
}

impl From<reqwest::Error> for GatewayError {
  fn from(e: reqwest::Error) -> Self {
    GatewayError::Transport(e.to_string())
  }
}

/// Job-board API client wrapper.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self, GatewayError> {
    let token = Config::api_token();
    Self::with_token(&config.api.url, token)
  }

  /// Build a client against an explicit base URL, with an optional bearer
  /// token. A missing token is not an error; requests go out without an
  /// Authorization header and the server decides.
  pub fn with_token(base_url: &str, token: Option<String>) -> Result<Self, GatewayError> {
    // Url::join drops the last path segment without a trailing slash
    let normalized = if base_url.ends_with('/') {
      base_url.to_string()
    } else {
      format!("{}/", base_url)
    };
    let base = Url::parse(&normalized)
      .map_err(|e| GatewayError::Transport(format!("invalid API base URL: {}", e)))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base,
      token,
    })
  }

  fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
    let url = self
      .base
      .join(path)
      .map_err(|e| GatewayError::Transport(format!("invalid request path {}: {}", path, e)))?;

    let mut builder = self.http.request(method, url);
    if let Some(token) = &self.token {
      builder = builder.bearer_auth(token);
    }
    Ok(builder)
  }

  async fn send(&self, builder: RequestBuilder) -> Result<ApiEnvelope, GatewayError> {
    let response = builder.send().await?;
    let envelope = response.json::<ApiEnvelope>().await?;
    Ok(envelope)
  }

  /// Fetch the full job list.
  pub async fn list_jobs(&self) -> Result<Vec<Job>, GatewayError> {
    let builder = self.request(Method::GET, "api/jobs")?;
    self.send(builder).await?.into_jobs()
  }

  /// Fetch a single job by id.
  pub async fn get_job(&self, id: &str) -> Result<Job, GatewayError> {
    let builder = self.request(Method::GET, &format!("api/jobs/{}", id))?;
    self.send(builder).await?.into_job()
  }

  /// Fetch the jobs owned by a user.
  pub async fn list_jobs_by_user(&self, user_id: &str) -> Result<Vec<Job>, GatewayError> {
    let builder = self.request(Method::GET, &format!("api/jobs/user/{}", user_id))?;
    self.send(builder).await?.into_jobs()
  }

  /// Create a job. Presence of title, description, category and budget is
  /// validated here; a missing field fails fast and never reaches the
  /// network.
  pub async fn create_job(&self, draft: &JobDraft) -> Result<Job, GatewayError> {
    validate_draft(draft)?;
    let builder = self.request(Method::POST, "api/jobs")?.json(draft);
    self.send(builder).await?.into_job()
  }

  /// Replace scalar fields of an existing job.
  pub async fn update_job(&self, id: &str, patch: &JobPatch) -> Result<Job, GatewayError> {
    let builder = self
      .request(Method::PUT, &format!("api/jobs/{}", id))?
      .json(patch);
    self.send(builder).await?.into_job()
  }

  /// Delete a job. Returns true once the server confirms.
  pub async fn delete_job(&self, id: &str) -> Result<bool, GatewayError> {
    let builder = self.request(Method::DELETE, &format!("api/jobs/{}", id))?;
    self.send(builder).await?.into_ack()?;
    Ok(true)
  }

  /// Post a comment on a job.
  pub async fn add_comment(&self, job_id: &str, text: &str) -> Result<Comment, GatewayError> {
    let builder = self
      .request(Method::POST, &format!("api/jobs/{}/comments", job_id))?
      .json(&TextBody { text });
    self.send(builder).await?.into_comment()
  }

  /// Post a reply under a comment.
  pub async fn add_reply(&self, comment_id: &str, text: &str) -> Result<Reply, GatewayError> {
    let builder = self
      .request(Method::POST, &format!("api/comments/{}/replies", comment_id))?
      .json(&TextBody { text });
    self.send(builder).await?.into_reply()
  }

  /// Delete a comment. Returns true once the server confirms.
  pub async fn delete_comment(&self, id: &str) -> Result<bool, GatewayError> {
    let builder = self.request(Method::DELETE, &format!("api/comments/{}", id))?;
    self.send(builder).await?.into_ack()?;
    Ok(true)
  }
}

#[derive(Serialize)]
struct TextBody<'a> {
  text: &'a str,
}

fn validate_draft(draft: &JobDraft) -> Result<(), GatewayError> {
  fn present(value: &Option<String>, field: &'static str) -> Result<(), GatewayError> {
    match value {
      Some(s) if !s.trim().is_empty() => Ok(()),
      _ => Err(GatewayError::Validation { field }),
    }
  }

  present(&draft.title, "title")?;
  present(&draft.description, "description")?;
  present(&draft.category, "category")?;
  if draft.budget.is_none() {
    return Err(GatewayError::Validation { field: "budget" });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(server: &mockito::ServerGuard, token: Option<&str>) -> ApiClient {
    ApiClient::with_token(&server.url(), token.map(String::from)).unwrap()
  }

  fn full_draft() -> JobDraft {
    JobDraft {
      title: Some("Paint the shed".into()),
      description: Some("One coat, green".into()),
      category: Some("painting".into()),
      budget: Some(80.0),
    }
  }

  #[tokio::test]
  async fn test_list_jobs_sends_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/api/jobs")
      .match_header("authorization", "Bearer sekrit")
      .with_body(r#"{"success": true, "jobs": []}"#)
      .create_async()
      .await;

    let jobs = client(&server, Some("sekrit")).list_jobs().await.unwrap();
    assert!(jobs.is_empty());
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_missing_token_still_attempts_the_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/api/jobs")
      .match_header("authorization", mockito::Matcher::Missing)
      .with_body(r#"{"success": true, "jobs": []}"#)
      .create_async()
      .await;

    assert!(client(&server, None).list_jobs().await.is_ok());
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_create_job_missing_budget_never_hits_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/api/jobs")
      .expect(0)
      .create_async()
      .await;

    let draft = JobDraft {
      budget: None,
      ..full_draft()
    };
    let err = client(&server, None).create_job(&draft).await.unwrap_err();
    assert!(matches!(err, GatewayError::Validation { field: "budget" }));
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_create_job_blank_title_fails_validation() {
    let server = mockito::Server::new_async().await;
    let draft = JobDraft {
      title: Some("   ".into()),
      ..full_draft()
    };
    let err = client(&server, None).create_job(&draft).await.unwrap_err();
    assert!(matches!(err, GatewayError::Validation { field: "title" }));
  }

  #[tokio::test]
  async fn test_server_failure_message_reaches_the_caller() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("DELETE", "/api/jobs/j-9")
      .with_body(r#"{"success": false, "message": "not yours to delete"}"#)
      .create_async()
      .await;

    let err = client(&server, None).delete_job("j-9").await.unwrap_err();
    assert!(err.to_string().contains("not yours to delete"));
  }
}
