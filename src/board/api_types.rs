//! Serde-deserializable types matching the job-board API envelope.
//!
//! Every response carries a `success` flag plus either a payload field
//! (`job`, `jobs`, `comment`, `reply`) or a human-readable `message`.
//! These stay separate from the domain types so the envelope can evolve
//! without touching application code.

use serde::Deserialize;

use super::client::GatewayError;
use super::types::{Comment, Job, Reply};

/// Common response envelope for all job-board endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
  #[serde(default)]
  pub success: bool,
  pub message: Option<String>,
  pub job: Option<Job>,
  pub jobs: Option<Vec<Job>>,
  pub comment: Option<Comment>,
  pub reply: Option<Reply>,
}

impl ApiEnvelope {
  fn failure(self, what: &str) -> GatewayError {
    let message = self
      .message
      .unwrap_or_else(|| format!("server did not return {}", what));
    GatewayError::Transport(message)
  }

  /// Succeed only when the flag is set; used for deletes, which carry no
  /// payload beyond the flag.
  pub fn into_ack(self) -> Result<(), GatewayError> {
    if self.success {
      Ok(())
    } else {
      Err(self.failure("confirmation"))
    }
  }

  pub fn into_job(self) -> Result<Job, GatewayError> {
    if self.success {
      if let Some(job) = self.job {
        return Ok(job);
      }
    }
    Err(self.failure("a job"))
  }

  pub fn into_jobs(self) -> Result<Vec<Job>, GatewayError> {
    if self.success {
      if let Some(jobs) = self.jobs {
        return Ok(jobs);
      }
    }
    Err(self.failure("a job list"))
  }

  pub fn into_comment(self) -> Result<Comment, GatewayError> {
    if self.success {
      if let Some(comment) = self.comment {
        return Ok(comment);
      }
    }
    Err(self.failure("a comment"))
  }

  pub fn into_reply(self) -> Result<Reply, GatewayError> {
    if self.success {
      if let Some(reply) = self.reply {
        return Ok(reply);
      }
    }
    Err(self.failure("a reply"))
  }
}
