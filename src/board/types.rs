//! Domain types for the job board.
//!
//! Entities are shared between the wire layer and the snapshot cache, so they
//! all derive Serialize/Deserialize. Nested sequences default to empty when
//! the server omits them: once a `Job` is in memory, `comments` is always a
//! vector, and the same holds for `replies` on a `Comment`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix for client-synthesized identifiers. The server never issues ids
/// with this prefix, so `is_temporary` can tell the two apart.
pub const TEMP_ID_PREFIX: &str = "temp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Mint a temporary identifier, unique for the lifetime of the process.
pub fn next_temp_id() -> String {
  let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
  format!("{}{}", TEMP_ID_PREFIX, n)
}

/// Whether an identifier was synthesized client-side and has not (yet) been
/// replaced by a server-issued one.
pub fn is_temporary(id: &str) -> bool {
  id.starts_with(TEMP_ID_PREFIX)
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
  Open,
  InProgress,
  Completed,
}

/// A posted job with its comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  pub id: String,
  pub title: String,
  pub description: String,
  pub category: String,
  pub budget: f64,
  pub status: JobStatus,
  /// Owning user.
  pub user_id: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub comments: Vec<Comment>,
}

/// A comment on a job. Author display fields are denormalized at creation
/// time and never re-fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: String,
  pub job_id: String,
  pub user_id: String,
  pub text: String,
  pub user_name: String,
  pub user_avatar: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub replies: Vec<Reply>,
}

/// A reply within a comment thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
  pub id: String,
  pub comment_id: String,
  pub user_id: String,
  pub text: String,
  pub user_name: String,
  pub user_avatar: String,
  pub created_at: DateTime<Utc>,
}

/// Identity of the acting user, supplied explicitly by the caller for every
/// mutation (never read from ambient session state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub avatar: String,
}

/// Input for creating a job. All required fields are optional here so that
/// presence can be validated before anything touches the network.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobDraft {
  pub title: Option<String>,
  pub description: Option<String>,
  pub category: Option<String>,
  pub budget: Option<f64>,
}

/// Scalar field replacements for an existing job. `None` fields are left
/// untouched and omitted from the request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub budget: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<JobStatus>,
}

impl Job {
  /// Take the scalar fields from a server-returned copy, keeping the local
  /// comment thread. The thread may hold entities the server doesn't know
  /// about yet, so it must survive an unrelated field update.
  pub fn adopt_scalars(&mut self, from: &Job) {
    self.title = from.title.clone();
    self.description = from.description.clone();
    self.category = from.category.clone();
    self.budget = from.budget;
    self.status = from.status;
  }
}
