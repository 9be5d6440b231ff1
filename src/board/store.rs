//! Optimistic store for the job board.
//!
//! Owns the canonical job list and every view derived from it. All mutations
//! go through here: an optimistic merge happens before the gateway call is
//! awaited, reconciliation happens after it resolves, and `&mut self` keeps
//! whole mutations serialized against each other. Nothing outside this type
//! touches the canonical list.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{Snapshot, SnapshotStore};

use super::client::{ApiClient, GatewayError};
use super::types::{next_temp_id, Comment, Job, JobDraft, JobPatch, Reply, UserProfile};

/// Fixed snapshot slot holding the last known-good job list.
const JOBS_SLOT: &str = "cachedJobs";

/// How many jobs from the head of the canonical list count as popular.
const POPULAR_COUNT: usize = 3;

/// Where the current job list came from after a refresh.
#[derive(Debug)]
pub enum RefreshOutcome {
  /// Live data from the server.
  Fresh { count: usize },
  /// The fetch failed; serving the last snapshot.
  Cached {
    saved_at: DateTime<Utc>,
    error: String,
  },
  /// The fetch failed and no snapshot exists; the list is empty.
  Unavailable { error: String },
}

/// Errors surfaced by store mutations. Each mutation resolves to exactly one
/// `Ok` or one `Err`; the held-locally variants double as the "saved locally
/// only" notice for comment and reply writes.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error(transparent)]
  Gateway(#[from] GatewayError),

  #[error("no job with id {0}")]
  UnknownJob(String),

  #[error("no comment with id {0}")]
  UnknownComment(String),

  /// The comment stays visible locally under its temporary id, but the
  /// server never accepted it.
  #[error("comment kept locally only: {source}")]
  CommentHeldLocally {
    temp_id: String,
    source: GatewayError,
  },

  /// Reply counterpart of `CommentHeldLocally`.
  #[error("reply kept locally only: {source}")]
  ReplyHeldLocally {
    temp_id: String,
    source: GatewayError,
  },
}

/// The job store: canonical list plus derived views, an API gateway, and a
/// snapshot backend for offline fallback.
pub struct BoardStore<S: SnapshotStore> {
  gateway: ApiClient,
  snapshots: S,

  /// Canonical job list; every derived view below is recomputed from it.
  jobs: Vec<Job>,

  /// Whose jobs `user_jobs` filters for.
  viewer: Option<String>,
  /// Search filter applied to `filtered_jobs` (title/category substring).
  filter: Option<String>,

  user_jobs: Vec<Job>,
  filtered_jobs: Vec<Job>,
  popular_jobs: Vec<Job>,
  saved_jobs: Vec<Job>,
}

impl<S: SnapshotStore> BoardStore<S> {
  pub fn new(gateway: ApiClient, snapshots: S) -> Self {
    Self {
      gateway,
      snapshots,
      jobs: Vec::new(),
      viewer: None,
      filter: None,
      user_jobs: Vec::new(),
      filtered_jobs: Vec::new(),
      popular_jobs: Vec::new(),
      saved_jobs: Vec::new(),
    }
  }

  // --- view accessors -------------------------------------------------------

  pub fn jobs(&self) -> &[Job] {
    &self.jobs
  }

  pub fn user_jobs(&self) -> &[Job] {
    &self.user_jobs
  }

  pub fn filtered_jobs(&self) -> &[Job] {
    &self.filtered_jobs
  }

  pub fn popular_jobs(&self) -> &[Job] {
    &self.popular_jobs
  }

  pub fn saved_jobs(&self) -> &[Job] {
    &self.saved_jobs
  }

  /// Set whose jobs the `user_jobs` view should track.
  pub fn set_viewer(&mut self, viewer: Option<String>) {
    self.viewer = viewer;
    self.sync_views();
  }

  /// Set the search filter for the `filtered_jobs` view. `None` means
  /// unfiltered (the full canonical list).
  pub fn set_filter(&mut self, filter: Option<String>) {
    self.filter = filter;
    self.sync_views();
  }

  /// Rebuild every derived view from the canonical list. Views are replaced
  /// wholesale so a reader never observes a partially-updated list.
  fn sync_views(&mut self) {
    self.user_jobs = match &self.viewer {
      Some(viewer) => self
        .jobs
        .iter()
        .filter(|j| &j.user_id == viewer)
        .cloned()
        .collect(),
      None => Vec::new(),
    };

    self.filtered_jobs = match &self.filter {
      Some(query) => {
        let query = query.to_lowercase();
        self
          .jobs
          .iter()
          .filter(|j| {
            j.title.to_lowercase().contains(&query) || j.category.to_lowercase().contains(&query)
          })
          .cloned()
          .collect()
      }
      None => self.jobs.clone(),
    };

    self.popular_jobs = self.jobs.iter().take(POPULAR_COUNT).cloned().collect();

    // save/unsave is accepted but unimplemented; the view stays empty.
    self.saved_jobs = Vec::new();
  }

  // --- reads ----------------------------------------------------------------

  /// Refresh the canonical list from the server. On failure this degrades to
  /// the last snapshot, and to an empty list when none exists; the outcome
  /// says which of the three happened.
  pub async fn refresh_jobs(&mut self) -> RefreshOutcome {
    debug!("refreshing job list");
    match self.gateway.list_jobs().await {
      Ok(jobs) => {
        let count = jobs.len();
        self.jobs = jobs;
        self.sync_views();
        // Caching is an optimization; a failed write is logged, never fatal.
        if let Err(e) = self.snapshots.save(JOBS_SLOT, &self.jobs) {
          warn!("Failed to persist job snapshot: {}", e);
        }
        RefreshOutcome::Fresh { count }
      }
      Err(err) => {
        let error = err.to_string();
        let snapshot: Option<Snapshot<Vec<Job>>> = match self.snapshots.load(JOBS_SLOT) {
          Ok(s) => s,
          Err(e) => {
            warn!("Failed to read job snapshot: {}", e);
            None
          }
        };
        match snapshot {
          Some(snapshot) => {
            self.jobs = snapshot.value;
            self.sync_views();
            RefreshOutcome::Cached {
              saved_at: snapshot.saved_at,
              error,
            }
          }
          None => {
            self.jobs = Vec::new();
            self.sync_views();
            RefreshOutcome::Unavailable { error }
          }
        }
      }
    }
  }

  /// Fetch a single job straight from the server, bypassing local state.
  pub async fn fetch_job(&self, id: &str) -> Result<Job, StoreError> {
    Ok(self.gateway.get_job(id).await?)
  }

  /// Fetch the jobs owned by a user straight from the server.
  pub async fn fetch_jobs_by_user(&self, user_id: &str) -> Result<Vec<Job>, StoreError> {
    Ok(self.gateway.list_jobs_by_user(user_id).await?)
  }

  // --- job mutations (no optimism: server confirms first) -------------------

  /// Create a job. The server-returned job lands at the head of the
  /// canonical list; on failure nothing changes.
  pub async fn create_job(&mut self, draft: &JobDraft) -> Result<Job, StoreError> {
    let job = self.gateway.create_job(draft).await?;
    self.jobs.insert(0, job.clone());
    self.sync_views();
    Ok(job)
  }

  /// Update a job's scalar fields. The local copy keeps its comment thread:
  /// a temp comment held locally must survive an unrelated title edit.
  pub async fn update_job(&mut self, id: &str, patch: &JobPatch) -> Result<Job, StoreError> {
    let updated = self.gateway.update_job(id, patch).await?;
    if let Some(job) = self.jobs.iter_mut().find(|j| j.id == id) {
      job.adopt_scalars(&updated);
      self.sync_views();
    }
    Ok(updated)
  }

  /// Delete a job everywhere once the server confirms.
  pub async fn delete_job(&mut self, id: &str) -> Result<(), StoreError> {
    self.gateway.delete_job(id).await?;
    self.jobs.retain(|j| j.id != id);
    self.sync_views();
    Ok(())
  }

  // --- comment / reply mutations (optimistic) -------------------------------

  /// Add a comment to a job.
  ///
  /// The comment appears in the job's thread under a temporary id before the
  /// request is issued. On success the temp entry is replaced in place by
  /// the server's comment, matched by the temp id captured here (never by
  /// content). On failure the temp entry stays: user-authored text is never
  /// silently discarded, and the error is the "saved locally only" notice.
  pub async fn add_comment(
    &mut self,
    job_id: &str,
    text: &str,
    user: &UserProfile,
  ) -> Result<Comment, StoreError> {
    if !self.jobs.iter().any(|j| j.id == job_id) {
      return Err(StoreError::UnknownJob(job_id.to_string()));
    }

    let temp_id = next_temp_id();
    let temp = Comment {
      id: temp_id.clone(),
      job_id: job_id.to_string(),
      user_id: user.id.clone(),
      text: text.to_string(),
      user_name: user.name.clone(),
      user_avatar: user.avatar.clone(),
      created_at: Utc::now(),
      replies: Vec::new(),
    };

    // Optimistic merge, visible before the request goes out.
    if let Some(job) = self.jobs.iter_mut().find(|j| j.id == job_id) {
      job.comments.push(temp);
    }
    self.sync_views();

    match self.gateway.add_comment(job_id, text).await {
      Ok(comment) => {
        self.replace_comment(job_id, &temp_id, comment.clone());
        self.sync_views();
        Ok(comment)
      }
      Err(source) => Err(StoreError::CommentHeldLocally { temp_id, source }),
    }
  }

  /// Add a reply under a comment. Same optimistic shape as `add_comment`,
  /// targeting the addressed comment's reply list.
  pub async fn add_reply(
    &mut self,
    job_id: &str,
    comment_id: &str,
    text: &str,
    user: &UserProfile,
  ) -> Result<Reply, StoreError> {
    let Some(job) = self.jobs.iter().find(|j| j.id == job_id) else {
      return Err(StoreError::UnknownJob(job_id.to_string()));
    };
    if !job.comments.iter().any(|c| c.id == comment_id) {
      return Err(StoreError::UnknownComment(comment_id.to_string()));
    }

    let temp_id = next_temp_id();
    let temp = Reply {
      id: temp_id.clone(),
      comment_id: comment_id.to_string(),
      user_id: user.id.clone(),
      text: text.to_string(),
      user_name: user.name.clone(),
      user_avatar: user.avatar.clone(),
      created_at: Utc::now(),
    };

    if let Some(comment) = self.find_comment_mut(job_id, comment_id) {
      comment.replies.push(temp);
    }
    self.sync_views();

    match self.gateway.add_reply(comment_id, text).await {
      Ok(reply) => {
        if let Some(comment) = self.find_comment_mut(job_id, comment_id) {
          if let Some(slot) = comment.replies.iter_mut().find(|r| r.id == temp_id) {
            *slot = reply.clone();
          }
        }
        self.sync_views();
        Ok(reply)
      }
      Err(source) => Err(StoreError::ReplyHeldLocally { temp_id, source }),
    }
  }

  /// Delete a comment. No optimistic pre-removal: hiding content the server
  /// still has is worse than a visible delay, so the sweep runs only after
  /// confirmation. The owning job isn't known to the caller, so every job's
  /// thread is swept.
  pub async fn delete_comment(&mut self, comment_id: &str) -> Result<(), StoreError> {
    self.gateway.delete_comment(comment_id).await?;
    for job in &mut self.jobs {
      job.comments.retain(|c| c.id != comment_id);
    }
    self.sync_views();
    Ok(())
  }

  // --- saved jobs (accepted, unimplemented) ---------------------------------

  pub fn save_job(&mut self, _id: &str) -> &'static str {
    "Saving jobs is not available yet"
  }

  pub fn unsave_job(&mut self, _id: &str) -> &'static str {
    "Saving jobs is not available yet"
  }

  // --- internals ------------------------------------------------------------

  /// Replace a temp comment with its server counterpart, preserving its
  /// position among the other comments.
  fn replace_comment(&mut self, job_id: &str, temp_id: &str, real: Comment) {
    if let Some(job) = self.jobs.iter_mut().find(|j| j.id == job_id) {
      if let Some(slot) = job.comments.iter_mut().find(|c| c.id == temp_id) {
        *slot = real;
      }
    }
  }

  fn find_comment_mut(&mut self, job_id: &str, comment_id: &str) -> Option<&mut Comment> {
    self
      .jobs
      .iter_mut()
      .find(|j| j.id == job_id)?
      .comments
      .iter_mut()
      .find(|c| c.id == comment_id)
  }

  #[cfg(test)]
  fn seed(&mut self, jobs: Vec<Job>) {
    self.jobs = jobs;
    self.sync_views();
  }
}
