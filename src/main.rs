mod board;
mod cache;
mod config;

use board::client::ApiClient;
use board::store::{BoardStore, RefreshOutcome, StoreError};
use board::types::{Job, JobDraft, JobPatch, JobStatus, UserProfile};
use cache::{NoopSnapshots, SnapshotStore, SqliteSnapshots};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use config::Config;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gigboard")]
#[command(about = "A command-line client for the GigBoard job board")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gigboard/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List jobs, falling back to the cached snapshot when offline
  Jobs {
    /// Filter by title or category substring
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// List jobs owned by a user, straight from the server
  Mine {
    /// User id (defaults to the configured default_user)
    user_id: Option<String>,
  },
  /// Show the most popular jobs
  Popular,
  /// Show one job with its comment thread
  Get { id: String },
  /// Post a new job
  Post {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    budget: Option<f64>,
  },
  /// Edit a job's fields
  Edit {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    budget: Option<f64>,
    /// One of: open, in-progress, completed
    #[arg(long)]
    status: Option<String>,
  },
  /// Delete a job
  Remove { id: String },
  /// Comment on a job
  Comment { job_id: String, text: String },
  /// Reply to a comment
  Reply {
    job_id: String,
    comment_id: String,
    text: String,
  },
  /// Delete a comment
  Uncomment { comment_id: String },
  /// Save a job for later
  Save { id: String },
  /// Remove a job from the saved list
  Unsave { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _guard = init_tracing();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let gateway = ApiClient::new(&config)?;

  if config.cache_enabled {
    let store = BoardStore::new(gateway, SqliteSnapshots::open()?);
    run(store, &config, args.command).await
  } else {
    let store = BoardStore::new(gateway, NoopSnapshots);
    run(store, &config, args.command).await
  }
}

/// Set up file logging under the data directory. Logging is best-effort;
/// when no data directory exists the process just runs without it.
fn init_tracing() -> Option<WorkerGuard> {
  let dir = dirs::data_dir()?.join("gigboard").join("logs");
  std::fs::create_dir_all(&dir).ok()?;

  let appender = tracing_appender::rolling::daily(dir, "gigboard.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Some(guard)
}

async fn run<S: SnapshotStore>(
  mut store: BoardStore<S>,
  config: &Config,
  command: Command,
) -> Result<()> {
  match command {
    Command::Jobs { filter } => {
      report_refresh(store.refresh_jobs().await);
      store.set_filter(filter);
      for job in store.filtered_jobs() {
        print_job_line(job);
      }
    }
    Command::Mine { user_id } => {
      let user_id = match user_id.or_else(|| config.default_user.as_ref().map(|u| u.id.clone())) {
        Some(id) => id,
        None => return Err(eyre!("No user id given and no default_user configured")),
      };
      match store.fetch_jobs_by_user(&user_id).await {
        Ok(jobs) => {
          for job in &jobs {
            print_job_line(job);
          }
        }
        Err(e) => println!("Could not fetch jobs for {}: {}", user_id, e),
      }
    }
    Command::Popular => {
      report_refresh(store.refresh_jobs().await);
      for job in store.popular_jobs() {
        print_job_line(job);
      }
    }
    Command::Get { id } => match store.fetch_job(&id).await {
      Ok(job) => print_job_detail(&job),
      Err(e) => println!("Could not fetch job {}: {}", id, e),
    },
    Command::Post {
      title,
      description,
      category,
      budget,
    } => {
      let draft = JobDraft {
        title,
        description,
        category,
        budget,
      };
      match store.create_job(&draft).await {
        Ok(job) => println!("Posted job {}: {}", job.id, job.title),
        Err(e) => println!("Could not post job: {}", e),
      }
    }
    Command::Edit {
      id,
      title,
      description,
      category,
      budget,
      status,
    } => {
      let status = status.map(|s| parse_status(&s)).transpose()?;
      let patch = JobPatch {
        title,
        description,
        category,
        budget,
        status,
      };
      match store.update_job(&id, &patch).await {
        Ok(job) => println!("Updated job {}: {}", job.id, job.title),
        Err(e) => println!("Could not update job {}: {}", id, e),
      }
    }
    Command::Remove { id } => match store.delete_job(&id).await {
      Ok(()) => println!("Deleted job {}", id),
      Err(e) => println!("Could not delete job {}: {}", id, e),
    },
    Command::Comment { job_id, text } => {
      let user = acting_user(config)?;
      report_refresh(store.refresh_jobs().await);
      match store.add_comment(&job_id, &text, &user).await {
        Ok(comment) => println!("Comment {} posted on {}", comment.id, job_id),
        Err(StoreError::CommentHeldLocally { temp_id, source }) => println!(
          "Submission failed ({}); your comment is kept locally as {}",
          source, temp_id
        ),
        Err(e) => println!("Could not post comment: {}", e),
      }
    }
    Command::Reply {
      job_id,
      comment_id,
      text,
    } => {
      let user = acting_user(config)?;
      report_refresh(store.refresh_jobs().await);
      match store.add_reply(&job_id, &comment_id, &text, &user).await {
        Ok(reply) => println!("Reply {} posted under {}", reply.id, comment_id),
        Err(StoreError::ReplyHeldLocally { temp_id, source }) => println!(
          "Submission failed ({}); your reply is kept locally as {}",
          source, temp_id
        ),
        Err(e) => println!("Could not post reply: {}", e),
      }
    }
    Command::Uncomment { comment_id } => match store.delete_comment(&comment_id).await {
      Ok(()) => println!("Deleted comment {}", comment_id),
      Err(e) => println!("Could not delete comment {}: {}", comment_id, e),
    },
    Command::Save { id } => println!("{}", store.save_job(&id)),
    Command::Unsave { id } => println!("{}", store.unsave_job(&id)),
  }

  Ok(())
}

fn acting_user(config: &Config) -> Result<UserProfile> {
  config
    .default_user
    .clone()
    .ok_or_else(|| eyre!("No default_user configured; add one to your config file"))
}

fn report_refresh(outcome: RefreshOutcome) {
  match outcome {
    RefreshOutcome::Fresh { .. } => {}
    RefreshOutcome::Cached { saved_at, error } => {
      println!("Offline ({}); showing jobs cached at {}", error, saved_at);
    }
    RefreshOutcome::Unavailable { error } => {
      println!("Offline ({}) and no cached jobs available", error);
    }
  }
}

fn parse_status(s: &str) -> Result<JobStatus> {
  match s {
    "open" => Ok(JobStatus::Open),
    "in-progress" => Ok(JobStatus::InProgress),
    "completed" => Ok(JobStatus::Completed),
    other => Err(eyre!(
      "Unknown status '{}' (expected open, in-progress or completed)",
      other
    )),
  }
}

fn status_label(status: JobStatus) -> &'static str {
  match status {
    JobStatus::Open => "open",
    JobStatus::InProgress => "in-progress",
    JobStatus::Completed => "completed",
  }
}

fn print_job_line(job: &Job) {
  println!(
    "{:<12} {:<12} ${:<8} {}",
    job.id,
    status_label(job.status),
    job.budget,
    job.title
  );
}

fn print_job_detail(job: &Job) {
  print_job_line(job);
  println!("  category: {}", job.category);
  println!("  posted by {} at {}", job.user_id, job.created_at);
  println!("  {}", job.description);
  for comment in &job.comments {
    println!("  [{}] {}: {}", comment.id, comment.user_name, comment.text);
    for reply in &comment.replies {
      println!("    [{}] {}: {}", reply.id, reply.user_name, reply.text);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_status_accepts_wire_values() {
    assert_eq!(parse_status("open").unwrap(), JobStatus::Open);
    assert_eq!(parse_status("in-progress").unwrap(), JobStatus::InProgress);
    assert_eq!(parse_status("completed").unwrap(), JobStatus::Completed);
    assert!(parse_status("paused").is_err());
  }
}
