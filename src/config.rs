use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::board::types::UserProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Identity used when posting jobs, comments and replies.
  pub default_user: Option<UserProfile>,
  /// Whether to keep an offline snapshot of the job list.
  #[serde(default = "default_true")]
  pub cache_enabled: bool,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the job-board backend, e.g. https://jobs.example.com
  pub url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gigboard.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gigboard/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/gigboard/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("gigboard.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gigboard").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the API token from environment variables, if one is set.
  ///
  /// Checks GIGBOARD_API_TOKEN first, then GIGBOARD_TOKEN as fallback.
  /// A missing token is fine: requests are attempted without credentials
  /// and the server decides what is allowed.
  pub fn api_token() -> Option<String> {
    std::env::var("GIGBOARD_API_TOKEN")
      .or_else(|_| std::env::var("GIGBOARD_TOKEN"))
      .ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_load_full_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      "api:\n  url: https://jobs.example.com\ndefault_user:\n  id: u-1\n  name: Dana\n  avatar: https://example.com/d.png\ncache_enabled: false\n"
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.api.url, "https://jobs.example.com");
    assert_eq!(config.default_user.as_ref().unwrap().name, "Dana");
    assert!(!config.cache_enabled);
  }

  #[test]
  fn test_cache_enabled_defaults_to_true() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "api:\n  url: https://jobs.example.com\n").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert!(config.cache_enabled);
    assert!(config.default_user.is_none());
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/gigboard.yaml"))).is_err());
  }
}
