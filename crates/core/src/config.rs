//! TOML-based configuration for the integrator.
//!
//! Every section has serde defaults so the tool runs without a config file
//! at all; CLI flags override whatever is loaded here. Remote credentials
//! are never configured by this tool — pushes use whatever the destination
//! repository's own git configuration provides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from `integrator.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream content settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Destination repository settings.
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Commit message and author identity.
    #[serde(default)]
    pub commit: CommitConfig,

    /// Publish behaviour (remote, push, release tagging).
    #[serde(default)]
    pub publish: PublishConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

/// Where the upstream content tree comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Remote URL to clone/update before syncing. When unset, `dir` is
    /// used as-is without refreshing.
    #[serde(default)]
    pub url: Option<String>,

    /// Local path of the upstream content tree.
    #[serde(default = "default_upstream_dir")]
    pub dir: PathBuf,
}

fn default_upstream_dir() -> PathBuf {
    PathBuf::from("./demisto-content")
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            dir: default_upstream_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// The custom content repository receiving synced files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Path to the destination repository (created and initialized if
    /// absent).
    #[serde(default = "default_destination_path")]
    pub path: PathBuf,
}

fn default_destination_path() -> PathBuf {
    PathBuf::from("./custom-content")
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            path: default_destination_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Commit message and author identity for sync commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Message used for sync commits.
    #[serde(default = "default_commit_message")]
    pub message: String,

    /// Author / committer name.
    #[serde(default = "default_author_name")]
    pub author_name: String,

    /// Author / committer email.
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

fn default_commit_message() -> String {
    "Sync upstream content".into()
}
fn default_author_name() -> String {
    "integrator".into()
}
fn default_author_email() -> String {
    "integrator@localhost".into()
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            message: default_commit_message(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

/// How a sync is published after files are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Remote to push to. The remote's URL and credentials come from the
    /// destination repository's configuration, not from this file.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Whether to push after committing (default true). A missing remote
    /// is always tolerated either way.
    #[serde(default = "default_push")]
    pub push: bool,

    /// Whether to create a calendar release tag (`YY.M.index`) for each
    /// sync commit.
    #[serde(default)]
    pub tag_release: bool,
}

fn default_remote() -> String {
    "origin".into()
}
fn default_push() -> bool {
    true
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            push: default_push(),
            tag_release: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "upstream.dir".into(),
                detail: "must not be empty".into(),
            });
        }
        if self.destination.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "destination.path".into(),
                detail: "must not be empty".into(),
            });
        }
        if self.commit.message.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "commit.message".into(),
                detail: "must not be empty".into(),
            });
        }
        if !self.commit.author_email.contains('@') {
            return Err(ConfigError::InvalidValue {
                field: "commit.author_email".into(),
                detail: "must contain '@'".into(),
            });
        }
        if let Some(url) = &self.upstream.url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "upstream.url".into(),
                    detail: "must not be empty when set".into(),
                });
            }
        }
        Ok(())
    }
}
