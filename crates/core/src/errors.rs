//! Error types for the integrator core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations against the destination
/// repository or the upstream checkout.
#[derive(Debug, Error)]
pub enum GitError {
    /// The destination path exists but cannot be opened or initialized as
    /// a repository.
    #[error("failed to initialize repository at '{path}': {detail}")]
    InitFailed { path: String, detail: String },

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// Committing staged changes failed. Fatal: nothing was persisted.
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// Push was rejected by the remote (e.g. non-fast-forward).
    #[error("push rejected for branch '{branch}': {detail}")]
    PushRejected { branch: String, detail: String },

    /// A ref (branch, tag, SHA) could not be resolved.
    #[error("git ref not found: {0}")]
    RefNotFound(String),

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Errors from plan computation and application.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The upstream content tree is missing or unreadable. Fatal, detected
    /// before any write to the destination.
    #[error("upstream content tree unavailable at '{path}': {detail}")]
    SourceUnavailable { path: String, detail: String },

    /// Walking the source tree failed partway through. No partial plan is
    /// applied.
    #[error("failed to walk source tree: {0}")]
    WalkError(String),

    /// Reading or writing a planned file failed.
    #[error("I/O error on '{path}': {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying Git error during publish.
    #[error("publish error: {0}")]
    GitError(#[from] GitError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = SyncError::SourceUnavailable {
            path: "/tmp/content".into(),
            detail: "No such file or directory".into(),
        };
        assert!(err.to_string().contains("/tmp/content"));

        let err = GitError::PushRejected {
            branch: "main".into(),
            detail: "non-fast-forward".into(),
        };
        assert_eq!(
            err.to_string(),
            "push rejected for branch 'main': non-fast-forward"
        );

        let err = ConfigError::InvalidValue {
            field: "commit.author_email".into(),
            detail: "missing '@'".into(),
        };
        assert!(err.to_string().contains("commit.author_email"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let sync_err = SyncError::WalkError("boom".into());
        let core_err: CoreError = sync_err.into();
        assert!(matches!(core_err, CoreError::Sync(_)));

        let git_err = GitError::CommitFailed("empty index".into());
        let core_err: CoreError = git_err.into();
        assert!(matches!(core_err, CoreError::Git(_)));
    }
}
