//! The content synchronization engine.
//!
//! Orchestrates one sync invocation: refresh the upstream checkout, load
//! ignore patterns, compute the plan, apply it to the destination working
//! tree, then publish (stage, commit, optional release tag, push).
//!
//! The engine is single-threaded and synchronous. Publish errors are
//! isolated from file application: by the time a commit or push can fail,
//! every planned file has already been written, and a push failure never
//! rolls back the commit.

use std::path::Path;

use chrono::Local;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::{CoreError, SyncError};
use crate::git::{GitClient, PushStatus};
use crate::ignore::IgnoreSet;
use crate::plan::{apply_plan, compute_plan, SyncPlan, IGNORE_FILE};
use crate::release::next_version;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Summary of one completed sync invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Relative paths written into the destination.
    pub applied: Vec<String>,
    /// SHA of the sync commit, when one was created.
    pub commit_sha: Option<String>,
    /// Release tag created, when tagging is enabled.
    pub release_tag: Option<String>,
    /// `true` if the commit was pushed to the remote.
    pub pushed: bool,
    /// Warning text when the push failed; the commit remains local.
    pub push_warning: Option<String>,
}

impl SyncOutcome {
    /// `true` if this invocation had nothing to do.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Produces an idempotent, filtered copy of upstream content in the
/// destination repository, then optionally persists and publishes it.
pub struct SyncEngine {
    config: Config,
}

impl SyncEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clone or fast-forward the upstream checkout when a URL is
    /// configured. With no URL, the local upstream directory is used as-is.
    pub fn refresh_upstream(&self) -> Result<(), CoreError> {
        if let Some(url) = &self.config.upstream.url {
            info!(url = %url, dir = %self.config.upstream.dir.display(), "refreshing upstream content");
            GitClient::clone_or_update(url, &self.config.upstream.dir)
                .map_err(SyncError::GitError)?;
        }
        Ok(())
    }

    /// Load the ignore set from the upstream tree root.
    pub fn load_ignores(&self) -> Result<IgnoreSet, CoreError> {
        let path = self.config.upstream.dir.join(IGNORE_FILE);
        let set = IgnoreSet::load(&path).map_err(|e| {
            CoreError::Sync(SyncError::FileIo {
                path: path.display().to_string(),
                source: e,
            })
        })?;
        for skipped in set.skipped() {
            warn!(
                line = skipped.line,
                reason = %skipped.reason,
                "ignoring malformed .contentignore line"
            );
        }
        Ok(set)
    }

    /// Compute the sync plan without touching the destination (dry run).
    /// The upstream tree must exist; the destination need not.
    pub fn plan(&self) -> Result<SyncPlan, CoreError> {
        let ignores = self.load_ignores()?;
        let plan = compute_plan(
            &self.config.upstream.dir,
            &self.config.destination.path,
            &ignores,
        )?;
        Ok(plan)
    }

    /// Apply a plan and publish the result.
    ///
    /// The destination repository is initialized if absent even when the
    /// plan is empty, so a fresh destination always ends up usable. An
    /// empty plan creates no commit.
    pub fn apply_and_publish(&self, plan: &SyncPlan) -> Result<SyncOutcome, CoreError> {
        let dest = &self.config.destination.path;
        let client = GitClient::open_or_init(dest)?;

        let applied = apply_plan(plan, &self.config.upstream.dir, dest)?;
        if applied.is_empty() {
            info!("nothing to sync");
            return Ok(SyncOutcome::default());
        }

        let mut outcome = SyncOutcome {
            applied,
            ..SyncOutcome::default()
        };

        // Publish stage. File application is complete at this point.
        client.stage(&outcome.applied).map_err(SyncError::GitError)?;
        let sha = client
            .commit(
                &self.config.commit.message,
                &self.config.commit.author_name,
                &self.config.commit.author_email,
            )
            .map_err(SyncError::GitError)?;
        outcome.commit_sha = Some(sha.to_string());

        if self.config.publish.tag_release {
            let tags = client.list_tags().map_err(SyncError::GitError)?;
            let version = next_version(&tags, Local::now().date_naive());
            client
                .tag(
                    &version,
                    &self.config.commit.message,
                    &self.config.commit.author_name,
                    &self.config.commit.author_email,
                )
                .map_err(SyncError::GitError)?;
            outcome.release_tag = Some(version);
        }

        if self.config.publish.push {
            match client.push(&self.config.publish.remote) {
                Ok(PushStatus::Pushed) => outcome.pushed = true,
                Ok(PushStatus::NoRemote) => {}
                Err(e) => {
                    // Non-fatal: the commit is already local and consistent.
                    warn!(error = %e, "push failed, commit remains local");
                    outcome.push_warning = Some(e.to_string());
                }
            }
        }

        info!(
            files = outcome.applied.len(),
            commit = outcome.commit_sha.as_deref().unwrap_or("-"),
            pushed = outcome.pushed,
            "sync completed"
        );
        Ok(outcome)
    }

    /// Run a full sync cycle: refresh upstream, plan, apply, publish.
    pub fn run(&self) -> Result<SyncOutcome, CoreError> {
        self.refresh_upstream()?;
        let plan = self.plan()?;
        self.apply_and_publish(&plan)
    }

    /// Paths in the upstream tree that the ignore set excludes, with the
    /// pattern responsible. Backs the `ignores` subcommand.
    pub fn ignored_paths(&self) -> Result<Vec<(String, String)>, CoreError> {
        let ignores = self.load_ignores()?;
        let mut result = Vec::new();
        for rel_path in crate::plan::walk_source(&self.config.upstream.dir)? {
            if let Some(pattern) = ignores.explain(&rel_path) {
                result.push((rel_path, pattern.text.clone()));
            }
        }
        Ok(result)
    }
}

/// Build an engine config for ad-hoc paths (used by the CLI to fold flag
/// overrides into a loaded config).
pub fn config_with_paths(mut config: Config, upstream: &Path, destination: &Path) -> Config {
    config.upstream.dir = upstream.to_path_buf();
    config.destination.path = destination.to_path_buf();
    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
