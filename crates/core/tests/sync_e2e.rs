//! End-to-end tests for the sync pipeline.
//!
//! These tests exercise full sync invocations using:
//! - Real upstream trees written into temp directories
//! - Real Git repositories via `git2` (through [`GitClient`])
//! - Local bare repositories as push targets
//!
//! No network I/O anywhere.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use integrator_core::config::Config;
use integrator_core::errors::{CoreError, SyncError};
use integrator_core::git::GitClient;
use integrator_core::sync_engine::{config_with_paths, SyncEngine};

// ===========================================================================
// Helper functions
// ===========================================================================

/// Write `content` to `rel` under `root`, creating parent directories.
fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A scratch area with an upstream tree and a destination path.
struct Fixture {
    dir: TempDir,
    upstream: PathBuf,
    dest: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let upstream = dir.path().join("demisto-content");
        let dest = dir.path().join("custom-content");
        fs::create_dir_all(&upstream).unwrap();
        Self {
            dir,
            upstream,
            dest,
        }
    }

    fn engine(&self) -> SyncEngine {
        SyncEngine::new(config_with_paths(
            Config::default(),
            &self.upstream,
            &self.dest,
        ))
    }

    fn engine_with(&self, tweak: impl FnOnce(&mut Config)) -> SyncEngine {
        let mut config = config_with_paths(Config::default(), &self.upstream, &self.dest);
        tweak(&mut config);
        SyncEngine::new(config)
    }
}

// ===========================================================================
// Spec properties
// ===========================================================================

#[test]
fn fresh_destination_ends_up_initialized_and_committed() {
    let fx = Fixture::new();
    write(&fx.upstream, "Integrations/bar.yml", "bar");
    write(&fx.upstream, "Playbooks/pb.yml", "pb");
    write(&fx.upstream, "install.sh", "echo hi");
    write(&fx.upstream, ".contentignore", "*.sh\n");

    assert!(!fx.dest.exists());
    let outcome = fx.engine().run().unwrap();

    assert_eq!(
        outcome.applied,
        vec!["Integrations/bar.yml", "Playbooks/pb.yml"]
    );
    assert!(fx.dest.join(".git").exists());
    assert!(fx.dest.join("Integrations/bar.yml").exists());
    assert!(!fx.dest.join("install.sh").exists());

    // The filtered files are committed, not just written.
    let client = GitClient::open(&fx.dest).unwrap();
    assert_eq!(client.head_sha().unwrap(), outcome.commit_sha.unwrap());
    assert!(!client.is_dirty().unwrap());
}

#[test]
fn sync_twice_second_plan_is_empty() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");
    write(&fx.upstream, "sub/b.yml", "b");

    let engine = fx.engine();
    engine.run().unwrap();

    let second = engine.plan().unwrap();
    assert!(second.is_empty());

    let outcome = engine.run().unwrap();
    assert!(outcome.is_noop());
    assert!(outcome.commit_sha.is_none());
}

#[test]
fn ignore_suppresses_updates_not_just_additions() {
    let fx = Fixture::new();
    write(&fx.upstream, "kept.yml", "upstream");
    write(&fx.upstream, "local.sh", "upstream version");
    write(&fx.upstream, ".contentignore", "*.sh\n");

    // Destination already has a *different* copy of the ignored file.
    let engine = fx.engine();
    GitClient::open_or_init(&fx.dest).unwrap();
    write(&fx.dest, "local.sh", "my local customization");

    engine.run().unwrap();

    assert_eq!(
        fs::read_to_string(fx.dest.join("local.sh")).unwrap(),
        "my local customization"
    );
    assert_eq!(fs::read_to_string(fx.dest.join("kept.yml")).unwrap(), "upstream");
}

#[test]
fn negation_reincludes_file() {
    let fx = Fixture::new();
    write(&fx.upstream, "Tests/keep.yml", "keep");
    write(&fx.upstream, "Tests/drop.yml", "drop");
    write(&fx.upstream, ".contentignore", "Tests/*\n!Tests/keep.yml\n");

    let outcome = fx.engine().run().unwrap();
    assert_eq!(outcome.applied, vec!["Tests/keep.yml"]);
    assert!(!fx.dest.join("Tests/drop.yml").exists());
}

#[test]
fn destination_only_files_survive_sync() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");

    let engine = fx.engine();
    GitClient::open_or_init(&fx.dest).unwrap();
    write(&fx.dest, "extra.yml", "mine");

    engine.run().unwrap();

    assert_eq!(fs::read_to_string(fx.dest.join("extra.yml")).unwrap(), "mine");
}

#[test]
fn missing_contentignore_syncs_everything() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");
    write(&fx.upstream, "b.sh", "b");

    let outcome = fx.engine().run().unwrap();
    assert_eq!(outcome.applied, vec!["a.yml", "b.sh"]);
}

#[test]
fn missing_upstream_aborts_before_touching_destination() {
    let fx = Fixture::new();
    fs::remove_dir_all(&fx.upstream).unwrap();

    let err = fx.engine().run().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Sync(SyncError::SourceUnavailable { .. })
    ));
    assert!(!fx.dest.exists());
}

// ===========================================================================
// Publishing
// ===========================================================================

#[test]
fn push_goes_to_local_bare_remote() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");

    // Destination with a local bare repo as origin.
    let bare = fx.dir.path().join("remote.git");
    git2::Repository::init_bare(&bare).unwrap();
    let dest_repo = git2::Repository::init(&fx.dest).unwrap();
    dest_repo
        .remote("origin", bare.to_str().unwrap())
        .unwrap();

    let outcome = fx.engine().run().unwrap();
    assert!(outcome.pushed);
    assert!(outcome.push_warning.is_none());

    // The bare remote received the branch.
    let remote_repo = git2::Repository::open_bare(&bare).unwrap();
    assert!(remote_repo.head().is_ok());
}

#[test]
fn push_failure_is_warning_commit_survives() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");

    // Remote URL points at nothing: the push fails, the sync must not.
    let dest_repo = git2::Repository::init(&fx.dest).unwrap();
    dest_repo
        .remote("origin", fx.dir.path().join("missing.git").to_str().unwrap())
        .unwrap();

    let outcome = fx.engine().run().unwrap();
    assert!(!outcome.pushed);
    assert!(outcome.push_warning.is_some());

    // Local commit stands.
    let client = GitClient::open(&fx.dest).unwrap();
    assert_eq!(client.head_sha().unwrap(), outcome.commit_sha.unwrap());
}

#[test]
fn no_push_config_skips_remote_entirely() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");

    let bare = fx.dir.path().join("remote.git");
    git2::Repository::init_bare(&bare).unwrap();
    let dest_repo = git2::Repository::init(&fx.dest).unwrap();
    dest_repo
        .remote("origin", bare.to_str().unwrap())
        .unwrap();

    let engine = fx.engine_with(|c| c.publish.push = false);
    let outcome = engine.run().unwrap();
    assert!(!outcome.pushed);
    assert!(outcome.push_warning.is_none());

    let remote_repo = git2::Repository::open_bare(&bare).unwrap();
    assert!(remote_repo.head().is_err());
}

#[test]
fn release_tags_increment_within_month() {
    let fx = Fixture::new();
    write(&fx.upstream, "a.yml", "a");

    let engine = fx.engine_with(|c| c.publish.tag_release = true);
    let first = engine.run().unwrap().release_tag.unwrap();
    assert!(first.ends_with(".0"));

    write(&fx.upstream, "b.yml", "b");
    let second = engine.run().unwrap().release_tag.unwrap();
    assert!(second.ends_with(".1"));

    let client = GitClient::open(&fx.dest).unwrap();
    let tags = client.list_tags().unwrap();
    assert_eq!(tags.len(), 2);
}

// ===========================================================================
// Upstream refresh
// ===========================================================================

#[test]
fn upstream_url_is_cloned_then_fast_forwarded() {
    let fx = Fixture::new();

    // Seed an upstream origin repository.
    let origin_path = fx.dir.path().join("origin");
    let origin = GitClient::open_or_init(&origin_path).unwrap();
    write(&origin_path, "a.yml", "v1");
    origin.stage_all().unwrap();
    origin.commit("seed", "Up", "up@example.com").unwrap();

    fs::remove_dir_all(&fx.upstream).unwrap();
    let engine = fx.engine_with(|c| {
        c.upstream.url = Some(origin_path.display().to_string());
    });

    let outcome = engine.run().unwrap();
    assert_eq!(outcome.applied, vec!["a.yml"]);
    assert_eq!(fs::read_to_string(fx.dest.join("a.yml")).unwrap(), "v1");

    // Upstream moves; the next sync picks up the fast-forwarded content.
    write(&origin_path, "a.yml", "v2");
    origin.stage_all().unwrap();
    origin.commit("update", "Up", "up@example.com").unwrap();

    let outcome = engine.run().unwrap();
    assert_eq!(outcome.applied, vec!["a.yml"]);
    assert_eq!(fs::read_to_string(fx.dest.join("a.yml")).unwrap(), "v2");
}
