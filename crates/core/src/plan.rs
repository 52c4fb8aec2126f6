//! Sync plan computation and application.
//!
//! A [`SyncPlan`] is the set of upstream files that pass the ignore filter
//! and differ from (or are absent in) the destination tree. It is computed
//! fresh on every run and never persisted; applying the same plan twice is
//! a no-op because identical files are excluded up front.

use std::fs;
use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, trace};
use walkdir::WalkDir;

use crate::errors::SyncError;
use crate::ignore::IgnoreSet;

/// Name of the ignore file, resolved at the upstream tree root. The file
/// itself is never synced; the destination's own `.git` must never be
/// overwritten by an upstream checkout's.
pub const IGNORE_FILE: &str = ".contentignore";

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// How a planned file changes the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The file does not exist in the destination.
    Add,
    /// The file exists in the destination with different content.
    Update,
}

/// One file to copy from the source tree into the destination.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    /// Path relative to both tree roots, forward-slash separated.
    pub rel_path: String,
    /// Source file size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the source content.
    pub digest: String,
    pub kind: ChangeKind,
}

/// The computed set of file changes for one sync invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub entries: Vec<PlanEntry>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn additions(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == ChangeKind::Add)
            .count()
    }

    pub fn updates(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == ChangeKind::Update)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

/// Walk `source_root` and return relative file paths in deterministic
/// (sorted) order. `.git` directories are pruned; the ignore file itself is
/// skipped. A fresh walk every call keeps the sequence restartable.
pub fn walk_source(source_root: &Path) -> Result<Vec<String>, SyncError> {
    if !source_root.is_dir() {
        return Err(SyncError::SourceUnavailable {
            path: source_root.display().to_string(),
            detail: "not a directory".into(),
        });
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != std::ffi::OsStr::new(".git"));

    for entry in walker {
        let entry = entry.map_err(|e| SyncError::WalkError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source_root)
            .map_err(|e| SyncError::WalkError(e.to_string()))?;
        if rel.file_name() == Some(IGNORE_FILE.as_ref()) && rel.parent() == Some(Path::new(""))
        {
            continue;
        }
        paths.push(rel_to_string(rel));
    }

    trace!(count = paths.len(), "walked source tree");
    Ok(paths)
}

fn rel_to_string(rel: &Path) -> String {
    // Forward slashes regardless of platform, matching ignore semantics.
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn sha256_file(path: &Path) -> Result<(u64, String), std::io::Error> {
    let content = fs::read(path)?;
    let digest = Sha256::digest(&content);
    Ok((content.len() as u64, hex::encode(digest)))
}

// ---------------------------------------------------------------------------
// Plan computation
// ---------------------------------------------------------------------------

/// Compute the sync plan: walk the source tree, drop ignored paths, drop
/// paths whose destination copy is byte-identical.
///
/// Ignored paths are excluded even when the destination copy differs —
/// ignore rules suppress updates, not just additions. Files present only in
/// the destination are never considered (one-directional sync).
pub fn compute_plan(
    source_root: &Path,
    dest_root: &Path,
    ignores: &IgnoreSet,
) -> Result<SyncPlan, SyncError> {
    let mut entries = Vec::new();

    for rel_path in walk_source(source_root)? {
        if let Some(pattern) = ignores.explain(&rel_path) {
            trace!(path = %rel_path, pattern = %pattern, "ignored");
            continue;
        }

        let src_file = source_root.join(&rel_path);
        let dst_file = dest_root.join(&rel_path);

        let (size, digest) = sha256_file(&src_file).map_err(|e| SyncError::FileIo {
            path: rel_path.clone(),
            source: e,
        })?;

        let kind = if !dst_file.is_file() {
            ChangeKind::Add
        } else {
            // Cheap size check first, digest only on equal sizes.
            let dst_size = fs::metadata(&dst_file)
                .map_err(|e| SyncError::FileIo {
                    path: rel_path.clone(),
                    source: e,
                })?
                .len();
            if dst_size == size {
                let (_, dst_digest) = sha256_file(&dst_file).map_err(|e| SyncError::FileIo {
                    path: rel_path.clone(),
                    source: e,
                })?;
                if dst_digest == digest {
                    trace!(path = %rel_path, "identical, skipping");
                    continue;
                }
            }
            ChangeKind::Update
        };

        entries.push(PlanEntry {
            rel_path,
            size,
            digest,
            kind,
        });
    }

    debug!(
        total = entries.len(),
        additions = entries.iter().filter(|e| e.kind == ChangeKind::Add).count(),
        "computed sync plan"
    );
    Ok(SyncPlan { entries })
}

// ---------------------------------------------------------------------------
// Plan application
// ---------------------------------------------------------------------------

/// Apply the plan: copy each entry from `source_root` into `dest_root`,
/// creating subdirectories as needed.
///
/// Each file is written atomically: content goes to a temporary file in the
/// destination directory, then a rename swaps it into place. Interruption
/// mid-plan leaves earlier entries applied and later ones untouched, which
/// a rerun completes. Returns the relative paths written.
pub fn apply_plan(
    plan: &SyncPlan,
    source_root: &Path,
    dest_root: &Path,
) -> Result<Vec<String>, SyncError> {
    let mut written = Vec::with_capacity(plan.len());

    for entry in &plan.entries {
        let src_file = source_root.join(&entry.rel_path);
        let dst_file = dest_root.join(&entry.rel_path);

        write_atomic(&src_file, &dst_file).map_err(|e| SyncError::FileIo {
            path: entry.rel_path.clone(),
            source: e,
        })?;

        trace!(path = %entry.rel_path, kind = ?entry.kind, "applied");
        written.push(entry.rel_path.clone());
    }

    info!(files = written.len(), "applied sync plan");
    Ok(written)
}

fn write_atomic(src_file: &Path, dst_file: &Path) -> Result<(), std::io::Error> {
    let parent = dst_file.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let content = fs::read(src_file)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(&content)?;
    tmp.flush()?;
    tmp.persist(dst_file).map_err(|e| e.error)?;

    #[cfg(unix)]
    {
        // Preserve the source mode (scripts keep their execute bit).
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(src_file)?.permissions().mode();
        fs::set_permissions(dst_file, fs::Permissions::from_mode(mode))?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
