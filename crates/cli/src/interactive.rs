//! Interactive plan review.
//!
//! Walks the user through the computed sync plan, confirming new files and
//! offering a unified-diff preview for modified ones, with "apply to all"
//! accelerators. `--force` bypasses this entirely.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Confirm;

use integrator_core::plan::{ChangeKind, SyncPlan};

use crate::style;

/// Review `plan` entry by entry, returning the subset the user accepted.
pub fn review_plan(plan: &SyncPlan, source_root: &Path, dest_root: &Path) -> Result<SyncPlan> {
    let mut accepted = SyncPlan::default();
    let mut add_all = false;
    let mut modify_all = false;

    for entry in &plan.entries {
        match entry.kind {
            ChangeKind::Add => {
                println!("{} {}", entry.rel_path, style::added());
                if add_all {
                    accepted.entries.push(entry.clone());
                    continue;
                }
                if confirm("Do you want to add this file?", true)? {
                    accepted.entries.push(entry.clone());
                    if confirm("Do you want to add all new files?", false)? {
                        add_all = true;
                    }
                }
            }
            ChangeKind::Update => {
                println!("{} {}", entry.rel_path, style::modified());
                if modify_all {
                    accepted.entries.push(entry.clone());
                    continue;
                }
                if confirm("Do you want to view the diff?", false)? {
                    print_diff(source_root, dest_root, &entry.rel_path);
                }
                if confirm("Do you want to accept these changes?", true)? {
                    accepted.entries.push(entry.clone());
                    if confirm("Do you want to accept all modified files?", false)? {
                        modify_all = true;
                    }
                }
            }
        }
    }

    Ok(accepted)
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .context("failed to read confirmation")
}

/// Print a unified diff of destination vs upstream content. Files that are
/// not valid UTF-8 get a one-line notice instead of a dump.
fn print_diff(source_root: &Path, dest_root: &Path, rel_path: &str) {
    let old = fs::read(dest_root.join(rel_path)).unwrap_or_default();
    let new = fs::read(source_root.join(rel_path)).unwrap_or_default();

    match (String::from_utf8(old), String::from_utf8(new)) {
        (Ok(old), Ok(new)) => {
            let patch = diffy::create_patch(&old, &new);
            for line in patch.to_string().lines() {
                println!("{}", style::diff_line(line));
            }
        }
        _ => {
            println!("{}", style::dim("(binary file changed, no diff preview)"));
        }
    }
}
