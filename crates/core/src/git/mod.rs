//! Version-control interaction for the integrator.
//!
//! All git operations are funneled through [`GitClient`] so the rest of
//! the core never touches `git2` directly.

mod client;

pub use client::{GitClient, PushStatus};
