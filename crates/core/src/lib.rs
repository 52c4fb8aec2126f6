//! Integrator core library.
//!
//! This crate provides the components behind the `integrator` CLI:
//! configuration, gitignore-style content filtering, sync-plan computation
//! and application, the git adapter, release versioning, and the engine
//! that ties one sync invocation together.

pub mod config;
pub mod errors;
pub mod git;
pub mod ignore;
pub mod plan;
pub mod release;
pub mod sync_engine;

// Re-exports for convenience.
pub use config::Config;
pub use errors::CoreError;
pub use ignore::IgnoreSet;
pub use plan::SyncPlan;
pub use sync_engine::{SyncEngine, SyncOutcome};
