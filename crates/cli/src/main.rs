//! Content integrator command-line tool.
//!
//! Synchronizes a custom content repository with upstream integration
//! content: filters the upstream tree through `.contentignore`, copies
//! new/changed files, then commits and optionally tags and pushes.

mod interactive;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use integrator_core::config::Config;
use integrator_core::plan::ChangeKind;
use integrator_core::sync_engine::SyncEngine;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Content integrator command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "integrator",
    version,
    about = "Sync a custom content repository with upstream integration content"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./integrator.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync upstream content into the custom content repository.
    Sync {
        /// Destination repository path (created if absent).
        #[arg(long)]
        custom_content_repo: Option<PathBuf>,

        /// Local upstream content tree.
        #[arg(long)]
        upstream: Option<PathBuf>,

        /// Upstream URL to clone/update before syncing.
        #[arg(long)]
        upstream_url: Option<String>,

        /// Commit message for the sync commit.
        #[arg(short, long)]
        message: Option<String>,

        /// Apply every planned change without confirmation.
        #[arg(long)]
        force: bool,

        /// Commit locally but do not push.
        #[arg(long)]
        no_push: bool,

        /// Create a calendar release tag for the sync commit.
        #[arg(long)]
        tag: bool,
    },

    /// Show what a sync would change, without writing anything.
    Plan {
        /// Destination repository path.
        #[arg(long)]
        custom_content_repo: Option<PathBuf>,

        /// Local upstream content tree.
        #[arg(long)]
        upstream: Option<PathBuf>,
    },

    /// List upstream files excluded by .contentignore and why.
    Ignores {
        /// Local upstream content tree.
        #[arg(long)]
        upstream: Option<PathBuf>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./integrator.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    // Minimal logging for CLI; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&cli.config),
        Commands::Sync {
            custom_content_repo,
            upstream,
            upstream_url,
            message,
            force,
            no_push,
            tag,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(path) = custom_content_repo {
                config.destination.path = path;
            }
            if let Some(dir) = upstream {
                config.upstream.dir = dir;
            }
            if let Some(url) = upstream_url {
                config.upstream.url = Some(url);
            }
            if let Some(message) = message {
                config.commit.message = message;
            }
            if no_push {
                config.publish.push = false;
            }
            if tag {
                config.publish.tag_release = true;
            }
            cmd_sync(config, force)
        }
        Commands::Plan {
            custom_content_repo,
            upstream,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(path) = custom_content_repo {
                config.destination.path = path;
            }
            if let Some(dir) = upstream {
                config.upstream.dir = dir;
            }
            cmd_plan(config)
        }
        Commands::Ignores { upstream } => {
            let mut config = load_config(&cli.config)?;
            if let Some(dir) = upstream {
                config.upstream.dir = dir;
            }
            cmd_ignores(config)
        }
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    let config = Config::load_or_default(path).context("failed to load configuration file")?;
    config
        .validate()
        .context("configuration validation failed")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_sync(config: Config, force: bool) -> Result<()> {
    let engine = SyncEngine::new(config);

    engine
        .refresh_upstream()
        .context("failed to refresh upstream content")?;

    let plan = engine.plan().context("failed to compute sync plan")?;
    if plan.is_empty() {
        println!("{}", style::success("Nothing to sync."));
        return Ok(());
    }

    println!(
        "{} file(s) to sync ({} new, {} modified)",
        plan.len(),
        plan.additions(),
        plan.updates()
    );

    let plan = if force {
        plan
    } else {
        let accepted = interactive::review_plan(
            &plan,
            &engine.config().upstream.dir,
            &engine.config().destination.path,
        )?;
        if accepted.is_empty() {
            println!("{}", style::success("Nothing accepted, nothing to sync."));
            return Ok(());
        }
        accepted
    };

    let outcome = engine
        .apply_and_publish(&plan)
        .context("sync failed")?;

    println!();
    println!("{}", style::success(&format!("{} file(s) synced.", outcome.applied.len())));
    if let Some(sha) = &outcome.commit_sha {
        println!("  Commit : {}", sha);
    }
    if let Some(tag) = &outcome.release_tag {
        println!("  Release: {}", tag);
    }
    if outcome.pushed {
        println!("  Pushed : yes");
    } else if let Some(warning) = &outcome.push_warning {
        // Non-fatal: the local commit already succeeded.
        println!("{}", style::warn(&format!("push failed: {}", warning)));
    } else {
        println!("  Pushed : no (no remote configured or push disabled)");
    }

    Ok(())
}

fn cmd_plan(config: Config) -> Result<()> {
    let engine = SyncEngine::new(config);
    let plan = engine.plan().context("failed to compute sync plan")?;

    if plan.is_empty() {
        println!("Nothing to sync.");
        return Ok(());
    }

    println!("{}", style::header("Sync plan"));
    for entry in &plan.entries {
        let marker = match entry.kind {
            ChangeKind::Add => "A",
            ChangeKind::Update => "M",
        };
        println!("  {} {} {}", marker, entry.rel_path, style::dim(&format!("({} bytes)", entry.size)));
    }
    println!();
    println!(
        "{} file(s): {} new, {} modified",
        plan.len(),
        plan.additions(),
        plan.updates()
    );

    Ok(())
}

fn cmd_ignores(config: Config) -> Result<()> {
    let engine = SyncEngine::new(config);
    let ignored = engine
        .ignored_paths()
        .context("failed to evaluate ignore patterns")?;

    if ignored.is_empty() {
        println!("No upstream files are ignored.");
        return Ok(());
    }

    for (path, pattern) in &ignored {
        println!("{:<30} {}", pattern, path);
    }
    println!();
    println!("{} file(s) ignored", ignored.len());

    Ok(())
}

fn cmd_init(output: &PathBuf) -> Result<()> {
    let default_config = r#"# Content integrator configuration
# See documentation for all available options.

[upstream]
# url = "git@github.com:demisto/content.git"
dir = "./demisto-content"

[destination]
path = "./custom-content"

[commit]
message = "Sync upstream content"
author_name = "integrator"
author_email = "integrator@localhost"

[publish]
remote = "origin"
push = true
tag_release = false

[log]
level = "info"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the config file with your upstream and destination paths");
    println!("  2. Add a .contentignore at the upstream root for anything to skip");
    println!(
        "  3. Validate with: integrator validate --config {}",
        output.display()
    );
    println!("  4. Run: integrator sync");

    Ok(())
}

fn cmd_validate(config_path: &PathBuf) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config = Config::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => {
            println!("  [OK] All required fields are valid");
        }
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!(
        "  Upstream URL : {}",
        config.upstream.url.as_deref().unwrap_or("(local only)")
    );
    println!("  Upstream dir : {}", config.upstream.dir.display());
    println!("  Destination  : {}", config.destination.path.display());
    println!("  Commit author: {} <{}>", config.commit.author_name, config.commit.author_email);
    println!("  Remote       : {}", config.publish.remote);
    println!("  Push         : {}", config.publish.push);
    println!("  Tag releases : {}", config.publish.tag_release);
    println!();
    println!("Configuration is valid.");

    Ok(())
}
