//! cli
//!
//! Command-line interface layer for the chassis.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Merge them over the user config file
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for discovery and the lifecycle. It never loads a module
//! or runs a stage itself.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Settings every command sees, after merging config and flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Program descriptor path.
    pub descriptor: PathBuf,
    /// Search path for by-name manifests, flags first.
    pub module_path: Vec<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Machine-readable output.
    pub json: bool,
}

impl Context {
    /// Merge CLI flags over the loaded config.
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        let quiet = cli.quiet || (!cli.debug && config.quiet());
        let debug = cli.debug || (!cli.quiet && config.debug());

        let mut module_path = cli.module_path.clone();
        module_path.extend(config.module_path().iter().cloned());

        Self {
            descriptor: cli
                .descriptor
                .clone()
                .unwrap_or_else(|| config.descriptor()),
            module_path,
            verbosity: Verbosity::from_flags(quiet, debug),
            json: cli.json,
        }
    }
}

/// Install the stderr tracing subscriber.
///
/// `--debug` shows debug events; otherwise `RUST_LOG` applies, falling back
/// to `warn`. `--quiet` silences tracing entirely.
fn init_tracing(verbosity: Verbosity) {
    let filter = match verbosity {
        Verbosity::Debug => EnvFilter::new("debug"),
        Verbosity::Quiet => EnvFilter::new("off"),
        Verbosity::Normal => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    };

    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load().context("Failed to load configuration")?;
    let ctx = Context::resolve(&cli, &config);

    init_tracing(ctx.verbosity);
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    commands::dispatch(cli.command, &ctx)
}
