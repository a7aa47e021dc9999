//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--descriptor <path>`: Program descriptor to load
//! - `--module-path <dir>`: Extra directory searched for module manifests
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chassis - discover modules from a program descriptor and drive them
/// through a staged lifecycle
#[derive(Parser, Debug)]
#[command(name = "chassis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Program descriptor to load [default: programdata.json]
    #[arg(long, global = true, value_name = "PATH")]
    pub descriptor: Option<PathBuf>,

    /// Directory searched for <name>.json module manifests (repeatable)
    #[arg(long = "module-path", global = true, value_name = "DIR")]
    pub module_path: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, conflicts_with = "quiet")]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a skeleton program descriptor
    #[command(
        name = "init",
        long_about = "Write a skeleton program descriptor.\n\n\
            The descriptor names an execution type, a ring log capacity and an \
            empty MODULES block. Edit it to add module names, files or directories.",
        after_help = "\
EXAMPLES:
    # Command-line tool with one run module
    chassis init

    # Server-style program, bigger ring log, somewhere else
    chassis --descriptor app/programdata.json init --execution-type WEBSERVER --ring-len 64"
    )]
    Init {
        /// Execution type to select
        #[arg(long, default_value = "CLITOOL", value_name = "NAME")]
        execution_type: String,

        /// Ring log capacity
        #[arg(long, default_value_t = 32, value_name = "N")]
        ring_len: usize,

        /// Overwrite an existing descriptor
        #[arg(long)]
        force: bool,
    },

    /// Discover modules and report the run-module census
    #[command(
        name = "discover",
        long_about = "Discover modules and report the run-module census.\n\n\
            Resolves every module reachable from the descriptor and the execution \
            type, wires vocabulary and snowflakes, then prints the module list and \
            the diagnostic log. No lifecycle stage runs.\n\n\
            Exits non-zero if an ERR diagnostic was logged."
    )]
    Discover,

    /// Run the full lifecycle
    #[command(
        name = "run",
        long_about = "Run the full lifecycle.\n\n\
            Discovers modules, then runs the setup stages, the run entry and the \
            teardown stages. Prints the log, the ring log, the noticed flags and \
            the exported snowflake counts.\n\n\
            Exits non-zero if an ERR diagnostic was logged.",
        after_help = "\
EXAMPLES:
    # Run with manifests from ./modules
    chassis --module-path modules run

    # Tick every pulse hook three times before teardown
    chassis run --pulses 3"
    )]
    Run {
        /// Call every pulse hook this many times after the run phase
        #[arg(long, default_value_t = 0, value_name = "N")]
        pulses: usize,
    },

    /// List the built-in execution types
    #[command(name = "types")]
    Types,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    chassis completion bash > ~/.local/share/bash-completion/completions/chassis
    chassis completion zsh > ~/.zfunc/_chassis"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
