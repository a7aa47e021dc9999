//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the descriptor and builds the module catalog
//! 2. Calls the engine to discover modules or run the lifecycle
//! 3. Formats and displays output
//!
//! Handlers never call a module hook directly. An ERR diagnostic in the
//! chassis log turns into a failed command after the report is printed.

mod completion;
mod discover;
mod init;
mod run;
mod types;

pub use completion::completion;
pub use discover::discover;
pub use init::init;
pub use run::run;
pub use types::types;

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde_json::{json, Value};

use super::args::Command;
use super::Context;
use crate::core::descriptor::ProgramDescriptor;
use crate::engine::census::RunCensus;
use crate::engine::ledger::Severity;
use crate::engine::source::ModuleCatalog;
use crate::engine::Chassis;
use crate::ui::output::{self, Verbosity};

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            execution_type,
            ring_len,
            force,
        } => init(ctx, &execution_type, ring_len, force),
        Command::Discover => discover(ctx),
        Command::Run { pulses } => run(ctx, pulses),
        Command::Types => types(ctx),
        Command::Completion { shell } => completion(shell),
    }
}

/// Load the descriptor and build a catalog over the configured search path.
///
/// Relative addresses in the descriptor resolve against its own directory,
/// and that directory is searched last for by-name manifests.
fn open_program(ctx: &Context) -> Result<(Chassis, ModuleCatalog)> {
    let mut descriptor = ProgramDescriptor::load(&ctx.descriptor)
        .with_context(|| format!("Failed to load {}", ctx.descriptor.display()))?;

    let base = ctx
        .descriptor
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    descriptor.modules = descriptor.modules.rebased(base);

    let mut catalog = ModuleCatalog::with_search_path(ctx.module_path.iter().cloned());
    catalog.add_search_dir(base);

    output::debug(
        format!(
            "descriptor {} ({})",
            ctx.descriptor.display(),
            descriptor.program.execution_type
        ),
        ctx.verbosity,
    );

    let chassis = Chassis::new(descriptor)?;
    Ok((chassis, catalog))
}

fn census_text(census: &RunCensus) -> String {
    match census {
        RunCensus::Designated(name) => name.clone(),
        RunCensus::Satisfied => "(not required)".to_string(),
        RunCensus::TooMany(names) => format!("(too many: {})", names.join(", ")),
        RunCensus::Missing => "(missing)".to_string(),
    }
}

/// Module list and census as JSON.
fn summary_json(chassis: &Chassis, census: &RunCensus) -> Value {
    let pulsers: Vec<&str> = chassis.pulsers().iter().map(|m| m.name()).collect();
    json!({
        "execution_type": chassis.execution_type().name,
        "modules": chassis.modules().names(),
        "run_module": chassis.run_module().map(|m| m.name()),
        "census": census_text(census),
        "pulsers": pulsers,
    })
}

/// Module list and census as text.
fn print_summary(chassis: &Chassis, census: &RunCensus, verbosity: Verbosity) {
    let names = chassis.modules().names();
    output::print(
        format!("execution type: {}", chassis.execution_type().name),
        verbosity,
    );
    output::print(format!("modules ({}):", names.len()), verbosity);
    if !names.is_empty() {
        output::print(output::format_list(&names, "  - "), verbosity);
    }
    output::print(format!("run module: {}", census_text(census)), verbosity);
    output::print(
        format!("pulse hooks: {}", chassis.pulsers().len()),
        verbosity,
    );
}

/// Fail the command if the chassis logged an ERR diagnostic.
fn check_errors(chassis: &Chassis) -> Result<()> {
    let errors = chassis.logger().count(Severity::Err);
    if errors > 0 {
        let codes: Vec<&str> = chassis
            .logger()
            .entries()
            .iter()
            .filter(|e| e.severity == Severity::Err)
            .map(|e| e.code.as_str())
            .collect();
        bail!("{} error(s) logged: {}", errors, codes.join(", "));
    }
    Ok(())
}
