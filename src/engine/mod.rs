//! engine
//!
//! The chassis runtime: discovery, census, interlink and the lifecycle.
//!
//! # Architecture
//!
//! Everything a running program shares lives in one [`Chassis`] value,
//! created from a program descriptor and passed by `&mut` to every
//! operation and every module hook:
//!
//! 1. **Discover** ([`discovery`]): resolve the descriptor's and execution
//!    type's modules, transitively, through a [`source::ModuleSource`]
//! 2. **Census** ([`census`]): designate the run entry, collect pulse hooks
//! 3. **Interlink** ([`interlink`]): wire vocabulary, define snowflakes
//! 4. **Run** ([`runner`]): setup stages, run entry, teardown stages
//!
//! ```text
//! descriptor -> gather_modules -> find_run_module -> find_pulsers
//!            -> interlink -> setup -> run -> teardown
//! ```
//!
//! The [`ledger::Logger`] and the snowflake registry are available
//! throughout.
//!
//! # Invariants
//!
//! - The module list only grows during discovery
//! - Each preparation step runs at most once until [`Chassis::reset`]
//! - The runtime is single-threaded (`Rc` handles, `!Send`)
//!
//! # Example
//!
//! ```
//! use chassis::core::descriptor::ProgramDescriptor;
//! use chassis::engine::runner::run_all;
//! use chassis::engine::source::ModuleCatalog;
//! use chassis::engine::Chassis;
//!
//! let descriptor = ProgramDescriptor::new("INTERACTIVEMENU").with_ring_len(8);
//! let mut chassis = Chassis::new(descriptor).unwrap();
//! run_all(&mut chassis, &mut ModuleCatalog::new()).unwrap();
//! assert!(!chassis.logger().has_errors());
//! ```

pub mod capabilities;
pub mod census;
pub mod discovery;
pub mod interlink;
pub mod ledger;
pub mod modes;
pub mod module;
pub mod runner;
pub mod source;
pub mod stage;

pub use capabilities::{Hook, HookSet};
pub use census::RunCensus;
pub use discovery::DiscoveryError;
pub use interlink::{InterlinkError, Vocabulary};
pub use ledger::{LogEntry, LogError, Logger, Severity};
pub use modes::{ExecutionType, ExecutionTypes};
pub use module::{ChassisModule, HookError, ModuleInfo, ModuleList, ModuleRef};
pub use source::{ModuleCatalog, ModuleSource, SourceError};
pub use stage::{Phase, Stage};

use std::fmt;

use thiserror::Error;

use crate::core::descriptor::{DescriptorError, OptionValues, ProgramDescriptor};
use crate::core::ops::{GuardedPhase, PhaseGuard, PromiseError};
use crate::core::snowflake::{SnowflakeError, SnowflakeRegistry};

/// Errors from the chassis runtime.
#[derive(Debug, Error)]
pub enum ChassisError {
    /// The descriptor names an execution type the table does not have.
    #[error("unknown execution type '{name}' (known: {known})")]
    UnknownExecutionType { name: String, known: String },

    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("interlink failed: {0}")]
    Interlink(#[from] InterlinkError),

    #[error(transparent)]
    Promise(#[from] PromiseError),

    #[error(transparent)]
    Snowflake(#[from] SnowflakeError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Log(#[from] LogError),

    /// A module hook returned an error.
    #[error("{hook} of module '{module}' failed: {source}")]
    Hook {
        module: String,
        hook: Hook,
        source: HookError,
    },

    /// The execution type's run fallback returned an error.
    #[error("run fallback of execution type '{execution_type}' failed: {source}")]
    Fallback {
        execution_type: String,
        source: HookError,
    },
}

/// The runtime context of one program.
pub struct Chassis {
    descriptor: ProgramDescriptor,
    execution_types: ExecutionTypes,
    execution_type: ExecutionType,
    guard: PhaseGuard,
    modules: ModuleList,
    run_module: Option<ModuleRef>,
    pulsers: Vec<ModuleRef>,
    stage: Option<Stage>,
    logger: Logger,
    snowflakes: SnowflakeRegistry,
    vocabulary: Vocabulary,
    options: OptionValues,
}

impl Chassis {
    /// Bind a runtime to a descriptor using the built-in execution types.
    ///
    /// # Errors
    ///
    /// [`ChassisError::UnknownExecutionType`] if `PROGRAM.EXECUTIONTYPE`
    /// names no built-in mode.
    pub fn new(descriptor: ProgramDescriptor) -> Result<Self, ChassisError> {
        Self::with_execution_types(descriptor, ExecutionTypes::builtin())
    }

    /// Bind a runtime to a descriptor and a custom execution type table.
    pub fn with_execution_types(
        descriptor: ProgramDescriptor,
        execution_types: ExecutionTypes,
    ) -> Result<Self, ChassisError> {
        let name = &descriptor.program.execution_type;
        let execution_type = execution_types.get(name).cloned().ok_or_else(|| {
            ChassisError::UnknownExecutionType {
                name: name.clone(),
                known: execution_types.names().collect::<Vec<_>>().join(", "),
            }
        })?;

        let logger = Logger::new(descriptor.program.log_ring_len);
        let options = descriptor.option_defaults();

        Ok(Self {
            descriptor,
            execution_types,
            execution_type,
            guard: PhaseGuard::new(),
            modules: ModuleList::new(),
            run_module: None,
            pulsers: Vec::new(),
            stage: None,
            logger,
            snowflakes: SnowflakeRegistry::new(),
            vocabulary: Vocabulary::default(),
            options,
        })
    }

    /// Drop all runtime state, keeping the descriptor and execution types.
    pub fn reset(&mut self) {
        self.guard.reset();
        self.modules.clear();
        self.run_module = None;
        self.pulsers.clear();
        self.stage = None;
        self.logger = Logger::new(self.descriptor.program.log_ring_len);
        self.snowflakes = SnowflakeRegistry::new();
        self.vocabulary = Vocabulary::default();
        self.options = self.descriptor.option_defaults();
    }

    // =========================================================================
    // Descriptor and execution type
    // =========================================================================

    /// The program descriptor.
    pub fn descriptor(&self) -> &ProgramDescriptor {
        &self.descriptor
    }

    /// Mutable descriptor, for modules that persist state at SAVE.
    pub fn descriptor_mut(&mut self) -> &mut ProgramDescriptor {
        &mut self.descriptor
    }

    /// The active execution type.
    pub fn execution_type(&self) -> &ExecutionType {
        &self.execution_type
    }

    /// Every known execution type.
    pub fn execution_types(&self) -> &ExecutionTypes {
        &self.execution_types
    }

    // =========================================================================
    // Promises
    // =========================================================================

    /// The phase guard.
    pub fn guard(&self) -> &PhaseGuard {
        &self.guard
    }

    /// Mutable phase guard; modules may take their own promise keys.
    pub fn guard_mut(&mut self) -> &mut PhaseGuard {
        &mut self.guard
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// Registered modules.
    pub fn modules(&self) -> &ModuleList {
        &self.modules
    }

    pub(crate) fn modules_mut(&mut self) -> &mut ModuleList {
        &mut self.modules
    }

    /// Register a module ahead of discovery.
    ///
    /// Returns `false` if the object was already registered.
    ///
    /// # Errors
    ///
    /// [`PromiseError::AlreadyLocked`] once discovery has started.
    pub fn register_module(&mut self, module: ModuleRef) -> Result<bool, PromiseError> {
        self.guard
            .promises()
            .forbid(&GuardedPhase::GatherModules.key())?;
        Ok(self.modules.register(module))
    }

    /// The designated run entry.
    pub fn run_module(&self) -> Option<&ModuleRef> {
        self.run_module.as_ref()
    }

    pub(crate) fn set_run_module(&mut self, module: ModuleRef) {
        self.run_module = Some(module);
    }

    /// Modules with a pulse hook, in list order.
    pub fn pulsers(&self) -> &[ModuleRef] {
        &self.pulsers
    }

    pub(crate) fn set_pulsers(&mut self, pulsers: Vec<ModuleRef>) {
        self.pulsers = pulsers;
    }

    /// Call every pulse hook once. See [`runner::pulse`].
    pub fn pulse(&mut self) -> Result<(), ChassisError> {
        runner::pulse(self)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// The current stage, `None` before the first stage.
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = Some(stage);
    }

    // =========================================================================
    // Shared services
    // =========================================================================

    /// The diagnostic record.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Mutable diagnostic record.
    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }

    /// Append to the log. The entry's call site is the caller of this method.
    #[track_caller]
    pub fn log(
        &mut self,
        severity: Severity,
        code: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.logger.log(severity, code, title, message);
    }

    /// Append to the log and mirror into the ring log.
    #[track_caller]
    pub fn ringlog(
        &mut self,
        severity: Severity,
        code: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.logger.ringlog(severity, code, title, message);
    }

    /// Record a noticed flag.
    pub fn notice(&mut self, code: impl Into<String>, text: impl Into<String>) -> bool {
        self.logger.notice(code, text)
    }

    /// The snowflake registry.
    pub fn snowflakes(&self) -> &SnowflakeRegistry {
        &self.snowflakes
    }

    /// Mutable snowflake registry.
    pub fn snowflakes_mut(&mut self) -> &mut SnowflakeRegistry {
        &mut self.snowflakes
    }

    /// Wired vocabulary; empty before interlink.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub(crate) fn set_vocabulary(&mut self, vocabulary: Vocabulary) {
        self.vocabulary = vocabulary;
    }

    /// Option values, seeded from the descriptor's `CONFIG` defaults.
    pub fn options(&self) -> &OptionValues {
        &self.options
    }

    /// Mutable option values, for the option parser.
    pub fn options_mut(&mut self) -> &mut OptionValues {
        &mut self.options
    }
}

impl fmt::Debug for Chassis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chassis")
            .field("execution_type", &self.execution_type.name)
            .field("modules", &self.modules)
            .field("run_module", &self.run_module.as_ref().map(|m| m.name()))
            .field("pulsers", &self.pulsers.len())
            .field("stage", &self.stage)
            .field("log_entries", &self.logger.entries().len())
            .finish()
    }
}
