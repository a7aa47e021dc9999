//! engine::modes
//!
//! Execution types: the named operating modes a descriptor can select.
//!
//! # Architecture
//!
//! An execution type decides two things the descriptor does not: which
//! modules are always seeded, and how many modules must implement the run
//! hook. It may also carry a fallback procedure that runs in place of a
//! run entry when none is designated (a server loop, for instance).
//!
//! The built-in table has four modes:
//!
//! | Name              | Run modules required |
//! |-------------------|----------------------|
//! | `CLITOOL`         | 1                    |
//! | `WEBSERVER`       | 0                    |
//! | `FILETALKSERVER`  | 0                    |
//! | `INTERACTIVEMENU` | 0                    |
//!
//! # Example
//!
//! ```
//! use chassis::engine::modes::{names, ExecutionTypes};
//!
//! let types = ExecutionTypes::builtin();
//! assert_eq!(types.get(names::CLITOOL).unwrap().run_modules, 1);
//! assert!(types.get("TKINTERGUI").is_none());
//! ```

use std::fmt;
use std::rc::Rc;

use super::module::HookError;
use super::Chassis;
use crate::core::types::ModuleAddresses;

/// Built-in execution type names.
pub mod names {
    pub const CLITOOL: &str = "CLITOOL";
    pub const WEBSERVER: &str = "WEBSERVER";
    pub const FILETALKSERVER: &str = "FILETALKSERVER";
    pub const INTERACTIVEMENU: &str = "INTERACTIVEMENU";
}

/// Procedure run when no run entry is designated.
pub type RunFallback = Rc<dyn Fn(&mut Chassis) -> Result<(), HookError>>;

/// One operating mode.
#[derive(Clone)]
pub struct ExecutionType {
    /// Unique name, matched against `PROGRAM.EXECUTIONTYPE`.
    pub name: String,
    /// Modules seeded for every program of this type.
    pub modules: ModuleAddresses,
    /// How many modules must implement the run hook.
    pub run_modules: usize,
    /// Run-phase fallback.
    pub fallback: Option<RunFallback>,
}

impl ExecutionType {
    /// Create a mode with no seed modules and no fallback.
    pub fn new(name: impl Into<String>, run_modules: usize) -> Self {
        Self {
            name: name.into(),
            modules: ModuleAddresses::default(),
            run_modules,
            fallback: None,
        }
    }

    /// Set the seed modules.
    pub fn with_modules(mut self, modules: ModuleAddresses) -> Self {
        self.modules = modules;
        self
    }

    /// Set the run-phase fallback.
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&mut Chassis) -> Result<(), HookError> + 'static,
    {
        self.fallback = Some(Rc::new(fallback));
        self
    }
}

impl fmt::Debug for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionType")
            .field("name", &self.name)
            .field("modules", &self.modules)
            .field("run_modules", &self.run_modules)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Table of known execution types, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTypes {
    types: Vec<ExecutionType>,
}

impl ExecutionTypes {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let mut types = Self::new();
        types.register(ExecutionType::new(names::CLITOOL, 1));
        types.register(ExecutionType::new(names::WEBSERVER, 0));
        types.register(ExecutionType::new(names::FILETALKSERVER, 0));
        types.register(ExecutionType::new(names::INTERACTIVEMENU, 0));
        types
    }

    /// Add a mode, replacing any mode of the same name in place.
    pub fn register(&mut self, ty: ExecutionType) -> &mut Self {
        match self.types.iter_mut().find(|t| t.name == ty.name) {
            Some(slot) => *slot = ty,
            None => self.types.push(ty),
        }
        self
    }

    /// Look up a mode by name.
    pub fn get(&self, name: &str) -> Option<&ExecutionType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Mode names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }

    /// Number of modes.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
