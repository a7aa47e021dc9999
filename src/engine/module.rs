//! engine::module
//!
//! The loadable unit the chassis drives.
//!
//! # Architecture
//!
//! A module is any value implementing [`ChassisModule`], shared as an
//! `Rc<dyn ChassisModule>`. It declares two things up front:
//!
//! - a [`ModuleInfo`] metadata block (sub-modules, vocabulary, imports,
//!   snowflakes), read by discovery and interlink
//! - a [`HookSet`], read by the census and the stage runner
//!
//! Hook methods receive the runtime by `&mut`, so a hook can log, allocate
//! snowflake IDs or read the current stage. Modules that need state of their
//! own keep it behind interior mutability.
//!
//! Identity is reference identity: [`ModuleList`] refuses a second
//! registration of the same object, however it was addressed.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use chassis::engine::capabilities::{Hook, HookSet};
//! use chassis::engine::module::{ChassisModule, HookError, ModuleRef};
//! use chassis::engine::Chassis;
//!
//! struct Hello;
//!
//! impl ChassisModule for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn hooks(&self) -> HookSet {
//!         HookSet::with([Hook::Run])
//!     }
//!
//!     fn run(&self, chassis: &mut Chassis) -> Result<(), HookError> {
//!         chassis.notice("HELLO", "said hello");
//!         Ok(())
//!     }
//! }
//!
//! let module: ModuleRef = Rc::new(Hello);
//! assert!(module.hooks().has(&Hook::Run));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::capabilities::HookSet;
use super::Chassis;
use crate::core::ops::PromiseError;
use crate::core::snowflake::{SnowflakeError, SnowflakeSpec};
use crate::core::types::ModuleAddresses;

/// A shared handle to a loaded module.
pub type ModuleRef = Rc<dyn ChassisModule>;

/// Errors a module hook may return.
#[derive(Debug, Error)]
pub enum HookError {
    /// A snowflake operation failed.
    #[error(transparent)]
    Snowflake(#[from] SnowflakeError),

    /// A promise taken by the hook was violated.
    #[error(transparent)]
    Promise(#[from] PromiseError),

    /// The hook failed for a module-specific reason.
    #[error("{0}")]
    Failed(String),
}

impl HookError {
    /// Create a module-specific failure.
    pub fn failed(message: impl Into<String>) -> Self {
        HookError::Failed(message.into())
    }
}

/// A module's metadata block.
///
/// ```json
/// {
///   "MODULES": {"NAMES": ["storage"]},
///   "SYMBOLS": ["TICKET", "QUEUE"],
///   "IMPORTSYMBOLS": ["chassis"],
///   "SNOWFLAKES": [{"NAME": "ticket", "DEFAULT": 100, "POLICY": "EXPORTED"}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleInfo {
    /// Sub-modules this module pulls in.
    #[serde(rename = "MODULES", skip_serializing_if = "ModuleAddresses::is_empty")]
    pub modules: ModuleAddresses,

    /// Vocabulary this module exports.
    #[serde(rename = "SYMBOLS", skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,

    /// Modules whose vocabulary this module imports.
    #[serde(rename = "IMPORTSYMBOLS", skip_serializing_if = "Vec::is_empty")]
    pub import_symbols: Vec<String>,

    /// ID sequences this module defines.
    #[serde(rename = "SNOWFLAKES", skip_serializing_if = "Vec::is_empty")]
    pub snowflakes: Vec<SnowflakeSpec>,
}

static EMPTY_INFO: ModuleInfo = ModuleInfo::EMPTY;

impl ModuleInfo {
    /// A block that declares nothing.
    pub const EMPTY: ModuleInfo = ModuleInfo {
        modules: ModuleAddresses::EMPTY,
        symbols: Vec::new(),
        import_symbols: Vec::new(),
        snowflakes: Vec::new(),
    };

    /// Set the sub-modules.
    pub fn with_modules(mut self, modules: ModuleAddresses) -> Self {
        self.modules = modules;
        self
    }

    /// Add exported vocabulary.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Add an import request.
    pub fn with_import(mut self, module: impl Into<String>) -> Self {
        self.import_symbols.push(module.into());
        self
    }

    /// Add a snowflake definition.
    pub fn with_snowflake(mut self, spec: SnowflakeSpec) -> Self {
        self.snowflakes.push(spec);
        self
    }
}

/// A unit the chassis can discover and drive.
///
/// Only [`name`](ChassisModule::name) is required. A hook method is called
/// only when the module's [`hooks`](ChassisModule::hooks) include it.
pub trait ChassisModule {
    /// Display name, used in diagnostics and as the vocabulary key.
    fn name(&self) -> &str;

    /// Metadata block.
    fn info(&self) -> &ModuleInfo {
        &EMPTY_INFO
    }

    /// Hooks this module implements.
    fn hooks(&self) -> HookSet {
        HookSet::new()
    }

    /// Called once per stage. The current stage is `chassis.stage()`.
    fn stage(&self, _chassis: &mut Chassis) -> Result<(), HookError> {
        Ok(())
    }

    /// Run entry.
    fn run(&self, _chassis: &mut Chassis) -> Result<(), HookError> {
        Ok(())
    }

    /// Scheduler tick.
    fn pulse(&self, _chassis: &mut Chassis) -> Result<(), HookError> {
        Ok(())
    }
}

fn same_module(a: &ModuleRef, b: &ModuleRef) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Registered modules, in discovery completion order.
///
/// Only discovery appends; everything else reads.
#[derive(Clone, Default)]
pub struct ModuleList {
    modules: Vec<ModuleRef>,
}

impl ModuleList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module unless the same object is already present.
    ///
    /// Returns `true` if the module was added.
    pub(crate) fn register(&mut self, module: ModuleRef) -> bool {
        if self.contains(&module) {
            return false;
        }
        self.modules.push(module);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.modules.clear();
    }

    /// Check if this exact module object is registered.
    pub fn contains(&self, module: &ModuleRef) -> bool {
        self.modules.iter().any(|m| same_module(m, module))
    }

    /// Iterate modules in list order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRef> {
        self.modules.iter()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names in list order.
    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name().to_string()).collect()
    }

    /// First module with the given name.
    pub fn find(&self, name: &str) -> Option<&ModuleRef> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// Owned snapshot of the handles, for iterating while the runtime is
    /// borrowed mutably.
    pub fn snapshot(&self) -> Vec<ModuleRef> {
        self.modules.clone()
    }
}

impl fmt::Debug for ModuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.modules.iter().map(|m| m.name())).finish()
    }
}

#[derive(Deserialize)]
struct ManifestFile {
    #[serde(rename = "NAME", default)]
    name: Option<String>,

    #[serde(flatten)]
    info: ModuleInfo,
}

/// A module backed by a JSON manifest: a metadata block and nothing else.
///
/// Relative `FILES` and `DIRS` entries are resolved against the manifest's
/// own directory. Without a `NAME` key the file stem names the module.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestModule {
    name: String,
    path: PathBuf,
    info: ModuleInfo,
}

impl ManifestModule {
    /// Parse manifest text read from `path`.
    pub fn parse(path: &Path, json: &str) -> Result<Self, serde_json::Error> {
        let file: ManifestFile = serde_json::from_str(json)?;

        let name = file.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });

        let mut info = file.info;
        if let Some(base) = path.parent() {
            info.modules = info.modules.rebased(base);
        }

        Ok(Self {
            name,
            path: path.to_path_buf(),
            info,
        })
    }

    /// Path the manifest was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChassisModule for ManifestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> &ModuleInfo {
        &self.info
    }
}
