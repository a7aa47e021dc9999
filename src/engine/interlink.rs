//! engine::interlink
//!
//! Vocabulary and ID-sequence wiring between discovered modules.
//!
//! # Architecture
//!
//! Interlink runs two passes over the frozen module list:
//!
//! 1. **Export**: intern each module's `SYMBOLS`, make them resolvable on
//!    that module, and record them in a registry under the module's name.
//! 2. **Import**: for each `IMPORTSYMBOLS` entry, copy the named module's
//!    exported vocabulary into the requesting module's table.
//!
//! The pass order is enforced by types: [`VocabularyBuilder::export_pass`]
//! returns an [`ExportedVocabulary`], and only that type has
//! [`import_pass`](ExportedVocabulary::import_pass). A module may therefore
//! import from a module later in the list.
//!
//! The chassis' own vocabulary (stage names, severities, diagnostic codes
//! and execution type names) is registered under [`CORE_VOCABULARY`] before
//! the export pass.
//!
//! Tables and the registry are keyed by module name. Two distinct modules
//! with one name (manifests with the same file stem in different
//! directories, say) share a table; interlink logs a `DUPLICATEMODULENAME`
//! warning for each such name.
//!
//! Snowflake definitions are registered separately, after both passes.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use chassis::core::descriptor::ProgramDescriptor;
//! use chassis::engine::interlink::{interlink, CORE_VOCABULARY};
//! use chassis::engine::module::{ChassisModule, ModuleInfo};
//! use chassis::engine::Chassis;
//!
//! struct Ticketing(ModuleInfo);
//! impl ChassisModule for Ticketing {
//!     fn name(&self) -> &str { "ticketing" }
//!     fn info(&self) -> &ModuleInfo { &self.0 }
//! }
//!
//! let mut chassis = Chassis::new(ProgramDescriptor::new("WEBSERVER")).unwrap();
//! chassis.register_module(Rc::new(Ticketing(
//!     ModuleInfo::default().with_symbols(["TICKET"]).with_import(CORE_VOCABULARY),
//! )))
//! .unwrap();
//! interlink(&mut chassis).unwrap();
//!
//! let vocabulary = chassis.vocabulary();
//! assert!(vocabulary.resolve("ticketing", "TICKET").is_some());
//! assert!(vocabulary.resolve("ticketing", "RUNSTART").is_some());
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::ledger::{codes, Severity};
use super::module::ModuleList;
use super::stage::Stage;
use super::Chassis;
use crate::core::ops::{GuardedPhase, PromiseError};
use crate::core::snowflake::SnowflakeError;
use crate::core::types::{Symbol, SymbolInterner};

/// Vocabulary key of the chassis' own symbols.
pub const CORE_VOCABULARY: &str = "chassis";

/// Errors from interlink.
#[derive(Debug, Error)]
pub enum InterlinkError {
    /// An import names a module that exported nothing under that name.
    #[error("module '{module}' imports symbols from '{requested}', which is not a registered vocabulary")]
    UnknownVocabulary { module: String, requested: String },

    /// Two modules define the same snowflake.
    #[error(transparent)]
    Snowflake(#[from] SnowflakeError),

    /// Interlink already ran.
    #[error(transparent)]
    Promise(#[from] PromiseError),
}

/// Names visible on one module, in the order they became visible.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    fn insert(&mut self, symbol: &Symbol) {
        if self.get(symbol).is_none() {
            self.symbols.push(Symbol::clone(symbol));
        }
    }

    /// Look up a name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| &***s == name)
    }

    /// Check if a name is visible.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate visible names.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Number of visible names.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// First pass input.
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    interner: SymbolInterner,
    registry: HashMap<String, Vec<Symbol>>,
}

/// Export pass done; imports not yet resolved.
#[derive(Debug)]
pub struct ExportedVocabulary {
    interner: SymbolInterner,
    registry: HashMap<String, Vec<Symbol>>,
    tables: HashMap<String, SymbolTable>,
}

/// Fully wired vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    interner: SymbolInterner,
    registry: HashMap<String, Vec<Symbol>>,
    tables: HashMap<String, SymbolTable>,
}

impl VocabularyBuilder {
    /// Start with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vocabulary that does not belong to a module.
    pub fn with_vocabulary<'a, I>(mut self, owner: &str, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let symbols = self.interner.intern_all(names);
        self.registry
            .entry(owner.to_string())
            .or_default()
            .extend(symbols);
        self
    }

    /// Pass 1: intern and record every module's exported vocabulary.
    pub fn export_pass(mut self, modules: &ModuleList) -> ExportedVocabulary {
        let mut tables: HashMap<String, SymbolTable> = HashMap::new();

        for module in modules.iter() {
            let symbols = self
                .interner
                .intern_all(module.info().symbols.iter().map(String::as_str));

            let table = tables.entry(module.name().to_string()).or_default();
            for symbol in &symbols {
                table.insert(symbol);
            }

            self.registry
                .entry(module.name().to_string())
                .or_default()
                .extend(symbols);
        }

        ExportedVocabulary {
            interner: self.interner,
            registry: self.registry,
            tables,
        }
    }
}

impl ExportedVocabulary {
    /// Pass 2: expose each imported vocabulary on the requesting module.
    ///
    /// # Errors
    ///
    /// [`InterlinkError::UnknownVocabulary`] for the first import that names
    /// an unregistered vocabulary.
    pub fn import_pass(mut self, modules: &ModuleList) -> Result<Vocabulary, InterlinkError> {
        for module in modules.iter() {
            for requested in &module.info().import_symbols {
                let imported = self.registry.get(requested).ok_or_else(|| {
                    InterlinkError::UnknownVocabulary {
                        module: module.name().to_string(),
                        requested: requested.clone(),
                    }
                })?;

                let table = self.tables.entry(module.name().to_string()).or_default();
                for symbol in imported {
                    table.insert(symbol);
                }
            }
        }

        Ok(Vocabulary {
            interner: self.interner,
            registry: self.registry,
            tables: self.tables,
        })
    }

    /// Vocabulary exported under a name.
    pub fn exported(&self, owner: &str) -> Option<&[Symbol]> {
        self.registry.get(owner).map(Vec::as_slice)
    }
}

impl Vocabulary {
    /// Names visible on a module.
    pub fn symbols_of(&self, module: &str) -> Option<&SymbolTable> {
        self.tables.get(module)
    }

    /// Resolve a name on a module.
    pub fn resolve(&self, module: &str, name: &str) -> Option<&Symbol> {
        self.tables.get(module).and_then(|t| t.get(name))
    }

    /// Vocabulary exported under a name.
    pub fn exported(&self, owner: &str) -> Option<&[Symbol]> {
        self.registry.get(owner).map(Vec::as_slice)
    }

    /// Number of distinct interned names.
    pub fn interned(&self) -> usize {
        self.interner.len()
    }
}

/// The chassis' own vocabulary.
pub fn core_vocabulary(chassis: &Chassis) -> Vec<String> {
    let mut names: Vec<String> = Stage::ALL.iter().map(|s| s.name().to_string()).collect();
    names.extend(Severity::ALL.iter().map(|s| s.as_str().to_string()));
    names.extend(
        [
            codes::BAD_PROGRAM_DATA,
            codes::TOO_MANY_RUN_MODULES,
            codes::NO_RUN_MODULE,
            codes::DUPLICATE_MODULE_NAME,
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    names.extend(chassis.execution_types().names().map(String::from));
    names
}

/// Names carried by more than one registered module, in first-repeat order.
pub fn shared_names(modules: &ModuleList) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut shared = Vec::new();
    for module in modules.iter() {
        let name = module.name();
        if !seen.insert(name) && !shared.iter().any(|s| s == name) {
            shared.push(name.to_string());
        }
    }
    shared
}

/// Wire vocabulary and define snowflakes.
///
/// # Errors
///
/// - [`InterlinkError::Promise`] if interlink already ran
/// - [`InterlinkError::UnknownVocabulary`] for a bad import
/// - [`InterlinkError::Snowflake`] if two modules define one sequence
pub fn interlink(chassis: &mut Chassis) -> Result<(), InterlinkError> {
    chassis.guard_mut().enter(GuardedPhase::Interlink)?;

    for name in shared_names(chassis.modules()) {
        chassis.log(
            Severity::Warn,
            codes::DUPLICATE_MODULE_NAME,
            "Duplicate Module Name",
            format!("more than one module is named '{}'; they share one symbol table", name),
        );
    }

    let core = core_vocabulary(chassis);
    let vocabulary = VocabularyBuilder::new()
        .with_vocabulary(CORE_VOCABULARY, core.iter().map(String::as_str))
        .export_pass(chassis.modules())
        .import_pass(chassis.modules())?;
    chassis.set_vocabulary(vocabulary);

    for module in chassis.modules().snapshot() {
        for spec in &module.info().snowflakes {
            tracing::debug!(module = module.name(), snowflake = %spec.name, "defining snowflake");
            chassis.snowflakes_mut().define(spec.clone())?;
        }
    }

    chassis.guard_mut().complete(GuardedPhase::Interlink)?;
    Ok(())
}
