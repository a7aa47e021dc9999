//! engine::discovery
//!
//! Transitive module discovery.
//!
//! # Architecture
//!
//! Discovery computes the closure of every address reachable from two seed
//! blocks (the descriptor's `MODULES` and the active execution type's
//! modules) and registers each loaded module once.
//!
//! ```text
//! seed(descriptor) -> seed(execution type) -> cascade
//!
//! cascade:
//!   while worklist not empty:
//!     pop one address, resolve it, mark it processed
//!     directory:  queue its files
//!     new module: queue its sub-addresses before the next pop
//! ```
//!
//! The worklist is a LIFO stack, so the last address pushed is resolved
//! first and a module's sub-modules are resolved before its earlier-declared
//! siblings. Within a block, directories are pushed before files and files
//! before names. Seeds `[a, b]` where `a` declares `x` and `b` declares `y`
//! register as `[b, y, a, x]`. This order is part of the contract.
//!
//! An address is queued only if it is neither pending nor processed, and a
//! module object is registered only if it is not already in the list. The
//! worklist and processed set live in [`Discovery`] and are dropped with it.
//!
//! # Invariants
//!
//! - Each seeding step and the cascade run at most once per runtime
//! - Every failure names the address and who requested it
//! - The module list only grows during discovery
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use chassis::core::descriptor::ProgramDescriptor;
//! use chassis::core::types::ModuleAddresses;
//! use chassis::engine::discovery::gather_modules;
//! use chassis::engine::module::ChassisModule;
//! use chassis::engine::source::ModuleCatalog;
//! use chassis::engine::Chassis;
//!
//! struct Named(&'static str);
//! impl ChassisModule for Named {
//!     fn name(&self) -> &str { self.0 }
//! }
//!
//! let mut catalog = ModuleCatalog::new();
//! for name in ["a", "b", "c"] {
//!     catalog.bind_name(name, Rc::new(Named(name)));
//! }
//!
//! let descriptor = ProgramDescriptor::new("WEBSERVER").with_modules(
//!     ModuleAddresses::default().with_name("a").with_name("b").with_name("c"),
//! );
//! let mut chassis = Chassis::new(descriptor).unwrap();
//! gather_modules(&mut chassis, &mut catalog).unwrap();
//!
//! assert_eq!(chassis.modules().names(), vec!["c", "b", "a"]);
//! ```

use std::collections::HashSet;
use std::rc::Rc;

use thiserror::Error;

use super::module::ModuleRef;
use super::source::{ModuleSource, SourceError};
use super::Chassis;
use crate::core::ops::{GuardedPhase, PromiseError};
use crate::core::types::{ModuleAddress, ModuleAddresses, Provenance};

/// Errors from discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No module answers to an address.
    #[error("module not found: {address} (requested by {provenance})")]
    ModuleNotFound {
        address: ModuleAddress,
        provenance: Provenance,
    },

    /// A module exists but could not be loaded.
    #[error("failed to load {address} (requested by {provenance}): {reason}")]
    ModuleLoad {
        address: ModuleAddress,
        provenance: Provenance,
        reason: String,
    },

    /// A discovery step ran twice.
    #[error(transparent)]
    Promise(#[from] PromiseError),
}

impl DiscoveryError {
    fn from_source(address: ModuleAddress, provenance: Provenance, err: SourceError) -> Self {
        if err.is_not_found() {
            DiscoveryError::ModuleNotFound {
                address,
                provenance,
            }
        } else {
            DiscoveryError::ModuleLoad {
                address,
                provenance,
                reason: err.to_string(),
            }
        }
    }
}

/// Run full discovery: both seeding steps, then the cascade.
///
/// # Errors
///
/// - [`DiscoveryError::Promise`] if discovery already ran on this runtime
/// - [`DiscoveryError::ModuleNotFound`] / [`DiscoveryError::ModuleLoad`] for
///   the first address that fails to resolve
pub fn gather_modules(
    chassis: &mut Chassis,
    source: &mut dyn ModuleSource,
) -> Result<(), DiscoveryError> {
    chassis.guard_mut().enter(GuardedPhase::GatherModules)?;

    {
        let mut discovery = Discovery::new(chassis, source);
        discovery.seed_from_descriptor()?;
        discovery.seed_from_execution_type()?;
        discovery.cascade()?;
    }

    chassis.guard_mut().complete(GuardedPhase::GatherModules)?;
    tracing::debug!(modules = chassis.modules().len(), "discovery complete");
    Ok(())
}

/// Discovery state for one runtime.
///
/// Most callers want [`gather_modules`]. The individual steps are public so
/// the call-once guards can be exercised directly.
pub struct Discovery<'c, 's> {
    chassis: &'c mut Chassis,
    source: &'s mut dyn ModuleSource,
    worklist: Vec<(ModuleAddress, Provenance)>,
    processed: HashSet<ModuleAddress>,
}

impl<'c, 's> Discovery<'c, 's> {
    /// Start discovery with an empty worklist.
    pub fn new(chassis: &'c mut Chassis, source: &'s mut dyn ModuleSource) -> Self {
        Self {
            chassis,
            source,
            worklist: Vec::new(),
            processed: HashSet::new(),
        }
    }

    /// Queue the program descriptor's modules.
    pub fn seed_from_descriptor(&mut self) -> Result<(), DiscoveryError> {
        self.chassis
            .guard_mut()
            .enter(GuardedPhase::SeedFromDescriptor)?;

        let block = self.chassis.descriptor().modules.clone();
        self.seed(&block, &Provenance::Descriptor);

        self.chassis
            .guard_mut()
            .complete(GuardedPhase::SeedFromDescriptor)?;
        Ok(())
    }

    /// Queue the active execution type's modules.
    pub fn seed_from_execution_type(&mut self) -> Result<(), DiscoveryError> {
        self.chassis
            .guard_mut()
            .enter(GuardedPhase::SeedFromExecutionType)?;

        let execution_type = self.chassis.execution_type();
        let block = execution_type.modules.clone();
        let provenance = Provenance::ExecutionType(execution_type.name.clone());
        self.seed(&block, &provenance);

        self.chassis
            .guard_mut()
            .complete(GuardedPhase::SeedFromExecutionType)?;
        Ok(())
    }

    /// Resolve the worklist to a fixed point.
    pub fn cascade(&mut self) -> Result<(), DiscoveryError> {
        self.chassis.guard_mut().enter(GuardedPhase::Cascade)?;

        while let Some((address, provenance)) = self.worklist.pop() {
            let resolved = self.resolve(&address, &provenance)?;
            self.processed.insert(address);
            if let Some(module) = resolved {
                let requester = Provenance::Module(module.name().to_string());
                self.seed(&module.info().modules, &requester);
            }
        }

        self.chassis.guard_mut().complete(GuardedPhase::Cascade)?;
        Ok(())
    }

    /// Addresses waiting to be resolved, bottom of the stack first.
    pub fn pending(&self) -> impl Iterator<Item = &ModuleAddress> {
        self.worklist.iter().map(|(address, _)| address)
    }

    /// Check if an address has been resolved.
    pub fn is_processed(&self, address: &ModuleAddress) -> bool {
        self.processed.contains(address)
    }

    fn seed(&mut self, block: &ModuleAddresses, provenance: &Provenance) {
        for address in block.addresses() {
            self.queue(address, provenance);
        }
    }

    fn queue(&mut self, address: ModuleAddress, provenance: &Provenance) -> bool {
        if self.processed.contains(&address) || self.worklist.iter().any(|(a, _)| *a == address) {
            return false;
        }
        self.worklist.push((address, provenance.clone()));
        true
    }

    /// Resolve one address. Returns the module if it was newly registered.
    fn resolve(
        &mut self,
        address: &ModuleAddress,
        provenance: &Provenance,
    ) -> Result<Option<ModuleRef>, DiscoveryError> {
        let module = match address {
            ModuleAddress::ByDirectory(dir) => {
                let files = self.source.list_directory(dir).map_err(|e| {
                    DiscoveryError::from_source(address.clone(), provenance.clone(), e)
                })?;
                tracing::debug!(%address, %provenance, files = files.len(), "expanded directory");
                for file in files {
                    self.queue(ModuleAddress::ByFile(file), provenance);
                }
                return Ok(None);
            }
            ModuleAddress::ByName(name) => self.source.load_by_name(name),
            ModuleAddress::ByFile(path) => self.source.load_file(path),
        }
        .map_err(|e| DiscoveryError::from_source(address.clone(), provenance.clone(), e))?;

        let added = self.chassis.modules_mut().register(Rc::clone(&module));
        tracing::debug!(
            %address,
            %provenance,
            module = module.name(),
            added,
            "resolved module address"
        );
        Ok(added.then_some(module))
    }
}
