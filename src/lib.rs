//! Chassis - an application bootstrap runtime
//!
//! Chassis reads a program descriptor, discovers the modules it names,
//! transitively, from names, files and directories, and drives them through
//! a fixed sequence of lifecycle stages. Along the way it designates a single
//! run entry, wires declared symbol vocabularies between modules, allocates
//! named monotonic ID sequences and keeps a structured diagnostic log with a
//! bounded ring mirror.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - The runtime: discovery, census, interlink and the lifecycle
//! - [`core`] - Descriptor schema, addresses, ID sequences, promise locks and
//!   user configuration
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every guarded operation runs at most once per runtime
//! 2. No module appears twice in the module list
//! 3. Every stage is recorded before any of its hooks runs
//! 4. A run-module count mismatch is logged, never raised
//!
//! # Example
//!
//! ```
//! use chassis::core::descriptor::ProgramDescriptor;
//! use chassis::engine::runner::run_all;
//! use chassis::engine::source::ModuleCatalog;
//! use chassis::engine::Chassis;
//!
//! let descriptor = ProgramDescriptor::new("WEBSERVER").with_ring_len(8);
//! let mut chassis = Chassis::new(descriptor).unwrap();
//! run_all(&mut chassis, &mut ModuleCatalog::new()).unwrap();
//! assert!(!chassis.logger().has_errors());
//! ```

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
