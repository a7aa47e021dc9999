//! core
//!
//! Core domain types, schemas, and shared services for the chassis.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ModuleAddress, Provenance, Symbol
//! - [`ops`] - Call-once promises and the phase guard
//! - [`snowflake`] - Named monotonic ID sequences
//! - [`descriptor`] - Program descriptor schema, load and save
//! - [`config`] - User configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict where the chassis owns them and lossless where it
//!   does not (unknown descriptor keys survive a load/save cycle)
//! - Nothing here depends on the engine

pub mod config;
pub mod descriptor;
pub mod ops;
pub mod snowflake;
pub mod types;
