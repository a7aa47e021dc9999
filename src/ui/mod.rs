//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! Command handlers print through this module so quiet mode, debug mode and
//! JSON output behave the same in every command. Library code never prints;
//! it records diagnostics in the chassis log and emits `tracing` events.

pub mod output;
