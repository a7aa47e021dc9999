//! core::ops
//!
//! Call-once discipline for phase transitions.
//!
//! # Modules
//!
//! - [`lock`] - Promise set and typed phase guard
//!
//! # Architecture
//!
//! Every discovery-phase entry point:
//! 1. Enters its phase on the runtime's [`PhaseGuard`]
//! 2. Does its work
//! 3. Completes the phase
//!
//! A second call on the same runtime fails before doing any work.

pub mod lock;

pub use lock::{GuardedPhase, PhaseGuard, PhaseState, PromiseError, PromiseSet};
