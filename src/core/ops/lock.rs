//! core::ops::lock
//!
//! Call-once promises for phase-transition operations.
//!
//! # Architecture
//!
//! A promise is a named flag. Taking it asserts that the guarded operation
//! has not run yet on this runtime; a second attempt fails immediately with
//! [`PromiseError::AlreadyLocked`]. Nothing ever waits: this is an assertion
//! mechanism, not a mutex.
//!
//! [`PromiseSet`] is the raw string-keyed set. [`PhaseGuard`] layers a
//! per-phase state machine on top of it:
//!
//! ```text
//! NotStarted --enter--> InProgress --complete--> Done
//! ```
//!
//! # Invariants
//!
//! - A key is either absent or held; `lock` on a held key fails
//! - `unlock` on an absent key fails
//! - `require` / `forbid` never mutate
//! - A phase can be entered at most once per guard
//!
//! # Example
//!
//! ```
//! use chassis::core::ops::lock::{PromiseError, PromiseSet};
//!
//! let mut promises = PromiseSet::new();
//! promises.lock("called:gather").unwrap();
//! assert!(matches!(
//!     promises.lock("called:gather"),
//!     Err(PromiseError::AlreadyLocked(_))
//! ));
//! promises.unlock("called:gather").unwrap();
//! promises.lock("called:gather").unwrap();
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

/// Errors from promise operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromiseError {
    /// The key was already held.
    #[error("promise '{0}' is already locked")]
    AlreadyLocked(String),

    /// The key was not held.
    #[error("promise '{0}' is not locked")]
    NotLocked(String),

    /// A phase transition was attempted from the wrong state.
    #[error("phase '{phase}' is {actual}, expected {expected}")]
    BadState {
        /// The guarded phase.
        phase: GuardedPhase,
        /// The state the transition needs.
        expected: PhaseState,
        /// The state the phase was actually in.
        actual: PhaseState,
    },
}

/// A set of held promise keys.
#[derive(Debug, Clone, Default)]
pub struct PromiseSet {
    held: HashSet<String>,
}

impl PromiseSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a promise.
    ///
    /// # Errors
    ///
    /// [`PromiseError::AlreadyLocked`] if `key` is already held.
    pub fn lock(&mut self, key: impl Into<String>) -> Result<(), PromiseError> {
        let key = key.into();
        if self.held.contains(&key) {
            return Err(PromiseError::AlreadyLocked(key));
        }
        self.held.insert(key);
        Ok(())
    }

    /// Release a promise.
    ///
    /// # Errors
    ///
    /// [`PromiseError::NotLocked`] if `key` is not held.
    pub fn unlock(&mut self, key: &str) -> Result<(), PromiseError> {
        if self.held.remove(key) {
            Ok(())
        } else {
            Err(PromiseError::NotLocked(key.to_string()))
        }
    }

    /// Assert that `key` is held.
    pub fn require(&self, key: &str) -> Result<(), PromiseError> {
        if self.held.contains(key) {
            Ok(())
        } else {
            Err(PromiseError::NotLocked(key.to_string()))
        }
    }

    /// Assert that `key` is not held.
    pub fn forbid(&self, key: &str) -> Result<(), PromiseError> {
        if self.held.contains(key) {
            Err(PromiseError::AlreadyLocked(key.to_string()))
        } else {
            Ok(())
        }
    }

    /// Check if `key` is held.
    pub fn is_locked(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Check if no key is held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Release every key.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// The call-once operations of the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardedPhase {
    /// Whole discovery run (seeding plus cascade).
    GatherModules,
    /// Queue the program descriptor's modules.
    SeedFromDescriptor,
    /// Queue the execution type's modules.
    SeedFromExecutionType,
    /// Drain the worklist to a fixed point.
    Cascade,
    /// Designate the run entry.
    FindRunModule,
    /// Collect pulse hooks.
    FindPulsers,
    /// Vocabulary and snowflake wiring.
    Interlink,
}

impl GuardedPhase {
    /// Every guarded phase, in the order a normal start-up enters them.
    pub const ALL: [GuardedPhase; 7] = [
        GuardedPhase::GatherModules,
        GuardedPhase::SeedFromDescriptor,
        GuardedPhase::SeedFromExecutionType,
        GuardedPhase::Cascade,
        GuardedPhase::FindRunModule,
        GuardedPhase::FindPulsers,
        GuardedPhase::Interlink,
    ];

    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            GuardedPhase::GatherModules => "gather-modules",
            GuardedPhase::SeedFromDescriptor => "seed-from-descriptor",
            GuardedPhase::SeedFromExecutionType => "seed-from-execution-type",
            GuardedPhase::Cascade => "cascade",
            GuardedPhase::FindRunModule => "find-run-module",
            GuardedPhase::FindPulsers => "find-pulsers",
            GuardedPhase::Interlink => "interlink",
        }
    }

    /// The promise key taken when the phase is entered.
    pub fn key(&self) -> String {
        format!("called:{}", self.name())
    }
}

impl fmt::Display for GuardedPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress of a guarded phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseState {
    /// Not entered yet.
    #[default]
    NotStarted,
    /// Entered, not completed (or failed part-way).
    InProgress,
    /// Completed.
    Done,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseState::NotStarted => write!(f, "not started"),
            PhaseState::InProgress => write!(f, "in progress"),
            PhaseState::Done => write!(f, "done"),
        }
    }
}

/// Typed single-use guard for the chassis phases.
///
/// Entering a phase takes its promise key in the underlying [`PromiseSet`],
/// so the string-keyed assertions (`require`, `forbid`) keep working against
/// phase keys.
#[derive(Debug, Clone, Default)]
pub struct PhaseGuard {
    promises: PromiseSet,
    states: HashMap<GuardedPhase, PhaseState>,
}

impl PhaseGuard {
    /// Create a guard with every phase not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a phase.
    ///
    /// # Errors
    ///
    /// [`PromiseError::AlreadyLocked`] if the phase was entered before.
    pub fn enter(&mut self, phase: GuardedPhase) -> Result<(), PromiseError> {
        self.promises.lock(phase.key())?;
        self.states.insert(phase, PhaseState::InProgress);
        Ok(())
    }

    /// Mark an entered phase as done.
    ///
    /// # Errors
    ///
    /// [`PromiseError::BadState`] unless the phase is in progress.
    pub fn complete(&mut self, phase: GuardedPhase) -> Result<(), PromiseError> {
        match self.state(phase) {
            PhaseState::InProgress => {
                self.states.insert(phase, PhaseState::Done);
                Ok(())
            }
            actual => Err(PromiseError::BadState {
                phase,
                expected: PhaseState::InProgress,
                actual,
            }),
        }
    }

    /// Current state of a phase.
    pub fn state(&self, phase: GuardedPhase) -> PhaseState {
        self.states.get(&phase).copied().unwrap_or_default()
    }

    /// Check if a phase is done.
    pub fn is_done(&self, phase: GuardedPhase) -> bool {
        self.state(phase) == PhaseState::Done
    }

    /// The underlying promise set.
    pub fn promises(&self) -> &PromiseSet {
        &self.promises
    }

    /// Mutable access for ad-hoc promise keys taken by modules.
    pub fn promises_mut(&mut self) -> &mut PromiseSet {
        &mut self.promises
    }

    /// Forget every phase and promise.
    pub fn reset(&mut self) {
        self.promises.clear();
        self.states.clear();
    }
}
