//! engine::capabilities
//!
//! Hook capabilities a module declares.
//!
//! # Architecture
//!
//! A module may take part in the lifecycle at three points: every stage,
//! the single run entry, and the external scheduler's pulse. Rather than
//! probing for optional methods, each module states up front which hooks it
//! implements as a [`HookSet`]. The runner and census query that set; a hook
//! method on a module whose set does not include it is never called.
//!
//! # Example
//!
//! ```
//! use chassis::engine::capabilities::{Hook, HookSet};
//!
//! let hooks = HookSet::with([Hook::Stage, Hook::Run]);
//!
//! assert!(hooks.has(&Hook::Stage));
//! assert!(!hooks.has(&Hook::Pulse));
//! assert_eq!(hooks.missing(&[Hook::Run, Hook::Pulse]), vec![Hook::Pulse]);
//! ```

use std::collections::HashSet;

/// A lifecycle hook a module can implement.
///
/// # Invariants
///
/// - A hook is binary: implemented or not
/// - The declared set is fixed for the module's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Called once per stage, for every stage.
    Stage,

    /// Candidate for the execution type's run entry.
    Run,

    /// Called by the external scheduler on every tick.
    Pulse,
}

impl Hook {
    /// Every hook kind.
    pub const ALL: [Hook; 3] = [Hook::Stage, Hook::Run, Hook::Pulse];

    /// Get a human-readable description of the hook.
    ///
    /// # Example
    ///
    /// ```
    /// use chassis::engine::capabilities::Hook;
    ///
    /// assert_eq!(Hook::Run.description(), "run entry");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Hook::Stage => "stage hook",
            Hook::Run => "run entry",
            Hook::Pulse => "pulse hook",
        }
    }
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// The hooks a module implements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    hooks: HashSet<Hook>,
}

impl HookSet {
    /// Create an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hook set with the given hooks.
    pub fn with<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        Self {
            hooks: iter.into_iter().collect(),
        }
    }

    /// Insert a hook into the set.
    pub fn insert(&mut self, hook: Hook) {
        self.hooks.insert(hook);
    }

    /// Check if a hook is present.
    pub fn has(&self, hook: &Hook) -> bool {
        self.hooks.contains(hook)
    }

    /// Get the hooks that are missing from the required set, in order.
    pub fn missing(&self, required: &[Hook]) -> Vec<Hook> {
        required
            .iter()
            .filter(|h| !self.hooks.contains(*h))
            .copied()
            .collect()
    }

    /// Get the number of hooks in the set.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Iterate hooks in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Hook> + '_ {
        Hook::ALL.into_iter().filter(|h| self.hooks.contains(h))
    }
}

impl FromIterator<Hook> for HookSet {
    fn from_iter<T: IntoIterator<Item = Hook>>(iter: T) -> Self {
        Self {
            hooks: iter.into_iter().collect(),
        }
    }
}
