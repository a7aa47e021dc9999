//! core::snowflake
//!
//! Named monotonic ID sequences ("snowflakes").
//!
//! # Architecture
//!
//! Each sequence is defined once with a default start value and a policy.
//! The next-pointer is materialized lazily: a sequence that was never
//! advanced hands out (and exports) its default.
//!
//! - `SESSION` sequences live for the runtime only.
//! - `EXPORTED` sequences are included in [`SnowflakeRegistry::export`] and
//!   overwritten by [`SnowflakeRegistry::import`].
//!
//! Import is lossy: counts for names that are not defined in the
//! current session are dropped, and will not appear in the next export.
//!
//! # Example
//!
//! ```
//! use chassis::core::snowflake::{Policy, SnowflakeRegistry, SnowflakeSpec};
//!
//! let mut ids = SnowflakeRegistry::new();
//! ids.define(SnowflakeSpec::new("ticket", 100, Policy::Exported)).unwrap();
//!
//! assert_eq!(ids.next("ticket").unwrap(), 100);
//! assert_eq!(ids.next("ticket").unwrap(), 101);
//! assert_eq!(ids.export()["ticket"], 102);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from snowflake operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnowflakeError {
    /// A sequence with this name is already defined.
    #[error("snowflake '{0}' is already defined")]
    AlreadyDefined(String),

    /// No sequence with this name is defined.
    #[error("snowflake '{0}' is not defined")]
    Undefined(String),

    /// Advancing would overflow the counter.
    #[error("snowflake '{0}' is exhausted")]
    Exhausted(String),
}

/// Export/import policy of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Policy {
    /// Session-only value.
    #[default]
    Session,
    /// Imported and exported value.
    Exported,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Session => write!(f, "SESSION"),
            Policy::Exported => write!(f, "EXPORTED"),
        }
    }
}

/// Definition of a sequence, as declared in module metadata.
///
/// ```json
/// { "NAME": "ticket", "DEFAULT": 100, "POLICY": "EXPORTED" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeSpec {
    /// Unique name of the sequence.
    #[serde(rename = "NAME")]
    pub name: String,

    /// First value handed out.
    #[serde(rename = "DEFAULT", default)]
    pub default: i64,

    /// Export policy.
    #[serde(rename = "POLICY", default)]
    pub policy: Policy,
}

impl SnowflakeSpec {
    /// Create a definition.
    pub fn new(name: impl Into<String>, default: i64, policy: Policy) -> Self {
        Self {
            name: name.into(),
            default,
            policy,
        }
    }
}

/// Exported counts: sequence name to next value.
pub type SnowflakeCounts = BTreeMap<String, i64>;

#[derive(Debug, Clone)]
struct Sequence {
    spec: SnowflakeSpec,
    next: Option<i64>,
}

impl Sequence {
    fn current(&self) -> i64 {
        self.next.unwrap_or(self.spec.default)
    }
}

/// Registry of defined sequences.
///
/// Not safe for concurrent use; the chassis is single-threaded.
#[derive(Debug, Clone, Default)]
pub struct SnowflakeRegistry {
    sequences: Vec<Sequence>,
    by_name: HashMap<String, usize>,
}

impl SnowflakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a sequence.
    ///
    /// # Errors
    ///
    /// [`SnowflakeError::AlreadyDefined`] if the name is taken.
    pub fn define(&mut self, spec: SnowflakeSpec) -> Result<(), SnowflakeError> {
        if self.by_name.contains_key(&spec.name) {
            return Err(SnowflakeError::AlreadyDefined(spec.name));
        }
        self.by_name.insert(spec.name.clone(), self.sequences.len());
        self.sequences.push(Sequence { spec, next: None });
        Ok(())
    }

    /// Check if a sequence is defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Hand out the current value and advance by one.
    pub fn next(&mut self, name: &str) -> Result<i64, SnowflakeError> {
        let seq = self.sequence_mut(name)?;
        let value = seq.current();
        let advanced = value
            .checked_add(1)
            .ok_or_else(|| SnowflakeError::Exhausted(name.to_string()))?;
        seq.next = Some(advanced);
        Ok(value)
    }

    /// The value the next call to [`next`](Self::next) would return.
    pub fn peek(&self, name: &str) -> Result<i64, SnowflakeError> {
        self.by_name
            .get(name)
            .map(|&i| self.sequences[i].current())
            .ok_or_else(|| SnowflakeError::Undefined(name.to_string()))
    }

    /// Set the next value, or restore the default when `value` is `None`.
    pub fn reset(&mut self, name: &str, value: Option<i64>) -> Result<(), SnowflakeError> {
        let seq = self.sequence_mut(name)?;
        seq.next = Some(value.unwrap_or(seq.spec.default));
        Ok(())
    }

    /// Next values of every `EXPORTED` sequence.
    pub fn export(&self) -> SnowflakeCounts {
        self.sequences
            .iter()
            .filter(|s| s.spec.policy == Policy::Exported)
            .map(|s| (s.spec.name.clone(), s.current()))
            .collect()
    }

    /// Overwrite `EXPORTED` sequences from a previous export.
    ///
    /// Returns the number of sequences updated. Names in `counts` that are
    /// not defined here, or are `SESSION` sequences, are ignored.
    pub fn import(&mut self, counts: &SnowflakeCounts) -> usize {
        let mut updated = 0;
        for seq in &mut self.sequences {
            if seq.spec.policy != Policy::Exported {
                continue;
            }
            if let Some(&value) = counts.get(&seq.spec.name) {
                seq.next = Some(value);
                updated += 1;
            }
        }
        updated
    }

    /// Definitions in definition order.
    pub fn specs(&self) -> impl Iterator<Item = &SnowflakeSpec> {
        self.sequences.iter().map(|s| &s.spec)
    }

    /// Number of defined sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Check if nothing is defined.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    fn sequence_mut(&mut self, name: &str) -> Result<&mut Sequence, SnowflakeError> {
        match self.by_name.get(name) {
            Some(&i) => Ok(&mut self.sequences[i]),
            None => Err(SnowflakeError::Undefined(name.to_string())),
        }
    }
}
