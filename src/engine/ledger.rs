//! engine::ledger
//!
//! Diagnostic record: an unbounded log, a bounded ring mirror, and a set of
//! noticed flags.
//!
//! # Architecture
//!
//! Every entry carries a UTC timestamp and the call site that produced it
//! (captured with `#[track_caller]`, so wrappers marked the same way report
//! their own caller). Entries are forwarded to `tracing` at the level that
//! matches their severity; the ledger itself is the record callers inspect.
//!
//! The ring log mirrors selected entries and evicts oldest-first once its
//! capacity is reached. A missing capacity is a descriptor problem, not a
//! caller problem: the entry is still mirrored, and a `BADPROGRAMDATA` error
//! is appended to the unbounded log.
//!
//! # Invariants
//!
//! - The unbounded log is append-only
//! - `ring().len() <= capacity` after every call when a capacity is set
//! - Rendering never mutates
//!
//! # Example
//!
//! ```
//! use chassis::engine::ledger::{Logger, Severity};
//!
//! let mut logger = Logger::new(Some(2));
//! for i in 0..3 {
//!     logger.ringlog(Severity::Note, "TICK", "tick", format!("tick {i}"));
//! }
//!
//! let ring: Vec<_> = logger.ring().map(|e| e.message.as_str()).collect();
//! assert_eq!(ring, vec!["tick 1", "tick 2"]);
//! assert_eq!(logger.entries().len(), 3);
//! ```

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic codes produced by the chassis itself.
pub mod codes {
    /// The program descriptor is missing something the chassis needs.
    pub const BAD_PROGRAM_DATA: &str = "BADPROGRAMDATA";
    /// More modules implement a run hook than the execution type allows.
    pub const TOO_MANY_RUN_MODULES: &str = "TOOMANYRUNMODULES";
    /// Fewer modules implement a run hook than the execution type requires.
    pub const NO_RUN_MODULE: &str = "NORUNMODULE";
    /// Two registered modules share a name, and so share a vocabulary table.
    pub const DUPLICATE_MODULE_NAME: &str = "DUPLICATEMODULENAME";
}

/// Errors from ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogError {
    /// A severity string is not one of NOTE, DBG, WARN, ERR.
    #[error("invalid severity '{0}' (expected NOTE, DBG, WARN or ERR)")]
    InvalidSeverity(String),
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// General catch-all.
    Note,
    /// Not a problem, but relevant to debugging.
    Dbg,
    /// Something a developer should be aware of.
    Warn,
    /// An error occurred.
    Err,
}

impl Severity {
    /// Every severity, least to most severe.
    pub const ALL: [Severity; 4] = [Severity::Note, Severity::Dbg, Severity::Warn, Severity::Err];

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "NOTE",
            Severity::Dbg => "DBG",
            Severity::Warn => "WARN",
            Severity::Err => "ERR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, LogError> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| LogError::InvalidSeverity(s.to_string()))
    }
}

/// Source location that produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl CallSite {
    fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub call_site: CallSite,
    pub severity: Severity,
    pub code: String,
    pub title: String,
    pub message: String,
}

impl LogEntry {
    fn render_into(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "* time: {}", self.timestamp.format("%Y-%m-%dT%H:%M:%SZ"));
        let _ = writeln!(out, "  source: {}", self.call_site);
        let _ = writeln!(out, "  type: {}", self.severity);
        let _ = writeln!(out, "  code: {}", self.code);
        let _ = writeln!(out, "  title: {}", self.title);
        let _ = writeln!(out, "  message: {}", self.message);
    }

    fn trace(&self) {
        let site = self.call_site;
        match self.severity {
            Severity::Note => {
                tracing::info!(code = %self.code, %site, title = %self.title, "{}", self.message)
            }
            Severity::Dbg => {
                tracing::debug!(code = %self.code, %site, title = %self.title, "{}", self.message)
            }
            Severity::Warn => {
                tracing::warn!(code = %self.code, %site, title = %self.title, "{}", self.message)
            }
            Severity::Err => {
                tracing::error!(code = %self.code, %site, title = %self.title, "{}", self.message)
            }
        }
    }
}

/// Something observed during execution, keyed by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticedFlag {
    pub code: String,
    pub text: String,
}

/// The chassis diagnostic record.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    entries: Vec<LogEntry>,
    ring: VecDeque<LogEntry>,
    ring_capacity: Option<usize>,
    noticed: Vec<NoticedFlag>,
}

impl Logger {
    /// Create a logger with the given ring capacity (`None` = not configured).
    pub fn new(ring_capacity: Option<usize>) -> Self {
        Self {
            ring_capacity,
            ..Default::default()
        }
    }

    /// Change the ring capacity, evicting immediately if it shrank.
    pub fn set_ring_capacity(&mut self, capacity: Option<usize>) {
        self.ring_capacity = capacity;
        self.evict();
    }

    /// Configured ring capacity.
    pub fn ring_capacity(&self) -> Option<usize> {
        self.ring_capacity
    }

    /// Append an entry to the unbounded log.
    #[track_caller]
    pub fn log(
        &mut self,
        severity: Severity,
        code: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> &LogEntry {
        let entry = LogEntry {
            timestamp: Utc::now(),
            call_site: CallSite::from_location(Location::caller()),
            severity,
            code: code.into(),
            title: title.into(),
            message: message.into(),
        };
        entry.trace();
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Append an entry to the log and mirror it into the ring.
    #[track_caller]
    pub fn ringlog(
        &mut self,
        severity: Severity,
        code: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        let entry = self.log(severity, code, title, message).clone();
        self.ring.push_back(entry);

        if self.ring_capacity.is_some() {
            self.evict();
        } else {
            self.log(
                Severity::Err,
                codes::BAD_PROGRAM_DATA,
                "LOGRINGLEN not defined",
                "ringlog(...) called, but LOGRINGLEN was not defined in the program data",
            );
        }
    }

    /// Record a noticed flag. Returns `false` if the code was already noticed.
    pub fn notice(&mut self, code: impl Into<String>, text: impl Into<String>) -> bool {
        let code = code.into();
        if self.is_noticed(&code) {
            return false;
        }
        self.noticed.push(NoticedFlag {
            code,
            text: text.into(),
        });
        true
    }

    /// Check if a code has been noticed.
    pub fn is_noticed(&self, code: &str) -> bool {
        self.noticed.iter().any(|n| n.code == code)
    }

    /// The unbounded log, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The ring log, oldest first.
    pub fn ring(&self) -> impl Iterator<Item = &LogEntry> {
        self.ring.iter()
    }

    /// Number of entries currently in the ring.
    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }

    /// Noticed flags, in the order first noticed.
    pub fn noticed(&self) -> &[NoticedFlag] {
        &self.noticed
    }

    /// Entries in the unbounded log with the given code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |e| e.code == code)
    }

    /// Number of entries of a severity in the unbounded log.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|e| e.severity == severity).count()
    }

    /// Check if any ERR entry was logged.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Err) > 0
    }

    /// Render the unbounded log.
    pub fn render_log(&self) -> String {
        Self::render("log:", self.entries.iter())
    }

    /// Render the ring log.
    pub fn render_ring_log(&self) -> String {
        Self::render("ringlog:", self.ring.iter())
    }

    /// Render the noticed flags.
    pub fn render_noticed(&self) -> String {
        let mut out = String::from("noticed flags:\n");
        if self.noticed.is_empty() {
            out.push_str("  - (nothing)\n");
        }
        for flag in &self.noticed {
            let _ = writeln!(out, "  - {}: {}", flag.code, flag.text);
        }
        out
    }

    /// Drop every entry and flag, keeping the capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.ring.clear();
        self.noticed.clear();
    }

    fn render<'a>(header: &str, entries: impl Iterator<Item = &'a LogEntry>) -> String {
        let mut out = format!("{header}\n");
        for entry in entries {
            entry.render_into(&mut out);
            out.push('\n');
        }
        out
    }

    fn evict(&mut self) {
        if let Some(capacity) = self.ring_capacity {
            while self.ring.len() > capacity {
                self.ring.pop_front();
            }
        }
    }
}
