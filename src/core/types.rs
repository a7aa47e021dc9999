//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ModuleAddress`] - Where a module is loaded from (name, file, directory)
//! - [`ModuleAddresses`] - A declared block of addresses (`NAMES`/`FILES`/`DIRS`)
//! - [`Provenance`] - Who asked for an address to be resolved
//! - [`Symbol`] / [`SymbolInterner`] - Interned vocabulary names
//!
//! # Examples
//!
//! ```
//! use chassis::core::types::{ModuleAddress, ModuleAddresses};
//!
//! let block = ModuleAddresses::default()
//!     .with_name("logging")
//!     .with_dir("plugins");
//!
//! // Directories queue before files, files before names.
//! let queued: Vec<_> = block.addresses().collect();
//! assert_eq!(queued[0], ModuleAddress::dir("plugins"));
//! assert_eq!(queued[1], ModuleAddress::name("logging"));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Identifies a unit to load.
///
/// Directories are not modules themselves; they expand into one
/// [`ModuleAddress::ByFile`] per eligible file during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleAddress {
    /// Symbolic lookup (catalog binding or search path).
    ByName(String),
    /// A single unit at a path.
    ByFile(PathBuf),
    /// Every eligible unit inside a directory.
    ByDirectory(PathBuf),
}

impl ModuleAddress {
    /// Address a module by symbolic name.
    pub fn name(name: impl Into<String>) -> Self {
        ModuleAddress::ByName(name.into())
    }

    /// Address a module by file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ModuleAddress::ByFile(path.into())
    }

    /// Address every module in a directory.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        ModuleAddress::ByDirectory(path.into())
    }

    /// Short tag for the address kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ModuleAddress::ByName(_) => "name",
            ModuleAddress::ByFile(_) => "file",
            ModuleAddress::ByDirectory(_) => "dir",
        }
    }
}

impl fmt::Display for ModuleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleAddress::ByName(name) => write!(f, "name:{}", name),
            ModuleAddress::ByFile(path) => write!(f, "file:{}", path.display()),
            ModuleAddress::ByDirectory(path) => write!(f, "dir:{}", path.display()),
        }
    }
}

/// A declared block of module addresses.
///
/// This is the `MODULES` block shared by the program descriptor, execution
/// types and module metadata.
///
/// ```json
/// { "NAMES": ["core"], "FILES": ["extra/report.json"], "DIRS": ["plugins"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleAddresses {
    /// Modules addressed by symbolic name.
    #[serde(rename = "NAMES", skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    /// Modules addressed by file path.
    #[serde(rename = "FILES", skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,

    /// Directories whose eligible files are all modules.
    #[serde(rename = "DIRS", skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<PathBuf>,
}

impl ModuleAddresses {
    /// An empty block, usable in `const` and `static` items.
    pub const EMPTY: ModuleAddresses = ModuleAddresses {
        names: Vec::new(),
        files: Vec::new(),
        dirs: Vec::new(),
    };

    /// Add a by-name address.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Add a by-file address.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Add a by-directory address.
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.push(path.into());
        self
    }

    /// Check if the block declares nothing.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.files.is_empty() && self.dirs.is_empty()
    }

    /// Total number of declared addresses.
    pub fn len(&self) -> usize {
        self.names.len() + self.files.len() + self.dirs.len()
    }

    /// Iterate addresses in queueing order: directories, files, then names.
    ///
    /// Discovery pushes in this order onto a LIFO worklist, so names are
    /// resolved first and the last declared name of a block goes first.
    pub fn addresses(&self) -> impl Iterator<Item = ModuleAddress> + '_ {
        self.dirs
            .iter()
            .map(|p| ModuleAddress::ByDirectory(p.clone()))
            .chain(self.files.iter().map(|p| ModuleAddress::ByFile(p.clone())))
            .chain(self.names.iter().map(|n| ModuleAddress::ByName(n.clone())))
    }

    /// Rebase relative file and directory entries onto `base`.
    ///
    /// Used when a descriptor on disk names paths relative to itself.
    pub fn rebased(&self, base: &Path) -> Self {
        let rebase = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            names: self.names.clone(),
            files: self.files.iter().map(rebase).collect(),
            dirs: self.dirs.iter().map(rebase).collect(),
        }
    }
}

/// Who requested an address.
///
/// Carried through discovery purely so that a failed resolution can say
/// which descriptor entry or module asked for the missing unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// The program descriptor's `MODULES` block.
    Descriptor,
    /// The active execution type's seed modules.
    ExecutionType(String),
    /// A module registered earlier in discovery.
    Module(String),
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Descriptor => write!(f, "program descriptor"),
            Provenance::ExecutionType(name) => write!(f, "execution type: {}", name),
            Provenance::Module(name) => write!(f, "module '{}'", name),
        }
    }
}

/// An interned vocabulary name.
///
/// Equal symbols produced by the same [`SymbolInterner`] share storage.
pub type Symbol = Rc<str>;

/// Interns vocabulary names so every module sees the same allocation.
#[derive(Debug, Default, Clone)]
pub struct SymbolInterner {
    symbols: HashSet<Symbol>,
}

impl SymbolInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern one name.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(existing) = self.symbols.get(name) {
            return Rc::clone(existing);
        }
        let symbol: Symbol = Rc::from(name);
        self.symbols.insert(Rc::clone(&symbol));
        symbol
    }

    /// Intern every name, preserving order.
    pub fn intern_all<'a, I>(&mut self, names: I) -> Vec<Symbol>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().map(|n| self.intern(n)).collect()
    }

    /// Number of distinct symbols interned so far.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
