//! engine::source
//!
//! Where modules come from.
//!
//! # Architecture
//!
//! Discovery never loads anything itself. It asks a [`ModuleSource`] to turn
//! one address into a module (or, for directories, into a list of file
//! paths). [`ModuleCatalog`] is the stock implementation:
//!
//! - **by name**: explicit bindings, then `<dir>/<name>.json` across the
//!   search path
//! - **by file**: explicit bindings, then a manifest on disk
//! - **by directory**: every `.json` file in the directory plus every bound
//!   file whose parent is that directory, sorted by path
//!
//! Manifests are cached by canonical path, so two addresses that reach the
//! same file yield the same module object.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use chassis::engine::module::{ChassisModule, ModuleRef};
//! use chassis::engine::source::{ModuleCatalog, ModuleSource};
//!
//! struct Core;
//! impl ChassisModule for Core {
//!     fn name(&self) -> &str { "core" }
//! }
//!
//! let mut catalog = ModuleCatalog::new();
//! catalog.bind_name("core", Rc::new(Core));
//!
//! let module = catalog.load_by_name("core").unwrap();
//! assert_eq!(module.name(), "core");
//! assert!(catalog.load_by_name("missing").is_err());
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use super::module::{ManifestModule, ModuleRef};

/// File extension of module manifests.
pub const MANIFEST_EXTENSION: &str = "json";

/// Errors from module sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing answers to the address.
    #[error("nothing found for {0}")]
    NotFound(String),

    /// A manifest exists but is not a valid metadata block.
    #[error("invalid manifest '{path}': {message}")]
    InvalidManifest { path: PathBuf, message: String },

    /// The filesystem refused.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SourceError {
    /// Check if this is a plain miss rather than a load failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// Resolves module addresses into loaded modules.
pub trait ModuleSource {
    /// Load a module by symbolic name.
    fn load_by_name(&mut self, name: &str) -> Result<ModuleRef, SourceError>;

    /// Load the module at a path.
    fn load_file(&mut self, path: &Path) -> Result<ModuleRef, SourceError>;

    /// List the loadable files in a directory, in a stable order.
    fn list_directory(&mut self, dir: &Path) -> Result<Vec<PathBuf>, SourceError>;
}

/// In-memory bindings plus manifest files on disk.
#[derive(Default)]
pub struct ModuleCatalog {
    names: HashMap<String, ModuleRef>,
    files: HashMap<PathBuf, ModuleRef>,
    search_path: Vec<PathBuf>,
    manifests: HashMap<PathBuf, ModuleRef>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog that searches `dirs` for by-name manifests.
    pub fn with_search_path<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_path: dirs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Bind a module to a name. Replaces any earlier binding.
    pub fn bind_name(&mut self, name: impl Into<String>, module: ModuleRef) -> &mut Self {
        self.names.insert(name.into(), module);
        self
    }

    /// Bind a module to a path. Replaces any earlier binding.
    ///
    /// The path need not exist; bound files also show up in listings of
    /// their parent directory.
    pub fn bind_file(&mut self, path: impl Into<PathBuf>, module: ModuleRef) -> &mut Self {
        self.files.insert(path.into(), module);
        self
    }

    /// Append a directory to the search path.
    pub fn add_search_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.search_path.push(dir.into());
        self
    }

    /// The search path, in lookup order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Number of manifests loaded so far.
    pub fn manifests_loaded(&self) -> usize {
        self.manifests.len()
    }

    fn load_manifest(&mut self, path: &Path) -> Result<ModuleRef, SourceError> {
        let canonical = fs::canonicalize(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        if let Some(module) = self.manifests.get(&canonical) {
            return Ok(Rc::clone(module));
        }

        let contents = fs::read_to_string(&canonical).map_err(|e| SourceError::Io {
            path: canonical.clone(),
            source: e,
        })?;

        let manifest =
            ManifestModule::parse(&canonical, &contents).map_err(|e| SourceError::InvalidManifest {
                path: canonical.clone(),
                message: e.to_string(),
            })?;

        let module: ModuleRef = Rc::new(manifest);
        self.manifests.insert(canonical, Rc::clone(&module));
        Ok(module)
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION)
}

impl ModuleSource for ModuleCatalog {
    fn load_by_name(&mut self, name: &str) -> Result<ModuleRef, SourceError> {
        if let Some(module) = self.names.get(name) {
            return Ok(Rc::clone(module));
        }

        let file_name = format!("{}.{}", name, MANIFEST_EXTENSION);
        let found = self
            .search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => self.load_manifest(&path),
            None => Err(SourceError::NotFound(format!("module name '{}'", name))),
        }
    }

    fn load_file(&mut self, path: &Path) -> Result<ModuleRef, SourceError> {
        if let Some(module) = self.files.get(path) {
            return Ok(Rc::clone(module));
        }

        if path.is_file() {
            self.load_manifest(path)
        } else {
            Err(SourceError::NotFound(format!("file '{}'", path.display())))
        }
    }

    fn list_directory(&mut self, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let mut paths: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();

        if dir.is_dir() {
            let entries = fs::read_dir(dir).map_err(|e| SourceError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| SourceError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
                let path = entry.path();
                if path.is_file() && is_manifest(&path) {
                    paths.push(path);
                }
            }
        } else if paths.is_empty() {
            return Err(SourceError::NotFound(format!(
                "directory '{}'",
                dir.display()
            )));
        }

        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::module::ChassisModule;
    use tempfile::TempDir;

    struct Bound(&'static str);

    impl ChassisModule for Bound {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn write(dir: &Path, file: &str, body: &str) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, body).unwrap();
        path
    }

    mod by_name {
        use super::*;

        #[test]
        fn binding_wins_over_search_path() {
            let temp = TempDir::new().unwrap();
            write(temp.path(), "core.json", r#"{"NAME": "from-disk"}"#);

            let mut catalog = ModuleCatalog::with_search_path([temp.path()]);
            catalog.bind_name("core", Rc::new(Bound("bound")));

            assert_eq!(catalog.load_by_name("core").unwrap().name(), "bound");
        }

        #[test]
        fn search_path_in_order() {
            let first = TempDir::new().unwrap();
            let second = TempDir::new().unwrap();
            write(second.path(), "core.json", r#"{"NAME": "second"}"#);
            write(first.path(), "core.json", r#"{"NAME": "first"}"#);

            let mut catalog = ModuleCatalog::with_search_path([first.path(), second.path()]);
            assert_eq!(catalog.load_by_name("core").unwrap().name(), "first");
        }

        #[test]
        fn missing_is_not_found() {
            let mut catalog = ModuleCatalog::new();
            let err = catalog.load_by_name("ghost").err().unwrap();
            assert!(err.is_not_found());
            assert!(err.to_string().contains("ghost"));
        }
    }

    mod by_file {
        use super::*;

        #[test]
        fn same_file_twice_is_same_object() {
            let temp = TempDir::new().unwrap();
            let path = write(temp.path(), "a.json", "{}");

            let mut catalog = ModuleCatalog::new();
            let one = catalog.load_file(&path).unwrap();
            let two = catalog.load_file(&temp.path().join(".").join("a.json")).unwrap();

            assert!(Rc::ptr_eq(&one, &two));
            assert_eq!(catalog.manifests_loaded(), 1);
        }

        #[test]
        fn name_and_file_reach_same_manifest() {
            let temp = TempDir::new().unwrap();
            let path = write(temp.path(), "a.json", "{}");

            let mut catalog = ModuleCatalog::with_search_path([temp.path()]);
            let by_name = catalog.load_by_name("a").unwrap();
            let by_file = catalog.load_file(&path).unwrap();
            assert!(Rc::ptr_eq(&by_name, &by_file));
        }

        #[test]
        fn malformed_manifest_is_invalid() {
            let temp = TempDir::new().unwrap();
            let path = write(temp.path(), "bad.json", "not json");

            let mut catalog = ModuleCatalog::new();
            let err = catalog.load_file(&path).err().unwrap();
            assert!(matches!(err, SourceError::InvalidManifest { .. }));
            assert!(!err.is_not_found());
        }

        #[test]
        fn bound_file_needs_no_disk() {
            let mut catalog = ModuleCatalog::new();
            catalog.bind_file("/virtual/x.json", Rc::new(Bound("x")));
            let module = catalog.load_file(Path::new("/virtual/x.json")).unwrap();
            assert_eq!(module.name(), "x");
        }

        #[test]
        fn missing_file_is_not_found() {
            let mut catalog = ModuleCatalog::new();
            let err = catalog.load_file(Path::new("/no/such/file.json")).err().unwrap();
            assert!(err.is_not_found());
        }
    }

    mod by_directory {
        use super::*;

        #[test]
        fn lists_manifests_sorted() {
            let temp = TempDir::new().unwrap();
            write(temp.path(), "b.json", "{}");
            write(temp.path(), "a.json", "{}");
            write(temp.path(), "notes.txt", "ignored");
            fs::create_dir(temp.path().join("sub.json")).unwrap();

            let mut catalog = ModuleCatalog::new();
            let listed = catalog.list_directory(temp.path()).unwrap();
            assert_eq!(
                listed,
                vec![temp.path().join("a.json"), temp.path().join("b.json")]
            );
        }

        #[test]
        fn includes_bound_files_without_duplicates() {
            let temp = TempDir::new().unwrap();
            let on_disk = write(temp.path(), "a.json", "{}");

            let mut catalog = ModuleCatalog::new();
            catalog.bind_file(on_disk.clone(), Rc::new(Bound("a")));
            catalog.bind_file(temp.path().join("z.json"), Rc::new(Bound("z")));

            let listed = catalog.list_directory(temp.path()).unwrap();
            assert_eq!(listed, vec![on_disk, temp.path().join("z.json")]);
        }

        #[test]
        fn virtual_directory_of_bound_files() {
            let mut catalog = ModuleCatalog::new();
            catalog.bind_file("/virtual/b", Rc::new(Bound("b")));
            catalog.bind_file("/virtual/a", Rc::new(Bound("a")));

            let listed = catalog.list_directory(Path::new("/virtual")).unwrap();
            assert_eq!(
                listed,
                vec![PathBuf::from("/virtual/a"), PathBuf::from("/virtual/b")]
            );
        }

        #[test]
        fn missing_directory_is_not_found() {
            let mut catalog = ModuleCatalog::new();
            let err = catalog.list_directory(Path::new("/no/such/dir")).unwrap_err();
            assert!(err.is_not_found());
        }
    }
}
