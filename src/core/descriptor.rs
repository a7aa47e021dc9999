//! core::descriptor
//!
//! The program descriptor (`programdata.json`).
//!
//! # Format
//!
//! ```json
//! {
//!   "APPID": { "NAME": "demo", "TITLE": "Demo program" },
//!   "PROGRAM": { "EXECUTIONTYPE": "CLITOOL", "LOGRINGLEN": 50 },
//!   "MODULES": { "NAMES": ["core"], "DIRS": ["plugins"] },
//!   "CONFIG": [
//!     { "NAME": "port", "TYPE": "int", "DESC": "listen port", "DEFAULT": 8080 }
//!   ]
//! }
//! ```
//!
//! The chassis reads `PROGRAM` and `MODULES`. `CONFIG` is handed to the
//! option-parsing collaborator. Any other top-level key (`RESOURCES`, ...) is
//! kept verbatim so that a load/save cycle does not drop it.
//!
//! # Example
//!
//! ```
//! use chassis::core::descriptor::ProgramDescriptor;
//!
//! let descriptor = ProgramDescriptor::from_json(
//!     r#"{"PROGRAM": {"EXECUTIONTYPE": "CLITOOL", "LOGRINGLEN": 3}, "RESOURCES": {}}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(descriptor.program.execution_type, "CLITOOL");
//! assert_eq!(descriptor.program.log_ring_len, Some(3));
//! assert!(descriptor.extra.contains_key("RESOURCES"));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::ModuleAddresses;

/// Default descriptor file name.
pub const DESCRIPTOR_FILENAME: &str = "programdata.json";

/// Errors from descriptor operations.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse descriptor '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write descriptor '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize descriptor: {0}")]
    Serialize(String),
}

/// Application identity block (`APPID`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppId {
    #[serde(rename = "GUID", skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    #[serde(rename = "TAGURI", skip_serializing_if = "Option::is_none")]
    pub tag_uri: Option<String>,

    #[serde(rename = "NAME", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "TITLE", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "TAGS", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(rename = "DESC", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `PROGRAM` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSection {
    /// Name of the active execution type.
    #[serde(rename = "EXECUTIONTYPE")]
    pub execution_type: String,

    /// Ring log capacity. Missing means the ring log is unbounded and every
    /// `ringlog` call records a `BADPROGRAMDATA` diagnostic.
    #[serde(rename = "LOGRINGLEN", default, skip_serializing_if = "Option::is_none")]
    pub log_ring_len: Option<usize>,

    /// Keys the chassis does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type tag of a configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Str,
    Int,
    Float,
    Bool,
    Path,
}

/// One typed configuration option, consumed by the option parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    #[serde(rename = "NAME")]
    pub name: String,

    #[serde(rename = "TYPE")]
    pub kind: OptionType,

    #[serde(rename = "DESC", default)]
    pub description: String,

    #[serde(rename = "DEFAULT", default)]
    pub default: Value,
}

/// Resolved option values: name to value.
///
/// Opaque to the chassis; it only carries what the option parser hands back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValues(BTreeMap<String, Value>);

impl OptionValues {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed values from each spec's default (null defaults are skipped).
    pub fn from_defaults(specs: &[OptionSpec]) -> Self {
        Self(
            specs
                .iter()
                .filter(|s| !s.default.is_null())
                .map(|s| (s.name.clone(), s.default.clone()))
                .collect(),
        )
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Overlay another mapping on top of this one.
    pub fn merge(&mut self, other: OptionValues) {
        self.0.extend(other.0);
    }

    /// Iterate values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The program descriptor blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramDescriptor {
    #[serde(rename = "APPID", default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<AppId>,

    #[serde(rename = "PROGRAM")]
    pub program: ProgramSection,

    #[serde(rename = "MODULES", default)]
    pub modules: ModuleAddresses,

    #[serde(rename = "CONFIG", default, skip_serializing_if = "Vec::is_empty")]
    pub config: Vec<OptionSpec>,

    /// Top-level keys the chassis does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgramDescriptor {
    /// Create a descriptor for an execution type with no modules.
    pub fn new(execution_type: impl Into<String>) -> Self {
        Self {
            program: ProgramSection {
                execution_type: execution_type.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Set the ring log capacity.
    pub fn with_ring_len(mut self, len: usize) -> Self {
        self.program.log_ring_len = Some(len);
        self
    }

    /// Set the seed modules.
    pub fn with_modules(mut self, modules: ModuleAddresses) -> Self {
        self.modules = modules;
        self
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON text.
    pub fn to_json(&self) -> Result<String, DescriptorError> {
        serde_json::to_string_pretty(self).map_err(|e| DescriptorError::Serialize(e.to_string()))
    }

    /// Default option values declared in `CONFIG`.
    pub fn option_defaults(&self) -> OptionValues {
        OptionValues::from_defaults(&self.config)
    }

    /// Load a descriptor from disk.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let contents = fs::read_to_string(path).map_err(|e| DescriptorError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&contents).map_err(|e| DescriptorError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the descriptor atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), DescriptorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error(path))?;
        }

        let contents = self.to_json()?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(write_error(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(write_error(&temp_path))?;
        file.sync_all().map_err(write_error(&temp_path))?;

        fs::rename(&temp_path, path).map_err(write_error(path))?;
        Ok(())
    }
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> DescriptorError {
    let path = path.to_path_buf();
    move |source| DescriptorError::WriteError { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"{
        "APPID": {"NAME": "demo", "TAGS": ["a", "b"]},
        "PROGRAM": {"EXECUTIONTYPE": "WEBSERVER", "LOGRINGLEN": 10, "PORTHINT": 1},
        "MODULES": {"NAMES": ["core"], "FILES": ["x.json"]},
        "CONFIG": [
            {"NAME": "port", "TYPE": "int", "DESC": "listen port", "DEFAULT": 8080},
            {"NAME": "root", "TYPE": "path"}
        ],
        "RESOURCES": {"icons": ["a.png"]}
    }"#;

    #[test]
    fn parses_full_descriptor() {
        let d = ProgramDescriptor::from_json(FULL).unwrap();
        assert_eq!(d.app_id.as_ref().and_then(|a| a.name.as_deref()), Some("demo"));
        assert_eq!(d.program.execution_type, "WEBSERVER");
        assert_eq!(d.program.log_ring_len, Some(10));
        assert!(d.program.extra.contains_key("PORTHINT"));
        assert_eq!(d.modules.names, vec!["core".to_string()]);
        assert_eq!(d.config.len(), 2);
        assert_eq!(d.config[0].kind, OptionType::Int);
        assert!(d.extra.contains_key("RESOURCES"));
    }

    #[test]
    fn missing_program_block_is_an_error() {
        assert!(ProgramDescriptor::from_json(r#"{"MODULES": {}}"#).is_err());
    }

    #[test]
    fn option_defaults_skip_null() {
        let d = ProgramDescriptor::from_json(FULL).unwrap();
        let values = d.option_defaults();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("port"), Some(&Value::from(8080)));
        assert!(values.get("root").is_none());
    }

    #[test]
    fn option_values_merge_overrides() {
        let mut values = OptionValues::new();
        values.insert("a", Value::from(1));
        let mut overlay = OptionValues::new();
        overlay.insert("a", Value::from(2));
        overlay.insert("b", Value::from(true));
        values.merge(overlay);
        assert_eq!(values.get("a"), Some(&Value::from(2)));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn save_then_load_preserves_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(DESCRIPTOR_FILENAME);

        let d = ProgramDescriptor::from_json(FULL).unwrap();
        d.save(&path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = ProgramDescriptor::load(&path).unwrap();
        assert_eq!(loaded, d);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.json");
        let err = ProgramDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, DescriptorError::ReadError { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DESCRIPTOR_FILENAME);
        fs::write(&path, "{ not json").unwrap();
        let err = ProgramDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, DescriptorError::ParseError { .. }));
    }

    #[test]
    fn builder_round_trips_through_json() {
        let d = ProgramDescriptor::new("CLITOOL")
            .with_ring_len(5)
            .with_modules(ModuleAddresses::default().with_name("main"));
        let json = d.to_json().unwrap();
        assert!(json.contains("\"EXECUTIONTYPE\": \"CLITOOL\""));
        assert!(!json.contains("CONFIG"));
        assert_eq!(ProgramDescriptor::from_json(&json).unwrap(), d);
    }
}
