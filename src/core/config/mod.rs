//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The chassis binary reads one optional user-level TOML file. The program
//! descriptor is a separate document (see [`crate::core::descriptor`]).
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$CHASSIS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/chassis/config.toml`
//! 3. `~/.chassis/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use chassis::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("descriptor: {}", config.descriptor().display());
//! for dir in config.module_path() {
//!     println!("module dir: {}", dir.display());
//! }
//! ```

pub mod schema;

pub use schema::GlobalConfig;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::descriptor::DESCRIPTOR_FILENAME;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CHASSIS_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration.
    pub global: GlobalConfig,
    /// Path the global config was loaded from, if any.
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::locate().as_deref())
    }

    /// Load configuration from an explicit file, or defaults for `None`.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let global = Self::read_global_config(path)?;
        global.validate()?;

        Ok(Self {
            global,
            global_path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file in the search order.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("chassis/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".chassis/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a global config file.
    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Descriptor path.
    ///
    /// Defaults to `programdata.json` in the working directory.
    pub fn descriptor(&self) -> PathBuf {
        self.global
            .descriptor
            .clone()
            .unwrap_or_else(|| PathBuf::from(DESCRIPTOR_FILENAME))
    }

    /// Search path for by-name module manifests.
    pub fn module_path(&self) -> &[PathBuf] {
        &self.global.module_path
    }

    /// Debug output default. Defaults to `false`.
    pub fn debug(&self) -> bool {
        self.global.debug.unwrap_or(false)
    }

    /// Quiet output default. Defaults to `false`.
    pub fn quiet(&self) -> bool {
        self.global.quiet.unwrap_or(false)
    }

    /// Path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

impl From<GlobalConfig> for Config {
    /// Wrap an in-memory config that was not read from disk.
    fn from(global: GlobalConfig) -> Self {
        Self {
            global,
            global_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::load_from(None).unwrap();
        assert_eq!(config.descriptor(), PathBuf::from(DESCRIPTOR_FILENAME));
        assert!(config.module_path().is_empty());
        assert!(!config.debug());
        assert!(!config.quiet());
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            descriptor = "apps/demo.json"
            module_path = ["mods"]
            quiet = true
            "#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.descriptor(), PathBuf::from("apps/demo.json"));
        assert_eq!(config.module_path(), &[PathBuf::from("mods")]);
        assert!(config.quiet());
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn parse_error_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "module_path = 3").unwrap();

        let err = Config::load_from(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "module_path = [\"\"]").unwrap();

        assert!(matches!(
            Config::load_from(Some(&path)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn in_memory_config_has_no_source() {
        let config = Config::from(GlobalConfig {
            module_path: vec![PathBuf::from("/opt/mods")],
            debug: Some(true),
            ..Default::default()
        });
        assert!(config.loaded_from().is_none());
        assert!(config.debug());
        assert_eq!(config.module_path(), &[PathBuf::from("/opt/mods")]);
    }
}
