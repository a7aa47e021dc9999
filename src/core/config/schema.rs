//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$CHASSIS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/chassis/config.toml`
//! 3. `~/.chassis/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., search path entries
//! must not be empty).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// descriptor = "~/apps/demo/programdata.json"
/// module_path = ["/usr/share/chassis/modules", "./modules"]
/// debug = false
/// quiet = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Descriptor to use when `--descriptor` is not given.
    pub descriptor: Option<PathBuf>,

    /// Directories searched for `<name>.json` manifests when resolving
    /// modules by name.
    pub module_path: Vec<PathBuf>,

    /// Debug output default.
    pub debug: Option<bool>,

    /// Quiet output default.
    pub quiet: Option<bool>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_path.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "module_path entries cannot be empty".to_string(),
            ));
        }

        if let Some(descriptor) = &self.descriptor {
            if descriptor.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "descriptor path cannot be empty".to_string(),
                ));
            }
        }

        if self.debug == Some(true) && self.quiet == Some(true) {
            return Err(ConfigError::InvalidValue(
                "debug and quiet cannot both be enabled".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let config: GlobalConfig = toml::from_str(
            r#"
            descriptor = "app/programdata.json"
            module_path = ["mods", "/opt/mods"]
            debug = true
            "#,
        )
        .unwrap();
        assert_eq!(config.descriptor, Some(PathBuf::from("app/programdata.json")));
        assert_eq!(config.module_path.len(), 2);
        assert_eq!(config.debug, Some(true));
        assert_eq!(config.quiet, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_is_default() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<GlobalConfig, _> = toml::from_str("trunk = \"main\"");
        assert!(result.is_err());
    }

    #[test]
    fn empty_module_path_entry_invalid() {
        let config = GlobalConfig {
            module_path: vec![PathBuf::from("")],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn debug_and_quiet_conflict() {
        let config = GlobalConfig {
            debug: Some(true),
            quiet: Some(true),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
