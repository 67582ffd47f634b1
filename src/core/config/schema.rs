//! core::config::schema
//!
//! Configuration schema types.
//!
//! # User Config
//!
//! Located at (in order of precedence):
//! 1. `$PLY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ply/config.toml`
//! 3. `~/.ply/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `.ply/config.toml` in the directory holding the design file.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they are in range.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Inclusive bounds for `upgrade.max_passes`.
pub const MAX_PASSES_RANGE: std::ops::RangeInclusive<usize> = 1..=1024;

/// User configuration.
///
/// # Example
///
/// ```toml
/// [upgrade]
/// max_passes = 16
///
/// [reprocess]
/// auto = true
///
/// [files]
/// last_directory = "/home/me/designs"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Upgrade engine settings
    pub upgrade: Option<UpgradeSettings>,

    /// Reprocessing settings
    pub reprocess: Option<ReprocessSettings>,

    /// File dialog state
    pub files: Option<FilesSettings>,
}

impl UserConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(upgrade) = &self.upgrade {
            upgrade.validate()?;
        }
        Ok(())
    }
}

/// Project configuration, next to a design file.
///
/// # Example
///
/// ```toml
/// [upgrade]
/// max_passes = 32
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Upgrade engine settings
    pub upgrade: Option<UpgradeSettings>,

    /// Reprocessing settings
    pub reprocess: Option<ReprocessSettings>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(upgrade) = &self.upgrade {
            upgrade.validate()?;
        }
        Ok(())
    }
}

/// Upgrade engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeSettings {
    /// Fixed-point pass bound
    pub max_passes: Option<usize>,
}

impl UpgradeSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(passes) = self.max_passes {
            if !MAX_PASSES_RANGE.contains(&passes) {
                return Err(ConfigError::InvalidValue(format!(
                    "upgrade.max_passes must be between {} and {}, got {}",
                    MAX_PASSES_RANGE.start(),
                    MAX_PASSES_RANGE.end(),
                    passes
                )));
            }
        }
        Ok(())
    }
}

/// Reprocessing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReprocessSettings {
    /// Reprocess after edits
    pub auto: Option<bool>,
}

/// File dialog state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FilesSettings {
    /// Directory of the last opened or saved design
    pub last_directory: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod user_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = UserConfig::default();
            assert!(config.upgrade.is_none());
            assert!(config.reprocess.is_none());
            assert!(config.files.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn max_passes_bounds() {
            let with = |passes| UserConfig {
                upgrade: Some(UpgradeSettings {
                    max_passes: Some(passes),
                }),
                ..Default::default()
            };
            assert!(with(1).validate().is_ok());
            assert!(with(1024).validate().is_ok());
            assert!(with(0).validate().is_err());
            assert!(with(1025).validate().is_err());
        }

        #[test]
        fn roundtrip() {
            let config = UserConfig {
                upgrade: Some(UpgradeSettings {
                    max_passes: Some(8),
                }),
                reprocess: Some(ReprocessSettings { auto: Some(false) }),
                files: Some(FilesSettings {
                    last_directory: Some(PathBuf::from("/tmp/designs")),
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: UserConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }
    }

    mod project_config {
        use super::*;

        #[test]
        fn files_section_is_user_only() {
            let toml = r#"
                [files]
                last_directory = "/tmp"
            "#;
            let result: Result<ProjectConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                [upgrade]
                max_passes = 4
                strategy = "fast"
            "#;
            let result: Result<ProjectConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }
}
