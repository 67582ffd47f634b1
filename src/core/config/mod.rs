//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! ply has two configuration scopes:
//! - **User**: User-level settings and file dialog state
//! - **Project**: Overrides stored next to a design file
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. User config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # User Config Locations
//!
//! Searched in order:
//! 1. `$PLY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ply/config.toml`
//! 3. `~/.ply/config.toml` (canonical write location)
//!
//! # Project Config Location
//!
//! `.ply/config.toml` in the directory holding the design file.
//!
//! # Example
//!
//! ```no_run
//! use plydesign::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("gripper.ply.json"))).unwrap();
//! println!("Max passes: {}", config.max_passes());
//! println!("Auto reprocess: {}", config.reprocess_auto());
//! ```

pub mod schema;

pub use schema::{
    FilesSettings, ProjectConfig, ReprocessSettings, UpgradeSettings, UserConfig,
};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::design::upgrade::DEFAULT_MAX_PASSES;
use crate::core::design::UpgradeOptions;
use crate::core::file::store::write_atomic;

/// Keys understood by [`Config::get`] and [`UserConfig::set`].
pub const KEYS: &[&str] = &["upgrade.max_passes", "reprocess.auto", "files.last_directory"];

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

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules; project config overrides user config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// User configuration
    pub user: UserConfig,
    /// Project configuration (if a design was given and has one)
    pub project: Option<ProjectConfig>,
    /// Path to the user config file (if loaded)
    user_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `design_path` is provided, also loads that design's project config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// out-of-range values. Missing config files are not an error.
    pub fn load(design_path: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_with(Self::locate_user().as_deref(), design_path)
    }

    /// Load from an explicit user config path instead of searching.
    pub fn load_with(
        user_path: Option<&Path>,
        design_path: Option<&Path>,
    ) -> Result<Config, ConfigError> {
        let (user, user_path) = match user_path.filter(|p| p.exists()) {
            Some(path) => (read_toml::<UserConfig>(path)?, Some(path.to_path_buf())),
            None => (UserConfig::default(), None),
        };

        let project_file = design_path.map(Self::project_config_path);
        let (project, project_path) = match project_file.filter(|p| p.exists()) {
            Some(path) => (Some(read_toml::<ProjectConfig>(&path)?), Some(path)),
            None => (None, None),
        };

        user.validate()?;
        if let Some(p) = &project {
            p.validate()?;
        }

        tracing::debug!(?user_path, ?project_path, "loaded configuration");
        Ok(Config {
            user,
            project,
            user_path,
            project_path,
        })
    }

    /// First existing user config file in search order.
    fn locate_user() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PLY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ply/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".ply/config.toml"))
            .filter(|p| p.exists())
    }

    /// Get the canonical path for user config.
    ///
    /// Honors `$PLY_CONFIG`; otherwise `~/.ply/config.toml`.
    pub fn user_config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("PLY_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".ply/config.toml"))
    }

    /// Project config path for a design file.
    pub fn project_config_path(design_path: &Path) -> PathBuf {
        design_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(".ply/config.toml")
    }

    /// Write user config atomically to the canonical location.
    pub fn write_user(config: &UserConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::user_config_path()?;
        write_toml(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Fixed-point pass bound for the upgrade engine.
    ///
    /// Defaults to 16 if not configured.
    pub fn max_passes(&self) -> usize {
        self.project
            .as_ref()
            .and_then(|p| p.upgrade.as_ref())
            .and_then(|u| u.max_passes)
            .or_else(|| self.user.upgrade.as_ref().and_then(|u| u.max_passes))
            .unwrap_or(DEFAULT_MAX_PASSES)
    }

    /// Whether mutating commands reprocess after editing.
    ///
    /// Defaults to `true` if not configured.
    pub fn reprocess_auto(&self) -> bool {
        self.project
            .as_ref()
            .and_then(|p| p.reprocess.as_ref())
            .and_then(|r| r.auto)
            .or_else(|| self.user.reprocess.as_ref().and_then(|r| r.auto))
            .unwrap_or(true)
    }

    /// Directory of the last opened or saved design.
    pub fn last_directory(&self) -> Option<&Path> {
        self.user
            .files
            .as_ref()
            .and_then(|f| f.last_directory.as_deref())
    }

    /// Upgrade options with the configured pass bound.
    pub fn upgrade_options(&self, identical: bool) -> UpgradeOptions {
        UpgradeOptions {
            identical,
            max_passes: self.max_passes(),
        }
    }

    /// Effective value of `key`, rendered for display.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match key {
            "upgrade.max_passes" => Ok(Some(self.max_passes().to_string())),
            "reprocess.auto" => Ok(Some(self.reprocess_auto().to_string())),
            "files.last_directory" => Ok(self.last_directory().map(|p| p.display().to_string())),
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }

    /// Get the path to the loaded user config file.
    pub fn user_config_loaded_from(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

impl UserConfig {
    /// Set `key` from its textual form, validating the result.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "upgrade.max_passes" => {
                let passes = value.parse::<usize>().map_err(|_| {
                    ConfigError::InvalidValue(format!("upgrade.max_passes: '{value}' is not a number"))
                })?;
                self.upgrade.get_or_insert_with(Default::default).max_passes = Some(passes);
            }
            "reprocess.auto" => {
                let auto = value.parse::<bool>().map_err(|_| {
                    ConfigError::InvalidValue(format!("reprocess.auto: '{value}' is not true or false"))
                })?;
                self.reprocess.get_or_insert_with(Default::default).auto = Some(auto);
            }
            "files.last_directory" => {
                self.files.get_or_insert_with(Default::default).last_directory =
                    Some(PathBuf::from(value));
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        self.validate()
    }

    /// Record the directory of a design that was just opened or saved.
    pub fn remember_directory(&mut self, design_path: &Path) {
        if let Some(dir) = design_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.files.get_or_insert_with(Default::default).last_directory =
                Some(dir.to_path_buf());
        }
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_toml<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
    write_atomic(path, contents.as_bytes()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
