//! Configuration module for forcelayout-rs
//!
//! This module handles layout configuration including:
//! - Kernel settings overrides (merged over defaults by the supervisor)
//! - Supervisor pacing options
//! - Persistence of both as a TOML file
//!
//! # Config Location
//!
//! The default config file lives in the platform-appropriate config
//! directory under `dev.forcelayout.forcelayout-rs`:
//!
//! - **Linux**: `~/.config/dev.forcelayout.forcelayout-rs/layout.toml`
//! - **macOS**: `~/Library/Application Support/dev.forcelayout.forcelayout-rs/layout.toml`
//! - **Windows**: `%APPDATA%\dev.forcelayout.forcelayout-rs\layout.toml`
//!
//! # Example
//!
//! ```ignore
//! use forcelayout_rs::config::LayoutConfig;
//!
//! let config = LayoutConfig::load_or_default();
//! supervisor.configure(&config.settings)?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{LayoutError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.forcelayout.forcelayout-rs";

/// Config filename
pub const CONFIG_FILE: &str = "layout.toml";

/// Get the application config directory path
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Persistent layout configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Kernel settings; only the fields present override the defaults
    #[serde(default)]
    pub settings: SettingsOverrides,

    /// Supervisor pacing
    #[serde(default)]
    pub supervisor: SupervisorOptions,
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate both sections without applying them
    pub fn validate(&self) -> Result<()> {
        LayoutSettings::from_overrides(&self.settings)?;
        self.supervisor.validate()
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LayoutError::Config(format!("Failed to parse layout config: {}", e)))
    }

    /// Load a config file from disk
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LayoutError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from the default location, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        let path = default_config_path().ok_or_else(|| {
            LayoutError::Config("Could not determine config directory".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load layout config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to `path` as TOML
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LayoutError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| LayoutError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            LayoutError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let path = default_config_path().ok_or_else(|| {
            LayoutError::Config("Could not determine config directory".to_string())
        })?;
        self.save_to(path)
    }
}
