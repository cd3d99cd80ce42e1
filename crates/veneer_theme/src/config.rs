//! Engine configuration (`veneer.toml`)

use crate::error::ConfigError;
use crate::mode::ThemeMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level theme engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub storage: StorageKeys,
    /// Mode used when nothing usable is stored
    #[serde(default)]
    pub default_mode: ThemeMode,
    #[serde(default)]
    pub transition: TransitionConfig,
    #[serde(default)]
    pub css: CssConfig,
}

impl ThemeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Keys under which the engine persists its records
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageKeys {
    #[serde(default = "default_mode_key")]
    pub mode: String,
    #[serde(default = "default_preferences_key")]
    pub preferences: String,
    #[serde(default = "default_custom_colors_key")]
    pub custom_colors: String,
}

fn default_mode_key() -> String {
    "veneer-theme-mode".to_string()
}

fn default_preferences_key() -> String {
    "veneer-theme-preferences".to_string()
}

fn default_custom_colors_key() -> String {
    "veneer-custom-colors".to_string()
}

impl StorageKeys {
    pub fn all(&self) -> [&str; 3] {
        [&self.mode, &self.preferences, &self.custom_colors]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            mode: default_mode_key(),
            preferences: default_preferences_key(),
            custom_colors: default_custom_colors_key(),
        }
    }
}

/// Transition window timing
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransitionConfig {
    /// Overrides the catalog's `theme_transition_ms` token when set
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Delay between mount and revealing content
    #[serde(default = "default_reveal_delay")]
    pub reveal_delay_ms: u64,
    /// Suppress pointer interaction while transitioning
    #[serde(default = "default_true")]
    pub suppress_interaction: bool,
}

fn default_reveal_delay() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

impl TransitionConfig {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: None,
            reveal_delay_ms: default_reveal_delay(),
            suppress_interaction: true,
        }
    }
}

/// CSS bridge settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CssConfig {
    /// Custom properties are written as `--{prefix}-bg-default` and so on
    #[serde(default = "default_prefix")]
    pub variable_prefix: String,
}

fn default_prefix() -> String {
    "veneer".to_string()
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            variable_prefix: default_prefix(),
        }
    }
}
