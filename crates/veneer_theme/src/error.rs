use std::path::PathBuf;
use thiserror::Error;

/// Failure of the persistence medium
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage is disabled, e.g. by privacy settings
    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage quota exceeded while writing {key:?}")]
    QuotaExceeded { key: String },

    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode storage contents: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure loading a [`ThemeConfig`](crate::ThemeConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read theme config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid theme config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A string that is not one of `light`, `dark` or `auto`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme mode {0:?}")]
pub struct ParseModeError(pub String);

/// A string that is not a `HH:MM` time of day
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day {0:?}, expected HH:MM")]
pub struct ParseTimeError(pub String);
