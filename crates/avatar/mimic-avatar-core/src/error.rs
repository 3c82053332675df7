//! Error types for the configuration and preset boundaries.
//!
//! Per-frame animation never fails; these only surface when loading
//! configuration or looking up presets by name.

use thiserror::Error;

/// Configuration loading/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration value: {field} - {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Pose preset lookup errors.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("unknown pose preset '{0}'")]
    Unknown(String),
}

/// Top-level error for the avatar core.
#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("preset error: {0}")]
    Preset(#[from] PresetError),
}
