//! Error types for overlay-core

use overlay_color::ConfigError;
use thiserror::Error;

/// Errors raised while loading configuration or building an overlay
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Invalid color configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;
