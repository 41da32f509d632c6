//! Error types for overlay-color
//!
//! Only static configuration can fail. Classification itself never does.

use thiserror::Error;

/// Invalid color or bin configuration, reported at construction time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Explicit bin-edge classifiers need at least two pairs
    #[error("At least 2 color-bin pairs are required, got {count}")]
    TooFewBinPairs { count: usize },

    /// Implicit bins need at least two edges to form one bin
    #[error("At least 2 bin edges are required, got {count}")]
    TooFewBinEdges { count: usize },

    /// Edges must be comparable numbers
    #[error("Invalid bin edge: {edge}")]
    InvalidEdge { edge: f64 },

    /// Palette stop that is not a `#rrggbb` color
    #[error("Invalid hex color: {0}")]
    InvalidColor(String),

    /// A palette with no colors cannot color anything
    #[error("Palette '{0}' has no colors")]
    EmptyPalette(String),
}

/// Result type alias for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
