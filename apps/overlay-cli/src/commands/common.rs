//! Shared CLI types: errors and input loading

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use thiserror::Error;

use overlay_core::{AttributeTable, FeatureCollection, OverlayConfig, OverlayError};

/// Errors raised by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid event '{token}': {reason}")]
    Script { token: String, reason: String },

    #[error("No geometry with key '{0}'")]
    UnknownGeometry(String),
}

/// Result type alias for CLI commands
pub type CliResult<T> = Result<T, CliError>;

pub fn read_file(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Feature, attribute and config files shared by every command
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// GeoJSON feature collection
    #[arg(short, long, value_name = "FILE")]
    pub features: PathBuf,

    /// JSON array of attribute records; feature properties when omitted
    #[arg(short, long, value_name = "FILE")]
    pub attributes: Option<PathBuf>,

    /// Overlay config (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Primary key, used when no config file is given
    #[arg(short, long, value_name = "FIELD", default_value = "id")]
    pub key: String,

    /// Override the configured color key
    #[arg(long, value_name = "FIELD")]
    pub color_key: Option<String>,
}

/// Everything needed to build an overlay
#[derive(Debug, Clone)]
pub struct Inputs {
    pub config: OverlayConfig,
    pub table: Arc<AttributeTable>,
    pub features: FeatureCollection,
}

impl InputArgs {
    /// Load and validate the configured inputs
    pub fn load(&self) -> CliResult<Inputs> {
        let mut config = match &self.config {
            Some(path) => OverlayConfig::load(path)?,
            None => OverlayConfig::new(self.key.clone()),
        };
        if let Some(color_key) = &self.color_key {
            config.color_key = color_key.clone();
        }
        config.validate()?;

        let features = FeatureCollection::from_json(&read_file(&self.features)?)?;
        let table = match &self.attributes {
            Some(path) => AttributeTable::from_json(&read_file(path)?, &config.key)?,
            None => AttributeTable::from_features(&features, &config.key),
        };

        tracing::debug!(
            features = features.len(),
            records = table.len(),
            key = %config.key,
            color_key = %config.color_key,
            "Loaded inputs"
        );
        Ok(Inputs {
            config,
            table: Arc::new(table),
            features,
        })
    }
}
