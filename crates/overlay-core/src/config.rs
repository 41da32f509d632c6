//! Overlay configuration
//!
//! Loaded from TOML or JSON with camelCase keys:
//!
//! ```toml
//! key = "code"
//! colorKey = "population"
//!
//! [color]
//! mode = "binEdges"
//! exclusive = "right"
//! pairs = [["#fee5d9", 0], ["#fb6a4a", 1000000], ["#a50f15", 10000000]]
//!
//! [display]
//! kind = "shape"
//! lockedOn = { click = true, dbclick = false }
//!
//! [[events.click]]
//! type = "highlight"
//! key = "region"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use overlay_color::{
    ColorBinPair, ConfigResult, Exclusive, Palette, DEFAULT_BINS, DEFAULT_PALETTE,
};

use crate::behavior::{EventsConfig, StyleOptions};
use crate::classify::{Classifier, GroupClassifier, ScaleClassifier};
use crate::error::{OverlayError, Result};
use crate::render::DisplayKind;
use crate::state::{LockedOn, PreventHover};
use crate::style::StyleDefaults;

/// Color key used when none is configured
pub const DEFAULT_COLOR_KEY: &str = "distinct";

fn default_palette() -> String {
    DEFAULT_PALETTE.to_string()
}

fn default_bins() -> Vec<f64> {
    DEFAULT_BINS.to_vec()
}

fn default_color_key() -> String {
    DEFAULT_COLOR_KEY.to_string()
}

/// How the color key is turned into colors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ColorScheme {
    /// Categorical: a palette, or an explicit color cycle
    Group {
        #[serde(default = "default_palette")]
        palette: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        colors: Option<Vec<String>>,
    },
    /// Implicit bins colored by a palette
    Scale {
        #[serde(default = "default_bins")]
        bins: Vec<f64>,
        #[serde(default = "default_palette")]
        palette: String,
    },
    /// Explicit `(color, edge)` pairs
    BinEdges {
        pairs: Vec<ColorBinPair>,
        #[serde(default)]
        exclusive: Exclusive,
    },
}

impl Default for ColorScheme {
    fn default() -> Self {
        ColorScheme::Group {
            palette: default_palette(),
            colors: None,
        }
    }
}

impl ColorScheme {
    /// Build the classifier this scheme describes
    pub fn build(&self) -> ConfigResult<Box<dyn Classifier>> {
        let classifier: Box<dyn Classifier> = match self {
            ColorScheme::Group {
                colors: Some(colors),
                ..
            } => Box::new(GroupClassifier::with_colors(colors.clone())?),
            ColorScheme::Group { palette, .. } => {
                Box::new(GroupClassifier::from_palette(&Palette::named_or_default(palette)))
            }
            ColorScheme::Scale { bins, palette } => Box::new(ScaleClassifier::implicit(
                bins.clone(),
                Palette::named_or_default(palette),
            )?),
            ColorScheme::BinEdges { pairs, exclusive } => {
                Box::new(ScaleClassifier::bin_edges(pairs.clone(), *exclusive)?)
            }
        };
        Ok(classifier)
    }

    /// Short name of the scheme
    pub fn mode(&self) -> &'static str {
        match self {
            ColorScheme::Group { .. } => "group",
            ColorScheme::Scale { .. } => "scale",
            ColorScheme::BinEdges { .. } => "binEdges",
        }
    }
}

/// How features are drawn and how presses interact with hover
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayConfig {
    pub kind: DisplayKind,
    pub locked_on: LockedOn,
    pub prevent_hover_on: PreventHover,
    /// Field read by the render filter; the primary key when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_key: Option<String>,
    pub isolate_popup: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            kind: DisplayKind::default(),
            locked_on: LockedOn::default(),
            prevent_hover_on: PreventHover::default(),
            filter_key: None,
            isolate_popup: true,
        }
    }
}

/// Complete configuration of one overlay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Primary key joining features to attribute records
    pub key: String,
    #[serde(default = "default_color_key")]
    pub color_key: String,
    #[serde(default)]
    pub color: ColorScheme,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub styles: StyleDefaults,
}

impl OverlayConfig {
    /// Configuration with defaults for everything but the primary key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            color_key: default_color_key(),
            color: ColorScheme::default(),
            display: DisplayConfig::default(),
            events: EventsConfig::default(),
            styles: StyleDefaults::default(),
        }
    }

    /// Load from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a `.json` or `.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text)?,
            _ => Self::from_toml(&text)?,
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), mode = config.color.mode(), "Loaded overlay config");
        Ok(config)
    }

    /// Field read by the render filter
    pub fn filter_key(&self) -> &str {
        self.display.filter_key.as_deref().unwrap_or(&self.key)
    }

    /// Styles for the behavior engine
    pub fn style_options(&self) -> StyleOptions {
        StyleOptions::from_defaults(&self.styles, self.display.isolate_popup)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(OverlayError::InvalidConfig("key cannot be empty".to_string()));
        }
        if self.color_key.trim().is_empty() {
            return Err(OverlayError::InvalidConfig(
                "colorKey cannot be empty".to_string(),
            ));
        }
        if let Some(binding) = self
            .events
            .all_bindings()
            .into_iter()
            .find(|b| b.key.as_deref().is_some_and(|k| k.trim().is_empty()))
        {
            return Err(OverlayError::InvalidConfig(format!(
                "{} binding for {:?} has an empty key",
                binding.trigger, binding.behavior
            )));
        }
        self.color.build()?;
        Ok(())
    }
}
