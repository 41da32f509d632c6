//! Path styles and the style function used to (re)style geometries

use serde::{Deserialize, Serialize};

use crate::classify::ColorAssignment;
use crate::table::AttributeValue;

/// Partial path options, merged the way map widgets merge style updates
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

impl PathStyle {
    /// Fields set on `top` replace the ones here
    pub fn overlay(&self, top: &PathStyle) -> PathStyle {
        PathStyle {
            color: top.color.clone().or_else(|| self.color.clone()),
            weight: top.weight.or(self.weight),
            opacity: top.opacity.or(self.opacity),
            fill_color: top.fill_color.clone().or_else(|| self.fill_color.clone()),
            fill_opacity: top.fill_opacity.or(self.fill_opacity),
        }
    }

    pub fn with_fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    /// Style given to every geometry before classification colors apply
    pub fn default_path() -> Self {
        Self {
            color: Some("#000000".to_string()),
            weight: Some(0.9),
            fill_opacity: Some(0.5),
            ..Self::default()
        }
    }

    /// Style for the locked geometry and for plain matches
    pub fn highlight() -> Self {
        Self {
            color: Some("#1C3FAA".to_string()),
            weight: Some(4.0),
            opacity: Some(0.9),
            fill_opacity: Some(0.9),
            ..Self::default()
        }
    }

    /// Style for matches while another geometry holds the lock
    pub fn semi_highlight() -> Self {
        Self {
            color: Some("#1C3FAA".to_string()),
            weight: Some(2.0),
            opacity: Some(1.0),
            fill_opacity: Some(0.9),
            ..Self::default()
        }
    }
}

/// Styles used by the base style function and the highlight behaviors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDefaults {
    pub default: PathStyle,
    pub highlight: PathStyle,
    pub semi_highlight: PathStyle,
    /// Applied by the `style` behavior
    pub custom: PathStyle,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            default: PathStyle::default_path(),
            highlight: PathStyle::highlight(),
            semi_highlight: PathStyle::semi_highlight(),
            custom: PathStyle::highlight(),
        }
    }
}

/// Computes a geometry's resting style from its feature key
///
/// The same function styles geometries at first render and again on every
/// reset, so a reset lands exactly where the initial render did.
pub trait StyleFunction {
    fn style(&self, key: Option<&AttributeValue>) -> PathStyle;
}

impl<F> StyleFunction for F
where
    F: Fn(Option<&AttributeValue>) -> PathStyle,
{
    fn style(&self, key: Option<&AttributeValue>) -> PathStyle {
        self(key)
    }
}

/// Base style with the classified fill color
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedStyle {
    base: PathStyle,
    colors: ColorAssignment,
}

impl ClassifiedStyle {
    pub fn new(base: PathStyle, colors: ColorAssignment) -> Self {
        Self { base, colors }
    }

    pub fn colors(&self) -> &ColorAssignment {
        &self.colors
    }

    pub fn base(&self) -> &PathStyle {
        &self.base
    }
}

impl StyleFunction for ClassifiedStyle {
    fn style(&self, key: Option<&AttributeValue>) -> PathStyle {
        match key.and_then(|k| self.colors.get(k)) {
            Some(color) => self.base.clone().with_fill_color(color),
            None => self.base.clone(),
        }
    }
}
