//! Named palettes and the color generator that walks them
//!
//! A palette is either:
//! - Discrete: a cyclic sequence of categorical colors
//! - Continuous: color stops interpolated over `[0, 1]`
//!
//! Unknown palette names fall back to `default`.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{ConfigError, ConfigResult};

/// Name of the palette used when none is configured
pub const DEFAULT_PALETTE: &str = "default";

/// How a palette hands out colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    /// Cycle through the listed colors
    #[default]
    Discrete,
    /// Interpolate between the listed colors
    Continuous,
}

/// A named list of colors, never empty
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Palette {
    name: String,
    colors: Vec<String>,
    kind: PaletteKind,
}

impl Palette {
    /// Create a custom palette
    ///
    /// Continuous palettes are interpolated, so every stop must be a
    /// `#rrggbb` color. Discrete colors are passed to the renderer verbatim.
    pub fn custom(
        name: impl Into<String>,
        colors: Vec<String>,
        kind: PaletteKind,
    ) -> ConfigResult<Self> {
        let name = name.into();
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette(name));
        }
        if kind == PaletteKind::Continuous {
            for color in &colors {
                Rgb::parse(color)?;
            }
        }
        Ok(Self { name, colors, kind })
    }

    fn builtin(name: &str, colors: &[&str], kind: PaletteKind) -> Self {
        Self {
            name: name.to_string(),
            colors: colors.iter().map(|c| (*c).to_string()).collect(),
            kind,
        }
    }

    /// Look up a built-in palette by its exact name
    pub fn named(name: &str) -> Option<Self> {
        use PaletteKind::{Continuous, Discrete};

        let palette = match name {
            "default" => Self::builtin("default", DEFAULT_COLORS, Discrete),
            "superrandom" => Self::builtin("superrandom", SUPERRANDOM_COLORS, Discrete),
            "blues" => Self::builtin("blues", BLUES_COLORS, Continuous),
            "reds" => Self::builtin("reds", REDS_COLORS, Continuous),
            "greens" => Self::builtin("greens", GREENS_COLORS, Continuous),
            "rog" => Self::builtin("rog", ROG_COLORS, Continuous),
            "redgreen" => Self::builtin("redgreen", REDGREEN_COLORS, Continuous),
            "redwhite" => Self::builtin("redwhite", REDWHITE_COLORS, Continuous),
            "viridis" => Self::builtin("viridis", VIRIDIS_COLORS, Continuous),
            _ => return None,
        };
        Some(palette)
    }

    /// Look up a built-in palette, falling back to `default`
    pub fn named_or_default(name: &str) -> Self {
        Self::named(name).unwrap_or_else(|| {
            tracing::warn!(palette = name, "Unknown palette, using default");
            Self::builtin(DEFAULT_PALETTE, DEFAULT_COLORS, PaletteKind::Discrete)
        })
    }

    /// Palette name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Palette colors, in order
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Discrete or continuous
    pub fn kind(&self) -> PaletteKind {
        self.kind
    }

    /// Number of colors in the palette
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no colors
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color at `index`, cycling when the index runs past the end
    pub fn cycled(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::builtin(DEFAULT_PALETTE, DEFAULT_COLORS, PaletteKind::Discrete)
    }
}

/// Get a list of all built-in palette names
pub fn builtin_palette_names() -> Vec<&'static str> {
    vec![
        "default",
        "superrandom",
        "blues",
        "reds",
        "greens",
        "rog",
        "redgreen",
        "redwhite",
        "viridis",
    ]
}

/// Hands out palette colors one at a time or by position
#[derive(Clone, Debug)]
pub struct ColorGenerator {
    palette: Palette,
    stops: Vec<Rgb>,
    index: usize,
}

impl ColorGenerator {
    /// Create a generator over a palette
    pub fn new(palette: Palette) -> Self {
        let stops = match palette.kind {
            PaletteKind::Continuous => palette
                .colors
                .iter()
                .filter_map(|c| Rgb::from_hex(c))
                .collect(),
            PaletteKind::Discrete => Vec::new(),
        };
        Self {
            palette,
            stops,
            index: 0,
        }
    }

    /// Create a generator over a built-in palette (unknown names use `default`)
    pub fn named(name: &str) -> Self {
        Self::new(Palette::named_or_default(name))
    }

    /// The palette being walked
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Next color in sequence
    ///
    /// Discrete palettes cycle. Continuous palettes sample evenly spaced
    /// stops, staying on the last stop once they run past the end.
    pub fn next_color(&mut self) -> String {
        let color = match self.palette.kind {
            PaletteKind::Discrete => self.palette.cycled(self.index).to_string(),
            PaletteKind::Continuous => {
                let span = self.stops.len().saturating_sub(1).max(1);
                self.interpolate(self.index as f64 / span as f64)
            }
        };
        self.index += 1;
        color
    }

    /// Color at a position in `[0, 1]`
    pub fn get_at(&self, position: f64) -> String {
        let position = if position.is_nan() { 0.0 } else { position };
        match self.palette.kind {
            PaletteKind::Discrete => {
                let n = self.palette.len();
                let index = (position * n as f64).floor().max(0.0) as usize;
                self.palette.colors[index.min(n - 1)].clone()
            }
            PaletteKind::Continuous => self.interpolate(position),
        }
    }

    /// Restart the sequence from the first color
    pub fn reset(&mut self) {
        self.index = 0;
    }

    fn interpolate(&self, t: f64) -> String {
        let t = t.clamp(0.0, 1.0);
        match self.stops.len() {
            0 => self.palette.cycled(0).to_string(),
            1 => self.stops[0].to_hex(),
            len => {
                let n = (len - 1) as f64;
                let i = ((t * n).floor() as usize).min(len - 2);
                let ratio = t * n - i as f64;
                Rgb::lerp(&self.stops[i], &self.stops[i + 1], ratio).to_hex()
            }
        }
    }
}

impl Iterator for ColorGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_color())
    }
}

// MARK: - Built-in palettes

const DEFAULT_COLORS: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

const SUPERRANDOM_COLORS: &[&str] = &[
    "#FF0000", "#00FF00", "#0000FF", "#FF00FF", "#FFA500", "#800080", "#FFFF00", "#A52A2A",
    "#FFC0CB", "#808080", "#00FFFF", "#008000", "#000080", "#800000", "#FFD700", "#808000",
    "#4682B4", "#D2691E", "#FF4500", "#DA70D6", "#ADFF2F", "#87CEEB",
];

const BLUES_COLORS: &[&str] = &[
    "#deebf7", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
];

const REDS_COLORS: &[&str] = &[
    "#fee5d9", "#fcae91", "#fb6a4a", "#de2d26", "#a50f15", "#67000d",
];

const GREENS_COLORS: &[&str] = &[
    "#e5f5e0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c",
];

// red through orange and dark yellow into green
const ROG_COLORS: &[&str] = &[
    "#FF0000", "#FF3300", "#FF6600", "#FF9900", "#FFCC00", "#8B8000", "#00CC00", "#00FF00",
];

const REDGREEN_COLORS: &[&str] = &[
    "#FF0000", "#FF4500", "#FF8C00", "#FFA500", "#FFD700", "#ADFF2F", "#7FFF00", "#32CD32",
    "#228B22", "#008000",
];

const REDWHITE_COLORS: &[&str] = &[
    "#FFEDA0", "#FED976", "#FEB24C", "#FD8D3C", "#FC4E2A", "#FF0000", "#E31A1C",
];

const VIRIDIS_COLORS: &[&str] = &[
    "#440154", "#482475", "#414487", "#355f8d", "#2a788e", "#21918c", "#22a884", "#44bf70",
    "#7ad151", "#bddf26", "#fde725",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_palettes_resolve() {
        for name in builtin_palette_names() {
            let palette = Palette::named(name).unwrap();
            assert_eq!(palette.name(), name);
            assert!(!palette.is_empty());
        }
    }

    #[test]
    fn test_continuous_builtins_are_valid_hex() {
        for name in builtin_palette_names() {
            let palette = Palette::named(name).unwrap();
            if palette.kind() == PaletteKind::Continuous {
                assert!(palette.colors().iter().all(|c| Rgb::from_hex(c).is_some()));
            }
        }
    }

    #[test]
    fn test_unknown_palette_falls_back_to_default() {
        assert!(Palette::named("plasma").is_none());
        let palette = Palette::named_or_default("plasma");
        assert_eq!(palette.name(), "default");
        assert_eq!(palette, Palette::default());
    }

    #[test]
    fn test_palette_names_are_case_sensitive() {
        assert!(Palette::named("blues").is_some());
        assert!(Palette::named("Blues").is_none());
        assert_eq!(Palette::named_or_default("VIRIDIS").name(), "default");
    }

    #[test]
    fn test_custom_palette_validation() {
        assert!(matches!(
            Palette::custom("empty", vec![], PaletteKind::Discrete),
            Err(ConfigError::EmptyPalette(_))
        ));
        assert!(matches!(
            Palette::custom("ramp", vec!["red".into()], PaletteKind::Continuous),
            Err(ConfigError::InvalidColor(_))
        ));
        // discrete colors are not interpolated, so any CSS color is fine
        assert!(Palette::custom("css", vec!["red".into()], PaletteKind::Discrete).is_ok());
    }

    #[test]
    fn test_discrete_generator_cycles() {
        let mut generator = ColorGenerator::named("default");
        let first: Vec<String> = generator.by_ref().take(6).collect();
        assert_eq!(first[0], "#1f77b4");
        assert_eq!(first[5], "#8c564b");
        assert_eq!(generator.next_color(), "#1f77b4");

        generator.reset();
        assert_eq!(generator.next_color(), "#1f77b4");
    }

    #[test]
    fn test_continuous_generator_walks_stops() {
        let mut generator = ColorGenerator::named("blues");
        let colors: Vec<String> = generator.by_ref().take(6).collect();
        assert_eq!(colors[0], "#deebf7");
        assert_eq!(colors[5], "#08519c");
        // past the end stays on the last stop
        assert_eq!(generator.next_color(), "#08519c");
    }

    #[test]
    fn test_get_at() {
        let discrete = ColorGenerator::named("default");
        assert_eq!(discrete.get_at(0.0), "#1f77b4");
        assert_eq!(discrete.get_at(1.0), "#8c564b");
        assert_eq!(discrete.get_at(-2.0), "#1f77b4");

        let ramp = ColorGenerator::new(
            Palette::custom(
                "bw",
                vec!["#000000".into(), "#ffffff".into()],
                PaletteKind::Continuous,
            )
            .unwrap(),
        );
        assert_eq!(ramp.get_at(0.5), "#808080");
        assert_eq!(ramp.get_at(7.0), "#ffffff");
    }
}
