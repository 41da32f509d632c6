//! RGB colors as used by palettes and interpolated ramps
//!
//! Palette entries and classified colors travel as `#rrggbb` strings, since
//! that is what map renderers accept. `Rgb` is the numeric form used while
//! interpolating between two palette stops.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// An 8-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a new color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex string (e.g., "#1f77b4" or "1F77B4")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self::new(r, g, b))
    }

    /// Parse a hex string, reporting a configuration error on failure
    pub fn parse(hex: &str) -> ConfigResult<Self> {
        Self::from_hex(hex).ok_or_else(|| ConfigError::InvalidColor(hex.to_string()))
    }

    /// Convert to a lowercase `#rrggbb` string
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors, rounding each channel
    pub fn lerp(a: &Rgb, b: &Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let channel = |x: u8, y: u8| -> u8 {
            let v = f64::from(x) * (1.0 - t) + f64::from(y) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: channel(a.r, b.r),
            g: channel(a.g, b.g),
            b: channel(a.b, b.b),
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
