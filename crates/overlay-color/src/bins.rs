//! Numeric bin strategies
//!
//! Two ways of turning a number into a color:
//!
//! - [`ImplicitBins`]: an ordered edge list with one generated palette color
//!   per adjacent pair. A value belongs to the lowest bin whose closed range
//!   contains it; values outside every bin use the first bin.
//! - [`ColorBinEdges`]: explicit `(color, edge)` pairs sorted by edge, looked
//!   up by binary search with a left- or right-exclusive policy and clamping
//!   at both ends.
//!
//! The two differ in edge semantics and out-of-range handling. Both implement
//! [`NumericColoring`].

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::palette::{ColorGenerator, Palette};

/// Edges used when a scale classification does not configure any
pub const DEFAULT_BINS: [f64; 6] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];

/// A strategy mapping numeric values to colors
pub trait NumericColoring {
    /// Color for a value; never fails, out-of-range values clamp or fall back
    fn color_for(&self, value: f64) -> &str;

    /// One summary per bin, in ascending order, for legends
    fn bins(&self) -> Vec<BinSummary>;
}

/// Description of a single bin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinSummary {
    pub color: String,
    pub lower: f64,
    pub upper: Option<f64>,
    pub label: String,
}

fn check_edges(edges: impl IntoIterator<Item = f64>) -> ConfigResult<()> {
    match edges.into_iter().find(|e| e.is_nan()) {
        Some(edge) => Err(ConfigError::InvalidEdge { edge }),
        None => Ok(()),
    }
}

// MARK: - Implicit bins

/// Edge list colored by a generated palette
#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitBins {
    edges: Vec<f64>,
    colors: Vec<String>,
}

impl ImplicitBins {
    /// Build bins, drawing one color per adjacent edge pair from `generator`
    pub fn new(edges: Vec<f64>, generator: &mut ColorGenerator) -> ConfigResult<Self> {
        if edges.len() < 2 {
            return Err(ConfigError::TooFewBinEdges { count: edges.len() });
        }
        check_edges(edges.iter().copied())?;

        let colors = generator.by_ref().take(edges.len() - 1).collect();
        Ok(Self { edges, colors })
    }

    /// Build bins colored from the start of `palette`
    pub fn from_palette(edges: Vec<f64>, palette: Palette) -> ConfigResult<Self> {
        Self::new(edges, &mut ColorGenerator::new(palette))
    }

    /// Default edges `[0, 5]` in unit steps
    pub fn with_default_edges(palette: Palette) -> Self {
        let edges = DEFAULT_BINS.to_vec();
        let colors = ColorGenerator::new(palette)
            .take(edges.len() - 1)
            .collect();
        Self { edges, colors }
    }

    /// Bin edges as configured
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// One color per bin
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Index of the lowest bin with `edge[i] <= value <= edge[i + 1]`,
    /// or the first bin when none contains the value
    pub fn find_bin(&self, value: f64) -> usize {
        self.edges
            .windows(2)
            .position(|pair| value >= pair[0] && value <= pair[1])
            .unwrap_or(0)
    }
}

impl NumericColoring for ImplicitBins {
    fn color_for(&self, value: f64) -> &str {
        &self.colors[self.find_bin(value)]
    }

    fn bins(&self) -> Vec<BinSummary> {
        self.edges
            .windows(2)
            .zip(&self.colors)
            .map(|(pair, color)| BinSummary {
                color: color.clone(),
                lower: pair[0],
                upper: Some(pair[1]),
                label: format!("{} – {}", pair[0], pair[1]),
            })
            .collect()
    }
}

// MARK: - Explicit bin edges

/// Which end of a bin interval is open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exclusive {
    /// Bin `i` owns `(edge[i], edge[i + 1]]`
    Left,
    /// Bin `i` owns `[edge[i], edge[i + 1])`
    #[default]
    Right,
}

/// A color paired with the lower edge of its bin
///
/// Serialized as a `[color, edge]` tuple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct ColorBinPair {
    pub color: String,
    pub edge: f64,
}

impl ColorBinPair {
    pub fn new(color: impl Into<String>, edge: f64) -> Self {
        Self {
            color: color.into(),
            edge,
        }
    }
}

impl From<(String, f64)> for ColorBinPair {
    fn from((color, edge): (String, f64)) -> Self {
        Self { color, edge }
    }
}

impl From<ColorBinPair> for (String, f64) {
    fn from(pair: ColorBinPair) -> Self {
        (pair.color, pair.edge)
    }
}

/// Explicit color bins looked up by binary search
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBinEdges {
    edges: Vec<f64>,
    colors: Vec<String>,
    exclusive: Exclusive,
}

impl ColorBinEdges {
    /// Build from at least two pairs; pairs are sorted by edge
    pub fn new(mut pairs: Vec<ColorBinPair>, exclusive: Exclusive) -> ConfigResult<Self> {
        if pairs.len() < 2 {
            return Err(ConfigError::TooFewBinPairs { count: pairs.len() });
        }
        check_edges(pairs.iter().map(|p| p.edge))?;

        // stable, so pairs sharing an edge keep their given order
        pairs.sort_by(|a, b| a.edge.total_cmp(&b.edge));
        let (colors, edges) = pairs.into_iter().map(|p| (p.color, p.edge)).unzip();

        Ok(Self {
            edges,
            colors,
            exclusive,
        })
    }

    /// Sorted bin edges
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Colors in edge order
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Exclusivity policy
    pub fn exclusive(&self) -> Exclusive {
        self.exclusive
    }

    fn last(&self) -> usize {
        self.edges.len() - 1
    }

    /// Out-of-range clamping shared by both lookups
    fn clamped(&self, value: f64) -> Option<usize> {
        let first = self.edges[0];
        let last = self.edges[self.last()];
        match self.exclusive {
            Exclusive::Right if value < first => Some(0),
            Exclusive::Right if value >= last => Some(self.last()),
            Exclusive::Left if value <= first => Some(0),
            Exclusive::Left if value > last => Some(self.last()),
            _ if value.is_nan() => Some(0),
            _ => None,
        }
    }

    /// Bin index for a value in O(log n)
    pub fn bin_index(&self, value: f64) -> usize {
        if let Some(index) = self.clamped(value) {
            return index;
        }
        // first edge is on the closed side of `value` here, so the count is >= 1
        let below = match self.exclusive {
            Exclusive::Right => self.edges.partition_point(|&e| e <= value),
            Exclusive::Left => self.edges.partition_point(|&e| e < value),
        };
        below - 1
    }

    /// Reference linear scan; always agrees with [`Self::bin_index`]
    pub fn bin_index_linear(&self, value: f64) -> usize {
        if let Some(index) = self.clamped(value) {
            return index;
        }
        self.edges
            .windows(2)
            .position(|pair| match self.exclusive {
                Exclusive::Right => pair[0] <= value && value < pair[1],
                Exclusive::Left => pair[0] < value && value <= pair[1],
            })
            .unwrap_or(0)
    }

    /// Color for a value via binary search
    pub fn color_for_value(&self, value: f64) -> &str {
        &self.colors[self.bin_index(value)]
    }

    /// Color for a value via linear scan
    pub fn color_for_value_linear(&self, value: f64) -> &str {
        &self.colors[self.bin_index_linear(value)]
    }
}

impl NumericColoring for ColorBinEdges {
    fn color_for(&self, value: f64) -> &str {
        self.color_for_value(value)
    }

    fn bins(&self) -> Vec<BinSummary> {
        let last = self.last();
        (0..=last)
            .map(|i| {
                let lower = self.edges[i];
                let upper = (i < last).then(|| self.edges[i + 1]);
                let label = match (upper, self.exclusive) {
                    (Some(upper), _) => format!("{lower} – {upper}"),
                    (None, Exclusive::Right) => format!("≥ {lower}"),
                    (None, Exclusive::Left) => format!("> {lower}"),
                };
                BinSummary {
                    color: self.colors[i].clone(),
                    lower,
                    upper,
                    label,
                }
            })
            .collect()
    }
}
