//! Color classification of attribute tables
//!
//! Two factories produce the same [`ColorAssignment`]:
//!
//! - [`GroupClassifier`]: categorical, one palette color per distinct value
//!   in first-encounter order
//! - [`ScaleClassifier`]: numeric, delegating to any [`NumericColoring`]
//!   strategy (implicit bins or explicit bin edges)
//!
//! Classification never fails. Missing or non-numeric values degrade by
//! omission; only building a classifier can return a [`ConfigError`].

use std::collections::HashMap;

use overlay_color::{
    ColorBinEdges, ColorBinPair, ConfigError, ConfigResult, Exclusive, ImplicitBins,
    NumericColoring, Palette,
};

use crate::legend::{Legend, LegendItem, LegendKind};
use crate::table::{AttributeTable, AttributeValue};

/// Color per entity id, in table order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorAssignment {
    entries: Vec<(AttributeValue, String)>,
    index: HashMap<AttributeValue, usize>,
}

impl ColorAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a color, replacing any earlier assignment for the id
    pub fn insert(&mut self, id: AttributeValue, color: impl Into<String>) {
        let color = color.into();
        match self.index.get(&id) {
            Some(&slot) => self.entries[slot].1 = color,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, color));
            }
        }
    }

    /// Color assigned to an id
    pub fn get(&self, id: &AttributeValue) -> Option<&str> {
        self.index.get(id).map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn contains(&self, id: &AttributeValue) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeValue, &str)> {
        self.entries.iter().map(|(id, color)| (id, color.as_str()))
    }
}

/// Turns a table column into colors
pub trait Classifier {
    /// Assign a color to every classifiable record, keyed by record id
    fn classify(&self, table: &AttributeTable, color_key: &str) -> ColorAssignment;

    /// Describe the classification for a legend
    fn legend(&self, table: &AttributeTable, color_key: &str) -> Legend;
}

// MARK: - Categorical

/// Categorical classifier: distinct values cycle through a color list
#[derive(Clone, Debug, PartialEq)]
pub struct GroupClassifier {
    colors: Vec<String>,
}

impl GroupClassifier {
    /// Cycle through a palette's colors
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            colors: palette.colors().to_vec(),
        }
    }

    /// Cycle through the colors of bin pairs, ordered by edge
    pub fn from_bin_pairs(pairs: &[ColorBinPair]) -> ConfigResult<Self> {
        let edges = ColorBinEdges::new(pairs.to_vec(), Exclusive::default())?;
        Ok(Self {
            colors: edges.colors().to_vec(),
        })
    }

    /// Cycle through an explicit color list
    pub fn with_colors(colors: Vec<String>) -> ConfigResult<Self> {
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette("custom".to_string()));
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    fn color(&self, group: usize) -> &str {
        &self.colors[group % self.colors.len()]
    }

    /// Distinct values of `key` in first-encounter order; a missing field
    /// counts as its own value
    fn groups<'t>(table: &'t AttributeTable, key: &str) -> HashMap<Option<&'t AttributeValue>, usize> {
        let mut groups = HashMap::new();
        for record in table {
            let next = groups.len();
            groups.entry(record.get(key)).or_insert(next);
        }
        groups
    }
}

impl Classifier for GroupClassifier {
    fn classify(&self, table: &AttributeTable, color_key: &str) -> ColorAssignment {
        let groups = Self::groups(table, color_key);
        let mut assignment = ColorAssignment::new();
        for record in table {
            let group = groups[&record.get(color_key)];
            assignment.insert(record.id.clone(), self.color(group));
        }
        tracing::debug!(
            key = color_key,
            groups = groups.len(),
            colors = self.colors.len(),
            assigned = assignment.len(),
            "Group classification"
        );
        assignment
    }

    fn legend(&self, table: &AttributeTable, color_key: &str) -> Legend {
        let mut groups: Vec<_> = Self::groups(table, color_key).into_iter().collect();
        groups.sort_by_key(|&(_, index)| index);

        let items = groups
            .into_iter()
            .map(|(value, index)| LegendItem {
                color: self.color(index).to_string(),
                label: value.map_or_else(|| "(none)".to_string(), ToString::to_string),
                value: value.and_then(AttributeValue::as_number),
            })
            .collect();

        Legend {
            title: color_key.to_string(),
            kind: LegendKind::Group,
            items,
            bins: None,
        }
    }
}

// MARK: - Numeric

/// Numeric classifier over any bin strategy
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleClassifier<S> {
    coloring: S,
}

impl<S: NumericColoring> ScaleClassifier<S> {
    pub fn new(coloring: S) -> Self {
        Self { coloring }
    }

    pub fn coloring(&self) -> &S {
        &self.coloring
    }
}

impl ScaleClassifier<ImplicitBins> {
    /// Implicit bins over `edges`, one palette color per bin
    pub fn implicit(edges: Vec<f64>, palette: Palette) -> ConfigResult<Self> {
        Ok(Self::new(ImplicitBins::from_palette(edges, palette)?))
    }
}

impl ScaleClassifier<ColorBinEdges> {
    /// Explicit `(color, edge)` pairs
    pub fn bin_edges(pairs: Vec<ColorBinPair>, exclusive: Exclusive) -> ConfigResult<Self> {
        Ok(Self::new(ColorBinEdges::new(pairs, exclusive)?))
    }
}

impl<S: NumericColoring> Classifier for ScaleClassifier<S> {
    fn classify(&self, table: &AttributeTable, color_key: &str) -> ColorAssignment {
        let values: Vec<(&AttributeValue, f64)> = table
            .iter()
            .filter_map(|record| Some((&record.id, record.get(color_key)?.as_number()?)))
            .collect();

        let omitted = table.len() - values.len();
        if omitted > 0 {
            tracing::debug!(key = color_key, omitted, "Omitted non-numeric values");
        }

        let mut assignment = ColorAssignment::new();
        let uniform = values
            .first()
            .map(|&(_, first)| first)
            .filter(|&first| values.iter().all(|&(_, v)| v == first));

        match uniform {
            Some(value) => {
                let color = self.coloring.color_for(value);
                for &(id, _) in &values {
                    assignment.insert(id.clone(), color);
                }
            }
            None => {
                for &(id, value) in &values {
                    assignment.insert(id.clone(), self.coloring.color_for(value));
                }
            }
        }

        tracing::debug!(
            key = color_key,
            assigned = assignment.len(),
            uniform = uniform.is_some(),
            "Scale classification"
        );
        assignment
    }

    fn legend(&self, _table: &AttributeTable, color_key: &str) -> Legend {
        Legend::from_bins(color_key, &self.coloring.bins())
    }
}

/// Categorical classification with a palette
pub fn classify_group(table: &AttributeTable, color_key: &str, palette: &Palette) -> ColorAssignment {
    GroupClassifier::from_palette(palette).classify(table, color_key)
}

/// Implicit-bin classification
pub fn classify_scale(
    table: &AttributeTable,
    color_key: &str,
    edges: Vec<f64>,
    palette: Palette,
) -> ConfigResult<ColorAssignment> {
    Ok(ScaleClassifier::implicit(edges, palette)?.classify(table, color_key))
}

/// Explicit bin-edge classification
pub fn classify_bin_edges(
    table: &AttributeTable,
    color_key: &str,
    pairs: Vec<ColorBinPair>,
    exclusive: Exclusive,
) -> ConfigResult<ColorAssignment> {
    Ok(ScaleClassifier::bin_edges(pairs, exclusive)?.classify(table, color_key))
}
