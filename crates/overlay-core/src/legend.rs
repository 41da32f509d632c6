//! Legend data describing a classification
//!
//! Rendering the legend panel is up to the host; this is only the data.

use serde::{Deserialize, Serialize};

use overlay_color::BinSummary;

/// Which kind of classifier produced a legend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendKind {
    Group,
    Scale,
}

/// One legend swatch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendItem {
    pub color: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Legend for one overlay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub kind: LegendKind,
    pub items: Vec<LegendItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<Vec<f64>>,
}

impl Legend {
    /// Legend for a numeric scale, one item per bin
    pub fn from_bins(title: impl Into<String>, bins: &[BinSummary]) -> Self {
        let items = bins
            .iter()
            .map(|bin| LegendItem {
                color: bin.color.clone(),
                label: bin.label.clone(),
                value: Some(bin.lower),
            })
            .collect();

        let mut edges: Vec<f64> = bins.iter().map(|bin| bin.lower).collect();
        if let Some(upper) = bins.last().and_then(|bin| bin.upper) {
            edges.push(upper);
        }

        Self {
            title: title.into(),
            kind: LegendKind::Scale,
            items,
            bins: Some(edges),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
