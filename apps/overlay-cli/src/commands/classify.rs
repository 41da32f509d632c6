//! Classify command: print the color assignment and legend

use std::fmt::Write as _;

use clap::Args;
use serde::Serialize;

use overlay_core::Legend;

use super::common::{CliResult, InputArgs, Inputs};

/// Print the color per entity and the legend
#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One classified entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorRow {
    pub id: String,
    pub color: String,
}

/// Classification result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyReport {
    pub mode: String,
    pub color_key: String,
    pub colors: Vec<ColorRow>,
    pub legend: Legend,
}

impl ClassifyReport {
    /// Plain-text rendering, one line per entity then the legend
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} classification on '{}'", self.mode, self.color_key);
        for row in &self.colors {
            let _ = writeln!(out, "  {:<20} {}", row.id, row.color);
        }
        let _ = writeln!(out, "legend: {}", self.legend.title);
        for item in &self.legend.items {
            let _ = writeln!(out, "  {} {}", item.color, item.label);
        }
        out
    }
}

/// Classify the loaded table with the configured scheme
pub fn classify(inputs: &Inputs) -> CliResult<ClassifyReport> {
    let config = &inputs.config;
    let classifier = config.color.build().map_err(overlay_core::OverlayError::from)?;
    let colors = classifier.classify(&inputs.table, &config.color_key);
    let legend = classifier.legend(&inputs.table, &config.color_key);

    Ok(ClassifyReport {
        mode: config.color.mode().to_string(),
        color_key: config.color_key.clone(),
        colors: colors
            .iter()
            .map(|(id, color)| ColorRow {
                id: id.to_string(),
                color: color.to_string(),
            })
            .collect(),
        legend,
    })
}

impl ClassifyArgs {
    /// Execute the classify command
    pub fn execute(&self) -> CliResult<()> {
        let inputs = self.input.load()?;
        let report = classify(&inputs)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.to_text());
        }
        Ok(())
    }
}
