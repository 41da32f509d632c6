//! Simulate command: build an overlay in memory and replay pointer events

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use overlay_core::{
    Effect, GeometryGroup, GeometryId, LayerPhase, MemoryGroup, Overlay, OverlayBuilder,
    PointerEvent, Propagation,
};

use super::common::{read_file, CliError, CliResult, InputArgs, Inputs};
use super::script::{parse_script, ScriptEvent};

/// Replay an event script against an in-memory overlay
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Events, e.g. "click:R1 over:R3 map"
    #[arg(short, long, value_name = "SCRIPT")]
    pub events: Option<String>,

    /// Read events from a file
    #[arg(long, value_name = "FILE", conflicts_with = "events")]
    pub script: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Style of one geometry after an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryRow {
    pub id: String,
    pub visible: bool,
    pub color: Option<String>,
    pub weight: Option<f64>,
    pub fill: Option<String>,
}

/// Overlay snapshot after one event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub event: String,
    pub propagation: Propagation,
    pub suppressed: bool,
    pub effects: Vec<String>,
    pub phase: LayerPhase,
    pub locked_on: Option<String>,
    pub geometries: Vec<GeometryRow>,
}

impl Step {
    fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{} -> {}", self.event, self.phase);
        if let Some(locked) = &self.locked_on {
            let _ = write!(out, " on {locked}");
        }
        if self.suppressed {
            out.push_str(" (suppressed)");
        }
        if self.propagation == Propagation::Stop {
            out.push_str(" [stop]");
        }
        out.push('\n');
        for effect in &self.effects {
            let _ = writeln!(out, "  effect: {effect}");
        }
        for row in &self.geometries {
            let _ = writeln!(
                out,
                "  {:<12} {:<7} color={} weight={} fill={}",
                row.id,
                if row.visible { "visible" } else { "hidden" },
                row.color.as_deref().unwrap_or("-"),
                row.weight.map_or_else(|| "-".to_string(), |w| w.to_string()),
                row.fill.as_deref().unwrap_or("-"),
            );
        }
        out
    }
}

fn label(group: &MemoryGroup, id: GeometryId) -> String {
    group
        .feature_key(id)
        .map_or_else(|| id.to_string(), |key| key.to_string())
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::View(record) => format!("view {}", record.id),
        Effect::Drilldown(value) => format!("drilldown {value}"),
    }
}

fn resolve(group: &MemoryGroup, key: &str) -> CliResult<GeometryId> {
    group
        .all()
        .find(|(_, g)| g.key.as_ref().is_some_and(|k| k.to_string() == key))
        .map(|(id, _)| id)
        .ok_or_else(|| CliError::UnknownGeometry(key.to_string()))
}

fn pointer_event(group: &MemoryGroup, event: &ScriptEvent) -> CliResult<PointerEvent> {
    Ok(match event {
        ScriptEvent::Click(key) => PointerEvent::Click(resolve(group, key)?),
        ScriptEvent::DblClick(key) => PointerEvent::DblClick(resolve(group, key)?),
        ScriptEvent::Over(key) => PointerEvent::MouseOver(resolve(group, key)?),
        ScriptEvent::Out(key) => PointerEvent::MouseOut(resolve(group, key)?),
        ScriptEvent::Map => PointerEvent::Map,
    })
}

fn snapshot(overlay: &Overlay<MemoryGroup>, event: String, outcome: &overlay_core::EventOutcome) -> Step {
    let group = overlay.renderer();
    Step {
        event,
        propagation: outcome.propagation,
        suppressed: outcome.suppressed,
        effects: outcome.effects.iter().map(describe).collect(),
        phase: overlay.state().phase(),
        locked_on: overlay.state().locked_on_id.as_ref().map(ToString::to_string),
        geometries: group
            .all()
            .map(|(id, g)| GeometryRow {
                id: label(group, id),
                visible: g.attached,
                color: g.style.color.clone(),
                weight: g.style.weight,
                fill: g.style.fill_color.clone(),
            })
            .collect(),
    }
}

/// Build the overlay and replay `events`, one snapshot per event
pub fn simulate(inputs: Inputs, events: &[ScriptEvent]) -> CliResult<Vec<Step>> {
    let mut overlay = OverlayBuilder::new(inputs.config, inputs.table)
        .build(&inputs.features, MemoryGroup::new())?;

    let mut steps = Vec::with_capacity(events.len());
    for event in events {
        let pointer = pointer_event(overlay.renderer(), event)?;
        let outcome = overlay.handle(pointer);
        tracing::debug!(%event, phase = %overlay.state().phase(), "Replayed event");
        steps.push(snapshot(&overlay, event.to_string(), &outcome));
    }
    Ok(steps)
}

impl SimulateArgs {
    fn script(&self) -> CliResult<Vec<ScriptEvent>> {
        match (&self.events, &self.script) {
            (Some(events), _) => parse_script(events),
            (None, Some(path)) => parse_script(&read_file(path)?),
            (None, None) => Ok(Vec::new()),
        }
    }

    /// Execute the simulate command
    pub fn execute(&self) -> CliResult<()> {
        let events = self.script()?;
        let inputs = self.input.load()?;
        let steps = simulate(inputs, &events)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&steps)?);
        } else {
            for step in &steps {
                print!("{}", step.to_text());
            }
        }
        Ok(())
    }
}
