//! Per-overlay interaction state
//!
//! ```text
//! Idle --click--> Clicked --(lockedOn)--> Locked
//!   ^                 |                     |
//!   +----- deselect --+---------------------+
//! ```
//!
//! `filtered_out` is orthogonal to the phase: any phase can hold filtered
//! geometries until the next reset.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::render::GeometryId;
use crate::table::AttributeValue;

/// Which presses lock the overlay on the pressed entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockedOn {
    pub click: bool,
    #[serde(alias = "dblclick")]
    pub dbclick: bool,
}

impl Default for LockedOn {
    fn default() -> Self {
        Self {
            click: true,
            dbclick: false,
        }
    }
}

/// Which presses suppress hover behaviors while active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreventHover {
    pub click: bool,
    #[serde(alias = "dblclick")]
    pub dbclick: bool,
}

/// Kind of press that changes state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Press {
    Click,
    DoubleClick,
}

/// Coarse phase derived from the state flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerPhase {
    Idle,
    Clicked,
    Locked,
}

impl LayerPhase {
    pub fn description(&self) -> &'static str {
        match self {
            LayerPhase::Idle => "No active selection",
            LayerPhase::Clicked => "Selection without lock",
            LayerPhase::Locked => "Locked on an entity",
        }
    }
}

impl std::fmt::Display for LayerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LayerPhase::Idle => "idle",
            LayerPhase::Clicked => "clicked",
            LayerPhase::Locked => "locked",
        };
        write!(f, "{}", s)
    }
}

/// Interaction state of one overlay
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerState {
    pub is_clicked: bool,
    pub is_double_clicked: bool,
    pub locked_on_id: Option<AttributeValue>,
    pub filtered_out: BTreeSet<GeometryId>,
}

impl LayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LayerPhase {
        if self.locked_on_id.is_some() {
            LayerPhase::Locked
        } else if self.is_clicked || self.is_double_clicked {
            LayerPhase::Clicked
        } else {
            LayerPhase::Idle
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_on_id.is_some()
    }

    /// Whether `key` is the locked entity
    pub fn is_locked_on(&self, key: Option<&AttributeValue>) -> bool {
        matches!((&self.locked_on_id, key), (Some(locked), Some(key)) if locked == key)
    }

    pub fn is_filtered(&self) -> bool {
        !self.filtered_out.is_empty()
    }

    /// Whether hover behaviors are currently suppressed
    pub fn hover_suppressed(&self, prevent: &PreventHover) -> bool {
        (self.is_clicked && prevent.click)
            || (self.is_double_clicked && prevent.dbclick)
            || self.locked_on_id.is_some()
    }

    /// Record a press and set or clear the lock
    pub fn press(&mut self, press: Press, lock: Option<AttributeValue>) {
        match press {
            Press::Click => self.is_clicked = true,
            Press::DoubleClick => self.is_double_clicked = true,
        }
        if self.locked_on_id != lock {
            tracing::debug!(?press, from = ?self.locked_on_id, to = ?lock, "Lock changed");
        }
        self.locked_on_id = lock;
    }

    /// Drop both press flags and the lock
    pub fn deselect(&mut self) {
        self.is_clicked = false;
        self.is_double_clicked = false;
        self.locked_on_id = None;
    }

    /// Take the filtered geometries, leaving the set empty
    pub fn take_filtered(&mut self) -> BTreeSet<GeometryId> {
        std::mem::take(&mut self.filtered_out)
    }
}
