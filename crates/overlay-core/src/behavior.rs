//! Event behaviors and the reset protocol
//!
//! A trigger (click, double-click, hover) is bound to an ordered list of
//! behaviors. Each behavior reads the shared attribute table and mutates the
//! sibling group and the [`LayerState`] passed in by the caller; the engine
//! itself holds no mutable state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::render::{GeometryGroup, GeometryId};
use crate::state::LayerState;
use crate::style::{PathStyle, StyleDefaults, StyleFunction};
use crate::table::{AttributeRecord, AttributeTable, AttributeValue};

/// User interaction that runs bound behaviors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Click,
    #[serde(alias = "dbclick")]
    DblClick,
    Hover,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trigger::Click => "click",
            Trigger::DblClick => "dblclick",
            Trigger::Hover => "hover",
        };
        write!(f, "{}", s)
    }
}

/// What happens when a trigger fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Restyle matching siblings, honoring the lock
    Highlight,
    /// Apply the custom style to matching siblings
    Style,
    /// Report the trigger's record to the host
    View,
    /// Open the trigger's popup
    Popup,
    /// Report the trigger's value at the key to the host
    Drilldown,
    /// Detach non-matching siblings
    Filter,
}

/// One configured behavior of a trigger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorSpec {
    #[serde(rename = "type")]
    pub behavior: Behavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl BehaviorSpec {
    pub fn new(behavior: Behavior, key: Option<&str>) -> Self {
        Self {
            behavior,
            key: key.map(str::to_string),
        }
    }
}

/// A behavior bound to a trigger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventBehaviorBinding {
    pub trigger: Trigger,
    pub behavior: Behavior,
    /// Field compared or reported; the primary key when `None`
    pub key: Option<String>,
}

/// Behaviors per trigger, run in list order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub click: Vec<BehaviorSpec>,
    #[serde(default, alias = "dbclick")]
    pub dblclick: Vec<BehaviorSpec>,
    #[serde(default)]
    pub hover: Vec<BehaviorSpec>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            click: vec![
                BehaviorSpec::new(Behavior::Popup, Some("id")),
                BehaviorSpec::new(Behavior::Highlight, Some("distinct")),
            ],
            dblclick: Vec::new(),
            hover: Vec::new(),
        }
    }
}

impl EventsConfig {
    /// Bindings for a trigger, in configured order
    pub fn bindings(&self, trigger: Trigger) -> Vec<EventBehaviorBinding> {
        let specs = match trigger {
            Trigger::Click => &self.click,
            Trigger::DblClick => &self.dblclick,
            Trigger::Hover => &self.hover,
        };
        specs
            .iter()
            .map(|spec| EventBehaviorBinding {
                trigger,
                behavior: spec.behavior,
                key: spec.key.clone(),
            })
            .collect()
    }

    /// Every binding across all triggers
    pub fn all_bindings(&self) -> Vec<EventBehaviorBinding> {
        [Trigger::Click, Trigger::DblClick, Trigger::Hover]
            .into_iter()
            .flat_map(|trigger| self.bindings(trigger))
            .collect()
    }
}

/// Styles applied by the highlight and style behaviors
#[derive(Clone, Debug, PartialEq)]
pub struct StyleOptions {
    pub highlight: PathStyle,
    pub semi_highlight: PathStyle,
    pub custom: PathStyle,
    /// Close sibling popups before opening a new one
    pub isolate_popup: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::from_defaults(&StyleDefaults::default(), true)
    }
}

impl StyleOptions {
    pub fn from_defaults(defaults: &StyleDefaults, isolate_popup: bool) -> Self {
        Self {
            highlight: defaults.highlight.clone(),
            semi_highlight: defaults.semi_highlight.clone(),
            custom: defaults.custom.clone(),
            isolate_popup,
        }
    }
}

/// Outcome of a behavior that the host must act on
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// The trigger's record, for a details view
    View(AttributeRecord),
    /// The trigger's value at the binding key
    Drilldown(AttributeValue),
}

/// Dispatches bound behaviors against a shared table
#[derive(Clone, Debug)]
pub struct BehaviorEngine {
    table: Arc<AttributeTable>,
    primary_key: String,
    options: StyleOptions,
}

impl BehaviorEngine {
    pub fn new(table: Arc<AttributeTable>, primary_key: impl Into<String>, options: StyleOptions) -> Self {
        Self {
            table,
            primary_key: primary_key.into(),
            options,
        }
    }

    pub fn table(&self) -> &AttributeTable {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn options(&self) -> &StyleOptions {
        &self.options
    }

    /// Bind a behavior to this engine
    pub fn handler(&self, binding: &EventBehaviorBinding) -> BehaviorHandler<'_> {
        BehaviorHandler {
            engine: self,
            behavior: binding.behavior,
            key: binding.key.clone().unwrap_or_else(|| self.primary_key.clone()),
        }
    }

    fn record_of(&self, group: &dyn GeometryGroup, id: GeometryId) -> Option<&AttributeRecord> {
        self.table.get(&group.feature_key(id)?)
    }
}

/// A behavior ready to run against a triggering geometry
#[derive(Clone, Debug)]
pub struct BehaviorHandler<'e> {
    engine: &'e BehaviorEngine,
    behavior: Behavior,
    key: String,
}

impl BehaviorHandler<'_> {
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run the behavior for `trigger` against its sibling `group`
    ///
    /// `base` is the overlay's resting style function; highlight styles are
    /// layered on top of it.
    pub fn apply(
        &self,
        trigger: GeometryId,
        group: &mut dyn GeometryGroup,
        state: &mut LayerState,
        base: &dyn StyleFunction,
    ) -> Option<Effect> {
        let record = self.engine.record_of(group, trigger);
        tracing::trace!(
            behavior = ?self.behavior,
            key = %self.key,
            %trigger,
            has_record = record.is_some(),
            "Applying behavior"
        );

        match self.behavior {
            Behavior::Highlight => {
                self.highlight(record, group, state, base);
                None
            }
            Behavior::Style => {
                self.custom_style(record, group, base);
                None
            }
            Behavior::View => record.map(|r| Effect::View(r.clone())),
            Behavior::Popup => {
                self.popup(trigger, group);
                None
            }
            Behavior::Drilldown => record
                .and_then(|r| r.get(&self.key))
                .map(|v| Effect::Drilldown(v.clone())),
            Behavior::Filter => {
                self.filter(record, group, state);
                None
            }
        }
    }

    fn matches(&self, trigger: &AttributeRecord, target: &AttributeRecord) -> bool {
        target.get(&self.key) == trigger.get(&self.key)
    }

    fn highlight(
        &self,
        trigger: Option<&AttributeRecord>,
        group: &mut dyn GeometryGroup,
        state: &LayerState,
        base: &dyn StyleFunction,
    ) {
        let options = &self.engine.options;
        for id in group.members() {
            let key = group.feature_key(id);
            let resting = base.style(key.as_ref());
            let target = key.as_ref().and_then(|k| self.engine.table.get(k));

            let style = match (trigger, target) {
                (Some(trigger), Some(target)) => {
                    if state.is_locked_on(key.as_ref()) {
                        resting.overlay(&options.highlight)
                    } else if self.matches(trigger, target) {
                        if state.is_locked() {
                            resting.overlay(&options.semi_highlight)
                        } else {
                            resting.overlay(&options.highlight)
                        }
                    } else {
                        resting
                    }
                }
                _ => resting,
            };
            group.set_style(id, style);
        }
    }

    fn custom_style(
        &self,
        trigger: Option<&AttributeRecord>,
        group: &mut dyn GeometryGroup,
        base: &dyn StyleFunction,
    ) {
        let custom = &self.engine.options.custom;
        for id in group.members() {
            let key = group.feature_key(id);
            let resting = base.style(key.as_ref());
            let target = key.as_ref().and_then(|k| self.engine.table.get(k));

            let style = match (trigger, target) {
                (Some(trigger), Some(target)) if self.matches(trigger, target) => resting.overlay(custom),
                _ => resting,
            };
            group.set_style(id, style);
        }
    }

    fn popup(&self, trigger: GeometryId, group: &mut dyn GeometryGroup) {
        if self.engine.options.isolate_popup {
            for id in group.members() {
                if id != trigger {
                    group.close_popup(id);
                }
            }
        }
        group.open_popup(trigger);
    }

    fn filter(&self, trigger: Option<&AttributeRecord>, group: &mut dyn GeometryGroup, state: &mut LayerState) {
        let Some(trigger) = trigger else {
            return;
        };
        let mut removed = 0usize;
        for id in group.members() {
            let Some(target) = self.engine.record_of(group, id) else {
                continue;
            };
            if !self.matches(trigger, target) {
                group.remove(id);
                state.filtered_out.insert(id);
                removed += 1;
            }
        }
        tracing::debug!(key = %self.key, removed, total = state.filtered_out.len(), "Filtered siblings");
    }
}

/// Restore the group to its initial render
///
/// Re-attaches every filtered geometry and restyles the whole group with
/// `base`, the same style function used at first render.
pub fn reset_layer(group: &mut dyn GeometryGroup, state: &mut LayerState, base: &dyn StyleFunction) {
    let filtered = state.take_filtered();
    for &id in &filtered {
        group.add(id);
    }
    group.restyle(base);
    tracing::debug!(restored = filtered.len(), "Reset layer");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ColorAssignment;
    use crate::render::MemoryGroup;
    use crate::style::ClassifiedStyle;

    struct Fixture {
        engine: BehaviorEngine,
        group: MemoryGroup,
        state: LayerState,
        base: ClassifiedStyle,
    }

    // a, b share region "n"; c is in "s"; d has no record
    fn fixture() -> Fixture {
        let table: AttributeTable = vec![
            AttributeRecord::new("a").with_field("region", "n").with_field("pop", 10),
            AttributeRecord::new("b").with_field("region", "n").with_field("pop", 20),
            AttributeRecord::new("c").with_field("region", "s").with_field("pop", 30),
        ]
        .into_iter()
        .collect();

        let mut group = MemoryGroup::new();
        for key in ["a", "b", "c", "d"] {
            group.push(Some(key.into()));
        }

        let mut colors = ColorAssignment::new();
        colors.insert("a".into(), "#111111");
        colors.insert("b".into(), "#222222");
        colors.insert("c".into(), "#333333");
        let base = ClassifiedStyle::new(PathStyle::default_path(), colors);
        group.restyle(&base);

        Fixture {
            engine: BehaviorEngine::new(Arc::new(table), "code", StyleOptions::default()),
            group,
            state: LayerState::new(),
            base,
        }
    }

    fn binding(behavior: Behavior, key: Option<&str>) -> EventBehaviorBinding {
        EventBehaviorBinding {
            trigger: Trigger::Click,
            behavior,
            key: key.map(str::to_string),
        }
    }

    impl Fixture {
        fn apply(&mut self, behavior: Behavior, key: Option<&str>, trigger: usize) -> Option<Effect> {
            let binding = binding(behavior, key);
            self.engine
                .handler(&binding)
                .apply(GeometryId(trigger), &mut self.group, &mut self.state, &self.base)
        }

        fn style(&self, id: usize) -> PathStyle {
            self.group.style(GeometryId(id)).cloned().unwrap()
        }

        fn resting(&self, id: usize) -> PathStyle {
            let key = self.group.feature_key(GeometryId(id));
            self.base.style(key.as_ref())
        }
    }

    #[test]
    fn test_highlight_without_lock() {
        let mut f = fixture();
        f.apply(Behavior::Highlight, Some("region"), 0);

        let highlight = &f.engine.options().highlight;
        assert_eq!(f.style(0), f.resting(0).overlay(highlight));
        assert_eq!(f.style(1), f.resting(1).overlay(highlight));
        assert_eq!(f.style(2), f.resting(2));
        assert_eq!(f.style(3), f.resting(3));
        // highlight keeps the classified fill
        assert_eq!(f.style(1).fill_color.as_deref(), Some("#222222"));
    }

    #[test]
    fn test_lock_overrides_matching() {
        let mut f = fixture();
        f.state.locked_on_id = Some("a".into());
        // b matches a's region while a holds the lock
        f.apply(Behavior::Highlight, Some("region"), 1);

        let options = f.engine.options().clone();
        assert_eq!(f.style(0), f.resting(0).overlay(&options.highlight));
        assert_eq!(f.style(1), f.resting(1).overlay(&options.semi_highlight));
        assert_eq!(f.style(2), f.resting(2));
    }

    #[test]
    fn test_highlight_from_unknown_trigger_resets_styles() {
        let mut f = fixture();
        f.apply(Behavior::Highlight, Some("region"), 0);
        f.apply(Behavior::Highlight, Some("region"), 3);
        for id in 0..4 {
            assert_eq!(f.style(id), f.resting(id));
        }
    }

    #[test]
    fn test_style_behavior_ignores_lock() {
        let mut f = fixture();
        f.state.locked_on_id = Some("c".into());
        f.apply(Behavior::Style, Some("region"), 0);

        let custom = f.engine.options().custom.clone();
        assert_eq!(f.style(0), f.resting(0).overlay(&custom));
        assert_eq!(f.style(1), f.resting(1).overlay(&custom));
        assert_eq!(f.style(2), f.resting(2));
    }

    #[test]
    fn test_view_and_drilldown() {
        let mut f = fixture();
        let writes = f.group.style_writes();

        match f.apply(Behavior::View, None, 1) {
            Some(Effect::View(record)) => assert_eq!(record.id, AttributeValue::from("b")),
            other => panic!("expected view effect, got {other:?}"),
        }
        assert_eq!(
            f.apply(Behavior::Drilldown, Some("pop"), 2),
            Some(Effect::Drilldown(30.into()))
        );
        assert_eq!(f.apply(Behavior::Drilldown, Some("missing"), 2), None);
        assert_eq!(f.apply(Behavior::View, None, 3), None);

        assert_eq!(f.group.style_writes(), writes);
        assert_eq!(f.state, LayerState::new());
    }

    #[test]
    fn test_popup_isolation() {
        let mut f = fixture();
        f.apply(Behavior::Popup, None, 0);
        f.apply(Behavior::Popup, None, 2);
        assert_eq!(f.group.open_popups(), vec![GeometryId(2)]);

        let mut f = fixture();
        f.engine.options.isolate_popup = false;
        f.apply(Behavior::Popup, None, 0);
        f.apply(Behavior::Popup, None, 2);
        assert_eq!(f.group.open_popups(), vec![GeometryId(0), GeometryId(2)]);
    }

    #[test]
    fn test_filtered_geometry_loses_its_popup() {
        let mut f = fixture();
        f.engine.options.isolate_popup = false;
        f.apply(Behavior::Popup, None, 2);
        f.apply(Behavior::Filter, Some("region"), 0);
        f.apply(Behavior::Popup, None, 0);

        assert_eq!(f.group.open_popups(), vec![GeometryId(0)]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut f = fixture();
        f.apply(Behavior::Filter, Some("region"), 0);
        let visible = f.group.members();
        let filtered = f.state.filtered_out.clone();

        // d has no record and stays
        assert_eq!(visible, vec![GeometryId(0), GeometryId(1), GeometryId(3)]);
        assert_eq!(filtered.len(), 1);

        f.apply(Behavior::Filter, Some("region"), 0);
        assert_eq!(f.group.members(), visible);
        assert_eq!(f.state.filtered_out, filtered);
    }

    #[test]
    fn test_reset_round_trip() {
        let mut f = fixture();
        let initial: Vec<PathStyle> = (0..4).map(|id| f.style(id)).collect();

        f.apply(Behavior::Highlight, Some("region"), 2);
        f.apply(Behavior::Filter, Some("region"), 2);
        reset_layer(&mut f.group, &mut f.state, &f.base);

        assert_eq!(f.group.members().len(), 4);
        assert!(!f.state.is_filtered());
        let restored: Vec<PathStyle> = (0..4).map(|id| f.style(id)).collect();
        assert_eq!(restored, initial);
    }

    #[test]
    fn test_events_config_defaults() {
        let events = EventsConfig::default();
        let click = events.bindings(Trigger::Click);
        assert_eq!(click.len(), 2);
        assert_eq!(click[0].behavior, Behavior::Popup);
        assert_eq!(click[1].key.as_deref(), Some("distinct"));
        assert!(events.bindings(Trigger::Hover).is_empty());
        assert_eq!(events.all_bindings().len(), 2);
    }

    #[test]
    fn test_unknown_behavior_rejected() {
        let err = serde_json::from_str::<EventsConfig>(r#"{"click": [{"type": "zoom"}]}"#);
        assert!(err.is_err());

        let events: EventsConfig =
            serde_json::from_str(r#"{"dbclick": [{"type": "filter", "key": "region"}]}"#).unwrap();
        assert_eq!(events.bindings(Trigger::DblClick)[0].behavior, Behavior::Filter);
        assert!(events.click.is_empty());
    }

    #[test]
    fn test_handler_defaults_to_primary_key() {
        let f = fixture();
        let handler = f.engine.handler(&binding(Behavior::Highlight, None));
        assert_eq!(handler.key(), "code");
        assert_eq!(handler.behavior(), Behavior::Highlight);
    }
}
