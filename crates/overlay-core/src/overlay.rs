//! Building an overlay and routing pointer events through it
//!
//! [`OverlayBuilder::build`] classifies the table, styles and draws every
//! feature through an [`OverlayRenderer`], and returns an [`Overlay`] that
//! owns its [`LayerState`]. Pointer events then go through
//! [`Overlay::handle`] (or the per-event methods), which run the configured
//! behaviors and report effects back to the host.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::behavior::{reset_layer, BehaviorEngine, Effect, Trigger};
use crate::classify::ColorAssignment;
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::feature::{Feature, FeatureCollection};
use crate::legend::Legend;
use crate::render::{GeometryId, OverlayRenderer};
use crate::state::{LayerState, Press};
use crate::style::{ClassifiedStyle, PathStyle, StyleFunction};
use crate::table::{AttributeRecord, AttributeTable, AttributeValue};

/// Popup text used when no popup function is configured
pub const DEFAULT_POPUP: &str = "Default Popup";

type PopupFn = Box<dyn Fn(&Feature, Option<&AttributeRecord>) -> Option<String>>;
type RenderFilterFn = Box<dyn Fn(&AttributeValue) -> bool>;
type ViewFn = Box<dyn FnMut(&AttributeRecord)>;
type DrilldownFn = Box<dyn FnMut(&AttributeValue)>;

/// A pointer event on an overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "geometry", rename_all = "lowercase")]
pub enum PointerEvent {
    Click(GeometryId),
    DblClick(GeometryId),
    MouseOver(GeometryId),
    MouseOut(GeometryId),
    /// Click on the map outside any geometry
    Map,
}

/// Whether the host should let the event reach the map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    Continue,
    Stop,
}

/// What handling one event produced
#[derive(Clone, Debug, PartialEq)]
pub struct EventOutcome {
    pub effects: Vec<Effect>,
    pub propagation: Propagation,
    /// The event was ignored because hover is suppressed
    pub suppressed: bool,
}

impl EventOutcome {
    fn new(effects: Vec<Effect>, propagation: Propagation) -> Self {
        Self {
            effects,
            propagation,
            suppressed: false,
        }
    }

    fn suppressed() -> Self {
        Self {
            effects: Vec::new(),
            propagation: Propagation::Continue,
            suppressed: true,
        }
    }
}

/// Assembles an [`Overlay`] from configuration, data and host callbacks
pub struct OverlayBuilder {
    config: OverlayConfig,
    table: Arc<AttributeTable>,
    popup: Option<PopupFn>,
    render_filter: Option<RenderFilterFn>,
    on_view: Option<ViewFn>,
    on_drilldown: Option<DrilldownFn>,
}

impl OverlayBuilder {
    pub fn new(config: OverlayConfig, table: Arc<AttributeTable>) -> Self {
        Self {
            config,
            table,
            popup: None,
            render_filter: None,
            on_view: None,
            on_drilldown: None,
        }
    }

    /// Popup text from a feature and its record; `None` uses the default
    pub fn popup<F>(mut self, popup: F) -> Self
    where
        F: Fn(&Feature, Option<&AttributeRecord>) -> Option<String> + 'static,
    {
        self.popup = Some(Box::new(popup));
        self
    }

    /// Only draw features whose record value at the filter key passes
    ///
    /// Features without a record, or without the field, are always drawn.
    pub fn render_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&AttributeValue) -> bool + 'static,
    {
        self.render_filter = Some(Box::new(filter));
        self
    }

    pub fn on_view<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&AttributeRecord) + 'static,
    {
        self.on_view = Some(Box::new(callback));
        self
    }

    pub fn on_drilldown<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&AttributeValue) + 'static,
    {
        self.on_drilldown = Some(Box::new(callback));
        self
    }

    /// Classify, style and draw every feature
    pub fn build<R: OverlayRenderer>(self, features: &FeatureCollection, mut renderer: R) -> Result<Overlay<R>> {
        let config = self.config;
        config.validate()?;

        let classifier = config.color.build()?;
        let colors = classifier.classify(&self.table, &config.color_key);
        let legend = classifier.legend(&self.table, &config.color_key);
        let style = ClassifiedStyle::new(config.styles.default.clone(), colors);

        let filter_key = config.filter_key();
        let mut skipped = 0usize;
        for feature in &features.features {
            let key = feature.key_value(&config.key);
            let record = key.as_ref().and_then(|k| self.table.get(k));

            if let (Some(filter), Some(value)) = (&self.render_filter, record.and_then(|r| r.get(filter_key))) {
                if !filter(value) {
                    skipped += 1;
                    continue;
                }
            }

            let content = self
                .popup
                .as_ref()
                .and_then(|popup| popup(feature, record))
                .unwrap_or_else(|| DEFAULT_POPUP.to_string());
            let initial = style.style(key.as_ref());
            let id = renderer.insert(feature, key, config.display.kind, initial);
            renderer.bind_popup(id, content);
        }

        tracing::debug!(
            features = features.len(),
            skipped,
            classified = style.colors().len(),
            mode = config.color.mode(),
            "Built overlay"
        );

        let engine = BehaviorEngine::new(self.table.clone(), config.key.clone(), config.style_options());
        Ok(Overlay {
            config,
            table: self.table,
            engine,
            style,
            legend,
            state: LayerState::new(),
            renderer,
            on_view: self.on_view,
            on_drilldown: self.on_drilldown,
        })
    }
}

/// A rendered, interactive overlay
pub struct Overlay<R> {
    config: OverlayConfig,
    table: Arc<AttributeTable>,
    engine: BehaviorEngine,
    style: ClassifiedStyle,
    legend: Legend,
    state: LayerState,
    renderer: R,
    on_view: Option<ViewFn>,
    on_drilldown: Option<DrilldownFn>,
}

impl<R: OverlayRenderer> Overlay<R> {
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<AttributeTable> {
        &self.table
    }

    /// Interaction state, read by the host before a map-level deselect
    pub fn state(&self) -> &LayerState {
        &self.state
    }

    pub fn colors(&self) -> &ColorAssignment {
        self.style.colors()
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Resting style of a geometry
    pub fn base_style(&self, id: GeometryId) -> PathStyle {
        self.style.style(self.renderer.feature_key(id).as_ref())
    }

    pub fn handle(&mut self, event: PointerEvent) -> EventOutcome {
        match event {
            PointerEvent::Click(id) => self.click(id),
            PointerEvent::DblClick(id) => self.dblclick(id),
            PointerEvent::MouseOver(id) => self.mouseover(id),
            PointerEvent::MouseOut(id) => self.mouseout(id),
            PointerEvent::Map => self.map_click(),
        }
    }

    pub fn click(&mut self, id: GeometryId) -> EventOutcome {
        self.press(id, Press::Click)
    }

    pub fn dblclick(&mut self, id: GeometryId) -> EventOutcome {
        self.press(id, Press::DoubleClick)
    }

    pub fn mouseover(&mut self, id: GeometryId) -> EventOutcome {
        if self.hover_suppressed() {
            return EventOutcome::suppressed();
        }
        let effects = self.run(Trigger::Hover, id);
        EventOutcome::new(effects, Propagation::Continue)
    }

    pub fn mouseout(&mut self, id: GeometryId) -> EventOutcome {
        if self.hover_suppressed() {
            return EventOutcome::suppressed();
        }
        tracing::trace!(geometry = %id, "Mouse out");
        self.reset();
        EventOutcome::new(Vec::new(), Propagation::Continue)
    }

    /// Map-level deselect: reset and drop both press flags and the lock
    pub fn map_click(&mut self) -> EventOutcome {
        self.reset();
        self.state.deselect();
        EventOutcome::new(Vec::new(), Propagation::Continue)
    }

    /// Undo filters and restore resting styles
    pub fn reset(&mut self) {
        reset_layer(&mut self.renderer, &mut self.state, &self.style);
    }

    fn hover_suppressed(&self) -> bool {
        self.state.hover_suppressed(&self.config.display.prevent_hover_on)
    }

    fn press(&mut self, id: GeometryId, press: Press) -> EventOutcome {
        self.reset();

        let (trigger, lock_enabled) = match press {
            Press::Click => (Trigger::Click, self.config.display.locked_on.click),
            Press::DoubleClick => (Trigger::DblClick, self.config.display.locked_on.dbclick),
        };
        let effects = self.run(trigger, id);

        let lock = if lock_enabled {
            self.renderer
                .feature_key(id)
                .filter(|key| self.table.contains_key(key))
        } else {
            None
        };
        self.state.press(press, lock);

        EventOutcome::new(effects, Propagation::Stop)
    }

    fn run(&mut self, trigger: Trigger, id: GeometryId) -> Vec<Effect> {
        let bindings = self.config.events.bindings(trigger);
        tracing::trace!(%trigger, geometry = %id, bindings = bindings.len(), "Dispatching event");

        let mut effects = Vec::new();
        for binding in &bindings {
            let handler = self.engine.handler(binding);
            if let Some(effect) = handler.apply(id, &mut self.renderer, &mut self.state, &self.style) {
                effects.push(effect);
            }
        }

        for effect in &effects {
            match effect {
                Effect::View(record) => {
                    if let Some(callback) = self.on_view.as_mut() {
                        callback(record);
                    }
                }
                Effect::Drilldown(value) => {
                    if let Some(callback) = self.on_drilldown.as_mut() {
                        callback(value);
                    }
                }
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Behavior, BehaviorSpec, EventsConfig};
    use crate::render::MemoryGroup;
    use crate::state::LayerPhase;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn features() -> FeatureCollection {
        FeatureCollection::from_json(
            &json!({
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "geometry": null, "properties": {"code": "a"}},
                    {"type": "Feature", "geometry": null, "properties": {"code": "b"}},
                    {"type": "Feature", "geometry": null, "properties": {"code": "c"}},
                    {"type": "Feature", "geometry": null, "properties": {"code": "orphan"}}
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    fn table() -> Arc<AttributeTable> {
        let table = AttributeTable::from_json(
            r#"[
                {"code": "a", "distinct": "n", "pop": 1},
                {"code": "b", "distinct": "n", "pop": 2},
                {"code": "c", "distinct": "s", "pop": 3}
            ]"#,
            "code",
        )
        .unwrap();
        Arc::new(table)
    }

    fn overlay(config: OverlayConfig) -> Overlay<MemoryGroup> {
        OverlayBuilder::new(config, table())
            .build(&features(), MemoryGroup::new())
            .unwrap()
    }

    #[test]
    fn test_build_styles_every_feature() {
        let o = overlay(OverlayConfig::new("code"));
        assert_eq!(o.renderer().len(), 4);
        assert_eq!(o.colors().len(), 3);
        // a and b share a group
        assert_eq!(o.colors().get(&"a".into()), o.colors().get(&"b".into()));

        let orphan = o.renderer().get(GeometryId(3)).unwrap();
        assert_eq!(orphan.style, o.config().styles.default);
        assert_eq!(orphan.popup.as_deref(), Some(DEFAULT_POPUP));
    }

    #[test]
    fn test_render_filter_and_popup() {
        let o = OverlayBuilder::new(OverlayConfig::new("code"), table())
            .render_filter(|value| value != &AttributeValue::from("b"))
            .popup(|_, record| record.map(|r| format!("Code {}", r.id)))
            .build(&features(), MemoryGroup::new())
            .unwrap();

        // b is filtered out, the orphan has no record and is kept
        assert_eq!(o.renderer().len(), 3);
        assert!(o.renderer().find(&"b".into()).is_none());
        let a = o.renderer().find(&"a".into()).unwrap();
        assert_eq!(o.renderer().get(a).unwrap().popup.as_deref(), Some("Code a"));
        let orphan = o.renderer().find(&"orphan".into()).unwrap();
        assert_eq!(o.renderer().get(orphan).unwrap().popup.as_deref(), Some(DEFAULT_POPUP));
    }

    #[test]
    fn test_click_locks_and_stops_propagation() {
        let mut o = overlay(OverlayConfig::new("code"));
        let outcome = o.click(GeometryId(0));

        assert_eq!(outcome.propagation, Propagation::Stop);
        assert_eq!(o.state().phase(), LayerPhase::Locked);
        assert_eq!(o.state().locked_on_id, Some("a".into()));
        assert_eq!(o.renderer().open_popups(), vec![GeometryId(0)]);

        let highlight = &o.config().styles.highlight;
        assert_eq!(
            o.renderer().style(GeometryId(1)),
            Some(&o.base_style(GeometryId(1)).overlay(highlight))
        );
        assert_eq!(o.renderer().style(GeometryId(2)), Some(&o.base_style(GeometryId(2))));
    }

    #[test]
    fn test_click_on_orphan_does_not_lock() {
        let mut o = overlay(OverlayConfig::new("code"));
        o.click(GeometryId(3));
        assert!(o.state().is_clicked);
        assert_eq!(o.state().locked_on_id, None);
    }

    #[test]
    fn test_dblclick_runs_bindings_and_clears_lock() {
        let mut config = OverlayConfig::new("code");
        config.events.dblclick = vec![BehaviorSpec::new(Behavior::Filter, Some("distinct"))];
        let mut o = overlay(config);

        o.click(GeometryId(2));
        assert!(o.state().is_locked());

        let outcome = o.dblclick(GeometryId(0));
        assert_eq!(outcome.propagation, Propagation::Stop);
        assert!(o.state().is_double_clicked);
        // dblclick does not lock by default
        assert_eq!(o.state().locked_on_id, None);
        let filtered: Vec<_> = o.state().filtered_out.iter().copied().collect();
        assert_eq!(filtered, vec![GeometryId(2)]);
    }

    #[test]
    fn test_hover_suppressed_while_locked() {
        let mut config = OverlayConfig::new("code");
        config.events.hover = vec![BehaviorSpec::new(Behavior::Highlight, Some("distinct"))];
        let mut o = overlay(config);

        o.mouseover(GeometryId(0));
        assert!(o.renderer().style_writes() > 0);

        o.click(GeometryId(2));
        let writes = o.renderer().style_writes();
        assert!(o.mouseover(GeometryId(0)).suppressed);
        assert!(o.mouseout(GeometryId(0)).suppressed);
        assert_eq!(o.renderer().style_writes(), writes);
    }

    #[test]
    fn test_map_click_deselects() {
        let mut o = overlay(OverlayConfig::new("code"));
        o.click(GeometryId(0));
        let outcome = o.handle(PointerEvent::Map);

        assert_eq!(outcome.propagation, Propagation::Continue);
        assert_eq!(o.state(), &LayerState::new());
        for id in 0..4 {
            let id = GeometryId(id);
            assert_eq!(o.renderer().style(id), Some(&o.base_style(id)));
        }
    }

    #[test]
    fn test_callbacks_receive_effects() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::default();
        let views = Rc::clone(&seen);
        let drills = Rc::clone(&seen);

        let mut config = OverlayConfig::new("code");
        config.events = EventsConfig {
            click: vec![
                BehaviorSpec::new(Behavior::View, None),
                BehaviorSpec::new(Behavior::Drilldown, Some("pop")),
            ],
            ..EventsConfig::default()
        };

        let mut o = OverlayBuilder::new(config, table())
            .on_view(move |record| views.borrow_mut().push(format!("view {}", record.id)))
            .on_drilldown(move |value| drills.borrow_mut().push(format!("drill {value}")))
            .build(&features(), MemoryGroup::new())
            .unwrap();

        let outcome = o.click(GeometryId(1));
        assert_eq!(outcome.effects.len(), 2);
        assert_eq!(*seen.borrow(), vec!["view b".to_string(), "drill 2".to_string()]);

        // no record, no callbacks
        assert!(o.click(GeometryId(3)).effects.is_empty());
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_pointer_event_serde() {
        let event: PointerEvent = serde_json::from_str(r#"{"event": "click", "geometry": 2}"#).unwrap();
        assert_eq!(event, PointerEvent::Click(GeometryId(2)));
        let event: PointerEvent = serde_json::from_str(r#"{"event": "map"}"#).unwrap();
        assert_eq!(event, PointerEvent::Map);
    }
}
