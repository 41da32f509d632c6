//! Renderer capability consumed by the behavior engine
//!
//! Drawing is done by the host map widget. The engine only needs to walk the
//! sibling geometries of one overlay, read their feature keys, restyle them,
//! toggle popups and detach or re-attach them. [`MemoryGroup`] implements
//! the whole capability in memory for tests and the CLI simulator.

use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::style::{PathStyle, StyleFunction};
use crate::table::AttributeValue;

/// Handle to a rendered geometry, stable for the overlay's lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeometryId(pub usize);

impl std::fmt::Display for GeometryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How features are drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Marker,
    Text,
    #[default]
    Shape,
    Buffer,
}

/// The sibling group of one overlay
pub trait GeometryGroup {
    /// Geometries currently attached to the group
    fn members(&self) -> Vec<GeometryId>;

    /// Value of the overlay's primary key on a geometry's feature, attached
    /// or not
    fn feature_key(&self, id: GeometryId) -> Option<AttributeValue>;

    fn set_style(&mut self, id: GeometryId, style: PathStyle);

    fn open_popup(&mut self, id: GeometryId);

    fn close_popup(&mut self, id: GeometryId);

    /// Re-attach a detached geometry
    fn add(&mut self, id: GeometryId);

    /// Detach a geometry; returns whether it was attached
    fn remove(&mut self, id: GeometryId) -> bool;

    /// Restyle every attached geometry with a style function
    fn restyle(&mut self, style: &dyn StyleFunction) {
        for id in self.members() {
            let key = self.feature_key(id);
            self.set_style(id, style.style(key.as_ref()));
        }
    }
}

/// A group that can also create geometries, used when building an overlay
pub trait OverlayRenderer: GeometryGroup {
    /// Draw a feature and attach it to the group
    fn insert(
        &mut self,
        feature: &Feature,
        key: Option<AttributeValue>,
        kind: DisplayKind,
        style: PathStyle,
    ) -> GeometryId;

    fn bind_popup(&mut self, id: GeometryId, content: String);
}

/// A geometry held by [`MemoryGroup`]
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryGeometry {
    pub key: Option<AttributeValue>,
    pub kind: DisplayKind,
    pub style: PathStyle,
    pub popup: Option<String>,
    pub popup_open: bool,
    pub attached: bool,
}

/// In-memory renderer that records what a map widget would show
#[derive(Clone, Debug, Default)]
pub struct MemoryGroup {
    geometries: Vec<MemoryGeometry>,
    style_writes: usize,
}

impl MemoryGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bare geometry with a key and an empty style
    pub fn push(&mut self, key: Option<AttributeValue>) -> GeometryId {
        self.geometries.push(MemoryGeometry {
            key,
            kind: DisplayKind::default(),
            style: PathStyle::default(),
            popup: None,
            popup_open: false,
            attached: true,
        });
        GeometryId(self.geometries.len() - 1)
    }

    pub fn get(&self, id: GeometryId) -> Option<&MemoryGeometry> {
        self.geometries.get(id.0)
    }

    pub fn style(&self, id: GeometryId) -> Option<&PathStyle> {
        self.get(id).map(|g| &g.style)
    }

    /// Every geometry ever inserted, attached or not
    pub fn all(&self) -> impl Iterator<Item = (GeometryId, &MemoryGeometry)> {
        self.geometries.iter().enumerate().map(|(i, g)| (GeometryId(i), g))
    }

    /// First geometry whose feature key equals `key`
    pub fn find(&self, key: &AttributeValue) -> Option<GeometryId> {
        self.all()
            .find(|(_, g)| g.key.as_ref() == Some(key))
            .map(|(id, _)| id)
    }

    pub fn is_attached(&self, id: GeometryId) -> bool {
        self.get(id).is_some_and(|g| g.attached)
    }

    pub fn open_popups(&self) -> Vec<GeometryId> {
        self.all()
            .filter(|(_, g)| g.popup_open)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of `set_style` calls so far
    pub fn style_writes(&self) -> usize {
        self.style_writes
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

impl GeometryGroup for MemoryGroup {
    fn members(&self) -> Vec<GeometryId> {
        self.all()
            .filter(|(_, g)| g.attached)
            .map(|(id, _)| id)
            .collect()
    }

    fn feature_key(&self, id: GeometryId) -> Option<AttributeValue> {
        self.get(id)?.key.clone()
    }

    fn set_style(&mut self, id: GeometryId, style: PathStyle) {
        if let Some(geometry) = self.geometries.get_mut(id.0) {
            geometry.style = style;
            self.style_writes += 1;
        }
    }

    fn open_popup(&mut self, id: GeometryId) {
        if let Some(geometry) = self.geometries.get_mut(id.0) {
            geometry.popup_open = true;
        }
    }

    fn close_popup(&mut self, id: GeometryId) {
        if let Some(geometry) = self.geometries.get_mut(id.0) {
            geometry.popup_open = false;
        }
    }

    fn add(&mut self, id: GeometryId) {
        if let Some(geometry) = self.geometries.get_mut(id.0) {
            geometry.attached = true;
        }
    }

    fn remove(&mut self, id: GeometryId) -> bool {
        match self.geometries.get_mut(id.0) {
            Some(geometry) => {
                geometry.popup_open = false;
                std::mem::replace(&mut geometry.attached, false)
            }
            None => false,
        }
    }
}

impl OverlayRenderer for MemoryGroup {
    fn insert(
        &mut self,
        _feature: &Feature,
        key: Option<AttributeValue>,
        kind: DisplayKind,
        style: PathStyle,
    ) -> GeometryId {
        let id = self.push(key);
        self.geometries[id.0].kind = kind;
        self.geometries[id.0].style = style;
        id
    }

    fn bind_popup(&mut self, id: GeometryId, content: String) {
        if let Some(geometry) = self.geometries.get_mut(id.0) {
            geometry.popup = Some(content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_and_add() {
        let mut group = MemoryGroup::new();
        let a = group.push(Some("a".into()));
        let b = group.push(None);

        assert!(group.remove(a));
        assert!(!group.remove(a));
        assert_eq!(group.members(), vec![b]);
        // detached geometries keep their key
        assert_eq!(group.feature_key(a), Some("a".into()));

        group.add(a);
        assert_eq!(group.members(), vec![a, b]);
    }

    #[test]
    fn test_restyle_counts_writes() {
        let mut group = MemoryGroup::new();
        let a = group.push(Some("a".into()));
        group.push(Some("b".into()));
        group.remove(a);

        let style = |key: Option<&AttributeValue>| match key {
            Some(k) if k == &AttributeValue::from("b") => PathStyle::highlight(),
            _ => PathStyle::default(),
        };
        group.restyle(&style);

        // only attached geometries are restyled
        assert_eq!(group.style_writes(), 1);
        assert_eq!(group.style(GeometryId(1)), Some(&PathStyle::highlight()));
        assert_eq!(group.find(&"b".into()), Some(GeometryId(1)));
    }

    #[test]
    fn test_insert_binds_popup() {
        let mut group = MemoryGroup::new();
        let feature = Feature::new(serde_json::Value::Null, serde_json::Map::new());
        let id = group.insert(&feature, None, DisplayKind::Marker, PathStyle::highlight());
        group.bind_popup(id, "hello".into());
        group.open_popup(id);

        let geometry = group.get(id).unwrap();
        assert_eq!(geometry.kind, DisplayKind::Marker);
        assert_eq!(geometry.popup.as_deref(), Some("hello"));
        assert_eq!(group.open_popups(), vec![id]);
        assert_eq!(group.style_writes(), 0);
    }

    #[test]
    fn test_remove_closes_popup() {
        let mut group = MemoryGroup::new();
        let a = group.push(Some("a".into()));
        let b = group.push(Some("b".into()));
        group.open_popup(a);
        group.open_popup(b);

        group.remove(a);
        assert_eq!(group.open_popups(), vec![b]);

        // re-attaching does not reopen it
        group.add(a);
        assert_eq!(group.open_popups(), vec![b]);
    }
}
