//! Minimal GeoJSON feature types and attribute joins
//!
//! Geometry is carried as opaque JSON and handed to the renderer untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::table::{AttributeRecord, AttributeTable, AttributeValue};

fn feature_type() -> String {
    "Feature".to_string()
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

/// A single GeoJSON feature
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Create a feature with the given properties
    pub fn new(geometry: Value, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            id: None,
            geometry,
            properties: Some(properties),
        }
    }

    /// Raw property value
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(name)
    }

    /// The feature's join key, `None` when missing or null
    pub fn key_value(&self, key: &str) -> Option<AttributeValue> {
        let value = AttributeValue::from_json(self.property(key)?);
        (!value.is_null()).then_some(value)
    }
}

/// A GeoJSON feature collection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }

    /// Parse a collection from GeoJSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl AttributeTable {
    /// Build a table from feature properties keyed by `key`
    ///
    /// Features without properties or without a key value are skipped.
    pub fn from_features(collection: &FeatureCollection, key: &str) -> Self {
        let records = collection
            .features
            .iter()
            .filter_map(|feature| AttributeRecord::from_json_object(feature.properties.as_ref()?, key));
        let table: Self = records.collect();
        tracing::debug!(
            features = collection.len(),
            records = table.len(),
            key,
            "Built attribute table from features"
        );
        table
    }
}

/// Copy each record's fields into its feature's properties
///
/// Record fields win over existing properties. Features whose key has no
/// record are returned unchanged.
pub fn merge_records_into_features(
    table: &AttributeTable,
    collection: &FeatureCollection,
    key: &str,
) -> FeatureCollection {
    let mut merged = collection.clone();
    let mut joined = 0usize;
    for feature in &mut merged.features {
        let Some(record) = feature.key_value(key).and_then(|k| table.get(&k)) else {
            continue;
        };
        let properties = feature.properties.get_or_insert_with(Map::new);
        for (name, value) in &record.fields {
            properties.insert(name.clone(), value.to_json());
        }
        joined += 1;
    }
    tracing::debug!(joined, features = merged.len(), key, "Merged attributes into features");
    merged
}
