//! Test fixture loading utilities

use std::path::PathBuf;
use std::sync::Arc;

use overlay_core::{AttributeTable, FeatureCollection, OverlayConfig};

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Six regions, R1..R6; R6 has no attribute record
pub fn load_regions() -> FeatureCollection {
    FeatureCollection::from_json(&load_fixture("regions.geojson")).expect("valid GeoJSON fixture")
}

/// Attributes for R1..R5 plus R7, which has no feature
pub fn load_attributes() -> Arc<AttributeTable> {
    let table = AttributeTable::from_json(&load_fixture("regions.json"), "code")
        .expect("valid attribute fixture");
    Arc::new(table)
}

/// Load and validate a config fixture
#[allow(dead_code)]
pub fn load_config(name: &str) -> OverlayConfig {
    OverlayConfig::load(&fixture_path(name)).expect("valid config fixture")
}
