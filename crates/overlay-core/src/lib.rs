//! overlay-core - Attribute-driven map overlays
//!
//! Joins a keyed attribute table to a feature collection, colors features
//! by a configured classification and runs click/hover behaviors against
//! the rendered geometries:
//!
//! - **AttributeTable**: keyed records shared read-only between overlays
//! - **Classifier**: group or numeric-scale color assignment
//! - **BehaviorEngine**: highlight, style, view, popup, drilldown, filter
//! - **LayerState**: press flags, lock and filtered geometries
//! - **Overlay**: builds the overlay and routes pointer events
//!
//! Drawing is delegated to an [`OverlayRenderer`] supplied by the host.

pub mod behavior;
pub mod classify;
pub mod config;
pub mod error;
pub mod feature;
pub mod legend;
pub mod overlay;
pub mod render;
pub mod state;
pub mod style;
pub mod table;

pub use behavior::*;
pub use classify::*;
pub use config::*;
pub use error::*;
pub use feature::*;
pub use legend::*;
pub use overlay::*;
pub use render::*;
pub use state::*;
pub use style::*;
pub use table::*;

pub use overlay_color;
