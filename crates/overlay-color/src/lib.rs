//! overlay-color - Palettes and numeric bin strategies for map overlays
//!
//! This crate holds the pure color logic behind overlay classification:
//!
//! - **Palette**: named discrete and continuous palettes
//! - **ColorGenerator**: walks a palette in sequence or samples it by position
//! - **ImplicitBins**: edge list colored by a generated palette
//! - **ColorBinEdges**: explicit `(color, edge)` pairs with binary-search lookup
//!
//! Table-driven classification (grouping entities, skipping non-numeric
//! values) lives in `overlay-core`.

pub mod bins;
pub mod color;
pub mod error;
pub mod palette;

pub use bins::*;
pub use color::*;
pub use error::*;
pub use palette::*;
