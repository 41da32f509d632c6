//! CLI command handlers

pub mod classify;
pub mod common;
pub mod script;
pub mod simulate;

pub use classify::ClassifyArgs;
pub use simulate::SimulateArgs;
