//! Numeric helpers for the engine.
mod saturating;

pub use saturating::*;
