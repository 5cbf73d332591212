//! Input/output helpers.
//!
//! - time-series exports (CSV/JSON) (`export`)

pub mod export;

pub use export::*;
