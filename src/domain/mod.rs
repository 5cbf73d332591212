//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - series catalogue entries (`SeriesDescriptor`) and their presentation rules
//! - normalized observations and latest-value rows (`Observation`, `LatestRow`)
//! - market table rows (`MarketRow`, `Session`)

pub mod types;

pub use types::*;
