//! Terminal plotting.

pub mod ascii;

pub use ascii::render_time_series;
