//! `econ-dash` library crate.
//!
//! The binary (`econ`) is a thin wrapper around this library so that:
//!
//! - provider adapters and normalization are testable without spawning processes
//! - the CLI tables and the TUI share one loading pipeline

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
