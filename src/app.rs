//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - loads the requested dashboard sections
//! - prints tables/plots or starts the TUI
//! - writes optional exports

use std::fs::File;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, HistoryArgs, MarketsArgs};
use crate::config::Settings;
use crate::data::{MarketGroup, banxico, fred};
use crate::error::AppError;

pub mod pipeline;

const TUI_LOG_FILE: &str = "econ.log";

/// Entry point for the `econ` binary.
pub fn run() -> Result<(), AppError> {
    // `econ` with no subcommand opens the dashboard; clap needs an explicit name.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(matches!(cli.command, Command::Tui));
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Banxico => handle_banxico(&settings),
        Command::Fred => handle_fred(&settings),
        Command::Markets(args) => handle_markets(&settings, args),
        Command::History(args) => handle_history(&settings, args),
        Command::Tui => crate::tui::run(settings),
    }
}

/// `RUST_LOG` controls verbosity (default `warn`). The TUI owns the terminal, so
/// it logs to a file instead of stderr.
fn init_logging(tui: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if tui {
        // Without a log file the TUI runs silently.
        if let Ok(file) = File::create(TUI_LOG_FILE) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_banxico(settings: &Settings) -> Result<(), AppError> {
    let rows = pipeline::load_banxico(settings)?;
    println!("{}", crate::report::format_latest_table("Banxico indicators", &rows, banxico::SERIES));
    Ok(())
}

fn handle_fred(settings: &Settings) -> Result<(), AppError> {
    let rows = pipeline::load_fred(settings)?;
    println!("{}", crate::report::format_latest_table("Fed key indicators", &rows, fred::INDICATORS));
    Ok(())
}

/// Group failures print inline; the command fails only if every group failed.
fn handle_markets(settings: &Settings, args: MarketsArgs) -> Result<(), AppError> {
    let groups: Vec<MarketGroup> = match args.group {
        Some(group) => vec![group],
        None => MarketGroup::ALL.to_vec(),
    };
    let sections = pipeline::load_markets(settings, &groups)?;

    let mut first_error = None;
    let mut any_ok = false;
    for section in &sections {
        match &section.rows {
            Ok(rows) => {
                any_ok = true;
                println!("{}", crate::report::format_market_table(section.group.title(), rows));
            }
            Err(err) => {
                println!("{}", crate::report::format_section_error(section.group.title(), err));
                first_error.get_or_insert_with(|| err.clone());
            }
        }
    }

    match first_error {
        Some(err) if !any_ok => Err(err.into()),
        _ => Ok(()),
    }
}

fn handle_history(settings: &Settings, args: HistoryArgs) -> Result<(), AppError> {
    let request = pipeline::HistoryRequest {
        source: args.source,
        key: args.key,
        start: args.start,
        end: args.end,
    };
    let series = pipeline::load_history(settings, &request)?;

    if args.plot {
        println!("{} ({})", series.name, series.source.display_name());
        println!("{}", crate::plot::render_time_series(&series.points, args.width, args.height));
    } else {
        println!("{}", crate::report::format_series_table(&series));
    }

    if let Some(path) = &args.export {
        crate::io::export::write_series(path, &series)?;
        tracing::info!(path = %path.display(), points = series.points.len(), "exported series");
    }

    Ok(())
}

/// Rewrite argv so `econ` defaults to `econ tui`.
///
/// Rules:
/// - `econ`                      -> `econ tui`
/// - `econ --help/--version/-h`  -> unchanged (show top-level help/version)
/// - `econ <subcommand> ...`     -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "banxico" | "fred" | "markets" | "history" | "tui");
    if is_subcommand {
        return argv;
    }

    // Otherwise, leave as-is and let clap report the error.
    argv
}
