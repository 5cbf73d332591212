//! Command-line parsing for the economic indicators dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! provider and presentation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::MarketGroup;
use crate::domain::SeriesSource;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "econ",
    version,
    about = "Economic indicators dashboard (Banxico, FRED, market prices)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the latest Banxico indicators.
    Banxico,
    /// Print the latest FRED key indicators.
    Fred,
    /// Print market prices, for one group or all of them.
    Markets(MarketsArgs),
    /// Print, plot or export one time series.
    History(HistoryArgs),
    /// Launch the interactive dashboard.
    ///
    /// Tabs for Banxico, the Fed and markets, plus a series chart.
    Tui,
}

#[derive(Debug, Args, Clone)]
pub struct MarketsArgs {
    /// Only this instrument group.
    #[arg(short, long, value_enum)]
    pub group: Option<MarketGroup>,
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Provider of the series.
    #[arg(short, long, value_enum)]
    pub source: SeriesSource,

    /// Series key (e.g. `fix`, `tiie_28`, `unemployment`).
    #[arg(short, long)]
    pub key: String,

    /// First date (YYYY-MM-DD); defaults to 2015-01-01.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Render an ASCII plot instead of the table.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the series (`.json` for JSON, CSV otherwise).
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_history_dates() {
        let cli = Cli::try_parse_from([
            "econ", "history", "--source", "fred", "--key", "unemployment", "--start", "2020-01-01", "--plot",
        ])
        .unwrap();
        let Command::History(args) = cli.command else {
            panic!("expected history");
        };
        assert_eq!(args.source, SeriesSource::Fred);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(args.end, None);
        assert!(args.plot);
    }

    #[test]
    fn parses_market_group() {
        let cli = Cli::try_parse_from(["econ", "markets", "--group", "mag7"]).unwrap();
        let Command::Markets(args) = cli.command else {
            panic!("expected markets");
        };
        assert_eq!(args.group, Some(MarketGroup::Mag7));
    }

    #[test]
    fn rejects_bad_date() {
        assert!(Cli::try_parse_from(["econ", "history", "-s", "banxico", "-k", "fix", "--start", "18/12/2025"]).is_err());
    }
}
