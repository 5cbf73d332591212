//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by any of the provider adapters
//! - rendered by the CLI tables or the TUI cards
//! - exported to CSV/JSON

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Unit handling applied after a raw value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueScaling {
    /// Use the parsed value as-is.
    None,
    /// Year-over-year rates that the provider sometimes encodes as a fraction
    /// (`0.046` for 4.6%). Values below `1.0` are multiplied by 100; larger
    /// values are already percentages and are left alone.
    FractionalPercent,
}

impl ValueScaling {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            ValueScaling::None => value,
            ValueScaling::FractionalPercent if value < 1.0 => value * 100.0,
            ValueScaling::FractionalPercent => value,
        }
    }
}

/// How a card describes the date of its observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodRule {
    /// `18 - DEC - 2025`
    ExactDay,
    /// `2Q DEC - 2024 to 2Q DEC - 2025` (semi-monthly annual rates).
    HalfMonthYoY,
    /// `September 2025`
    Month,
    /// `Q2 2025`
    Quarter,
    /// `2025-12-18`
    IsoDate,
}

/// How a card renders its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Plain fixed-point number without grouping separators.
    Fixed(u8),
    /// Fixed-point number followed by `%`.
    Percent(u8),
}

/// A series known at startup: stable key, provider id and presentation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesDescriptor {
    pub key: &'static str,
    pub series_id: &'static str,
    pub display_name: &'static str,
    pub scaling: ValueScaling,
    pub period: PeriodRule,
    pub format: ValueFormat,
}

/// Look up a descriptor by key in a catalogue.
pub fn find_descriptor<'a>(catalogue: &'a [SeriesDescriptor], key: &str) -> Option<&'a SeriesDescriptor> {
    catalogue.iter().find(|d| d.key == key)
}

/// Which provider a time series comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeriesSource {
    Banxico,
    Fred,
}

impl SeriesSource {
    pub fn display_name(self) -> &'static str {
        match self {
            SeriesSource::Banxico => "Banxico",
            SeriesSource::Fred => "FRED",
        }
    }
}

/// A single parsed (date, value) data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Why a latest-value row has no observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// The series id was absent from the primary batched response, and the
    /// wide-range query returned nothing usable either.
    NotInBatch,
    /// The series was present but had no usable observation, in the primary
    /// response nor in the wide-range query.
    NoRecentData,
}

/// How a latest-value row was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Taken from the "most recent observation" query.
    Primary,
    /// Taken from the trailing wide-range query.
    Fallback,
    Missing(MissingReason),
}

/// The latest usable value of one series, ready for a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestRow {
    pub key: String,
    pub series_id: String,
    pub name: String,
    pub observation: Option<Observation>,
    /// Empty when there is no observation.
    pub period_label: String,
    /// Provider-defined rendering that replaces the numeric format
    /// (e.g. a `4.25% to 4.50%` target range).
    pub value_text: Option<String>,
    pub status: RowStatus,
}

impl LatestRow {
    pub fn missing(descriptor: &SeriesDescriptor, name: impl Into<String>, reason: MissingReason) -> Self {
        Self {
            key: descriptor.key.to_string(),
            series_id: descriptor.series_id.to_string(),
            name: name.into(),
            observation: None,
            period_label: String::new(),
            value_text: None,
            status: RowStatus::Missing(reason),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.observation.map(|o| o.date)
    }

    pub fn value(&self) -> Option<f64> {
        self.observation.map(|o| o.value)
    }
}

/// An ordered (ascending by date) series for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub source: SeriesSource,
    pub key: String,
    pub name: String,
    pub points: Vec<Observation>,
}

/// Which price a market row reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Session {
    /// Live price during continuous trading.
    Regular,
    /// Most recent daily close.
    Close,
    /// Post-market price, reported next to the regular row.
    AfterHours,
}

impl Session {
    pub fn display_name(self) -> &'static str {
        match self {
            Session::Regular => "Regular",
            Session::Close => "Close",
            Session::AfterHours => "After-hours",
        }
    }
}

/// One line of a market table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRow {
    pub name: String,
    pub ticker: String,
    pub price: f64,
    pub change_pct: Option<f64>,
    pub session: Session,
}

/// A traded instrument: provider ticker plus display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub ticker: &'static str,
    pub name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_percent_scales_only_below_one() {
        let s = ValueScaling::FractionalPercent;
        assert!((s.apply(0.046) - 4.6).abs() < 1e-12);
        assert_eq!(s.apply(1.0), 1.0);
        assert_eq!(s.apply(3.72), 3.72);
        assert_eq!(ValueScaling::None.apply(0.046), 0.046);
    }
}
