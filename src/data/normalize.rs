//! Observation normalizer.
//!
//! Providers hand us `(date-text, value-text)` pairs with their own date
//! encodings and "no data" sentinels. Everything that cannot be turned into a
//! finite number on a valid date is dropped here rather than reported: feeds
//! routinely carry malformed trailing rows.
//!
//! Tie-break: observations are stable-sorted by date, and when a feed repeats a
//! date the entry that appears later in the input wins latest-value selection.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{Observation, ValueScaling};

/// A raw provider observation.
///
/// Banxico uses `fecha`/`dato`, FRED uses `date`/`value`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawObservation {
    #[serde(alias = "fecha", default)]
    pub date: String,
    #[serde(alias = "dato", default)]
    pub value: Option<String>,
}

impl RawObservation {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            value: Some(value.into()),
        }
    }
}

/// Provider date encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `30/11/2025`
    DayMonthYear,
    /// `2025-11-30`
    Iso,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }

    pub fn parse(self, raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw.trim(), self.pattern()).ok()
    }
}

/// Per-series parsing rules.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeRule<'a> {
    pub date_format: DateFormat,
    /// Value tokens meaning "no data" (compared after trimming).
    pub placeholders: &'a [&'a str],
    pub scaling: ValueScaling,
}

/// Parse a provider value string.
///
/// Returns `None` for absent, empty or placeholder values, and for anything that
/// is not a finite number once thousands separators are stripped.
pub fn parse_value(raw: Option<&str>, placeholders: &[&str]) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || placeholders.contains(&trimmed) {
        return None;
    }
    let v = trimmed.replace(',', "").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Turn raw pairs into an ascending series, dropping unusable rows.
pub fn normalize(raw: &[RawObservation], rule: &NormalizeRule<'_>) -> Vec<Observation> {
    let mut out: Vec<Observation> = raw
        .iter()
        .filter_map(|obs| {
            let date = rule.date_format.parse(&obs.date)?;
            let value = parse_value(obs.value.as_deref(), rule.placeholders)?;
            Some(Observation::new(date, rule.scaling.apply(value)))
        })
        .collect();
    out.sort_by_key(|o| o.date);
    out
}

/// Latest usable observation dated on or before `today`.
pub fn latest_on_or_before(
    raw: &[RawObservation],
    rule: &NormalizeRule<'_>,
    today: NaiveDate,
) -> Option<Observation> {
    normalize(raw, rule).into_iter().filter(|o| o.date <= today).last()
}

/// Latest observation of an already-normalized series, on or before `today`.
pub fn latest_of(series: &[Observation], today: NaiveDate) -> Option<Observation> {
    series.iter().filter(|o| o.date <= today).last().copied()
}
