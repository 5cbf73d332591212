//! FRED API integration for US macro indicators.

use std::collections::HashSet;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Settings;
use crate::data::get_json;
use crate::data::normalize::{DateFormat, NormalizeRule, RawObservation, latest_of, normalize};
use crate::data::period::period_label;
use crate::data::yoy::year_over_year;
use crate::domain::{
    LatestRow, MissingReason, Observation, PeriodRule, RowStatus, SeriesDescriptor, SeriesSource, TimeSeries,
    ValueFormat, ValueScaling, find_descriptor,
};
use crate::error::SourceError;

pub const PROVIDER: &str = "FRED";
const PLACEHOLDERS: &[&str] = &["."];

const SERIES_TARGET_LOW: &str = "DFEDTARL";
const SERIES_TARGET_HIGH: &str = "DFEDTARU";

const fn series(
    key: &'static str,
    series_id: &'static str,
    display_name: &'static str,
    period: PeriodRule,
    format: ValueFormat,
) -> SeriesDescriptor {
    SeriesDescriptor {
        key,
        series_id,
        display_name,
        scaling: ValueScaling::None,
        period,
        format,
    }
}

/// Series available for charting.
pub static SERIES: &[SeriesDescriptor] = &[
    series("policy_rate", "FEDFUNDS", "Policy rate", PeriodRule::Month, ValueFormat::Percent(2)),
    series("inflation_pce", "PCEPI", "Inflation (PCE)", PeriodRule::Month, ValueFormat::Fixed(3)),
    series("unemployment", "UNRATE", "Unemployment Rate", PeriodRule::Month, ValueFormat::Percent(2)),
    series("gdp_growth", "A191RL1Q225SBEA", "Gross Domestic Product", PeriodRule::Quarter, ValueFormat::Percent(1)),
];

/// Key-indicator cards, in display order.
pub static INDICATORS: &[SeriesDescriptor] = &[
    series(
        "policy_range",
        "DFEDTARL,DFEDTARU",
        "Fed Funds Target Range",
        PeriodRule::IsoDate,
        ValueFormat::Percent(2),
    ),
    series("inflation_pce", "PCEPI", "Inflation (PCE)", PeriodRule::Month, ValueFormat::Percent(1)),
    series("unemployment", "UNRATE", "Unemployment Rate", PeriodRule::Month, ValueFormat::Percent(2)),
    series("gdp_growth", "A191RL1Q225SBEA", "Real GDP (q/q SAAR)", PeriodRule::Quarter, ValueFormat::Percent(1)),
];

pub fn descriptor(key: &str) -> Result<&'static SeriesDescriptor, SourceError> {
    find_descriptor(SERIES, key).ok_or_else(|| SourceError::UnknownKey { key: key.to_string() })
}

const RULE: NormalizeRule<'static> = NormalizeRule {
    date_format: DateFormat::Iso,
    placeholders: PLACEHOLDERS,
    scaling: ValueScaling::None,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Default start of a chart query.
pub fn default_history_start() -> NaiveDate {
    ymd(2015, 1, 1)
}

/// Access to `fred/series/observations`.
pub trait FredApi {
    fn observations(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawObservation>, SourceError>;
}

pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FredClient {
    /// Fails with `MissingConfig` when `FRED_API_KEY` is not set.
    pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
        let api_key = settings.require_fred_api_key()?.to_string();
        Ok(Self {
            client: settings.http_client()?,
            base_url: settings.fred_base_url.clone(),
            api_key,
        })
    }
}

impl FredApi for FredClient {
    fn observations(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawObservation>, SourceError> {
        tracing::debug!(provider = PROVIDER, series_id, %start, ?end, "request");
        let start = start.to_string();
        let mut req = self.client.get(&self.base_url).query(&[
            ("series_id", series_id),
            ("api_key", self.api_key.as_str()),
            ("file_type", "json"),
            ("observation_start", start.as_str()),
        ]);

        if let Some(date) = end {
            req = req.query(&[("observation_end", date.to_string())]);
        }

        let body: ObservationsResponse = get_json(req, PROVIDER)?;
        Ok(body.observations)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

fn fetch_series(api: &dyn FredApi, series_id: &str, start: NaiveDate) -> Result<Vec<Observation>, SourceError> {
    let raw = api.observations(series_id, start, None)?;
    Ok(normalize(&raw, &RULE))
}

/// One chart series between `start` and `end`.
pub fn time_series(
    api: &dyn FredApi,
    key: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<TimeSeries, SourceError> {
    let descriptor = descriptor(key)?;
    let raw = api.observations(descriptor.series_id, start, end)?;
    Ok(TimeSeries {
        source: SeriesSource::Fred,
        key: descriptor.key.to_string(),
        name: descriptor.display_name.to_string(),
        points: normalize(&raw, &RULE),
    })
}

/// Latest key indicators, dated on or before `today`.
///
/// The PCE card is omitted entirely when no observation a year back exists;
/// the other cards become `Missing` rows when their series is empty.
pub fn latest_all(api: &dyn FredApi, today: NaiveDate) -> Result<Vec<LatestRow>, SourceError> {
    let mut rows = Vec::with_capacity(INDICATORS.len());
    for indicator in INDICATORS {
        let row = match indicator.key {
            "policy_range" => Some(policy_range(api, indicator, today)?),
            "inflation_pce" => pce_inflation(api, indicator, today)?,
            _ => Some(latest_level(api, indicator, today)?),
        };
        if let Some(row) = row {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn policy_range(api: &dyn FredApi, indicator: &SeriesDescriptor, today: NaiveDate) -> Result<LatestRow, SourceError> {
    let start = ymd(2015, 1, 1);
    let low = fetch_series(api, SERIES_TARGET_LOW, start)?;
    let high = fetch_series(api, SERIES_TARGET_HIGH, start)?;

    let Some((date, low_v, high_v)) = latest_common(&low, &high, today) else {
        tracing::warn!(provider = PROVIDER, key = indicator.key, "no common target range date");
        return Ok(LatestRow::missing(indicator, indicator.display_name, MissingReason::NoRecentData));
    };

    Ok(LatestRow {
        key: indicator.key.to_string(),
        series_id: indicator.series_id.to_string(),
        name: indicator.display_name.to_string(),
        observation: Some(Observation::new(date, (low_v + high_v) / 2.0)),
        period_label: period_label(date, indicator.period),
        value_text: Some(format!("{low_v:.2}% to {high_v:.2}%")),
        status: RowStatus::Primary,
    })
}

fn pce_inflation(
    api: &dyn FredApi,
    indicator: &SeriesDescriptor,
    today: NaiveDate,
) -> Result<Option<LatestRow>, SourceError> {
    let index: Vec<Observation> = fetch_series(api, indicator.series_id, ymd(2010, 1, 1))?
        .into_iter()
        .filter(|o| o.date <= today)
        .collect();

    let Some(yoy) = year_over_year(&index) else {
        tracing::warn!(provider = PROVIDER, key = indicator.key, "not enough history for year-over-year");
        return Ok(None);
    };

    Ok(Some(LatestRow {
        key: indicator.key.to_string(),
        series_id: indicator.series_id.to_string(),
        name: indicator.display_name.to_string(),
        observation: Some(Observation::new(yoy.date, yoy.pct)),
        period_label: period_label(yoy.date, indicator.period),
        value_text: None,
        status: RowStatus::Primary,
    }))
}

fn latest_level(api: &dyn FredApi, indicator: &SeriesDescriptor, today: NaiveDate) -> Result<LatestRow, SourceError> {
    let start = if indicator.key == "gdp_growth" { ymd(2015, 1, 1) } else { ymd(2010, 1, 1) };
    let series = fetch_series(api, indicator.series_id, start)?;

    let Some(obs) = latest_of(&series, today) else {
        tracing::warn!(provider = PROVIDER, key = indicator.key, "no usable observation");
        return Ok(LatestRow::missing(indicator, indicator.display_name, MissingReason::NoRecentData));
    };

    Ok(LatestRow {
        key: indicator.key.to_string(),
        series_id: indicator.series_id.to_string(),
        name: indicator.display_name.to_string(),
        observation: Some(obs),
        period_label: period_label(obs.date, indicator.period),
        value_text: None,
        status: RowStatus::Primary,
    })
}

/// Latest date on or before `today` present in both series, with both values.
fn latest_common(a: &[Observation], b: &[Observation], today: NaiveDate) -> Option<(NaiveDate, f64, f64)> {
    let dates: HashSet<NaiveDate> = b.iter().map(|o| o.date).collect();
    let date = a
        .iter()
        .map(|o| o.date)
        .filter(|d| *d <= today && dates.contains(d))
        .max()?;
    let a_v = latest_of(a, date)?.value;
    let b_v = latest_of(b, date)?.value;
    Some((date, a_v, b_v))
}
