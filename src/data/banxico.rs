//! Banxico SIE API integration (Mexican central bank series).
//!
//! Two query shapes:
//! - `/{id,id,...}/datos/oportuno`: the most recent observation of each series
//! - `/{id}/datos/{start}/{end}`: observations over an explicit range
//!
//! Latest values go through a two-step sequence: the batched "most recent"
//! query first, then one trailing two-year range query for any series that came
//! back without a usable observation.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Settings;
use crate::data::get_json;
use crate::data::normalize::{DateFormat, NormalizeRule, RawObservation, latest_on_or_before, normalize};
use crate::data::period::period_label;
use crate::domain::{
    LatestRow, MissingReason, PeriodRule, RowStatus, SeriesDescriptor, SeriesSource, TimeSeries, ValueFormat,
    ValueScaling, find_descriptor,
};
use crate::error::SourceError;

pub const PROVIDER: &str = "Banxico";
const TOKEN_HEADER: &str = "Bmx-Token";
const PLACEHOLDERS: &[&str] = &["N/E"];
const FALLBACK_WINDOW_MONTHS: u32 = 24;

/// Default start of a history query.
pub fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN)
}

const fn series(
    key: &'static str,
    series_id: &'static str,
    display_name: &'static str,
    format: ValueFormat,
) -> SeriesDescriptor {
    SeriesDescriptor {
        key,
        series_id,
        display_name,
        scaling: ValueScaling::None,
        period: PeriodRule::ExactDay,
        format,
    }
}

const fn inflation(key: &'static str, series_id: &'static str, display_name: &'static str) -> SeriesDescriptor {
    SeriesDescriptor {
        key,
        series_id,
        display_name,
        scaling: ValueScaling::FractionalPercent,
        period: PeriodRule::HalfMonthYoY,
        format: ValueFormat::Fixed(2),
    }
}

/// Card order is catalogue order.
pub static SERIES: &[SeriesDescriptor] = &[
    series("tasa_objetivo", "SF61745", "Tasa objetivo", ValueFormat::Fixed(2)),
    series("tiie_fondeo", "SF331451", "TIIE Fondeo", ValueFormat::Fixed(2)),
    series("tiie_28", "SF43783", "TIIE 28", ValueFormat::Fixed(4)),
    series("cetes_28", "SF60633", "Cetes 28", ValueFormat::Fixed(2)),
    series("fix", "SF43718", "Tipo de cambio FIX", ValueFormat::Fixed(4)),
    series("reservas", "SF43707", "Reservas intl. (mill. dls.)", ValueFormat::Fixed(1)),
    inflation("inflacion_general", "SP74833", "Inflación anual (quincenal)"),
    inflation("inflacion_subyacente", "SP74834", "Inflación subyacente anual (quincenal)"),
    series("udis", "SP68257", "UDIS", ValueFormat::Fixed(6)),
];

pub fn descriptor(key: &str) -> Result<&'static SeriesDescriptor, SourceError> {
    find_descriptor(SERIES, key).ok_or_else(|| SourceError::UnknownKey { key: key.to_string() })
}

fn rule(descriptor: &SeriesDescriptor) -> NormalizeRule<'static> {
    NormalizeRule {
        date_format: DateFormat::DayMonthYear,
        placeholders: PLACEHOLDERS,
        scaling: descriptor.scaling,
    }
}

/// One series as returned inside the `bmx.series` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSeries {
    #[serde(rename = "idSerie")]
    pub id: String,
    #[serde(rename = "titulo", default)]
    pub title: Option<String>,
    #[serde(rename = "datos", default)]
    pub observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    bmx: SeriesList,
}

#[derive(Debug, Deserialize)]
struct SeriesList {
    #[serde(default)]
    series: Vec<RawSeries>,
}

/// Access to the SIE endpoints.
pub trait BanxicoApi {
    /// Most recent observation of each series, in one request.
    fn latest(&self, series_ids: &[&str]) -> Result<Vec<RawSeries>, SourceError>;

    /// Observations of one series between `start` and `end` (inclusive).
    fn range(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawSeries>, SourceError>;
}

pub struct BanxicoClient {
    client: Client,
    base_url: String,
    token: String,
}

impl BanxicoClient {
    /// Fails with `MissingConfig` when `BANXICO_TOKEN` is not set.
    pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
        let token = settings.require_banxico_token()?.to_string();
        Ok(Self {
            client: settings.http_client()?,
            base_url: settings.banxico_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn fetch(&self, path: &str) -> Result<Vec<RawSeries>, SourceError> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(provider = PROVIDER, %path, "request");
        let req = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json");
        let body: Envelope = get_json(req, PROVIDER)?;
        Ok(body.bmx.series)
    }
}

impl BanxicoApi for BanxicoClient {
    fn latest(&self, series_ids: &[&str]) -> Result<Vec<RawSeries>, SourceError> {
        self.fetch(&format!("{}/datos/oportuno", series_ids.join(",")))
    }

    fn range(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawSeries>, SourceError> {
        self.fetch(&format!(
            "{series_id}/datos/{}/{}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ))
    }
}

/// Latest usable value (on or before `today`) of every catalogue series.
///
/// Transport failures of either query propagate; a series with no data after
/// both steps becomes a `Missing` row instead.
pub fn latest_all(api: &dyn BanxicoApi, today: NaiveDate) -> Result<Vec<LatestRow>, SourceError> {
    let ids: Vec<&str> = SERIES.iter().map(|d| d.series_id).collect();
    let primary = api.latest(&ids)?;
    let by_id: HashMap<&str, &RawSeries> = primary.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut rows = Vec::with_capacity(SERIES.len());
    for descriptor in SERIES {
        let entry = by_id.get(descriptor.series_id).copied();
        let mut title = entry.and_then(|s| s.title.clone());

        let mut resolved = entry
            .and_then(|s| latest_on_or_before(&s.observations, &rule(descriptor), today))
            .map(|obs| (obs, RowStatus::Primary));

        if resolved.is_none() {
            let window = fallback_range(api, descriptor, today)?;
            if let Some(series) = window.first() {
                title = title.or_else(|| series.title.clone());
                resolved = latest_on_or_before(&series.observations, &rule(descriptor), today)
                    .map(|obs| (obs, RowStatus::Fallback));
            }
        }

        let name = title.unwrap_or_else(|| descriptor.display_name.to_string());
        let row = match resolved {
            Some((obs, status)) => LatestRow {
                key: descriptor.key.to_string(),
                series_id: descriptor.series_id.to_string(),
                name,
                observation: Some(obs),
                period_label: period_label(obs.date, descriptor.period),
                value_text: None,
                status,
            },
            None => {
                let reason = if entry.is_none() {
                    MissingReason::NotInBatch
                } else {
                    MissingReason::NoRecentData
                };
                tracing::warn!(provider = PROVIDER, key = descriptor.key, ?reason, "no usable observation");
                LatestRow::missing(descriptor, name, reason)
            }
        };
        rows.push(row);
    }

    Ok(rows)
}

fn fallback_range(
    api: &dyn BanxicoApi,
    descriptor: &SeriesDescriptor,
    today: NaiveDate,
) -> Result<Vec<RawSeries>, SourceError> {
    let start = today
        .checked_sub_months(Months::new(FALLBACK_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN);
    tracing::info!(
        provider = PROVIDER,
        key = descriptor.key,
        series_id = descriptor.series_id,
        %start,
        "no recent observation, querying trailing window"
    );
    api.range(descriptor.series_id, start, today)
}

/// Observations of one catalogue series between `start` and `end`.
pub fn series_history(
    api: &dyn BanxicoApi,
    key: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<TimeSeries, SourceError> {
    let descriptor = descriptor(key)?;
    let raw = api.range(descriptor.series_id, start, end)?;

    let (name, points) = match raw.first() {
        Some(series) => (
            series.title.clone().unwrap_or_else(|| descriptor.display_name.to_string()),
            normalize(&series.observations, &rule(descriptor)),
        ),
        None => (descriptor.display_name.to_string(), Vec::new()),
    };

    Ok(TimeSeries {
        source: SeriesSource::Banxico,
        key: descriptor.key.to_string(),
        name,
        points,
    })
}
