//! Shared loading logic used by both CLI and TUI front-ends.
//!
//! Every dashboard section is loaded on its own and returns a `Section<T>`, so a
//! failing provider (missing token, outage) only blanks its own section. The
//! CLI and the TUI then focus on presentation (printing vs widgets).

use chrono::NaiveDate;

use crate::config::Settings;
use crate::data::{BanxicoClient, FredClient, MarketGroup, YahooClient, banxico, fred, markets};
use crate::domain::{LatestRow, MarketRow, SeriesSource, TimeSeries};
use crate::error::SourceError;

/// Outcome of loading one section.
pub type Section<T> = Result<T, SourceError>;

/// Rows of one instrument group.
#[derive(Debug, Clone)]
pub struct MarketSection {
    pub group: MarketGroup,
    pub rows: Section<Vec<MarketRow>>,
}

/// Everything shown on the dashboard tabs.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub banxico: Section<Vec<LatestRow>>,
    pub fred: Section<Vec<LatestRow>>,
    pub markets: Section<Vec<MarketSection>>,
}

pub fn load_banxico(settings: &Settings) -> Section<Vec<LatestRow>> {
    let client = BanxicoClient::from_settings(settings)?;
    banxico::latest_all(&client, settings.today())
}

pub fn load_fred(settings: &Settings) -> Section<Vec<LatestRow>> {
    let client = FredClient::from_settings(settings)?;
    fred::latest_all(&client, settings.today())
}

/// Each group keeps its own result; only client construction fails the whole section.
pub fn load_markets(settings: &Settings, groups: &[MarketGroup]) -> Section<Vec<MarketSection>> {
    let client = YahooClient::from_settings(settings)?;
    Ok(groups
        .iter()
        .map(|&group| MarketSection {
            group,
            rows: markets::latest_prices(&client, group.instruments()),
        })
        .collect())
}

/// Load all three tabs; the providers are independent and queried concurrently.
pub fn load_dashboard(settings: &Settings) -> Dashboard {
    let (banxico, (fred, markets)) = rayon::join(
        || load_banxico(settings),
        || rayon::join(|| load_fred(settings), || load_markets(settings, &MarketGroup::ALL)),
    );
    Dashboard { banxico, fred, markets }
}

/// A chart request before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub source: SeriesSource,
    pub key: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl HistoryRequest {
    /// Concrete `(start, end)`; defaults are the provider's history start and `today`.
    pub fn resolve_range(&self, today: NaiveDate) -> Section<(NaiveDate, NaiveDate)> {
        let start = self.start.unwrap_or_else(|| match self.source {
            SeriesSource::Banxico => banxico::default_history_start(),
            SeriesSource::Fred => fred::default_history_start(),
        });
        let end = self.end.unwrap_or(today);
        if end < start {
            return Err(SourceError::InvalidRange { start, end });
        }
        Ok((start, end))
    }
}

pub fn load_history(settings: &Settings, request: &HistoryRequest) -> Section<TimeSeries> {
    let (start, end) = request.resolve_range(settings.today())?;
    tracing::debug!(source = ?request.source, key = %request.key, %start, %end, "loading history");

    match request.source {
        SeriesSource::Banxico => {
            let client = BanxicoClient::from_settings(settings)?;
            banxico::series_history(&client, &request.key, start, end)
        }
        SeriesSource::Fred => {
            let client = FredClient::from_settings(settings)?;
            fred::time_series(&client, &request.key, start, Some(end))
        }
    }
}

/// Chartable keys and display names for a provider.
pub fn series_choices(source: SeriesSource) -> Vec<(&'static str, &'static str)> {
    let catalogue = match source {
        SeriesSource::Banxico => banxico::SERIES,
        SeriesSource::Fred => fred::SERIES,
    };
    catalogue.iter().map(|d| (d.key, d.display_name)).collect()
}
