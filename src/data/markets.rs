//! Market snapshots (equities, indices, crypto, commodities) from Yahoo Finance.
//!
//! Which price a row reports depends on the session state:
//! - continuous trading with a live price: live price vs. prior regular close
//! - anything else: latest daily close vs. the close before it
//! - a post-market price that differs from the regular price adds an
//!   "After-hours" row, measured against the regular price
//!
//! Instruments with no price from any path are left out of the table.

use std::sync::OnceLock;

use clap::ValueEnum;
use rayon::prelude::*;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::data::get_json;
use crate::domain::{Instrument, MarketRow, Session};
use crate::error::SourceError;

pub const PROVIDER: &str = "Yahoo Finance";
const AFTER_HOURS_EPSILON: f64 = 1e-9;
const DAILY_WINDOW: &str = "5d";

const fn inst(ticker: &'static str, name: &'static str) -> Instrument {
    Instrument { ticker, name }
}

pub static INDICES: &[Instrument] = &[
    inst("^DJI", "Dow Jones"),
    inst("^GSPC", "S&P 500"),
    inst("^IXIC", "Nasdaq"),
    inst("^RUT", "Russell 2000"),
];

pub static CRYPTO: &[Instrument] = &[
    inst("BTC-USD", "Bitcoin"),
    inst("ETH-USD", "Ethereum"),
    inst("USDT-USD", "Tether"),
];

pub static COMMODITIES: &[Instrument] = &[
    inst("GC=F", "Gold"),
    inst("SI=F", "Silver"),
    inst("HG=F", "Copper"),
    inst("CL=F", "Crude Oil (WTI)"),
    inst("BZ=F", "Brent Crude"),
    inst("NG=F", "Natural Gas"),
];

pub static PRIVATE: &[Instrument] = &[
    inst("SPAX.PVT", "SpaceX"),
    inst("OPAI.PVT", "OpenAI"),
    inst("ANTH.PVT", "Anthropic"),
    inst("XAAI.PVT", "xAI"),
    inst("DATB.PVT", "Databricks"),
];

pub static MAG7: &[Instrument] = &[
    inst("AAPL", "Apple"),
    inst("MSFT", "Microsoft"),
    inst("GOOGL", "Alphabet"),
    inst("AMZN", "Amazon"),
    inst("NVDA", "Nvidia"),
    inst("META", "Meta"),
    inst("TSLA", "Tesla"),
];

/// Instrument tables shown on the markets page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MarketGroup {
    Mag7,
    Indices,
    Crypto,
    Commodities,
    Private,
}

impl MarketGroup {
    pub const ALL: [MarketGroup; 5] = [
        MarketGroup::Mag7,
        MarketGroup::Indices,
        MarketGroup::Crypto,
        MarketGroup::Commodities,
        MarketGroup::Private,
    ];

    pub fn instruments(self) -> &'static [Instrument] {
        match self {
            MarketGroup::Mag7 => MAG7,
            MarketGroup::Indices => INDICES,
            MarketGroup::Crypto => CRYPTO,
            MarketGroup::Commodities => COMMODITIES,
            MarketGroup::Private => PRIVATE,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MarketGroup::Mag7 => "Magnificent 7",
            MarketGroup::Indices => "Indices",
            MarketGroup::Crypto => "Crypto",
            MarketGroup::Commodities => "Commodities",
            MarketGroup::Private => "High-valuation private companies",
        }
    }
}

/// Current/previous/extended-hours prices plus the session state string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    #[serde(default)]
    pub market_state: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_previous_close: Option<f64>,
    #[serde(default)]
    pub pre_market_price: Option<f64>,
    #[serde(default)]
    pub post_market_price: Option<f64>,
}

impl QuoteSnapshot {
    /// `REGULAR` (any case, surrounding whitespace ignored) means continuous trading.
    pub fn is_regular_session(&self) -> bool {
        self.market_state
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("REGULAR"))
            .unwrap_or(false)
    }
}

/// Latest daily close and the one before it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyCloses {
    pub last: Option<f64>,
    pub previous: Option<f64>,
}

impl DailyCloses {
    /// `closes` in chronological order.
    pub fn from_closes(closes: &[f64]) -> Self {
        let n = closes.len();
        Self {
            last: closes.last().copied(),
            previous: if n >= 2 { Some(closes[n - 2]) } else { None },
        }
    }
}

/// Access to the quote and daily-bar endpoints.
pub trait MarketApi: Sync {
    fn snapshot(&self, ticker: &str) -> Result<QuoteSnapshot, SourceError>;

    /// Non-null daily closes over a short trailing window, oldest first.
    fn daily_closes(&self, ticker: &str) -> Result<Vec<f64>, SourceError>;
}

fn pct_change(price: f64, base: Option<f64>) -> Option<f64> {
    match base {
        Some(b) if b != 0.0 => Some((price / b - 1.0) * 100.0),
        _ => None,
    }
}

/// Decide which rows an instrument contributes.
///
/// `daily` is only invoked when the regular session price cannot be used.
pub fn select_rows(
    instrument: &Instrument,
    snapshot: &QuoteSnapshot,
    daily: impl FnOnce() -> DailyCloses,
) -> Vec<MarketRow> {
    let regular = snapshot.regular_market_price;

    let (price, base, session) = match regular {
        Some(live) if snapshot.is_regular_session() => {
            (Some(live), snapshot.regular_market_previous_close, Session::Regular)
        }
        _ => {
            let closes = daily();
            (
                closes.last.or(regular),
                closes.previous.or(snapshot.regular_market_previous_close),
                Session::Close,
            )
        }
    };

    let Some(price) = price else {
        return Vec::new();
    };

    let mut rows = vec![MarketRow {
        name: instrument.name.to_string(),
        ticker: instrument.ticker.to_string(),
        price,
        change_pct: pct_change(price, base),
        session,
    }];

    if let (Some(post), Some(reg)) = (snapshot.post_market_price, regular) {
        if (post - reg).abs() > AFTER_HOURS_EPSILON {
            rows.push(MarketRow {
                name: format!("{} (After-hours)", instrument.name),
                ticker: instrument.ticker.to_string(),
                price: post,
                change_pct: pct_change(post, Some(reg)),
                session: Session::AfterHours,
            });
        }
    }

    rows
}

/// Rows for every instrument, in catalogue order.
///
/// Lookups run in parallel. Per-instrument failures only drop that instrument;
/// the call fails only when every snapshot lookup failed and nothing was priced.
pub fn latest_prices(api: &dyn MarketApi, instruments: &[Instrument]) -> Result<Vec<MarketRow>, SourceError> {
    let results: Vec<(Vec<MarketRow>, Option<SourceError>)> = instruments
        .par_iter()
        .map(|instrument| {
            let (snapshot, error) = match api.snapshot(instrument.ticker) {
                Ok(s) => (s, None),
                Err(e) => {
                    tracing::debug!(provider = PROVIDER, ticker = instrument.ticker, error = %e, "snapshot failed");
                    (QuoteSnapshot::default(), Some(e))
                }
            };

            let rows = select_rows(instrument, &snapshot, || match api.daily_closes(instrument.ticker) {
                Ok(closes) => DailyCloses::from_closes(&closes),
                Err(e) => {
                    tracing::debug!(provider = PROVIDER, ticker = instrument.ticker, error = %e, "daily bars failed");
                    DailyCloses::default()
                }
            });

            if rows.is_empty() {
                tracing::debug!(provider = PROVIDER, ticker = instrument.ticker, "no price, omitted");
            }
            (rows, error)
        })
        .collect();

    let all_failed = !results.is_empty() && results.iter().all(|(rows, err)| rows.is_empty() && err.is_some());
    if all_failed {
        if let Some((_, Some(err))) = results.into_iter().next() {
            return Err(err);
        }
        return Ok(Vec::new());
    }

    Ok(results.into_iter().flat_map(|(rows, _)| rows).collect())
}

pub struct YahooClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: OnceLock<Option<String>>,
}

impl YahooClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.http_client()?,
            base_url: settings.yahoo_base_url.trim_end_matches('/').to_string(),
            cookie_url: settings.yahoo_cookie_url.clone(),
            crumb: OnceLock::new(),
        })
    }

    /// The quote endpoint wants a session cookie plus a matching crumb.
    ///
    /// Fetched once per client; when the handshake fails the quote request is
    /// sent without a crumb and may be rejected, which then surfaces as a
    /// per-instrument failure.
    fn crumb(&self) -> Option<&str> {
        self.crumb
            .get_or_init(|| {
                // Only the cookie matters here; the status is usually 404.
                let _ = self.client.get(&self.cookie_url).send();
                let resp = self
                    .client
                    .get(format!("{}/v1/test/getcrumb", self.base_url))
                    .send()
                    .ok()?;
                if !resp.status().is_success() {
                    return None;
                }
                let crumb = resp.text().ok()?.trim().to_string();
                (!crumb.is_empty()).then_some(crumb)
            })
            .as_deref()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResult,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    #[serde(default)]
    result: Vec<QuoteSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartResponse,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl MarketApi for YahooClient {
    fn snapshot(&self, ticker: &str) -> Result<QuoteSnapshot, SourceError> {
        tracing::debug!(provider = PROVIDER, ticker, "quote request");
        let mut req = self
            .client
            .get(format!("{}/v7/finance/quote", self.base_url))
            .query(&[("symbols", ticker)]);
        if let Some(crumb) = self.crumb() {
            req = req.query(&[("crumb", crumb)]);
        }

        let body: QuoteEnvelope = get_json(req, PROVIDER)?;
        Ok(body.quote_response.result.into_iter().next().unwrap_or_default())
    }

    fn daily_closes(&self, ticker: &str) -> Result<Vec<f64>, SourceError> {
        tracing::debug!(provider = PROVIDER, ticker, "daily bars request");
        let req = self
            .client
            .get(format!("{}/v8/finance/chart/{ticker}", self.base_url))
            .query(&[("range", DAILY_WINDOW), ("interval", "1d")]);

        let body: ChartEnvelope = get_json(req, PROVIDER)?;
        let closes = body
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.indicators.quote.into_iter().next())
            .map(|q| q.close.into_iter().flatten().filter(|v| v.is_finite()).collect())
            .unwrap_or_default();
        Ok(closes)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    const APPLE: Instrument = Instrument {
        ticker: "AAPL",
        name: "Apple",
    };

    fn snapshot(state: &str, reg: Option<f64>, prev: Option<f64>, post: Option<f64>) -> QuoteSnapshot {
        QuoteSnapshot {
            market_state: Some(state.to_string()),
            regular_market_price: reg,
            regular_market_previous_close: prev,
            pre_market_price: None,
            post_market_price: post,
        }
    }

    #[test]
    fn regular_session_uses_live_price_without_daily_bars() {
        let snap = snapshot(" regular ", Some(110.0), Some(100.0), None);
        let rows = select_rows(&APPLE, &snap, || panic!("daily bars must not be queried"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session, Session::Regular);
        assert_eq!(rows[0].price, 110.0);
        assert!((rows[0].change_pct.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn closed_market_uses_daily_closes() {
        let snap = snapshot("CLOSED", Some(110.0), Some(100.0), None);
        let rows = select_rows(&APPLE, &snap, || DailyCloses::from_closes(&[90.0, 100.0, 105.0]));
        assert_eq!(rows[0].session, Session::Close);
        assert_eq!(rows[0].price, 105.0);
        assert!((rows[0].change_pct.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn closed_market_falls_back_to_snapshot_when_bars_are_empty() {
        let snap = snapshot("POST", Some(110.0), Some(0.0), None);
        let rows = select_rows(&APPLE, &snap, DailyCloses::default);
        assert_eq!(rows[0].price, 110.0);
        assert_eq!(rows[0].change_pct, None);
    }

    #[test]
    fn after_hours_row_only_when_price_differs() {
        let snap = snapshot("POST", Some(200.0), Some(190.0), Some(202.0));
        let rows = select_rows(&APPLE, &snap, || DailyCloses::from_closes(&[190.0, 200.0]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "Apple (After-hours)");
        assert_eq!(rows[1].session, Session::AfterHours);
        assert!((rows[1].change_pct.unwrap() - 1.0).abs() < 1e-9);

        let same = snapshot("POST", Some(200.0), Some(190.0), Some(200.0));
        let rows = select_rows(&APPLE, &same, || DailyCloses::from_closes(&[190.0, 200.0]));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn instrument_without_any_price_is_omitted() {
        let rows = select_rows(&APPLE, &QuoteSnapshot::default(), DailyCloses::default);
        assert!(rows.is_empty());
    }

    struct FakeMarket {
        snapshots: HashMap<&'static str, QuoteSnapshot>,
        closes: HashMap<&'static str, Vec<f64>>,
        fail_all: bool,
        daily_calls: Mutex<usize>,
    }

    impl MarketApi for FakeMarket {
        fn snapshot(&self, ticker: &str) -> Result<QuoteSnapshot, SourceError> {
            if self.fail_all {
                return Err(SourceError::Status {
                    provider: PROVIDER,
                    status: 401,
                });
            }
            Ok(self.snapshots.get(ticker).cloned().unwrap_or_default())
        }

        fn daily_closes(&self, ticker: &str) -> Result<Vec<f64>, SourceError> {
            *self.daily_calls.lock().unwrap() += 1;
            if self.fail_all {
                return Err(SourceError::transport(PROVIDER, "connection refused"));
            }
            Ok(self.closes.get(ticker).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn group_keeps_catalogue_order_and_drops_unpriced() {
        let mut snapshots = HashMap::new();
        snapshots.insert("^GSPC", snapshot("REGULAR", Some(6000.0), Some(5940.0), None));
        let mut closes = HashMap::new();
        closes.insert("^DJI", vec![44000.0, 44440.0]);
        let api = FakeMarket {
            snapshots,
            closes,
            fail_all: false,
            daily_calls: Mutex::new(0),
        };

        let rows = latest_prices(&api, INDICES).unwrap();
        let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["^DJI", "^GSPC"]);
        // ^DJI, ^IXIC and ^RUT needed the daily window.
        assert_eq!(*api.daily_calls.lock().unwrap(), 3);
    }

    #[test]
    fn provider_outage_is_an_error() {
        let api = FakeMarket {
            snapshots: HashMap::new(),
            closes: HashMap::new(),
            fail_all: true,
            daily_calls: Mutex::new(0),
        };
        let err = latest_prices(&api, CRYPTO).unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 401, .. }));
    }

    #[test]
    fn decodes_chart_closes_with_nulls() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[10.5,null,11.0]}]}}],"error":null}}"#;
        let env: ChartEnvelope = serde_json::from_str(json).unwrap();
        let quote = &env.chart.result.unwrap()[0].indicators.quote[0];
        let closes: Vec<f64> = quote.close.iter().flatten().copied().collect();
        assert_eq!(closes, vec![10.5, 11.0]);
    }
}
