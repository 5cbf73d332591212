//! Runtime configuration read from the environment (and `.env`).
//!
//! Secrets are optional here: a missing token only fails the data path that
//! needs it, at first use, so the other dashboard sections keep working.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::blocking::Client;

use crate::error::{AppError, SourceError};

pub const DEFAULT_BANXICO_BASE_URL: &str = "https://www.banxico.org.mx/SieAPIRest/service/v1/series";
pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_TIME_ZONE: &str = "America/Mexico_City";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Settings {
    pub banxico_token: Option<String>,
    pub fred_api_key: Option<String>,
    pub banxico_base_url: String,
    pub fred_base_url: String,
    pub yahoo_base_url: String,
    /// Visited once to obtain the session cookie the quote endpoint expects.
    pub yahoo_cookie_url: String,
    /// Per-request ceiling; there is no other cancellation.
    pub http_timeout: Duration,
    /// Zone that defines "today" for latest-value selection.
    pub time_zone: Tz,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout = match non_empty("ECON_HTTP_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(AppError::new(
                        2,
                        format!("Invalid ECON_HTTP_TIMEOUT_SECS '{raw}': expected a positive integer."),
                    ));
                }
            },
        };

        let tz_name = non_empty("ECON_TZ").unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
        let time_zone = tz_name
            .parse::<Tz>()
            .map_err(|e| AppError::new(2, format!("Invalid ECON_TZ '{tz_name}': {e}")))?;

        Ok(Self {
            banxico_token: non_empty("BANXICO_TOKEN"),
            fred_api_key: non_empty("FRED_API_KEY"),
            banxico_base_url: non_empty("BANXICO_BASE_URL").unwrap_or_else(|| DEFAULT_BANXICO_BASE_URL.to_string()),
            fred_base_url: non_empty("FRED_BASE_URL").unwrap_or_else(|| DEFAULT_FRED_BASE_URL.to_string()),
            yahoo_base_url: non_empty("YAHOO_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
            yahoo_cookie_url: non_empty("YAHOO_COOKIE_URL").unwrap_or_else(|| DEFAULT_YAHOO_COOKIE_URL.to_string()),
            http_timeout,
            time_zone,
        })
    }

    pub fn require_banxico_token(&self) -> Result<&str, SourceError> {
        self.banxico_token
            .as_deref()
            .ok_or(SourceError::MissingConfig { var: "BANXICO_TOKEN" })
    }

    pub fn require_fred_api_key(&self) -> Result<&str, SourceError> {
        self.fred_api_key
            .as_deref()
            .ok_or(SourceError::MissingConfig { var: "FRED_API_KEY" })
    }

    /// The current calendar date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.time_zone).date_naive()
    }

    /// Blocking HTTP client shared by the provider adapters.
    pub fn http_client(&self) -> Result<Client, SourceError> {
        Client::builder()
            .timeout(self.http_timeout)
            .cookie_store(true)
            .user_agent(concat!("econ-dash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::transport("HTTP client", e))
    }
}
