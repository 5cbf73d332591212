//! Blocking provider clients against a local mock server.

use chrono::NaiveDate;
use econ_dash::config::Settings;
use econ_dash::data::banxico::{self, BanxicoApi};
use econ_dash::data::markets;
use econ_dash::data::{BanxicoClient, FredClient, YahooClient, fred};
use econ_dash::domain::{Instrument, RowStatus, Session};
use econ_dash::error::SourceError;
use httpmock::prelude::*;
use serde_json::json;

fn settings_for(server: &MockServer) -> Settings {
    let banxico = server.url("/series");
    let fred = server.url("/fred/series/observations");
    let yahoo = server.base_url();
    let cookie = server.url("/cookie");
    Settings::from_lookup(move |name| match name {
        "BANXICO_TOKEN" => Some("test-token".to_string()),
        "FRED_API_KEY" => Some("test-key".to_string()),
        "BANXICO_BASE_URL" => Some(banxico.clone()),
        "FRED_BASE_URL" => Some(fred.clone()),
        "YAHOO_BASE_URL" => Some(yahoo.clone()),
        "YAHOO_COOKIE_URL" => Some(cookie.clone()),
        "ECON_HTTP_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn banxico_range_sends_token_and_decodes_envelope() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/series/SF43718/datos/2025-12-01/2025-12-05")
            .header("Bmx-Token", "test-token");
        then.status(200).json_body(json!({
            "bmx": {"series": [{
                "idSerie": "SF43718",
                "titulo": "Tipo de cambio FIX",
                "datos": [
                    {"fecha": "01/12/2025", "dato": "18.3150"},
                    {"fecha": "02/12/2025", "dato": "N/E"}
                ]
            }]}
        }));
    });

    let client = BanxicoClient::from_settings(&settings_for(&server)).unwrap();
    let series = client.range("SF43718", ymd(2025, 12, 1), ymd(2025, 12, 5)).unwrap();

    mock.assert();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].title.as_deref(), Some("Tipo de cambio FIX"));
    assert_eq!(series[0].observations.len(), 2);
}

#[test]
fn banxico_latest_all_uses_one_batched_request_when_data_is_present() {
    let server = MockServer::start();
    let ids: Vec<&str> = banxico::SERIES.iter().map(|d| d.series_id).collect();
    let series: Vec<_> = ids
        .iter()
        .map(|id| json!({"idSerie": id, "datos": [{"fecha": "15/12/2025", "dato": "1,234.5"}]}))
        .collect();
    let mock = server.mock(|when, then| {
        when.method(GET).path(format!("/series/{}/datos/oportuno", ids.join(",")));
        then.status(200).json_body(json!({"bmx": {"series": series}}));
    });

    let settings = settings_for(&server);
    let client = BanxicoClient::from_settings(&settings).unwrap();
    let rows = banxico::latest_all(&client, settings.today()).unwrap();

    mock.assert_calls(1);
    assert_eq!(rows.len(), banxico::SERIES.len());
    assert!(rows.iter().all(|r| r.status == RowStatus::Primary));
    assert_eq!(rows[0].value(), Some(1234.5));
    assert_eq!(rows[0].period_label, "15 - DEC - 2025");
}

#[test]
fn fred_sends_query_parameters() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/fred/series/observations")
            .query_param("series_id", "UNRATE")
            .query_param("api_key", "test-key")
            .query_param("file_type", "json")
            .query_param("observation_start", "2025-01-01")
            .query_param("observation_end", "2025-03-31");
        then.status(200).json_body(json!({
            "observations": [
                {"date": "2025-01-01", "value": "4.0"},
                {"date": "2025-02-01", "value": "."},
                {"date": "2025-03-01", "value": "4.2"}
            ]
        }));
    });

    let client = FredClient::from_settings(&settings_for(&server)).unwrap();
    let series = fred::time_series(&client, "unemployment", ymd(2025, 1, 1), Some(ymd(2025, 3, 31))).unwrap();

    mock.assert();
    assert_eq!(series.points.len(), 2);
    assert_eq!(series.points[1].date, ymd(2025, 3, 1));
    assert_eq!(series.points[1].value, 4.2);
}

#[test]
fn error_status_maps_to_status_variant() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fred/series/observations");
        then.status(500);
    });

    let client = FredClient::from_settings(&settings_for(&server)).unwrap();
    let err = fred::time_series(&client, "policy_rate", ymd(2025, 1, 1), None).unwrap_err();
    assert!(matches!(err, SourceError::Status { provider: "FRED", status: 500 }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn unexpected_body_maps_to_decode_variant() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/series/SF43718/datos/2025-12-01/2025-12-05");
        then.status(200).body("<html>maintenance</html>");
    });

    let client = BanxicoClient::from_settings(&settings_for(&server)).unwrap();
    let err = client.range("SF43718", ymd(2025, 12, 1), ymd(2025, 12, 5)).unwrap_err();
    assert!(matches!(err, SourceError::Decode { provider: "Banxico", .. }));
}

#[test]
fn yahoo_closed_market_uses_daily_bars_and_crumb() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/cookie");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("crumb123");
    });
    let quote = server.mock(|when, then| {
        when.method(GET)
            .path("/v7/finance/quote")
            .query_param("symbols", "AAPL")
            .query_param("crumb", "crumb123");
        then.status(200).json_body(json!({
            "quoteResponse": {"result": [{
                "symbol": "AAPL",
                "marketState": "POSTPOST",
                "regularMarketPrice": 200.0,
                "regularMarketPreviousClose": 190.0,
                "postMarketPrice": 202.0
            }]}
        }));
    });
    let chart = server.mock(|when, then| {
        when.method(GET)
            .path("/v8/finance/chart/AAPL")
            .query_param("range", "5d")
            .query_param("interval", "1d");
        then.status(200).json_body(json!({
            "chart": {"result": [{"indicators": {"quote": [{"close": [190.0, null, 200.0]}]}}], "error": null}
        }));
    });

    let client = YahooClient::from_settings(&settings_for(&server)).unwrap();
    let apple = Instrument {
        ticker: "AAPL",
        name: "Apple",
    };
    let rows = markets::latest_prices(&client, &[apple]).unwrap();

    quote.assert();
    chart.assert();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].session, Session::Close);
    assert_eq!(rows[0].price, 200.0);
    assert_eq!(rows[1].name, "Apple (After-hours)");
    assert_eq!(rows[1].price, 202.0);
}

#[test]
fn yahoo_outage_fails_the_group() {
    // No mocks: every request, crumb included, gets the server's 404.
    let server = MockServer::start();

    let client = YahooClient::from_settings(&settings_for(&server)).unwrap();
    let err = markets::latest_prices(&client, markets::CRYPTO).unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 404, .. }));
}
