//! Plain-text tables for the CLI subcommands.
//!
//! Output is deterministic so tables can be compared in tests.

use crate::domain::{LatestRow, MarketRow, SeriesDescriptor, TimeSeries};
use crate::error::SourceError;
use crate::report::{NO_DATA, card_value, change_text, price_text};

/// Latest-value cards as a table: name, value, period, series id.
pub fn format_latest_table(title: &str, rows: &[LatestRow], catalogue: &[SeriesDescriptor]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {title} ===\n"));
    push_line(
        &mut out,
        format!("{:<40} {:>18} {:<32} {:<18}", "indicator", "value", "period", "series"),
    );
    push_line(&mut out, format!("{:-<40} {:-<18} {:-<32} {:-<18}", "", "", "", ""));

    for row in rows {
        let period = if row.observation.is_some() {
            row.period_label.as_str()
        } else {
            NO_DATA
        };
        push_line(
            &mut out,
            format!(
                "{:<40} {:>18} {:<32} {:<18}",
                truncate(&row.name, 40),
                card_value(row, catalogue),
                truncate(period, 32),
                truncate(&row.series_id, 18),
            ),
        );
    }

    out
}

/// One instrument group; an empty group prints a placeholder line.
pub fn format_market_table(title: &str, rows: &[MarketRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {title} ===\n"));
    if rows.is_empty() {
        out.push_str("(no prices available)\n");
        return out;
    }

    push_line(
        &mut out,
        format!("{:<32} {:<10} {:>14} {:>10} {:<12}", "name", "ticker", "price", "change", "session"),
    );
    push_line(&mut out, format!("{:-<32} {:-<10} {:-<14} {:-<10} {:-<12}", "", "", "", "", ""));

    for row in rows {
        push_line(
            &mut out,
            format!(
                "{:<32} {:<10} {:>14} {:>10} {:<12}",
                truncate(&row.name, 32),
                truncate(&row.ticker, 10),
                price_text(row.price),
                change_text(row.change_pct),
                row.session.display_name(),
            ),
        );
    }

    out
}

/// A time series as `date value` lines.
pub fn format_series_table(series: &TimeSeries) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} ({}: {}) | n={} ===\n",
        series.name,
        series.source.display_name(),
        series.key,
        series.points.len()
    ));
    push_line(&mut out, format!("{:<10} {:>16}", "date", "value"));
    push_line(&mut out, format!("{:-<10} {:-<16}", "", ""));
    for p in &series.points {
        push_line(&mut out, format!("{:<10} {:>16.4}", p.date.format("%Y-%m-%d"), p.value));
    }
    out
}

/// Inline error block for a section that failed to load.
pub fn format_section_error(title: &str, err: &SourceError) -> String {
    format!("=== {title} ===\nerror: {err}\n")
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Observation, SeriesSource, Session};

    #[test]
    fn market_table_rows() {
        let rows = vec![
            MarketRow {
                name: "Apple".to_string(),
                ticker: "AAPL".to_string(),
                price: 201.5,
                change_pct: Some(0.75),
                session: Session::Close,
            },
            MarketRow {
                name: "Tether".to_string(),
                ticker: "USDT-USD".to_string(),
                price: 1.00012,
                change_pct: None,
                session: Session::Regular,
            },
        ];
        let txt = format_market_table("Test", &rows);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "=== Test ===");
        assert!(lines[3].starts_with("Apple"));
        assert!(lines[3].contains("201.50"));
        assert!(lines[3].contains("+0.75%"));
        assert!(lines[3].ends_with("Close"));
        assert!(lines[4].contains("1.0001"));
        assert!(lines[4].contains(" - "));
    }

    #[test]
    fn empty_group_has_placeholder() {
        assert_eq!(format_market_table("Private", &[]), "=== Private ===\n(no prices available)\n");
    }

    #[test]
    fn series_table_lists_points() {
        let series = TimeSeries {
            source: SeriesSource::Fred,
            key: "unemployment".to_string(),
            name: "Unemployment Rate".to_string(),
            points: vec![Observation::new(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), 4.3)],
        };
        let txt = format_series_table(&series);
        assert!(txt.starts_with("=== Unemployment Rate (FRED: unemployment) | n=1 ===\n"));
        assert!(txt.ends_with("2025-09-01           4.3000\n"));
    }

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
