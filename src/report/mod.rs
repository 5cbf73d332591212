//! Card values and market prices as display text.
//!
//! Each catalogue entry carries its own `ValueFormat`, so rendering a card is a
//! lookup by series key rather than per-key branching in the front-ends.

use crate::domain::{LatestRow, SeriesDescriptor, ValueFormat, find_descriptor};

pub mod format;

pub use format::*;

/// Shown in place of a value when a series has no usable observation.
pub const NO_DATA: &str = "N/E";

const DEFAULT_FORMAT: ValueFormat = ValueFormat::Fixed(2);

/// Fixed-point rendering without grouping separators.
pub fn format_value(value: f64, format: ValueFormat) -> String {
    match format {
        ValueFormat::Fixed(decimals) => format!("{value:.prec$}", prec = decimals as usize),
        ValueFormat::Percent(decimals) => format!("{value:.prec$}%", prec = decimals as usize),
    }
}

/// Text for a card, using the row's catalogue entry for the format.
///
/// Provider-supplied `value_text` wins over the numeric format.
pub fn card_value(row: &LatestRow, catalogue: &[SeriesDescriptor]) -> String {
    if let Some(text) = &row.value_text {
        return text.clone();
    }
    let format = find_descriptor(catalogue, &row.key)
        .map(|d| d.format)
        .unwrap_or(DEFAULT_FORMAT);
    match row.value() {
        Some(v) => format_value(v, format),
        None => NO_DATA.to_string(),
    }
}

/// Decimal places for a market price: 4 below 5, otherwise 2.
pub fn price_decimals(price: f64) -> usize {
    if price.abs() < 5.0 { 4 } else { 2 }
}

pub fn round_price(price: f64) -> f64 {
    let factor = 10f64.powi(price_decimals(price) as i32);
    (price * factor).round() / factor
}

pub fn price_text(price: f64) -> String {
    format!("{price:.prec$}", prec = price_decimals(price))
}

pub fn change_text(change_pct: Option<f64>) -> String {
    match change_pct {
        Some(pct) => format!("{pct:+.2}%"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::{banxico, fred};
    use crate::domain::{MissingReason, Observation, RowStatus};

    fn row(key: &str, value: Option<f64>) -> LatestRow {
        LatestRow {
            key: key.to_string(),
            series_id: String::new(),
            name: key.to_string(),
            observation: value.map(|v| Observation::new(NaiveDate::from_ymd_opt(2025, 12, 18).unwrap(), v)),
            period_label: String::new(),
            value_text: None,
            status: value.map_or(RowStatus::Missing(MissingReason::NoRecentData), |_| RowStatus::Primary),
        }
    }

    #[test]
    fn card_format_follows_catalogue() {
        assert_eq!(card_value(&row("fix", Some(18.12346)), banxico::SERIES), "18.1235");
        assert_eq!(card_value(&row("reservas", Some(245123.456)), banxico::SERIES), "245123.5");
        assert_eq!(card_value(&row("udis", Some(8.5)), banxico::SERIES), "8.500000");
        assert_eq!(card_value(&row("gdp_growth", Some(3.84)), fred::INDICATORS), "3.8%");
        assert_eq!(card_value(&row("unemployment", Some(4.3)), fred::INDICATORS), "4.30%");
    }

    #[test]
    fn missing_and_text_overrides() {
        assert_eq!(card_value(&row("fix", None), banxico::SERIES), NO_DATA);

        let mut range = row("policy_range", Some(4.375));
        range.value_text = Some("4.25% to 4.50%".to_string());
        assert_eq!(card_value(&range, fred::INDICATORS), "4.25% to 4.50%");
    }

    #[test]
    fn price_precision_depends_on_magnitude() {
        assert_eq!(price_text(1.000123), "1.0001");
        assert_eq!(price_text(6001.456), "6001.46");
        assert_eq!(round_price(4.56789), 4.5679);
        assert_eq!(round_price(123.456), 123.46);
        assert_eq!(change_text(Some(1.234)), "+1.23%");
        assert_eq!(change_text(None), "-");
    }
}
