//! Period labels shown under each card.

use chrono::{Datelike, NaiveDate};

use crate::domain::PeriodRule;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Render the label for `date` under `rule`.
pub fn period_label(date: NaiveDate, rule: PeriodRule) -> String {
    match rule {
        PeriodRule::ExactDay => exact_day(date),
        PeriodRule::HalfMonthYoY => half_month_yoy(date),
        PeriodRule::Month => date.format("%B %Y").to_string(),
        PeriodRule::Quarter => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
        PeriodRule::IsoDate => date.format("%Y-%m-%d").to_string(),
    }
}

fn month_abbrev(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

fn exact_day(date: NaiveDate) -> String {
    format!("{:02} - {} - {}", date.day(), month_abbrev(date), date.year())
}

/// First half of the month is days 1..=15.
fn half_month_yoy(date: NaiveDate) -> String {
    let half = if date.day() <= 15 { "1Q" } else { "2Q" };
    let month = month_abbrev(date);
    format!(
        "{half} {month} - {} to {half} {month} - {}",
        date.year() - 1,
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn exact_day_label() {
        assert_eq!(period_label(d(2025, 12, 18), PeriodRule::ExactDay), "18 - DEC - 2025");
        assert_eq!(period_label(d(2025, 3, 4), PeriodRule::ExactDay), "04 - MAR - 2025");
    }

    #[test]
    fn half_month_buckets() {
        assert_eq!(
            period_label(d(2025, 12, 18), PeriodRule::HalfMonthYoY),
            "2Q DEC - 2024 to 2Q DEC - 2025"
        );
        assert_eq!(
            period_label(d(2025, 12, 15), PeriodRule::HalfMonthYoY),
            "1Q DEC - 2024 to 1Q DEC - 2025"
        );
    }

    #[test]
    fn month_quarter_and_iso_labels() {
        assert_eq!(period_label(d(2025, 9, 1), PeriodRule::Month), "September 2025");
        assert_eq!(period_label(d(2025, 4, 1), PeriodRule::Quarter), "Q2 2025");
        assert_eq!(period_label(d(2025, 12, 31), PeriodRule::Quarter), "Q4 2025");
        assert_eq!(period_label(d(2025, 1, 7), PeriodRule::IsoDate), "2025-01-07");
    }
}
