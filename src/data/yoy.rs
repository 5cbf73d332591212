//! Year-over-year change derived from a price index.

use chrono::{Months, NaiveDate};

use crate::domain::Observation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearOverYear {
    pub date: NaiveDate,
    pub latest: f64,
    pub base_date: NaiveDate,
    pub base: f64,
    /// `(latest / base - 1) * 100`
    pub pct: f64,
}

/// Compare the latest observation with the latest one dated at least a year earlier.
///
/// `series` does not need to be sorted. Returns `None` when there is no
/// observation a year back, or when the base is zero.
pub fn year_over_year(series: &[Observation]) -> Option<YearOverYear> {
    let latest = series.iter().max_by_key(|o| o.date)?;
    let cutoff = latest.date.checked_sub_months(Months::new(12))?;
    let base = series
        .iter()
        .filter(|o| o.date <= cutoff)
        .max_by_key(|o| o.date)?;

    if base.value == 0.0 {
        return None;
    }

    Some(YearOverYear {
        date: latest.date,
        latest: latest.value,
        base_date: base.date,
        base: base.value,
        pct: (latest.value / base.value - 1.0) * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(y: i32, m: u32, d: u32, v: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), v)
    }

    #[test]
    fn four_percent_over_a_year() {
        let series = vec![obs(2024, 10, 1, 100.0), obs(2025, 10, 1, 104.0)];
        let yoy = year_over_year(&series).unwrap();
        assert!((yoy.pct - 4.0).abs() < 1e-9);
        assert_eq!(yoy.base_date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    }

    #[test]
    fn uses_most_recent_base_at_least_a_year_back() {
        let series = vec![
            obs(2025, 10, 1, 110.0),
            obs(2024, 9, 1, 99.0),
            obs(2024, 10, 1, 100.0),
            obs(2024, 11, 1, 101.0),
        ];
        let yoy = year_over_year(&series).unwrap();
        assert_eq!(yoy.base, 100.0);
        assert!((yoy.pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn omitted_without_a_year_of_history() {
        let series = vec![obs(2025, 1, 1, 100.0), obs(2025, 10, 1, 103.0)];
        assert!(year_over_year(&series).is_none());
        assert!(year_over_year(&[]).is_none());
    }
}
