//! Export a time series to CSV or JSON.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::TimeSeries;
use crate::error::AppError;

/// Write `series` to `path`; `.json` selects JSON, anything else CSV.
pub fn write_series(path: &Path, series: &TimeSeries) -> Result<(), AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        write_series_json(path, series)
    } else {
        write_series_csv(path, series)
    }
}

/// `date,value` rows in ascending date order.
pub fn write_series_csv(path: &Path, series: &TimeSeries) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "date,value").map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for p in &series.points {
        writeln!(file, "{},{}", p.date.format("%Y-%m-%d"), p.value)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// The whole `TimeSeries` (source, key, name, points) as pretty JSON.
pub fn write_series_json(path: &Path, series: &TimeSeries) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, series).map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Observation, SeriesSource};

    fn sample() -> TimeSeries {
        TimeSeries {
            source: SeriesSource::Banxico,
            key: "fix".to_string(),
            name: "Tipo de cambio FIX".to_string(),
            points: vec![
                Observation::new(NaiveDate::from_ymd_opt(2025, 12, 17).unwrap(), 18.0125),
                Observation::new(NaiveDate::from_ymd_opt(2025, 12, 18).unwrap(), 17.9876),
            ],
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("econ-dash-{}-{name}", std::process::id()))
    }

    #[test]
    fn csv_export() {
        let path = temp_path("fix.csv");
        write_series(&path, &sample()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(text, "date,value\n2025-12-17,18.0125\n2025-12-18,17.9876\n");
    }

    #[test]
    fn json_export_by_extension() {
        let path = temp_path("fix.JSON");
        write_series(&path, &sample()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["source"], "banxico");
        assert_eq!(value["key"], "fix");
        assert_eq!(value["points"][1]["date"], "2025-12-18");
    }

    #[test]
    fn unwritable_path_is_config_error() {
        let err = write_series_csv(Path::new("/nonexistent-dir/x.csv"), &sample()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
