//! Export corrected curves and metric bundles.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use crate::domain::{CorrectedCurve, MetricBundle};
use crate::error::AppError;

/// Write curves in long format: `country_id,occupation_code,year,value`.
pub fn write_curves_csv(path: &Path, curves: &[CorrectedCurve]) -> Result<(), AppError> {
    let mut writer = create_csv(path)?;

    writer
        .write_record(["country_id", "occupation_code", "year", "value"])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for curve in curves {
        for (year, value) in curve.points() {
            writer
                .write_record([
                    curve.country_id(),
                    curve.occupation_code(),
                    year.to_string().as_str(),
                    format!("{value:.6}").as_str(),
                ])
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
    }

    flush_csv(writer)
}

/// Write metric bundles; JSON when the path ends in `.json`, CSV otherwise.
///
/// The CSV form flattens each bundle to one row and drops the per-year tier map.
pub fn write_metrics(path: &Path, bundles: &[MetricBundle]) -> Result<(), AppError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        write_metrics_json(path, bundles)
    } else {
        write_metrics_csv(path, bundles)
    }
}

fn write_metrics_json(path: &Path, bundles: &[MetricBundle]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, bundles)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))
}

fn write_metrics_csv(path: &Path, bundles: &[MetricBundle]) -> Result<(), AppError> {
    let mut writer = create_csv(path)?;

    writer
        .write_record([
            "country_id",
            "occupation_code",
            "reference_year",
            "growth_rate_10yr",
            "year_50pct",
            "year_90pct",
            "speed_class",
            "p2024",
            "p2030",
            "p2050",
            "p2107",
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    let opt_year = |y: Option<i32>| y.map(|y| y.to_string()).unwrap_or_default();
    for b in bundles {
        let m = &b.milestones;
        writer
            .write_record([
                b.country_id.clone(),
                b.occupation_code.clone(),
                b.reference_year.to_string(),
                format!("{:.6}", b.growth_rate_10yr),
                opt_year(b.year_reaches_50pct),
                opt_year(b.year_reaches_90pct),
                b.speed_class.label().to_string(),
                format!("{:.6}", m.current_2024),
                format!("{:.6}", m.outlook_2030),
                format!("{:.6}", m.midterm_2050),
                format!("{:.6}", m.final_2107),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    flush_csv(writer)
}

fn create_csv(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn flush_csv(mut writer: csv::Writer<File>) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
}
