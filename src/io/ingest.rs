//! CSV/JSON directory ingest.
//!
//! Layout of a data directory:
//!
//! ```text
//! <dir>/profiles.json      array of DiffusionProfile objects
//! <dir>/<country_id>.csv   code,title,2017,2018,...,2107
//! ```
//!
//! Design goals:
//! - **Strict schema** for the header (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no correction logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, warn};

use crate::data::OccupationSource;
use crate::domain::{DiffusionProfile, FIRST_YEAR, HORIZON_LEN, LAST_YEAR, OccupationRecord};
use crate::error::AppError;

/// File name of the profile list inside a data directory.
pub const PROFILES_FILE: &str = "profiles.json";

const CODE_COLUMNS: &[&str] = &["code", "soc_code", "soc code"];
const TITLE_COLUMNS: &[&str] = &["title", "occupation", "occupation_title"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub code: Option<String>,
    pub message: String,
}

/// Ingest output for one country file.
#[derive(Debug, Clone)]
pub struct IngestedCountry {
    pub records: Vec<OccupationRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Data directory source.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn country_path(&self, country_id: &str) -> PathBuf {
        self.dir.join(format!("{country_id}.csv"))
    }

    fn read_profiles(&self) -> Result<Vec<DiffusionProfile>, AppError> {
        read_profiles_json(&self.dir.join(PROFILES_FILE))
    }
}

impl OccupationSource for CsvDirectory {
    fn country_ids(&self) -> Result<Vec<String>, AppError> {
        let mut ids: Vec<String> = self.read_profiles()?.into_iter().map(|p| p.country_id).collect();
        ids.sort();
        Ok(ids)
    }

    fn load_occupation_records(&self, country_id: &str) -> Result<Vec<OccupationRecord>, AppError> {
        let ingested = read_occupation_csv(&self.country_path(country_id))?;
        for err in &ingested.row_errors {
            warn!(
                country = country_id,
                line = err.line,
                code = err.code.as_deref().unwrap_or(""),
                "skipped row: {}",
                err.message
            );
        }
        debug!(
            country = country_id,
            rows_read = ingested.rows_read,
            rows_used = ingested.records.len(),
            "occupation file ingested"
        );
        Ok(ingested.records)
    }

    fn load_diffusion_profile(&self, country_id: &str) -> Result<DiffusionProfile, AppError> {
        self.read_profiles()?
            .into_iter()
            .find(|p| p.country_id == country_id)
            .ok_or_else(|| {
                AppError::new(
                    3,
                    format!("No profile for country '{country_id}' in {PROFILES_FILE}."),
                )
            })
    }

    fn has_occupation_data(&self, country_id: &str) -> bool {
        self.country_path(country_id).is_file()
    }
}

/// Read a JSON array of diffusion profiles.
///
/// Profiles are only parsed here; range checks happen when they are loaded
/// into the profile store.
pub fn read_profiles_json(path: &Path) -> Result<Vec<DiffusionProfile>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open profiles '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid profiles JSON '{}': {e}", path.display())))
}

/// Load one country's occupation table.
pub fn read_occupation_csv(path: &Path) -> Result<IngestedCountry, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let layout = resolve_layout(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header line.
        let line = idx + 2;
        rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    code: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&row, &layout) {
            Ok(record) => records.push(record),
            Err((code, message)) => row_errors.push(RowError { line, code, message }),
        }
    }

    if records.is_empty() {
        return Err(AppError::new(
            3,
            format!("No valid occupation rows in '{}'.", path.display()),
        ));
    }

    Ok(IngestedCountry {
        records,
        row_errors,
        rows_read,
    })
}

/// Column positions for one file.
struct Layout {
    code: usize,
    title: usize,
    years: Vec<usize>,
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    let name = name.to_ascii_lowercase();
    // Year headers occasionally come through as floats ("2017.0").
    match name.strip_suffix(".0") {
        Some(stem) if stem.parse::<i32>().is_ok() => stem.to_string(),
        _ => name,
    }
}

fn resolve_layout(header_map: &HashMap<String, usize>) -> Result<Layout, AppError> {
    let find_any = |names: &[&str]| names.iter().find_map(|n| header_map.get(*n).copied());

    let code = find_any(CODE_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `code` (or `soc_code`)."))?;
    let title = find_any(TITLE_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `title` (or `occupation`)."))?;

    let mut years = Vec::with_capacity(HORIZON_LEN);
    for year in FIRST_YEAR..=LAST_YEAR {
        let idx = header_map.get(&year.to_string()).copied().ok_or_else(|| {
            AppError::new(
                2,
                format!("Missing year column `{year}` (expected {FIRST_YEAR}..={LAST_YEAR})."),
            )
        })?;
        years.push(idx);
    }

    Ok(Layout { code, title, years })
}

fn parse_row(row: &StringRecord, layout: &Layout) -> Result<OccupationRecord, (Option<String>, String)> {
    let code = get_required(row, layout.code, "code").map_err(|m| (None, m))?.to_string();
    let title = get_required(row, layout.title, "title")
        .map_err(|m| (Some(code.clone()), m))?
        .to_string();

    let mut values = Vec::with_capacity(HORIZON_LEN);
    for (offset, &idx) in layout.years.iter().enumerate() {
        let year = FIRST_YEAR + offset as i32;
        let raw = get_required(row, idx, &year.to_string()).map_err(|m| (Some(code.clone()), m))?;
        let v = raw
            .parse::<f64>()
            .map_err(|_| (Some(code.clone()), format!("Invalid probability '{raw}' for {year}.")))?;
        values.push(v);
    }

    OccupationRecord::new(code.clone(), title, values).map_err(|e| (Some(code), e.to_string()))
}

fn get_required<'a>(row: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    row.get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn header() -> String {
        let years: Vec<String> = (FIRST_YEAR..=LAST_YEAR).map(|y| y.to_string()).collect();
        format!("\u{feff}SOC Code,Occupation,{}", years.join(","))
    }

    fn row(code: &str, title: &str, value: f64) -> String {
        let values: Vec<String> = (0..HORIZON_LEN).map(|_| format!("{value}")).collect();
        format!("{code},{title},{}", values.join(","))
    }

    #[test]
    fn reads_valid_rows_and_reports_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("USA.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{}", header()).unwrap();
        writeln!(f, "{}", row("11-1011.00", "Chief Executives", 0.1)).unwrap();
        writeln!(f, "{}", row("43-9021.00", "Data Entry Keyers", 1.5)).unwrap();
        writeln!(f, "29-1141.00,Registered Nurses,0.1,0.2").unwrap();
        drop(f);

        let ingested = read_occupation_csv(&path).unwrap();
        assert_eq!(ingested.rows_read, 3);
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(ingested.records[0].title(), "Chief Executives");
        assert_eq!(ingested.row_errors.len(), 2);
        assert_eq!(ingested.row_errors[0].line, 3);
        assert_eq!(ingested.row_errors[0].code.as_deref(), Some("43-9021.00"));
    }

    #[test]
    fn missing_year_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.csv");
        std::fs::write(&path, "code,title,2017,2018\na,b,0.1,0.2\n").unwrap();
        let err = read_occupation_csv(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("2019"));
    }

    #[test]
    fn directory_source_reads_profiles_and_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROFILES_FILE),
            r#"[
                {"country_id": "USA", "adoption_speed": 1.2, "ceiling": 0.99, "lag_years": 0},
                {"country_id": "Mali", "name": "Mali", "adoption_speed": 0.5, "ceiling": 0.7, "lag_years": 20, "regulatory_damping": 0.1}
            ]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Mali.csv"),
            format!("{}\n{}\n", header(), row("43-9021.00", "Data Entry Keyers", 0.4)),
        )
        .unwrap();

        let src = CsvDirectory::new(dir.path());
        assert_eq!(src.country_ids().unwrap(), vec!["Mali", "USA"]);
        let mali = src.load_diffusion_profile("Mali").unwrap();
        assert_eq!(mali.regulatory_damping, 0.1);
        assert_eq!(src.load_occupation_records("Mali").unwrap().len(), 1);
        assert_eq!(src.load_diffusion_profile("Chad").unwrap_err().exit_code(), 3);
        assert_eq!(src.load_occupation_records("USA").unwrap_err().exit_code(), 2);
        assert!(src.has_occupation_data("Mali"));
        assert!(!src.has_occupation_data("USA"));
    }

    #[test]
    fn float_year_headers_are_accepted() {
        assert_eq!(normalize_header_name("2017.0"), "2017");
        assert_eq!(normalize_header_name(" Title "), "title");
    }
}
