//! Shared "load pipeline" used by every subcommand.
//!
//! source -> (profiles, occupation records) -> engine
//!
//! Front-ends then only deal with queries and presentation.

use tracing::{info, warn};

use crate::data::{OccupationSource, SyntheticSource};
use crate::domain::{DataSourceSpec, RunConfig};
use crate::engine::AutomationEngine;
use crate::error::AppError;
use crate::io::CsvDirectory;

/// What a load put into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    /// Human-readable source description.
    pub source: String,
    /// `(country_id, occupation count)` in lexical order.
    pub countries: Vec<(String, usize)>,
    /// Listed countries skipped because their occupation data is absent.
    pub missing: Vec<String>,
}

impl LoadSummary {
    pub fn total_records(&self) -> usize {
        self.countries.iter().map(|(_, n)| n).sum()
    }
}

/// Build the configured source and load it into a fresh engine.
pub fn build_engine(config: &RunConfig) -> Result<(AutomationEngine, LoadSummary), AppError> {
    let engine = AutomationEngine::new(config.engine)?;
    let summary = match &config.source {
        DataSourceSpec::Directory(dir) => {
            let source = CsvDirectory::new(dir);
            load_into(&engine, &source, format!("directory {}", dir.display()))?
        }
        DataSourceSpec::Synthetic { seed, occupations } => {
            let source = SyntheticSource::new(*seed, *occupations)?;
            load_into(
                &engine,
                &source,
                format!("synthetic (seed={seed}, occupations={occupations})"),
            )?
        }
    };
    Ok((engine, summary))
}

/// Load every country a source offers into `engine`.
///
/// Everything is read and validated before the engine is touched; profiles
/// and occupation datasets are then published together. A country listed
/// without occupation data is skipped (and its profile left out), but at
/// least one country must load. On any error the engine keeps its previous
/// inputs.
pub fn load_into(
    engine: &AutomationEngine,
    source: &dyn OccupationSource,
    description: String,
) -> Result<LoadSummary, AppError> {
    let country_ids = source.country_ids()?;
    if country_ids.is_empty() {
        return Err(AppError::new(2, format!("No countries found in {description}.")));
    }

    let mut profiles = Vec::with_capacity(country_ids.len());
    let mut datasets = Vec::with_capacity(country_ids.len());
    let mut countries = Vec::with_capacity(country_ids.len());
    let mut missing = Vec::new();
    for id in &country_ids {
        if !source.has_occupation_data(id) {
            warn!(country = %id, "no occupation data; country skipped");
            missing.push(id.clone());
            continue;
        }
        profiles.push(source.load_diffusion_profile(id)?);
        let records = source.load_occupation_records(id)?;
        countries.push((id.clone(), records.len()));
        datasets.push((id.clone(), records));
    }

    if datasets.is_empty() {
        return Err(AppError::new(
            2,
            format!(
                "No occupation data for any listed country in {description} (missing: {}).",
                missing.join(", ")
            ),
        ));
    }

    engine.load_inputs(profiles, datasets)?;

    let summary = LoadSummary {
        source: description,
        countries,
        missing,
    };
    info!(
        source = %summary.source,
        countries = summary.countries.len(),
        missing = summary.missing.len(),
        records = summary.total_records(),
        "data loaded"
    );
    Ok(summary)
}
