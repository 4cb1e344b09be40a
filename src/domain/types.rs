//! Shared domain types.
//!
//! Inputs (`OccupationRecord`, `DiffusionProfile`) are validated on construction
//! or load and never mutated afterwards. Everything else here is derived from
//! them and can be recomputed at any time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// First modeled year.
pub const FIRST_YEAR: i32 = 2017;
/// Last modeled year (inclusive).
pub const LAST_YEAR: i32 = 2107;
/// Number of annual values in every curve.
pub const HORIZON_LEN: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;

/// Map a calendar year to its curve index.
pub fn year_index(year: i32) -> Result<usize, EngineError> {
    if (FIRST_YEAR..=LAST_YEAR).contains(&year) {
        Ok((year - FIRST_YEAR) as usize)
    } else {
        Err(EngineError::YearOutOfRange {
            year,
            first: FIRST_YEAR,
            last: LAST_YEAR,
        })
    }
}

/// Map a curve index back to its calendar year.
pub fn index_year(idx: usize) -> i32 {
    FIRST_YEAR + idx as i32
}

/// Check a raw 91-value probability curve.
///
/// Values are never clamped here: a curve that is too short, too long, or holds
/// a value outside `[0, 1]` is rejected outright.
pub fn validate_curve(code: &str, values: &[f64]) -> Result<(), EngineError> {
    if values.len() != HORIZON_LEN {
        return Err(EngineError::InvalidBaseCurve {
            code: code.to_string(),
            reason: format!("expected {HORIZON_LEN} annual values, got {}", values.len()),
        });
    }
    if let Some((idx, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && (0.0..=1.0).contains(*v)))
    {
        return Err(EngineError::InvalidBaseCurve {
            code: code.to_string(),
            reason: format!("value {v} for year {} is outside [0, 1]", index_year(idx)),
        });
    }
    Ok(())
}

/// One occupation's country-agnostic base curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationRecord {
    code: String,
    title: String,
    base_curve: Vec<f64>,
}

impl OccupationRecord {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        base_curve: Vec<f64>,
    ) -> Result<Self, EngineError> {
        let code = code.into();
        validate_curve(&code, &base_curve)?;
        Ok(Self {
            code,
            title: title.into(),
            base_curve,
        })
    }

    /// SOC-style occupation code (e.g. `11-1011.00`).
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Base probabilities indexed by `year - FIRST_YEAR`.
    pub fn base_curve(&self) -> &[f64] {
        &self.base_curve
    }
}

/// Country-specific diffusion parameters.
///
/// Profiles are plain data; the store validates them (see [`DiffusionProfile::validate`])
/// before they become visible to queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffusionProfile {
    pub country_id: String,
    /// Display name (informational only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text narrative about the country (informational only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Adoption speed multiplier. `1.0` leaves the base curve as-is.
    pub adoption_speed: f64,
    /// Upper bound for every corrected value, in `(0, 1]`.
    pub ceiling: f64,
    /// Years by which the base curve is delayed.
    pub lag_years: f64,
    /// Share of the corrected probability removed by regulation, in `[0, 1]`.
    #[serde(default)]
    pub regulatory_damping: f64,
}

impl DiffusionProfile {
    /// Profile with the given parameters and no damping or display metadata.
    pub fn new(country_id: impl Into<String>, adoption_speed: f64, ceiling: f64, lag_years: f64) -> Self {
        Self {
            country_id: country_id.into(),
            name: None,
            description: None,
            adoption_speed,
            ceiling,
            lag_years,
            regulatory_damping: 0.0,
        }
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.regulatory_damping = damping;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.country_id)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |reason: String| EngineError::ProfileValidationFailed {
            country_id: self.country_id.clone(),
            reason,
        };

        if self.country_id.trim().is_empty() {
            return Err(fail("country_id must not be empty".to_string()));
        }
        if !(self.adoption_speed.is_finite() && self.adoption_speed > 0.0) {
            return Err(fail(format!("adoption_speed must be > 0, got {}", self.adoption_speed)));
        }
        if !(self.ceiling.is_finite() && self.ceiling > 0.0 && self.ceiling <= 1.0) {
            return Err(fail(format!("ceiling must be in (0, 1], got {}", self.ceiling)));
        }
        if !(self.lag_years.is_finite() && self.lag_years >= 0.0) {
            return Err(fail(format!("lag_years must be >= 0, got {}", self.lag_years)));
        }
        if !(self.regulatory_damping.is_finite() && (0.0..=1.0).contains(&self.regulatory_damping)) {
            return Err(fail(format!(
                "regulatory_damping must be in [0, 1], got {}",
                self.regulatory_damping
            )));
        }
        Ok(())
    }
}

/// Diffusion-adjusted curve for one (occupation, country) pair.
///
/// Only the correction engine builds these, so every instance is non-decreasing
/// and bounded by its profile ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectedCurve {
    occupation_code: String,
    country_id: String,
    values: Vec<f64>,
}

impl CorrectedCurve {
    pub(crate) fn new(occupation_code: String, country_id: String, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), HORIZON_LEN);
        Self {
            occupation_code,
            country_id,
            values,
        }
    }

    pub fn occupation_code(&self) -> &str {
        &self.occupation_code
    }

    pub fn country_id(&self) -> &str {
        &self.country_id
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Corrected probability in `year`.
    pub fn value_at(&self, year: i32) -> Result<f64, EngineError> {
        Ok(self.values[year_index(year)?])
    }

    /// `(year, value)` pairs across the whole horizon.
    pub fn points(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| (index_year(i), v))
    }
}

/// Categorical probability bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

/// How quickly a curve moves from 50% to 90%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Rapid,
    Moderate,
    Slow,
    /// The curve never reaches 90% within the horizon.
    Stalled,
}

impl SpeedClass {
    pub fn label(self) -> &'static str {
        match self {
            SpeedClass::Rapid => "rapid",
            SpeedClass::Moderate => "moderate",
            SpeedClass::Slow => "slow",
            SpeedClass::Stalled => "stalled",
        }
    }
}

/// Snapshot of a corrected curve at fixed reporting years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Milestones {
    pub current_2024: f64,
    pub outlook_2030: f64,
    pub midterm_2050: f64,
    pub final_2107: f64,
}

/// Derived analytics for one corrected curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBundle {
    pub occupation_code: String,
    pub country_id: String,
    pub risk_tier_by_year: BTreeMap<i32, RiskTier>,
    /// Year at which `growth_rate_10yr` was evaluated.
    pub reference_year: i32,
    pub growth_rate_10yr: f64,
    pub year_reaches_50pct: Option<i32>,
    pub year_reaches_90pct: Option<i32>,
    pub speed_class: SpeedClass,
    pub milestones: Milestones,
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub entity_id: String,
    pub value: f64,
}

/// Ordered output of a ranking query.
///
/// Entries are sorted by `value` descending, then `entity_id` ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Human-readable description of what `value` holds.
    pub sort_key: String,
    pub year: i32,
    pub entries: Vec<RankEntry>,
}

impl ComparisonResult {
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.entity_id.as_str()).collect()
    }
}

/// Country-level aggregate over all of its occupations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryOverview {
    pub country_id: String,
    pub total_occupations: usize,
    pub year: i32,
    pub mean_probability: f64,
    pub high_risk_year: i32,
    pub high_risk_count: usize,
    pub high_risk_pct: f64,
}

/// Result row of an occupation search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupationMatch {
    pub code: String,
    pub title: String,
}

/// Risk-tier and speed-class boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct MetricsConfig {
    /// Values at or above this are at least `medium`.
    pub low_medium_boundary: f64,
    /// Values at or above this are `high`.
    pub medium_high_boundary: f64,
    /// 50%→90% gaps up to this many years are `rapid`.
    pub rapid_gap_years: i32,
    /// 50%→90% gaps up to this many years are `moderate`; longer is `slow`.
    pub moderate_gap_years: i32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            low_medium_boundary: 0.20,
            medium_high_boundary: 0.50,
            rapid_gap_years: 10,
            moderate_gap_years: 30,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let low = self.low_medium_boundary;
        let high = self.medium_high_boundary;
        if !(low.is_finite() && high.is_finite() && low > 0.0 && low < high && high <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "tier boundaries must satisfy 0 < lowMediumBoundary < mediumHighBoundary <= 1 (got {low}, {high})"
            )));
        }
        if self.rapid_gap_years < 0 || self.rapid_gap_years > self.moderate_gap_years {
            return Err(EngineError::InvalidConfig(format!(
                "gap buckets must satisfy 0 <= rapidGapYears <= moderateGapYears (got {}, {})",
                self.rapid_gap_years, self.moderate_gap_years
            )));
        }
        Ok(())
    }
}

/// Shape of the adoption-speed multiplier.
///
/// Every shape maps `[0, 1]` into `[0, 1]` (before the ceiling clamp) and is the
/// identity at `adoption_speed = 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionShape {
    /// `p^(1/speed)`.
    #[default]
    Power,
    /// `1 - (1 - p)^speed`.
    Saturating,
    /// `p * speed`.
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CorrectionConfig {
    pub shape: AdoptionShape,
}

/// Full engine configuration as read from the optional config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EngineConfig {
    pub metrics: MetricsConfig,
    pub correction: CorrectionConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.metrics.validate()
    }
}

/// Where occupation records and profiles come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceSpec {
    /// `profiles.json` + one `<country>.csv` per country.
    Directory(PathBuf),
    /// Seeded synthetic data.
    Synthetic { seed: u64, occupations: usize },
}

/// A run's configuration as understood by the pipeline.
///
/// Derived from CLI flags, the environment and the optional config file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: DataSourceSpec,
    pub engine: EngineConfig,
}
