//! Metric derivation for corrected curves.
//!
//! Every function here is a pure function of its inputs. Thresholds are
//! lower-closed: a value exactly on a boundary belongs to the higher bucket.

use std::collections::BTreeMap;

use crate::domain::{
    CorrectedCurve, LAST_YEAR, MetricBundle, MetricsConfig, Milestones, RiskTier, SpeedClass, index_year,
    year_index,
};
use crate::error::EngineError;

/// "Half automated" threshold used for the first crossing year.
pub const HALF_THRESHOLD: f64 = 0.50;
/// "Nearly fully automated" threshold used for the second crossing year.
pub const NINETY_THRESHOLD: f64 = 0.90;
/// Window of the growth-rate metric, in years.
pub const GROWTH_WINDOW_YEARS: i32 = 10;
/// Floor for the growth-rate denominator.
pub const GROWTH_EPS: f64 = 1e-9;

/// Years used for the milestone snapshot.
pub const CURRENT_YEAR_MILESTONE: i32 = 2024;
pub const OUTLOOK_YEAR_MILESTONE: i32 = 2030;
pub const MIDTERM_YEAR_MILESTONE: i32 = 2050;

/// Derive the full metric bundle for one corrected curve.
///
/// `reference_year` is where the 10-year growth rate is evaluated; it must leave
/// room for a full window before the end of the horizon.
pub fn derive_metrics(
    curve: &CorrectedCurve,
    reference_year: i32,
    config: &MetricsConfig,
) -> Result<MetricBundle, EngineError> {
    let values = curve.values();
    let growth_rate_10yr = growth_rate(values, reference_year, GROWTH_WINDOW_YEARS)?;

    let risk_tier_by_year: BTreeMap<i32, RiskTier> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (index_year(i), risk_tier(v, config)))
        .collect();

    let year_reaches_50pct = first_crossing(values, HALF_THRESHOLD);
    let year_reaches_90pct = first_crossing(values, NINETY_THRESHOLD);
    let speed_class = speed_class(year_reaches_50pct, year_reaches_90pct, config);

    Ok(MetricBundle {
        occupation_code: curve.occupation_code().to_string(),
        country_id: curve.country_id().to_string(),
        risk_tier_by_year,
        reference_year,
        growth_rate_10yr,
        year_reaches_50pct,
        year_reaches_90pct,
        speed_class,
        milestones: milestones(curve)?,
    })
}

/// Bucket a single probability.
pub fn risk_tier(value: f64, config: &MetricsConfig) -> RiskTier {
    if value >= config.medium_high_boundary {
        RiskTier::High
    } else if value >= config.low_medium_boundary {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Relative growth over `window` years starting at `start_year`:
/// `(v[t + window] - v[t]) / max(v[t], ε)`.
pub fn growth_rate(values: &[f64], start_year: i32, window: i32) -> Result<f64, EngineError> {
    let horizon_error = EngineError::InsufficientHorizon {
        start: start_year,
        window,
        last: LAST_YEAR,
    };
    let end_year = start_year + window;
    if end_year > LAST_YEAR {
        return Err(horizon_error);
    }
    let start = year_index(start_year).map_err(|_| horizon_error.clone())?;
    let end = year_index(end_year).map_err(|_| horizon_error)?;

    let v0 = values[start];
    let v1 = values[end];
    Ok((v1 - v0) / v0.max(GROWTH_EPS))
}

/// First year whose value is at or above `threshold`.
pub fn first_crossing(values: &[f64], threshold: f64) -> Option<i32> {
    values.iter().position(|&v| v >= threshold).map(index_year)
}

/// Classify the 50%→90% transition speed.
pub fn speed_class(year_50: Option<i32>, year_90: Option<i32>, config: &MetricsConfig) -> SpeedClass {
    let (Some(y50), Some(y90)) = (year_50, year_90) else {
        return SpeedClass::Stalled;
    };
    let gap = y90 - y50;
    if gap <= config.rapid_gap_years {
        SpeedClass::Rapid
    } else if gap <= config.moderate_gap_years {
        SpeedClass::Moderate
    } else {
        SpeedClass::Slow
    }
}

/// Values at the fixed reporting years.
pub fn milestones(curve: &CorrectedCurve) -> Result<Milestones, EngineError> {
    Ok(Milestones {
        current_2024: curve.value_at(CURRENT_YEAR_MILESTONE)?,
        outlook_2030: curve.value_at(OUTLOOK_YEAR_MILESTONE)?,
        midterm_2050: curve.value_at(MIDTERM_YEAR_MILESTONE)?,
        final_2107: curve.value_at(LAST_YEAR)?,
    })
}
