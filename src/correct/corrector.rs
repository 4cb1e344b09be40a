//! Diffusion correction of a base curve.
//!
//! Given a validated base curve and a country profile we compute, for every
//! year `t`:
//!
//! ```text
//! shifted[t]   = base[clamp(t - lag_years)]          (linear interpolation for fractional lags)
//! adjusted[t]  = shifted[t] · factor(shifted[t], adoption_speed) · (1 - regulatory_damping)
//! corrected[t] = clamp(adjusted[t], 0, ceiling)
//! ```
//!
//! followed by a forward pass that lifts any value below its predecessor, so the
//! output is non-decreasing by construction.

use crate::correct::shape::adoption_speed_factor;
use crate::domain::{
    CorrectedCurve, CorrectionConfig, DiffusionProfile, HORIZON_LEN, OccupationRecord, validate_curve,
};
use crate::error::EngineError;

/// Correct one occupation's base curve for one country.
pub fn correct(
    record: &OccupationRecord,
    profile: &DiffusionProfile,
    config: &CorrectionConfig,
) -> Result<CorrectedCurve, EngineError> {
    let values = correct_values(record.code(), record.base_curve(), profile, config)?;
    Ok(CorrectedCurve::new(
        record.code().to_string(),
        profile.country_id.clone(),
        values,
    ))
}

/// Correct a raw base curve.
///
/// Fails with `InvalidBaseCurve` for a curve of the wrong length or with values
/// outside `[0, 1]`, and with `ProfileValidationFailed` for an invalid profile.
pub fn correct_values(
    code: &str,
    base: &[f64],
    profile: &DiffusionProfile,
    config: &CorrectionConfig,
) -> Result<Vec<f64>, EngineError> {
    validate_curve(code, base)?;
    profile.validate()?;

    let keep = 1.0 - profile.regulatory_damping;
    let mut out: Vec<f64> = (0..HORIZON_LEN)
        .map(|t| {
            let shifted = shifted_value(base, t, profile.lag_years);
            let factor = adoption_speed_factor(config.shape, shifted, profile.adoption_speed);
            let adjusted = shifted * factor * keep;
            adjusted.clamp(0.0, profile.ceiling)
        })
        .collect();

    enforce_monotone(&mut out);
    Ok(out)
}

/// Lift every value to at least its predecessor.
pub fn enforce_monotone(values: &mut [f64]) {
    for t in 1..values.len() {
        if values[t] < values[t - 1] {
            values[t] = values[t - 1];
        }
    }
}

/// Base value at the lagged time coordinate `t - lag`.
///
/// The coordinate is clamped to the curve span; a lag beyond the span yields
/// `base[0]` everywhere.
fn shifted_value(base: &[f64], t: usize, lag: f64) -> f64 {
    let last = base.len() - 1;
    let pos = (t as f64 - lag).clamp(0.0, last as f64);
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f64;
    base[lo] + frac * (base[hi] - base[lo])
}
