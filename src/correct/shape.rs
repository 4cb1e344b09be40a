//! Adoption-speed transforms.
//!
//! Each shape maps a shifted base probability `p ∈ [0, 1]` to an adjusted
//! probability in `[0, 1]`, given the country's adoption speed `s > 0`:
//!
//! - `power`:      `p^(1/s)`
//! - `saturating`: `1 - (1 - p)^s`
//! - `linear`:     `p · s` (clamped to 1)
//!
//! All three are the identity at `s = 1`, lift probabilities for `s > 1` and
//! damp them for `s < 1`. They are monotone in `p`, so a non-decreasing input
//! stays non-decreasing.

use crate::domain::AdoptionShape;

/// Below this, a probability is treated as exactly zero (keeps `0^x` well defined).
const P_EPS: f64 = 1e-15;

/// Apply the adoption transform for one value.
pub fn apply_adoption(shape: AdoptionShape, p: f64, speed: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    let out = match shape {
        AdoptionShape::Power => {
            if p <= P_EPS {
                0.0
            } else {
                p.powf(speed.recip())
            }
        }
        AdoptionShape::Saturating => 1.0 - (1.0 - p).powf(speed),
        AdoptionShape::Linear => p * speed,
    };
    out.clamp(0.0, 1.0)
}

/// Multiplicative view of [`apply_adoption`]: `adjusted / p`.
///
/// This is the multiplier the corrector applies to each shifted base value.
///
/// Returns `1.0` for `p = 0`, where the ratio is undefined and the adjusted
/// value is zero for every shape.
pub fn adoption_speed_factor(shape: AdoptionShape, p: f64, speed: f64) -> f64 {
    if p <= P_EPS {
        return 1.0;
    }
    apply_adoption(shape, p, speed) / p
}
