//! Reporting utilities: formatted terminal output.
//!
//! Presentation choices (tier markers, column widths, percentages) live here
//! and nowhere else; the engine only returns numbers and enums.

use crate::domain::{RiskTier, SpeedClass};

pub mod format;

pub use format::*;

/// Short marker shown next to a probability.
pub fn tier_marker(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "low",
        RiskTier::Medium => "MED",
        RiskTier::High => "HIGH",
    }
}

/// Human phrasing of a speed class.
pub fn speed_phrase(speed: SpeedClass) -> &'static str {
    match speed {
        SpeedClass::Rapid => "rapid transition",
        SpeedClass::Moderate => "moderate transition",
        SpeedClass::Slow => "slow transition",
        SpeedClass::Stalled => "does not reach 90%",
    }
}
