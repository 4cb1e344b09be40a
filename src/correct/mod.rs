//! Correction engine: base curve + diffusion profile → corrected curve.

pub mod corrector;
pub mod shape;

pub use corrector::*;
pub use shape::*;
