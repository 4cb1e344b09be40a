//! Metrics engine: corrected curve → risk tiers, growth, crossings, speed class.

pub mod derive;

pub use derive::*;
