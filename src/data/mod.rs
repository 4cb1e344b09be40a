//! Data sources feeding the stores.
//!
//! The engine never reads files itself; it only receives validated
//! `OccupationRecord`s and `DiffusionProfile`s from an `OccupationSource`.

use crate::domain::{DiffusionProfile, OccupationRecord};
use crate::error::AppError;

pub mod sample;

pub use sample::SyntheticSource;

/// Supplier of per-country inputs.
pub trait OccupationSource {
    /// Countries this source can provide, in lexical order.
    fn country_ids(&self) -> Result<Vec<String>, AppError>;

    fn load_occupation_records(&self, country_id: &str) -> Result<Vec<OccupationRecord>, AppError>;

    fn load_diffusion_profile(&self, country_id: &str) -> Result<DiffusionProfile, AppError>;

    /// Whether occupation data exists for a listed country.
    ///
    /// A country listed without data is skipped by the load pipeline instead
    /// of failing it.
    fn has_occupation_data(&self, _country_id: &str) -> bool {
        true
    }
}
