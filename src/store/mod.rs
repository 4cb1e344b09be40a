//! Read-mostly stores for the engine's two inputs.
//!
//! - `ProfileStore`: one `DiffusionProfile` per country
//! - `OccupationStore`: one `CountryDataset` of `OccupationRecord`s per country

pub mod occupations;
pub mod profiles;

pub use occupations::*;
pub use profiles::*;
