//! Seeded synthetic occupations and a built-in country profile set.
//!
//! Base curves are logistic adoption paths with a little Gaussian jitter, so
//! they are mostly increasing but not perfectly smooth (the correction engine
//! has to repair small dips). Output depends only on `(seed, occupations)`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::OccupationSource;
use crate::domain::{DiffusionProfile, HORIZON_LEN, OccupationRecord};
use crate::error::AppError;

/// Standard deviation of the per-year jitter added to each base curve.
const JITTER_SIGMA: f64 = 0.004;

/// A handful of real SOC codes so reports read naturally.
const CATALOG: &[(&str, &str)] = &[
    ("11-1011.00", "Chief Executives"),
    ("13-2011.00", "Accountants and Auditors"),
    ("15-1252.00", "Software Developers"),
    ("25-2021.00", "Elementary School Teachers"),
    ("29-1141.00", "Registered Nurses"),
    ("35-2014.00", "Cooks, Restaurant"),
    ("41-2011.00", "Cashiers"),
    ("41-2031.00", "Retail Salespersons"),
    ("43-3071.00", "Tellers"),
    ("43-4051.00", "Customer Service Representatives"),
    ("43-9021.00", "Data Entry Keyers"),
    ("47-2061.00", "Construction Laborers"),
    ("49-3023.00", "Automotive Service Technicians and Mechanics"),
    ("51-2092.00", "Team Assemblers"),
    ("51-4121.00", "Welders, Cutters, Solderers, and Brazers"),
    ("53-3032.00", "Heavy and Tractor-Trailer Truck Drivers"),
    ("53-7062.00", "Laborers and Freight, Stock, and Material Movers, Hand"),
    ("29-1228.00", "Physicians, All Other"),
];

/// Built-in country: profile parameters plus the share of the catalog it covers.
struct CountrySeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    adoption_speed: f64,
    ceiling: f64,
    lag_years: f64,
    regulatory_damping: f64,
    coverage: f64,
}

const COUNTRIES: &[CountrySeed] = &[
    CountrySeed {
        id: "Algeria",
        name: "Algeria",
        description: "North African economy with emerging tech sector",
        adoption_speed: 0.7,
        ceiling: 0.85,
        lag_years: 12.0,
        regulatory_damping: 0.05,
        coverage: 0.9,
    },
    CountrySeed {
        id: "China",
        name: "China",
        description: "Rapidly developing with massive AI investments",
        adoption_speed: 1.4,
        ceiling: 0.98,
        lag_years: 2.0,
        regulatory_damping: 0.0,
        coverage: 1.0,
    },
    CountrySeed {
        id: "Germany",
        name: "Germany",
        description: "Industrial leader with strong manufacturing",
        adoption_speed: 1.1,
        ceiling: 0.97,
        lag_years: 3.0,
        regulatory_damping: 0.05,
        coverage: 1.0,
    },
    CountrySeed {
        id: "MENA",
        name: "MENA Region",
        description: "Middle East & North Africa regional perspective",
        adoption_speed: 0.8,
        ceiling: 0.9,
        lag_years: 9.0,
        regulatory_damping: 0.03,
        coverage: 0.95,
    },
    CountrySeed {
        id: "Mali",
        name: "Mali",
        description: "West African developing economy",
        adoption_speed: 0.45,
        ceiling: 0.7,
        lag_years: 25.0,
        regulatory_damping: 0.0,
        coverage: 0.8,
    },
    CountrySeed {
        id: "USA",
        name: "United States",
        description: "Advanced economy with high tech adoption",
        adoption_speed: 1.3,
        ceiling: 0.99,
        lag_years: 0.0,
        regulatory_damping: 0.0,
        coverage: 1.0,
    },
];

/// Deterministic in-memory source.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    records: Vec<OccupationRecord>,
}

impl SyntheticSource {
    /// Generate `occupations` base curves from `seed`.
    pub fn new(seed: u64, occupations: usize) -> Result<Self, AppError> {
        if occupations == 0 {
            return Err(AppError::new(2, "Synthetic occupation count must be > 0."));
        }

        let mut rng = StdRng::seed_from_u64(mix_seed(seed, "occupations"));
        let jitter = Normal::new(0.0, JITTER_SIGMA)
            .map_err(|e| AppError::new(4, format!("Jitter distribution error: {e}")))?;

        let mut records = Vec::with_capacity(occupations);
        for i in 0..occupations {
            let (code, title) = match CATALOG.get(i) {
                Some(&(code, title)) => (code.to_string(), title.to_string()),
                None => (format!("99-{:04}.00", i + 1), format!("Synthetic Occupation {}", i + 1)),
            };
            let curve = logistic_curve(&mut rng, &jitter);
            let record = OccupationRecord::new(code, title, curve)?;
            records.push(record);
        }

        Ok(Self { seed, records })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn country(&self, country_id: &str) -> Result<&'static CountrySeed, AppError> {
        COUNTRIES
            .iter()
            .find(|c| c.id == country_id)
            .ok_or_else(|| AppError::new(3, format!("Unknown synthetic country '{country_id}'.")))
    }
}

impl OccupationSource for SyntheticSource {
    fn country_ids(&self) -> Result<Vec<String>, AppError> {
        Ok(COUNTRIES.iter().map(|c| c.id.to_string()).collect())
    }

    fn load_occupation_records(&self, country_id: &str) -> Result<Vec<OccupationRecord>, AppError> {
        let country = self.country(country_id)?;
        // Always keep the first record so every country has at least one row.
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, country.id));
        Ok(self
            .records
            .iter()
            .enumerate()
            .filter(|(i, _)| *i == 0 || rng.gen_bool(country.coverage))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn load_diffusion_profile(&self, country_id: &str) -> Result<DiffusionProfile, AppError> {
        let c = self.country(country_id)?;
        Ok(DiffusionProfile {
            country_id: c.id.to_string(),
            name: Some(c.name.to_string()),
            description: Some(c.description.to_string()),
            adoption_speed: c.adoption_speed,
            ceiling: c.ceiling,
            lag_years: c.lag_years,
            regulatory_damping: c.regulatory_damping,
        })
    }
}

/// One jittered logistic curve: `floor + (cap - floor) / (1 + e^{-k (t - mid)})`.
fn logistic_curve(rng: &mut StdRng, jitter: &Normal<f64>) -> Vec<f64> {
    let floor = rng.gen_range(0.001..0.05);
    let cap = rng.gen_range(0.6..0.999);
    let midpoint = rng.gen_range(5.0..80.0);
    let steepness = rng.gen_range(0.05..0.3);

    let mut out = Vec::with_capacity(HORIZON_LEN);
    for t in 0..HORIZON_LEN {
        let x = steepness * (t as f64 - midpoint);
        let p = floor + (cap - floor) / (1.0 + (-x).exp());
        out.push((p + jitter.sample(rng)).clamp(0.0, 1.0));
    }
    out
}

/// Derive a sub-seed from `seed` and a salt. Fixed arithmetic, so generated
/// data stays the same across toolchains.
fn mix_seed(seed: u64, salt: &str) -> u64 {
    salt.bytes().fold(splitmix64(seed), |h, b| splitmix64(h ^ u64::from(b)))
}

/// One SplitMix64 step.
fn splitmix64(z: u64) -> u64 {
    let z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
