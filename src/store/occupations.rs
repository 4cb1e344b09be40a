//! Per-country occupation record sets.
//!
//! Same discipline as the profile store: datasets are immutable once built,
//! and the whole collection is swapped behind one `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::domain::OccupationRecord;
use crate::error::EngineError;

/// One country's occupations keyed by code.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryDataset {
    country_id: String,
    records: BTreeMap<String, OccupationRecord>,
}

impl CountryDataset {
    /// Build a dataset, rejecting duplicated occupation codes.
    pub fn new(country_id: impl Into<String>, records: Vec<OccupationRecord>) -> Result<Self, EngineError> {
        let country_id = country_id.into();
        let mut map = BTreeMap::new();
        for record in records {
            if map.contains_key(record.code()) {
                return Err(EngineError::DuplicateOccupation {
                    code: record.code().to_string(),
                    country_id,
                });
            }
            map.insert(record.code().to_string(), record);
        }
        Ok(Self { country_id, records: map })
    }

    pub fn country_id(&self) -> &str {
        &self.country_id
    }

    pub fn get(&self, code: &str) -> Result<&OccupationRecord, EngineError> {
        self.records.get(code).ok_or_else(|| EngineError::UnknownOccupation {
            code: code.to_string(),
            country_id: self.country_id.clone(),
        })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.records.contains_key(code)
    }

    /// Records in code order.
    pub fn records(&self) -> impl Iterator<Item = &OccupationRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// All loaded datasets keyed by country id.
pub type OccupationSet = BTreeMap<String, Arc<CountryDataset>>;

/// Build every dataset; the first invalid one rejects the whole list.
pub fn build_occupation_set(datasets: Vec<(String, Vec<OccupationRecord>)>) -> Result<OccupationSet, EngineError> {
    let mut next = OccupationSet::new();
    for (country_id, records) in datasets {
        let dataset = CountryDataset::new(country_id.clone(), records)?;
        next.insert(country_id, Arc::new(dataset));
    }
    Ok(next)
}

#[derive(Debug, Default)]
pub struct OccupationStore {
    current: RwLock<Arc<OccupationSet>>,
}

impl OccupationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or add) one country's dataset wholesale.
    pub fn load_country(&self, country_id: &str, records: Vec<OccupationRecord>) -> Result<usize, EngineError> {
        let dataset = Arc::new(CountryDataset::new(country_id, records)?);
        let count = dataset.len();

        let mut guard = self.current.write();
        let mut next = OccupationSet::clone(&guard);
        next.insert(country_id.to_string(), dataset);
        *guard = Arc::new(next);
        drop(guard);

        info!(country = country_id, occupations = count, "occupation dataset loaded");
        Ok(count)
    }

    /// Replace every dataset at once, all or nothing.
    pub fn load_all(&self, datasets: Vec<(String, Vec<OccupationRecord>)>) -> Result<usize, EngineError> {
        let next = build_occupation_set(datasets)?;
        let countries = next.len();
        self.install(Arc::new(next));
        info!(countries, "occupation datasets loaded");
        Ok(countries)
    }

    /// Swap in an already built set.
    pub(crate) fn install(&self, next: Arc<OccupationSet>) {
        *self.current.write() = next;
    }

    pub fn snapshot(&self) -> Arc<OccupationSet> {
        Arc::clone(&self.current.read())
    }

    pub fn dataset(&self, country_id: &str) -> Result<Arc<CountryDataset>, EngineError> {
        self.snapshot()
            .get(country_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCountry(country_id.to_string()))
    }
}
