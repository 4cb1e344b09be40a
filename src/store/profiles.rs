//! Per-country diffusion profiles.
//!
//! The active set is an immutable `ProfileSet` behind an `Arc`. A reload
//! validates and builds the replacement without holding the lock, then swaps the
//! pointer in a single write. Readers holding an older snapshot keep a complete,
//! consistent set until they drop it.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::DiffusionProfile;
use crate::error::EngineError;

/// An immutable, validated set of profiles keyed by country id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    profiles: BTreeMap<String, DiffusionProfile>,
}

impl ProfileSet {
    /// Validate every profile and build a set. Any failure rejects the whole list.
    pub fn from_profiles(profiles: Vec<DiffusionProfile>) -> Result<Self, EngineError> {
        let mut map = BTreeMap::new();
        for profile in profiles {
            profile.validate()?;
            if map.contains_key(&profile.country_id) {
                return Err(EngineError::ProfileValidationFailed {
                    country_id: profile.country_id.clone(),
                    reason: "duplicate country_id in profile list".to_string(),
                });
            }
            map.insert(profile.country_id.clone(), profile);
        }
        Ok(Self { profiles: map })
    }

    pub fn get(&self, country_id: &str) -> Result<&DiffusionProfile, EngineError> {
        self.profiles
            .get(country_id)
            .ok_or_else(|| EngineError::UnknownCountry(country_id.to_string()))
    }

    /// Country ids in lexical order.
    pub fn country_ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiffusionProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Holder of the active profile set.
#[derive(Debug, Default)]
pub struct ProfileStore {
    current: RwLock<Arc<ProfileSet>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active set with `profiles`, all or nothing.
    ///
    /// On failure the previous set stays active and the error names the first
    /// offending profile.
    pub fn load_profiles(&self, profiles: Vec<DiffusionProfile>) -> Result<usize, EngineError> {
        let next = match ProfileSet::from_profiles(profiles) {
            Ok(set) => Arc::new(set),
            Err(err) => {
                warn!(error = %err, "profile reload rejected; keeping previous set");
                return Err(err);
            }
        };
        let count = next.len();
        self.install(next);
        info!(countries = count, "diffusion profiles loaded");
        Ok(count)
    }

    /// Swap in an already validated set.
    pub(crate) fn install(&self, next: Arc<ProfileSet>) {
        *self.current.write() = next;
    }

    pub fn get_profile(&self, country_id: &str) -> Result<DiffusionProfile, EngineError> {
        self.snapshot().get(country_id).cloned()
    }

    /// The active set. Holding the snapshot pins it across later reloads.
    pub fn snapshot(&self) -> Arc<ProfileSet> {
        Arc::clone(&self.current.read())
    }

    pub fn country_ids(&self) -> Vec<String> {
        self.snapshot().country_ids()
    }
}
