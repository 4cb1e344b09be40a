//! Query interface over the stores.
//!
//! Every query pins one snapshot of each store for its whole duration, so a
//! concurrent reload can never mix old and new inputs inside one answer.
//! `load_inputs` publishes a new profile set and a new occupation set under one
//! write guard, and queries take both snapshots under the matching read guard,
//! so a query sees either both old sets or both new ones.
//! Per-pair work (correction + metrics) fans out over `rayon`; results are then
//! gathered in a fixed order so that errors and rankings are deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::correct::correct;
use crate::domain::{
    ComparisonResult, CorrectedCurve, CountryOverview, DiffusionProfile, EngineConfig, MetricBundle,
    OccupationMatch, OccupationRecord, RankEntry, RiskTier, year_index,
};
use crate::error::EngineError;
use crate::metrics::{derive_metrics, risk_tier};
use crate::rank::build_ranking;
use crate::store::{
    CountryDataset, OccupationSet, OccupationStore, ProfileSet, ProfileStore, build_occupation_set,
};

pub struct AutomationEngine {
    profiles: ProfileStore,
    occupations: OccupationStore,
    /// Read while a query pins its snapshots, written while `load_inputs` swaps both sets.
    publish: RwLock<()>,
    config: EngineConfig,
}

/// Both input sets as of one instant.
struct Inputs {
    profiles: Arc<ProfileSet>,
    occupations: Arc<OccupationSet>,
}

impl Inputs {
    fn dataset(&self, country_id: &str) -> Result<&CountryDataset, EngineError> {
        self.occupations
            .get(country_id)
            .map(|ds| ds.as_ref())
            .ok_or_else(|| EngineError::UnknownCountry(country_id.to_string()))
    }
}

impl AutomationEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            profiles: ProfileStore::new(),
            occupations: OccupationStore::new(),
            publish: RwLock::new(()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn occupations(&self) -> &OccupationStore {
        &self.occupations
    }

    /// Replace profiles and occupation datasets together, all or nothing.
    ///
    /// Both sets are validated before anything is published, and every dataset
    /// must have a profile. On failure the previous pair stays active.
    /// Returns `(profiles, datasets)` loaded.
    pub fn load_inputs(
        &self,
        profiles: Vec<DiffusionProfile>,
        datasets: Vec<(String, Vec<OccupationRecord>)>,
    ) -> Result<(usize, usize), EngineError> {
        let built = ProfileSet::from_profiles(profiles).and_then(|profile_set| {
            let occupation_set = build_occupation_set(datasets)?;
            for country_id in occupation_set.keys() {
                profile_set.get(country_id)?;
            }
            Ok((profile_set, occupation_set))
        });
        let (profile_set, occupation_set) = match built {
            Ok(pair) => pair,
            Err(err) => {
                warn!(error = %err, "input reload rejected; keeping previous inputs");
                return Err(err);
            }
        };

        let counts = (profile_set.len(), occupation_set.len());
        {
            let _guard = self.publish.write();
            self.profiles.install(Arc::new(profile_set));
            self.occupations.install(Arc::new(occupation_set));
        }
        info!(profiles = counts.0, datasets = counts.1, "engine inputs loaded");
        Ok(counts)
    }

    fn inputs(&self) -> Inputs {
        let _guard = self.publish.read();
        Inputs {
            profiles: self.profiles.snapshot(),
            occupations: self.occupations.snapshot(),
        }
    }

    /// Corrected curve for one (occupation, country) pair.
    pub fn corrected_curve(&self, occupation_code: &str, country_id: &str) -> Result<CorrectedCurve, EngineError> {
        let inputs = self.inputs();
        let dataset = inputs.dataset(country_id)?;
        let profile = inputs.profiles.get(country_id)?;
        self.correct_one(dataset.get(occupation_code)?, profile)
    }

    /// Metric bundle for one (occupation, country) pair.
    pub fn metrics(
        &self,
        occupation_code: &str,
        country_id: &str,
        reference_year: i32,
    ) -> Result<MetricBundle, EngineError> {
        let curve = self.corrected_curve(occupation_code, country_id)?;
        derive_metrics(&curve, reference_year, &self.config.metrics)
    }

    /// Countries holding `occupation_code`, by corrected probability in `year`.
    pub fn rank_countries_by_year(&self, occupation_code: &str, year: i32) -> Result<ComparisonResult, EngineError> {
        let idx = year_index(year)?;
        debug!(occupation = occupation_code, year, "ranking countries");

        let inputs = self.inputs();
        let holders: Vec<(&String, &OccupationRecord)> = inputs
            .occupations
            .iter()
            .filter_map(|(country_id, ds)| ds.get(occupation_code).ok().map(|r| (country_id, r)))
            .collect();

        if holders.is_empty() {
            return Err(EngineError::UnknownOccupation {
                code: occupation_code.to_string(),
                country_id: "any loaded country".to_string(),
            });
        }

        let entries: Vec<Result<RankEntry, EngineError>> = holders
            .par_iter()
            .map(|(country_id, record)| {
                let curve = self.correct_one(record, inputs.profiles.get(country_id)?)?;
                Ok(RankEntry {
                    entity_id: (*country_id).clone(),
                    value: curve.values()[idx],
                })
            })
            .collect();
        let entries = entries.into_iter().collect::<Result<Vec<_>, _>>()?;

        build_ranking(
            format!("corrected probability of {occupation_code} in {year}"),
            year,
            entries,
            None,
        )
    }

    /// Occupations of one country, by corrected probability in `year`.
    pub fn rank_occupations_by_country(
        &self,
        country_id: &str,
        year: i32,
        top_n: Option<usize>,
    ) -> Result<ComparisonResult, EngineError> {
        if let Some(0) = top_n {
            return Err(EngineError::InvalidLimit(0));
        }
        let idx = year_index(year)?;
        debug!(country = country_id, year, ?top_n, "ranking occupations");

        let inputs = self.inputs();
        let dataset = inputs.dataset(country_id)?;
        let profile = inputs.profiles.get(country_id)?;

        let entries = self
            .correct_dataset(dataset, profile)?
            .into_iter()
            .map(|curve| RankEntry {
                entity_id: curve.occupation_code().to_string(),
                value: curve.values()[idx],
            })
            .collect();

        build_ranking(
            format!("corrected probability in {country_id} in {year}"),
            year,
            entries,
            top_n,
        )
    }

    /// Metric bundles for one occupation in each requested country.
    ///
    /// All or nothing: if any country is unknown or lacks the occupation, the
    /// whole call fails and no partial map is returned.
    pub fn compare_across_countries<S: AsRef<str>>(
        &self,
        occupation_code: &str,
        country_ids: &[S],
        reference_year: i32,
    ) -> Result<BTreeMap<String, MetricBundle>, EngineError> {
        debug!(occupation = occupation_code, countries = country_ids.len(), "comparing across countries");
        let inputs = self.inputs();

        let mut pairs: Vec<(&OccupationRecord, &DiffusionProfile)> = Vec::with_capacity(country_ids.len());
        for id in country_ids {
            let id = id.as_ref();
            let dataset = inputs.dataset(id)?;
            let profile = inputs.profiles.get(id)?;
            pairs.push((dataset.get(occupation_code)?, profile));
        }

        let bundles: Vec<Result<MetricBundle, EngineError>> = pairs
            .par_iter()
            .map(|(record, profile)| {
                let curve = self.correct_one(record, profile)?;
                derive_metrics(&curve, reference_year, &self.config.metrics)
            })
            .collect();

        let mut out = BTreeMap::new();
        for bundle in bundles {
            let bundle = bundle?;
            out.insert(bundle.country_id.clone(), bundle);
        }
        Ok(out)
    }

    /// Countries by mean corrected probability (over all their occupations) in `year`.
    pub fn rank_countries_by_average(&self, year: i32) -> Result<ComparisonResult, EngineError> {
        let idx = year_index(year)?;
        let inputs = self.inputs();

        let mut entries = Vec::new();
        for (country_id, dataset) in inputs.occupations.iter().filter(|(_, ds)| !ds.is_empty()) {
            let curves = self.correct_dataset(dataset, inputs.profiles.get(country_id)?)?;
            let mean = curves.iter().map(|c| c.values()[idx]).sum::<f64>() / curves.len() as f64;
            entries.push(RankEntry {
                entity_id: country_id.clone(),
                value: mean,
            });
        }

        build_ranking(format!("mean corrected probability in {year}"), year, entries, None)
    }

    /// Aggregate view of one country.
    ///
    /// `high_risk_count` counts occupations whose corrected value in
    /// `high_risk_year` falls in the `high` tier.
    pub fn country_overview(
        &self,
        country_id: &str,
        year: i32,
        high_risk_year: i32,
    ) -> Result<CountryOverview, EngineError> {
        let idx = year_index(year)?;
        let risk_idx = year_index(high_risk_year)?;
        let inputs = self.inputs();
        let curves = self.correct_dataset(inputs.dataset(country_id)?, inputs.profiles.get(country_id)?)?;

        let total = curves.len();
        let (mean_probability, high_risk_count, high_risk_pct) = if total == 0 {
            (0.0, 0, 0.0)
        } else {
            let mean = curves.iter().map(|c| c.values()[idx]).sum::<f64>() / total as f64;
            let high = curves
                .iter()
                .filter(|c| risk_tier(c.values()[risk_idx], &self.config.metrics) == RiskTier::High)
                .count();
            (mean, high, high as f64 / total as f64 * 100.0)
        };

        Ok(CountryOverview {
            country_id: country_id.to_string(),
            total_occupations: total,
            year,
            mean_probability,
            high_risk_year,
            high_risk_count,
            high_risk_pct,
        })
    }

    /// Metric bundles for every occupation of a country, in code order.
    pub fn country_metrics(&self, country_id: &str, reference_year: i32) -> Result<Vec<MetricBundle>, EngineError> {
        let inputs = self.inputs();
        let curves = self.correct_dataset(inputs.dataset(country_id)?, inputs.profiles.get(country_id)?)?;
        curves
            .par_iter()
            .map(|curve| derive_metrics(curve, reference_year, &self.config.metrics))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    /// Case-insensitive substring search over codes and titles.
    pub fn search_occupations(&self, country_id: &str, query: &str) -> Result<Vec<OccupationMatch>, EngineError> {
        let dataset = self.occupations.dataset(country_id)?;
        let needle = query.trim().to_lowercase();
        Ok(dataset
            .records()
            .filter(|r| {
                needle.is_empty()
                    || r.code().to_lowercase().contains(&needle)
                    || r.title().to_lowercase().contains(&needle)
            })
            .map(|r| OccupationMatch {
                code: r.code().to_string(),
                title: r.title().to_string(),
            })
            .collect())
    }

    /// Title of an occupation in a country (for display).
    pub fn occupation_title(&self, occupation_code: &str, country_id: &str) -> Result<String, EngineError> {
        Ok(self.occupations.dataset(country_id)?.get(occupation_code)?.title().to_string())
    }

    /// The active profile set.
    pub fn profile_snapshot(&self) -> Arc<ProfileSet> {
        self.profiles.snapshot()
    }

    fn correct_one(&self, record: &OccupationRecord, profile: &DiffusionProfile) -> Result<CorrectedCurve, EngineError> {
        correct(record, profile, &self.config.correction)
    }

    fn correct_dataset(
        &self,
        dataset: &CountryDataset,
        profile: &DiffusionProfile,
    ) -> Result<Vec<CorrectedCurve>, EngineError> {
        let records: Vec<&OccupationRecord> = dataset.records().collect();
        records
            .par_iter()
            .map(|record| self.correct_one(record, profile))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HORIZON_LEN, MetricsConfig, SpeedClass};

    fn linear(start: f64, end: f64) -> Vec<f64> {
        (0..HORIZON_LEN)
            .map(|i| start + (end - start) * i as f64 / (HORIZON_LEN - 1) as f64)
            .collect()
    }

    fn record(code: &str, title: &str, start: f64, end: f64) -> OccupationRecord {
        OccupationRecord::new(code, title, linear(start, end)).unwrap()
    }

    fn profiles() -> Vec<DiffusionProfile> {
        vec![
            DiffusionProfile::new("USA", 1.0, 0.999, 0.0),
            DiffusionProfile::new("Germany", 1.0, 0.999, 0.0),
            DiffusionProfile::new("Mali", 0.5, 0.8, 15.0),
        ]
    }

    fn datasets() -> Vec<(String, Vec<OccupationRecord>)> {
        let usa = vec![
            record("11-1011.00", "Chief Executives", 0.003, 0.999),
            record("43-9021.00", "Data Entry Keyers", 0.3, 0.99),
            record("29-1141.00", "Registered Nurses", 0.01, 0.4),
        ];
        let germany = vec![
            record("11-1011.00", "Chief Executives", 0.003, 0.999),
            record("43-9021.00", "Data Entry Keyers", 0.2, 0.95),
        ];
        let mali = vec![record("43-9021.00", "Data Entry Keyers", 0.3, 0.99)];
        vec![
            ("USA".to_string(), usa),
            ("Germany".to_string(), germany),
            ("Mali".to_string(), mali),
        ]
    }

    fn engine() -> AutomationEngine {
        let engine = AutomationEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.load_inputs(profiles(), datasets()).unwrap(), (3, 3));
        engine
    }

    #[test]
    fn rank_countries_breaks_ties_by_id() {
        let engine = engine();
        let result = engine.rank_countries_by_year("11-1011.00", 2050).unwrap();
        // Same curve and profile in both countries: tie broken lexically.
        assert_eq!(result.ids(), vec!["Germany", "USA"]);
        assert_eq!(result.entries[0].value, result.entries[1].value);

        let again = engine.rank_countries_by_year("11-1011.00", 2050).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn rank_countries_orders_by_value() {
        let engine = engine();
        let result = engine.rank_countries_by_year("43-9021.00", 2040).unwrap();
        assert_eq!(result.ids(), vec!["USA", "Germany", "Mali"]);
        assert!(result.entries.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn rank_countries_unknown_occupation_and_year() {
        let engine = engine();
        assert!(matches!(
            engine.rank_countries_by_year("99-9999.00", 2050),
            Err(EngineError::UnknownOccupation { .. })
        ));
        assert!(matches!(
            engine.rank_countries_by_year("11-1011.00", 2200),
            Err(EngineError::YearOutOfRange { .. })
        ));
    }

    #[test]
    fn rank_occupations_with_limit() {
        let engine = engine();
        let all = engine.rank_occupations_by_country("USA", 2030, None).unwrap();
        assert_eq!(all.ids(), vec!["43-9021.00", "11-1011.00", "29-1141.00"]);

        let top = engine.rank_occupations_by_country("USA", 2030, Some(1)).unwrap();
        assert_eq!(top.ids(), vec!["43-9021.00"]);

        assert_eq!(
            engine.rank_occupations_by_country("USA", 2030, Some(0)).unwrap_err(),
            EngineError::InvalidLimit(0)
        );
        assert!(matches!(
            engine.rank_occupations_by_country("Chad", 2030, None),
            Err(EngineError::UnknownCountry(_))
        ));
    }

    #[test]
    fn compare_is_all_or_nothing() {
        let engine = engine();
        let err = engine
            .compare_across_countries("11-1011.00", &["USA", "Mali"], 2024)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownOccupation {
                code: "11-1011.00".to_string(),
                country_id: "Mali".to_string(),
            }
        );

        assert!(matches!(
            engine.compare_across_countries("11-1011.00", &["USA", "Atlantis"], 2024),
            Err(EngineError::UnknownCountry(_))
        ));
    }

    #[test]
    fn compare_returns_bundle_per_country() {
        let engine = engine();
        let map = engine
            .compare_across_countries("43-9021.00", &["Mali", "USA", "Germany"], 2024)
            .unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Germany", "Mali", "USA"]);

        let usa = &map["USA"];
        let mali = &map["Mali"];
        assert!(usa.year_reaches_50pct.unwrap() < mali.year_reaches_50pct.unwrap_or(i32::MAX));
        assert_eq!(mali.year_reaches_90pct, None);
        assert_eq!(mali.speed_class, SpeedClass::Stalled);
    }

    #[test]
    fn compare_fails_on_horizon() {
        let engine = engine();
        assert!(matches!(
            engine.compare_across_countries("43-9021.00", &["USA"], 2100),
            Err(EngineError::InsufficientHorizon { .. })
        ));
    }

    #[test]
    fn missing_profile_is_unknown_country() {
        let engine = engine();
        engine
            .occupations()
            .load_country("China", vec![record("11-1011.00", "Chief Executives", 0.1, 0.9)])
            .unwrap();
        assert_eq!(
            engine.rank_countries_by_year("11-1011.00", 2050).unwrap_err(),
            EngineError::UnknownCountry("China".to_string())
        );
    }

    #[test]
    fn load_inputs_requires_a_profile_per_dataset() {
        let engine = engine();
        let before = engine.rank_countries_by_average(2040).unwrap();

        let err = engine
            .load_inputs(
                vec![DiffusionProfile::new("Atlantis", 1.0, 0.9, 0.0)],
                vec![("Chad".to_string(), vec![record("11-1011.00", "Chief Executives", 0.1, 0.9)])],
            )
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownCountry("Chad".to_string()));

        // Neither half of the rejected pair was published.
        assert_eq!(engine.profiles().country_ids(), vec!["Germany", "Mali", "USA"]);
        assert_eq!(engine.occupations().snapshot().len(), 3);
        assert_eq!(engine.rank_countries_by_average(2040).unwrap(), before);
    }

    #[test]
    fn load_inputs_rejects_invalid_profiles_before_publishing() {
        let engine = engine();
        let mut bad = profiles();
        bad[2].ceiling = 1.5;
        assert!(matches!(
            engine.load_inputs(bad, datasets()),
            Err(EngineError::ProfileValidationFailed { .. })
        ));
        assert_eq!(engine.profile_snapshot().get("Mali").unwrap().ceiling, 0.8);
    }

    #[test]
    fn readers_never_see_a_mixed_reload() {
        let engine = engine();
        let other_profiles = || vec![DiffusionProfile::new("Chad", 0.8, 0.9, 5.0)];
        let other_datasets = || {
            vec![(
                "Chad".to_string(),
                vec![record("43-9021.00", "Data Entry Keyers", 0.2, 0.9)],
            )]
        };

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..50 {
                    if i % 2 == 0 {
                        engine.load_inputs(other_profiles(), other_datasets()).unwrap();
                    } else {
                        engine.load_inputs(profiles(), datasets()).unwrap();
                    }
                }
            });
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let ranking = engine.rank_countries_by_average(2050).unwrap();
                        assert!(ranking.entries.len() == 1 || ranking.entries.len() == 3);
                    }
                });
            }
        });
    }

    #[test]
    fn overview_counts_high_tier() {
        let engine = engine();
        let overview = engine.country_overview("USA", 2024, 2050).unwrap();
        assert_eq!(overview.total_occupations, 3);
        // Data entry is high by 2050; CEOs (linear 0.003→0.999) cross 0.5 only in 2062.
        assert_eq!(overview.high_risk_count, 1);
        assert!((overview.high_risk_pct - 100.0 / 3.0).abs() < 1e-9);
        assert!(overview.mean_probability > 0.0);
    }

    #[test]
    fn average_ranking_covers_all_countries() {
        let engine = engine();
        let result = engine.rank_countries_by_average(2060).unwrap();
        assert_eq!(result.entries.len(), 3);
        assert_eq!(result.entries.last().unwrap().entity_id, "Mali");
    }

    #[test]
    fn search_matches_code_or_title() {
        let engine = engine();
        let hits = engine.search_occupations("USA", "NURSE").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "29-1141.00");

        let hits = engine.search_occupations("USA", "43-").unwrap();
        assert_eq!(hits[0].title, "Data Entry Keyers");

        assert_eq!(engine.search_occupations("USA", "").unwrap().len(), 3);
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = EngineConfig {
            metrics: MetricsConfig {
                rapid_gap_years: 40,
                ..MetricsConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(matches!(AutomationEngine::new(cfg), Err(EngineError::InvalidConfig(_))));
    }
}
