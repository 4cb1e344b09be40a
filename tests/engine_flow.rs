//! End-to-end flows: source -> stores -> engine queries.

use std::fmt::Write as _;
use std::path::Path;

use automation_diffusion::app::pipeline::{build_engine, load_into};
use automation_diffusion::data::{OccupationSource, SyntheticSource};
use automation_diffusion::domain::{
    DataSourceSpec, DiffusionProfile, EngineConfig, FIRST_YEAR, HORIZON_LEN, LAST_YEAR, RunConfig, SpeedClass,
};
use automation_diffusion::io::{CsvDirectory, PROFILES_FILE};
use automation_diffusion::{AutomationEngine, EngineError};

fn synthetic_engine(seed: u64, occupations: usize) -> AutomationEngine {
    let config = RunConfig {
        source: DataSourceSpec::Synthetic { seed, occupations },
        engine: EngineConfig::default(),
    };
    build_engine(&config).unwrap().0
}

#[test]
fn every_synthetic_curve_is_bounded_and_monotone() {
    let engine = synthetic_engine(11, 25);
    let profiles = engine.profile_snapshot();
    for (country_id, dataset) in engine.occupations().snapshot().iter() {
        let ceiling = profiles.get(country_id).unwrap().ceiling;
        for record in dataset.records() {
            let curve = engine.corrected_curve(record.code(), country_id).unwrap();
            let v = curve.values();
            assert_eq!(v.len(), HORIZON_LEN);
            assert!(v.iter().all(|&x| (0.0..=ceiling).contains(&x)));
            assert!(v.windows(2).all(|w| w[0] <= w[1]), "{country_id}/{}", record.code());
        }
    }
}

#[test]
fn queries_are_reproducible_across_engines() {
    let a = synthetic_engine(5, 30);
    let b = synthetic_engine(5, 30);

    for year in [2024, 2050, 2107] {
        assert_eq!(
            a.rank_countries_by_year("43-9021.00", year).unwrap(),
            b.rank_countries_by_year("43-9021.00", year).unwrap()
        );
        assert_eq!(
            a.rank_occupations_by_country("Germany", year, Some(10)).unwrap(),
            b.rank_occupations_by_country("Germany", year, Some(10)).unwrap()
        );
    }
    assert_eq!(
        a.compare_across_countries("11-1011.00", &["USA", "China"], 2030).unwrap(),
        b.compare_across_countries("11-1011.00", &["USA", "China"], 2030).unwrap()
    );
}

#[test]
fn threshold_years_are_ordered_in_every_bundle() {
    let engine = synthetic_engine(3, 20);
    for country in engine.profiles().country_ids() {
        for bundle in engine.country_metrics(&country, 2024).unwrap() {
            if let Some(y90) = bundle.year_reaches_90pct {
                let y50 = bundle.year_reaches_50pct.unwrap();
                assert!(y50 <= y90);
                assert_ne!(bundle.speed_class, SpeedClass::Stalled);
            } else {
                assert_eq!(bundle.speed_class, SpeedClass::Stalled);
            }
            assert_eq!(bundle.risk_tier_by_year.len(), HORIZON_LEN);
        }
    }
}

#[test]
fn rejected_profile_reload_keeps_previous_set() {
    let engine = synthetic_engine(1, 5);
    let before = engine.rank_countries_by_year("11-1011.00", 2040).unwrap();

    let err = engine
        .profiles()
        .load_profiles(vec![
            DiffusionProfile::new("USA", 2.0, 0.9, 0.0),
            DiffusionProfile::new("Mali", -1.0, 0.5, 10.0),
        ])
        .unwrap_err();
    assert!(matches!(err, EngineError::ProfileValidationFailed { .. }));

    assert_eq!(engine.rank_countries_by_year("11-1011.00", 2040).unwrap(), before);
}

fn linear_row(code: &str, title: &str) -> String {
    let mut row = format!("{code},\"{title}\"");
    for i in 0..HORIZON_LEN {
        let v = 0.003 + 0.996 * i as f64 / (HORIZON_LEN - 1) as f64;
        write!(row, ",{v}").unwrap();
    }
    row
}

fn write_directory(dir: &Path) {
    std::fs::write(
        dir.join(PROFILES_FILE),
        r#"[
            {"country_id": "USA", "name": "United States", "adoption_speed": 1.0, "ceiling": 0.999, "lag_years": 0},
            {"country_id": "Lagged", "adoption_speed": 1.0, "ceiling": 0.999, "lag_years": 20}
        ]"#,
    )
    .unwrap();

    let header: Vec<String> = (FIRST_YEAR..=LAST_YEAR).map(|y| y.to_string()).collect();
    let header = format!("code,title,{}", header.join(","));
    std::fs::write(
        dir.join("USA.csv"),
        format!(
            "{header}\n{}\n{}\nbroken,row\n",
            linear_row("11-1011.00", "Chief Executives"),
            linear_row("35-2014.00", "Cooks, Restaurant"),
        ),
    )
    .unwrap();
    std::fs::write(
        dir.join("Lagged.csv"),
        format!("{header}\n{}\n", linear_row("35-2014.00", "Cooks, Restaurant")),
    )
    .unwrap();
}

#[test]
fn csv_directory_drives_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    write_directory(dir.path());

    let config = RunConfig {
        source: DataSourceSpec::Directory(dir.path().to_path_buf()),
        engine: EngineConfig::default(),
    };
    let (engine, summary) = build_engine(&config).unwrap();
    assert_eq!(
        summary.countries,
        vec![("Lagged".to_string(), 1), ("USA".to_string(), 2)]
    );

    // A 20-year lag moves the 50% crossing 20 years later.
    let map = engine
        .compare_across_countries("35-2014.00", &["USA", "Lagged"], 2024)
        .unwrap();
    assert_eq!(map["USA"].year_reaches_50pct, Some(2062));
    assert_eq!(map["Lagged"].year_reaches_50pct, Some(2082));

    // Chief Executives only exist in USA: the comparison fails as a whole.
    assert_eq!(
        engine
            .compare_across_countries("11-1011.00", &["USA", "Lagged"], 2024)
            .unwrap_err(),
        EngineError::UnknownOccupation {
            code: "11-1011.00".to_string(),
            country_id: "Lagged".to_string(),
        }
    );

    assert_eq!(engine.occupation_title("35-2014.00", "USA").unwrap(), "Cooks, Restaurant");
}

#[test]
fn custom_source_loads_through_trait_object() {
    let engine = AutomationEngine::new(EngineConfig::default()).unwrap();
    let source = SyntheticSource::new(8, 4).unwrap();
    let summary = load_into(&engine, &source, "test".to_string()).unwrap();
    assert_eq!(summary.countries.len(), source.country_ids().unwrap().len());

    let dir_source = CsvDirectory::new("/definitely/not/here");
    assert_eq!(
        load_into(&engine, &dir_source, "missing".to_string()).unwrap_err().exit_code(),
        2
    );
    // The failed load left the synthetic data in place.
    assert_eq!(engine.profiles().country_ids().len(), 6);
}

#[test]
fn failed_directory_reload_keeps_previous_inputs() {
    let engine = synthetic_engine(9, 6);
    let ranked = engine.rank_countries_by_year("11-1011.00", 2040).unwrap();
    let average = engine.rank_countries_by_average(2040).unwrap();

    // A profile list naming a country that has no table.
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(PROFILES_FILE),
        r#"[{"country_id": "Atlantis", "adoption_speed": 1.0, "ceiling": 0.9, "lag_years": 0}]"#,
    )
    .unwrap();
    let err = load_into(&engine, &CsvDirectory::new(dir.path()), "atlantis".to_string()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    // A table that exists but fails the header schema.
    std::fs::write(dir.path().join("Atlantis.csv"), "code,title,2017\nx,y,0.1\n").unwrap();
    let err = load_into(&engine, &CsvDirectory::new(dir.path()), "atlantis".to_string()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    assert_eq!(engine.profiles().country_ids().len(), 6);
    assert!(!engine.profiles().country_ids().contains(&"Atlantis".to_string()));
    assert_eq!(engine.rank_countries_by_year("11-1011.00", 2040).unwrap(), ranked);
    assert_eq!(engine.rank_countries_by_average(2040).unwrap(), average);
}

#[test]
fn countries_without_a_table_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_directory(dir.path());
    std::fs::remove_file(dir.path().join("Lagged.csv")).unwrap();

    let config = RunConfig {
        source: DataSourceSpec::Directory(dir.path().to_path_buf()),
        engine: EngineConfig::default(),
    };
    let (engine, summary) = build_engine(&config).unwrap();
    assert_eq!(summary.countries, vec![("USA".to_string(), 2)]);
    assert_eq!(summary.missing, vec!["Lagged".to_string()]);

    // The skipped country's profile is not loaded either.
    assert_eq!(engine.profiles().country_ids(), vec!["USA".to_string()]);
    assert_eq!(
        engine.corrected_curve("35-2014.00", "Lagged").unwrap_err(),
        EngineError::UnknownCountry("Lagged".to_string())
    );
    assert_eq!(engine.rank_countries_by_year("35-2014.00", 2050).unwrap().ids(), vec!["USA"]);
}
