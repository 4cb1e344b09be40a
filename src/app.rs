//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - builds the engine from the configured data source
//! - runs one query and prints the report
//! - writes optional exports

use std::path::Path;

use chrono::Datelike;
use clap::Parser;
use tracing::debug;

use crate::cli::{
    Cli, Command, CompareArgs, CurveArgs, DataArgs, MetricsArgs, OverviewArgs, RankCountriesArgs,
    RankOccupationsArgs, SearchArgs, YearArgs,
};
use crate::domain::{DataSourceSpec, EngineConfig, FIRST_YEAR, LAST_YEAR, RunConfig};
use crate::engine::AutomationEngine;
use crate::error::{AppError, EngineError};
use crate::metrics::GROWTH_WINDOW_YEARS;

pub mod pipeline;

/// Entry point for the `autodiff` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = run_config_from_args(&cli.data)?;
    let (engine, summary) = pipeline::build_engine(&config)?;
    debug!("{}", crate::report::format_load_summary(&summary).trim_end());

    match cli.command {
        Command::RankCountries(args) => handle_rank_countries(&engine, args),
        Command::RankOccupations(args) => handle_rank_occupations(&engine, args),
        Command::Average(args) => handle_average(&engine, args),
        Command::Compare(args) => handle_compare(&engine, args),
        Command::Overview(args) => handle_overview(&engine, args),
        Command::Search(args) => handle_search(&engine, args),
        Command::Curve(args) => handle_curve(&engine, args),
        Command::Metrics(args) => handle_metrics(&engine, args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Resolve data source and engine config from CLI flags, env and config file.
pub fn run_config_from_args(args: &DataArgs) -> Result<RunConfig, AppError> {
    let mut engine = match &args.config {
        Some(path) => crate::io::read_engine_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(shape) = args.shape {
        engine.correction.shape = shape;
    }

    let source = match (&args.data_dir, args.synthetic) {
        (Some(dir), false) => DataSourceSpec::Directory(dir.clone()),
        _ => DataSourceSpec::Synthetic {
            seed: args.seed,
            occupations: args.occupations,
        },
    };

    Ok(RunConfig { source, engine })
}

/// Current calendar year clamped to `[FIRST_YEAR, last]`.
fn current_year(last: i32) -> i32 {
    chrono::Local::now().year().clamp(FIRST_YEAR, last)
}

fn query_year(args: &YearArgs) -> i32 {
    args.year.unwrap_or_else(|| current_year(LAST_YEAR))
}

fn reference_year(explicit: Option<i32>) -> i32 {
    explicit.unwrap_or_else(|| current_year(LAST_YEAR - GROWTH_WINDOW_YEARS))
}

fn handle_rank_countries(engine: &AutomationEngine, args: RankCountriesArgs) -> Result<(), AppError> {
    let result = engine.rank_countries_by_year(&args.occupation, query_year(&args.year))?;
    let profiles = engine.profile_snapshot();
    println!(
        "{}",
        crate::report::format_ranking(&result, &engine.config().metrics, |id| {
            profiles.get(id).ok().map(|p| p.display_name().to_string())
        })
    );
    Ok(())
}

fn handle_rank_occupations(engine: &AutomationEngine, args: RankOccupationsArgs) -> Result<(), AppError> {
    let result = engine.rank_occupations_by_country(&args.country, query_year(&args.year), args.top)?;
    let country = args.country.as_str();
    println!(
        "{}",
        crate::report::format_ranking(&result, &engine.config().metrics, |code| {
            engine.occupation_title(code, country).ok()
        })
    );
    Ok(())
}

fn handle_average(engine: &AutomationEngine, args: YearArgs) -> Result<(), AppError> {
    let result = engine.rank_countries_by_average(query_year(&args))?;
    let profiles = engine.profile_snapshot();
    println!(
        "{}",
        crate::report::format_ranking(&result, &engine.config().metrics, |id| {
            profiles.get(id).ok().map(|p| p.display_name().to_string())
        })
    );
    Ok(())
}

fn handle_compare(engine: &AutomationEngine, args: CompareArgs) -> Result<(), AppError> {
    let countries = if args.countries.is_empty() {
        engine.profiles().country_ids()
    } else {
        args.countries
    };
    let bundles = engine.compare_across_countries(&args.occupation, &countries, reference_year(args.reference_year))?;

    let title = match countries.first() {
        Some(first) => engine
            .occupation_title(&args.occupation, first)
            .map(|t| format!("{} ({t})", args.occupation))
            .unwrap_or_else(|_| args.occupation.clone()),
        None => args.occupation.clone(),
    };
    println!("{}", crate::report::format_comparison(&title, &bundles));
    Ok(())
}

fn handle_overview(engine: &AutomationEngine, args: OverviewArgs) -> Result<(), AppError> {
    let overview = engine.country_overview(&args.country, query_year(&args.year), args.high_risk_year)?;
    let profile = engine.profiles().get_profile(&args.country)?;
    println!("{}", crate::report::format_overview(&overview, &profile));
    Ok(())
}

fn handle_search(engine: &AutomationEngine, args: SearchArgs) -> Result<(), AppError> {
    let hits = engine.search_occupations(&args.country, &args.query)?;
    println!("{}", crate::report::format_search(&args.query, &hits));
    Ok(())
}

fn handle_curve(engine: &AutomationEngine, args: CurveArgs) -> Result<(), AppError> {
    let countries = if args.countries.is_empty() {
        // Every loaded country that holds the occupation, in lexical order.
        let holders: Vec<String> = engine
            .occupations()
            .snapshot()
            .iter()
            .filter(|(_, ds)| ds.contains(&args.occupation))
            .map(|(id, _)| id.clone())
            .collect();
        if holders.is_empty() {
            return Err(EngineError::UnknownOccupation {
                code: args.occupation,
                country_id: "any loaded country".to_string(),
            }
            .into());
        }
        holders
    } else {
        args.countries
    };

    let curves = countries
        .iter()
        .map(|country| engine.corrected_curve(&args.occupation, country))
        .collect::<Result<Vec<_>, _>>()?;

    if !args.no_plot {
        let refs: Vec<_> = curves.iter().collect();
        println!("{}", crate::plot::render_curves(&refs, args.width, args.height));
    }
    if let Some(path) = &args.export {
        crate::io::write_curves_csv(path, &curves)?;
        report_export(path);
    }
    Ok(())
}

fn handle_metrics(engine: &AutomationEngine, args: MetricsArgs) -> Result<(), AppError> {
    let bundles = engine.country_metrics(&args.country, reference_year(args.reference_year))?;
    println!(
        "{}",
        crate::report::format_metrics_table(&bundles, &engine.config().metrics)
    );
    if let Some(path) = &args.export {
        crate::io::write_metrics(path, &bundles)?;
        report_export(path);
    }
    Ok(())
}

fn report_export(path: &Path) {
    tracing::info!(path = %path.display(), "export written");
}
