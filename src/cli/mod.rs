//! Command-line parsing for the automation diffusion engine.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (`app`) and from the engine.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::AdoptionShape;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "autodiff",
    version,
    about = "Country-adjusted automation probability curves, metrics and rankings"
)]
pub struct Cli {
    #[command(flatten)]
    pub data: DataArgs,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank countries by an occupation's corrected probability in one year.
    RankCountries(RankCountriesArgs),
    /// Rank a country's occupations by corrected probability in one year.
    RankOccupations(RankOccupationsArgs),
    /// Rank countries by mean corrected probability across their occupations.
    Average(YearArgs),
    /// Compare one occupation's metrics across countries.
    Compare(CompareArgs),
    /// Headline numbers for one country.
    Overview(OverviewArgs),
    /// Find occupations by code or title.
    Search(SearchArgs),
    /// Plot (and optionally export) corrected curves for one occupation.
    Curve(CurveArgs),
    /// Metric bundles for every occupation of a country.
    Metrics(MetricsArgs),
}

/// Where data comes from and how the engine is configured.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Data directory holding `profiles.json` and one `<country>.csv` per country.
    #[arg(long, global = true, env = "AUTODIFF_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use seeded synthetic data even if a data directory is configured.
    #[arg(long, global = true)]
    pub synthetic: bool,

    /// Seed for synthetic data.
    #[arg(long, global = true, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic occupations.
    #[arg(long, global = true, default_value_t = 40)]
    pub occupations: usize,

    /// Engine config JSON (metrics thresholds, correction shape).
    #[arg(long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Adoption multiplier shape (overrides the config file).
    #[arg(long, global = true, value_enum)]
    pub shape: Option<AdoptionShape>,
}

#[derive(Debug, Args, Clone)]
pub struct YearArgs {
    /// Query year (defaults to the current year).
    #[arg(short, long)]
    pub year: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct RankCountriesArgs {
    /// Occupation code, e.g. 43-9021.00.
    pub occupation: String,

    #[command(flatten)]
    pub year: YearArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RankOccupationsArgs {
    pub country: String,

    #[command(flatten)]
    pub year: YearArgs,

    /// Keep only the first N entries.
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    pub occupation: String,

    /// Comma-separated country ids (defaults to every loaded country).
    #[arg(short, long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Start year of the 10-year growth window (defaults to the current year).
    #[arg(long)]
    pub reference_year: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct OverviewArgs {
    pub country: String,

    #[command(flatten)]
    pub year: YearArgs,

    /// Year at which occupations are counted as high risk.
    #[arg(long, default_value_t = 2050)]
    pub high_risk_year: i32,
}

#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    pub country: String,

    /// Case-insensitive substring of the code or title (empty lists all).
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    pub occupation: String,

    /// Comma-separated country ids (defaults to every loaded country holding the occupation).
    #[arg(short, long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 91)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 21)]
    pub height: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Export curves to CSV (country_id,occupation_code,year,value).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct MetricsArgs {
    pub country: String,

    /// Start year of the 10-year growth window (defaults to the current year).
    #[arg(long)]
    pub reference_year: Option<i32>,

    /// Export bundles; `.json` writes JSON, anything else CSV.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "autodiff",
            "compare",
            "43-9021.00",
            "--countries",
            "USA,Mali",
            "--synthetic",
            "--shape",
            "saturating",
        ]);
        assert!(cli.data.synthetic);
        assert_eq!(cli.data.shape, Some(AdoptionShape::Saturating));
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.countries, vec!["USA", "Mali"]);
                assert_eq!(args.reference_year, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn overview_defaults_high_risk_year() {
        let cli = Cli::parse_from(["autodiff", "overview", "Germany", "--year", "2030"]);
        match cli.command {
            Command::Overview(args) => {
                assert_eq!(args.year.year, Some(2030));
                assert_eq!(args.high_risk_year, 2050);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
