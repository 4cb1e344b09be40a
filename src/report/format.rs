//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the engine code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use std::collections::BTreeMap;

use crate::app::pipeline::LoadSummary;
use crate::domain::{ComparisonResult, CountryOverview, DiffusionProfile, MetricBundle, MetricsConfig, OccupationMatch};
use crate::metrics::risk_tier;
use crate::report::{speed_phrase, tier_marker};

/// One line per loaded country, plus totals.
pub fn format_load_summary(summary: &LoadSummary) -> String {
    let mut out = String::new();
    out.push_str("=== autodiff - Automation Diffusion ===\n");
    out.push_str(&format!("Source: {}\n", summary.source));
    out.push_str(&format!(
        "Loaded: {} countries | {} occupation rows\n",
        summary.countries.len(),
        summary.total_records()
    ));
    for (country, n) in &summary.countries {
        out.push_str(&format!("  {country:<12} {n:>6}\n"));
    }
    if !summary.missing.is_empty() {
        out.push_str(&format!("Missing data files: {}\n", summary.missing.join(", ")));
    }
    out
}

/// A ranking table. `label` supplies an optional display name per entity id.
pub fn format_ranking(
    result: &ComparisonResult,
    metrics: &MetricsConfig,
    label: impl Fn(&str) -> Option<String>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Ranking: {}\n", result.sort_key));
    out.push_str(format!("{:>4} {:<14} {:<40} {:>8} {:<5}", "#", "id", "name", "p", "tier").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<14} {:-<40} {:-<8} {:-<5}", "", "", "", "", "").trim_end());
    out.push('\n');

    for (i, e) in result.entries.iter().enumerate() {
        let name = label(&e.entity_id).unwrap_or_default();
        out.push_str(
            format!(
                "{:>4} {:<14} {:<40} {:>7.1}% {:<5}",
                i + 1,
                truncate(&e.entity_id, 14),
                truncate(&name, 40),
                e.value * 100.0,
                tier_marker(risk_tier(e.value, metrics)),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Side-by-side metric bundles, one row per country.
pub fn format_comparison(title: &str, bundles: &BTreeMap<String, MetricBundle>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Comparison: {title}\n"));
    out.push_str(
        format!(
            "{:<12} {:>7} {:>7} {:>7} {:>7} {:>9} {:>6} {:>6} {:<20}",
            "country", "2024", "2030", "2050", "2107", "growth10", "50%", "90%", "speed"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<7} {:-<7} {:-<7} {:-<7} {:-<9} {:-<6} {:-<6} {:-<20}",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (country, b) in bundles {
        let m = &b.milestones;
        out.push_str(
            format!(
                "{:<12} {:>6.1}% {:>6.1}% {:>6.1}% {:>6.1}% {:>8.1}% {:>6} {:>6} {:<20}",
                truncate(country, 12),
                m.current_2024 * 100.0,
                m.outlook_2030 * 100.0,
                m.midterm_2050 * 100.0,
                m.final_2107 * 100.0,
                b.growth_rate_10yr * 100.0,
                fmt_year(b.year_reaches_50pct),
                fmt_year(b.year_reaches_90pct),
                speed_phrase(b.speed_class),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if let Some(b) = bundles.values().next() {
        out.push_str(&format!("(growth10 measured from {})\n", b.reference_year));
    }
    out
}

/// Headline numbers for one country.
pub fn format_overview(overview: &CountryOverview, profile: &DiffusionProfile) -> String {
    let mut out = String::new();
    out.push_str(&format!("Country: {} ({})\n", profile.display_name(), overview.country_id));
    if let Some(desc) = &profile.description {
        out.push_str(&format!("  {desc}\n"));
    }
    out.push_str(&format!(
        "Profile: speed={:.2} ceiling={:.2} lag={:.1}y damping={:.2}\n",
        profile.adoption_speed, profile.ceiling, profile.lag_years, profile.regulatory_damping
    ));
    out.push_str(&format!("Occupations: {}\n", overview.total_occupations));
    out.push_str(&format!(
        "Mean probability {}: {:.1}%\n",
        overview.year,
        overview.mean_probability * 100.0
    ));
    out.push_str(&format!(
        "High risk by {}: {} ({:.1}%)\n",
        overview.high_risk_year, overview.high_risk_count, overview.high_risk_pct
    ));
    out
}

/// Per-occupation metric rows for one country.
pub fn format_metrics_table(bundles: &[MetricBundle], metrics: &MetricsConfig) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<14} {:>7} {:<5} {:>7} {:>6} {:>6} {:<10}",
            "code", "2030", "tier", "2050", "50%", "90%", "speed"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<14} {:-<7} {:-<5} {:-<7} {:-<6} {:-<6} {:-<10}", "", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for b in bundles {
        let m = &b.milestones;
        out.push_str(
            format!(
                "{:<14} {:>6.1}% {:<5} {:>6.1}% {:>6} {:>6} {:<10}",
                truncate(&b.occupation_code, 14),
                m.outlook_2030 * 100.0,
                tier_marker(risk_tier(m.outlook_2030, metrics)),
                m.midterm_2050 * 100.0,
                fmt_year(b.year_reaches_50pct),
                fmt_year(b.year_reaches_90pct),
                b.speed_class.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Search hits, one per line.
pub fn format_search(query: &str, hits: &[OccupationMatch]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} match(es) for '{query}':\n", hits.len()));
    for h in hits {
        out.push_str(&format!("  {:<14} {}\n", h.code, h.title));
    }
    out
}

fn fmt_year(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
