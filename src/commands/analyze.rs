use crate::analysis::{analyze, grandparent_locations, render_report, write_charts, write_report, GrandparentLocation};
use crate::config::Config;
use crate::export::json::load_json;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_COUNTRY: &str = "PR";
pub const DEFAULT_LABEL: &str = "Puerto Rico";

pub struct AnalyzeOptions {
    pub export_file: PathBuf,
    pub country: Option<String>,
    pub label: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub list_locations: bool,
}

/// Explicit flags win, then the last run's country, then the most common
/// grandparent country in the data. The remembered label is only reused
/// for the remembered country.
fn resolve_location(
    config: &Config,
    options: &AnalyzeOptions,
    locations: &[GrandparentLocation],
) -> (String, String) {
    let country = options
        .country
        .clone()
        .or_else(|| config.last_country_code.clone())
        .or_else(|| locations.first().map(|l| l.country_code.clone()))
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    let remembered = config
        .last_location_label
        .clone()
        .filter(|_| config.last_country_code.as_deref() == Some(country.as_str()));
    let label = options
        .label
        .clone()
        .or(remembered)
        .or_else(|| {
            locations
                .iter()
                .find(|l| l.country_code == country)
                .map(|l| l.name.clone())
        })
        .unwrap_or_else(|| {
            if country == DEFAULT_COUNTRY {
                DEFAULT_LABEL.to_string()
            } else {
                country.clone()
            }
        });
    (country, label)
}

fn print_locations(locations: &[GrandparentLocation]) {
    if locations.is_empty() {
        println!("No relatives have all four grandparents born in the same country.");
        return;
    }
    println!("Countries where all four grandparents were born:");
    for (i, location) in locations.iter().enumerate() {
        println!(
            "{:2}. {:<3} - {:>4} matches ({})",
            i + 1,
            location.country_code,
            location.count,
            location.name
        );
    }
}

pub fn run(config: &mut Config, options: AnalyzeOptions) -> Result<()> {
    let records = load_json(&options.export_file)
        .with_context(|| format!("Failed to load export {}", options.export_file.display()))?;
    let locations = grandparent_locations(&records);
    if options.list_locations {
        print_locations(&locations);
        return Ok(());
    }

    let (country, label) = resolve_location(config, &options, &locations);
    info!(records = records.len(), country = %country, label = %label, "analyzing export");

    let report = analyze(&records, &country, &label);
    print!("{}", render_report(&report));

    if report.stats.total_matches > 0 {
        let dir = options.output_dir.unwrap_or_else(|| config.output_dir.clone());
        let path = write_report(&report, &dir)
            .with_context(|| format!("Failed to write report into {}", dir.display()))?;
        println!("\nResults saved to: {}", path.display());
        let charts = write_charts(&report, &dir)
            .with_context(|| format!("Failed to write charts into {}", dir.display()))?;
        for chart in charts {
            println!("Chart saved to: {}", chart.display());
        }
    }

    config.remember_location(&country, &label);
    if let Err(e) = config.save() {
        warn!(error = %e, "could not remember analysis location");
    }
    Ok(())
}
