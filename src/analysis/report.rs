use super::{AnalysisReport, RelativeSummary, DETAIL_LIMIT};
use crate::ancestry::{parse_percent, HaplogroupFrequency, Hierarchy, RegionNode};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Regions at or below this average are left out of the report.
const MIN_REPORTED_PERCENT: f64 = 0.1;
const NAME_WIDTH: usize = 40;
const RULE_WIDTH: usize = 60;
const CARRIERS_SHOWN: usize = 5;
const CARRIERS_TRUNCATED: usize = 3;

/// `<label>_ancestry_hierarchical_results.txt`, label lowercased with
/// spaces turned into underscores.
pub fn report_file_name(location_label: &str) -> String {
    format!(
        "{}_ancestry_hierarchical_results.txt",
        location_label.to_lowercase().replace(' ', "_")
    )
}

fn percent_of(value: &str) -> f64 {
    parse_percent(value).unwrap_or(0.0)
}

fn sorted_reportable(regions: &Hierarchy) -> Vec<&RegionNode> {
    let mut nodes: Vec<&RegionNode> = regions
        .iter()
        .flat_map(|(_, nodes)| nodes.iter())
        .filter(|n| percent_of(&n.total_percent) > MIN_REPORTED_PERCENT)
        .collect();
    nodes.sort_by(|a, b| percent_of(&b.total_percent).total_cmp(&percent_of(&a.total_percent)));
    nodes
}

fn write_region_lines(out: &mut String, regions: &Hierarchy, depth: usize, lead: &str) {
    let nodes = sorted_reportable(regions);
    let count = nodes.len();
    for (i, node) in nodes.into_iter().enumerate() {
        let last = i + 1 == count;
        let (marker, next_lead) = match depth {
            0 => ("● ".to_string(), "  ".to_string()),
            _ if last => (format!("{lead}└─ "), format!("{lead}   ")),
            _ => (format!("{lead}├─ "), format!("{lead}│  ")),
        };
        let width = NAME_WIDTH.saturating_sub(3 * depth).max(20);
        let max = node.max_percent.as_deref().map_or(0.0, percent_of);
        let _ = writeln!(
            out,
            "{marker}{:<width$} avg: {:>5.1}%  max: {:>5.1}%",
            node.label,
            percent_of(&node.total_percent),
            max,
        );
        if let Some(children) = &node.regions {
            write_region_lines(out, children, depth + 1, &next_lead);
        }
    }
}

fn write_haplogroup_block(
    out: &mut String,
    title: &str,
    kind: &str,
    available: usize,
    total: usize,
    rows: &[HaplogroupFrequency],
    carriers: &[RelativeSummary],
) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "Available data: {available}/{total} relatives");
    let _ = writeln!(out, "{}", "-".repeat(40));
    if rows.is_empty() {
        let _ = writeln!(out, "No {kind} data available");
        let _ = writeln!(out);
        return;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "{:<15} {:>3} relatives ({:>5}%)",
            row.label, row.count, row.percentage
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Most common {kind}: {}", rows[0].label);

    let shown = if carriers.len() <= CARRIERS_SHOWN {
        carriers.len()
    } else {
        CARRIERS_TRUNCATED
    };
    for carrier in &carriers[..shown] {
        let _ = writeln!(out, "  • {} ({})", carrier.initials, carrier.relationship);
    }
    if shown < carriers.len() {
        let _ = writeln!(out, "  ... and {} more", carriers.len() - shown);
    }
    let _ = writeln!(out);
}

/// Plain-text report: averaged region tree, haplogroup tables and the first
/// few selected relatives.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let code = &report.country_code;
    let stats = &report.stats;

    let _ = writeln!(
        out,
        "AVERAGE ANCESTRY PERCENTAGES FOR {} RELATIVES (LATEST COMPUTE)",
        report.location_label.to_uppercase()
    );
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total relatives in dataset: {}", report.total_relatives);
    let _ = writeln!(
        out,
        "Relatives with all 4 grandparents born in {code}: {}",
        report.with_grandparents
    );
    let _ = writeln!(out, "... AND using latest compute: {}", stats.total_matches);
    let _ = writeln!(out);

    if stats.total_matches == 0 {
        let _ = writeln!(
            out,
            "No relatives found with all grandparents born in {code} and using latest compute."
        );
        return out;
    }

    let _ = writeln!(
        out,
        "Based on {} relatives with all grandparents born in {code} and using latest compute:",
        stats.total_matches
    );
    let _ = writeln!(out);
    write_region_lines(&mut out, &stats.average_regions, 0, "");

    let main_total: f64 = stats
        .average_regions
        .iter()
        .flat_map(|(_, nodes)| nodes.iter())
        .map(|n| percent_of(&n.total_percent))
        .sum();
    let _ = writeln!(out, "{thin}");
    let _ = writeln!(out, "Total main categories: {main_total:.1}%");
    if (main_total - 100.0).abs() < 1.0 {
        let _ = writeln!(out, "✓ Percentages approximately add up to 100%");
    } else {
        let _ = writeln!(out, "⚠ Percentages do not add up to 100%");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "HAPLOGROUP ANALYSIS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    write_haplogroup_block(
        &mut out,
        "Y-DNA HAPLOGROUPS (Paternal Line)",
        "Y-DNA",
        stats.matches_with_ydna,
        stats.total_matches,
        &stats.most_common_ydna,
        &report.ydna_carriers,
    );
    write_haplogroup_block(
        &mut out,
        "mtDNA HAPLOGROUPS (Maternal Line)",
        "mtDNA",
        stats.matches_with_mtdna,
        stats.total_matches,
        &stats.most_common_mtdna,
        &report.mtdna_carriers,
    );

    let _ = writeln!(out, "{thin}");
    let _ = writeln!(out, "RELATIVE DETAILS:");
    for (i, relative) in report.relatives.iter().take(DETAIL_LIMIT).enumerate() {
        let _ = writeln!(
            out,
            "{:2}. {:<4} - {:<25} (IBD: {:.1}%)",
            i + 1,
            relative.initials,
            relative.relationship,
            relative.ibd_percent
        );
    }
    if report.relatives.len() > DETAIL_LIMIT {
        let _ = writeln!(out, "... and {} more relatives", report.relatives.len() - DETAIL_LIMIT);
    }
    out
}

pub fn write_report(report: &AnalysisReport, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(&report.location_label));
    std::fs::write(&path, render_report(report))?;
    Ok(path)
}
