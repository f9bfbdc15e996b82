use crate::ancestry::{aggregate, AggregateStatistics, HaplogroupFrequency, Hierarchy};
use crate::export::json::load_json;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

fn write_table(out: &mut String, title: &str, rows: &[HaplogroupFrequency]) {
    let _ = writeln!(out, "\n{title}");
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for row in rows {
        let _ = writeln!(out, "  {:<15} {:>4}  {:>5}%", row.label, row.count, row.percentage);
    }
}

fn write_regions(out: &mut String, regions: &Hierarchy, depth: usize) {
    for (_, nodes) in regions.iter() {
        for node in nodes {
            let _ = writeln!(
                out,
                "{:indent$}{:<30} {:>6}%  (max {}%)",
                "",
                node.label,
                node.total_percent,
                node.max_percent.as_deref().unwrap_or("-"),
                indent = 2 + depth * 2,
            );
            if let Some(children) = &node.regions {
                write_regions(out, children, depth + 1);
            }
        }
    }
}

pub fn format_summary(stats: &AggregateStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total matches:       {}", stats.total_matches);
    let _ = writeln!(out, "With ancestry:       {}", stats.matches_with_ancestry);
    let _ = writeln!(out, "With Y-DNA:          {}", stats.matches_with_ydna);
    let _ = writeln!(out, "With mtDNA:          {}", stats.matches_with_mtdna);
    write_table(&mut out, "Most common Y-DNA haplogroups", &stats.most_common_ydna);
    write_table(&mut out, "Most common mtDNA haplogroups", &stats.most_common_mtdna);
    let _ = writeln!(out, "\nAverage ancestry");
    write_regions(&mut out, &stats.average_regions, 0);
    out
}

pub fn run(export_file: &Path) -> Result<()> {
    let records = load_json(export_file)
        .with_context(|| format!("Failed to load export {}", export_file.display()))?;
    print!("{}", format_summary(&aggregate(&records)));
    Ok(())
}
