//! SVG bar charts written next to the text report.

use super::AnalysisReport;
use crate::ancestry::{parse_percent, HaplogroupFrequency, Hierarchy, RegionNode};
use std::path::{Path, PathBuf};

/// Top-level categories at or below this average are not charted.
const MAIN_CATEGORY_CUTOFF: f64 = 0.5;
const SUBREGION_CUTOFF: f64 = 0.1;
const FALLBACK_COLOR: &str = "#808080";

const LABEL_WIDTH: u32 = 280;
const PLOT_WIDTH: u32 = 460;
const VALUE_WIDTH: u32 = 70;
const HEADER_HEIGHT: u32 = 70;
const ROW_HEIGHT: u32 = 22;
const BAR_HEIGHT: u32 = 14;
const INDENT: usize = 3;

pub const YDNA_PALETTE: [&str; 10] = [
    "#1f4e79", "#2e5a8a", "#3d659a", "#4c70aa", "#5b7bba", "#2f7030", "#3f8040", "#4f9050", "#5fa060", "#6fb070",
];

pub const MTDNA_PALETTE: [&str; 10] = [
    "#6a3d9a", "#8e63b5", "#b294d0", "#d95f02", "#f28e2b", "#fdae6b", "#8c564b", "#a6761d", "#1f78b4", "#6baed6",
];

struct SvgTag {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
}

impl SvgTag {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    fn attr(mut self, key: &'static str, value: impl ToString) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    fn render(&self, self_closing: bool) -> String {
        let attrs: String = self
            .attributes
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_xml(v)))
            .collect::<Vec<_>>()
            .join(" ");

        if self_closing {
            format!("<{} {}/>", self.name, attrs)
        } else {
            format!("<{} {}>", self.name, attrs)
        }
    }

    fn wrap(&self, text: &str) -> String {
        format!("{}{}</{}>", self.render(false), escape_xml(text), self.name)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// One horizontal bar. `secondary` draws a lighter bar behind the main one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub label: String,
    pub value: f64,
    pub secondary: Option<f64>,
    pub color: String,
    pub value_text: String,
}

fn percent_of(value: &str) -> f64 {
    parse_percent(value).unwrap_or(0.0)
}

fn color_of(node: &RegionNode, inherited: Option<&str>) -> String {
    node.color
        .as_deref()
        .filter(|c| !c.is_empty())
        .or(inherited)
        .unwrap_or(FALLBACK_COLOR)
        .to_string()
}

fn sorted_above(regions: &Hierarchy, cutoff: f64) -> Vec<&RegionNode> {
    let mut nodes: Vec<&RegionNode> = regions
        .iter()
        .flat_map(|(_, nodes)| nodes.iter())
        .filter(|n| percent_of(&n.total_percent) > cutoff)
        .collect();
    nodes.sort_by(|a, b| percent_of(&b.total_percent).total_cmp(&percent_of(&a.total_percent)));
    nodes
}

fn region_row(node: &RegionNode, depth: usize, color: String) -> ChartRow {
    let value = percent_of(&node.total_percent);
    let max = node.max_percent.as_deref().map(percent_of);
    ChartRow {
        label: format!("{}{}", " ".repeat(INDENT * depth), node.label),
        value,
        secondary: max,
        color,
        value_text: match max {
            Some(max) => format!("{value:.1}% / {max:.1}%"),
            None => format!("{value:.1}%"),
        },
    }
}

/// Top-level categories above half a percent, largest first.
pub fn main_category_rows(regions: &Hierarchy) -> Vec<ChartRow> {
    sorted_above(regions, MAIN_CATEGORY_CUTOFF)
        .into_iter()
        .map(|node| region_row(node, 0, color_of(node, None)))
        .collect()
}

fn push_subregions(rows: &mut Vec<ChartRow>, regions: &Hierarchy, depth: usize, inherited: &str) {
    for node in sorted_above(regions, SUBREGION_CUTOFF) {
        rows.push(region_row(node, depth, inherited.to_string()));
        if let Some(children) = &node.regions {
            push_subregions(rows, children, depth + 1, inherited);
        }
    }
}

/// Main categories followed by their subregions, indented by depth. Every
/// subregion takes its main category's colour.
pub fn hierarchy_rows(regions: &Hierarchy) -> Vec<ChartRow> {
    let mut rows = Vec::new();
    for node in sorted_above(regions, MAIN_CATEGORY_CUTOFF) {
        let color = color_of(node, None);
        rows.push(region_row(node, 0, color.clone()));
        if let Some(children) = &node.regions {
            push_subregions(&mut rows, children, 1, &color);
        }
    }
    rows
}

pub fn haplogroup_rows(frequencies: &[HaplogroupFrequency], palette: &[&str]) -> Vec<ChartRow> {
    frequencies
        .iter()
        .enumerate()
        .map(|(i, row)| ChartRow {
            label: row.label.clone(),
            value: row.count as f64,
            secondary: None,
            color: palette
                .get(i % palette.len().max(1))
                .copied()
                .unwrap_or(FALLBACK_COLOR)
                .to_string(),
            value_text: format!("{} ({}%)", row.count, row.percentage),
        })
        .collect()
}

/// Horizontal bar chart with one row per entry, scaled to the largest value.
pub fn render_bar_chart(title: &str, subtitle: &str, rows: &[ChartRow]) -> String {
    let width = LABEL_WIDTH + PLOT_WIDTH + VALUE_WIDTH;
    let height = HEADER_HEIGHT + ROW_HEIGHT * rows.len().max(1) as u32 + 20;
    let scale_max = rows
        .iter()
        .map(|r| r.value.max(r.secondary.unwrap_or(0.0)))
        .fold(0.0_f64, f64::max);
    let scale = |v: f64| {
        if scale_max > 0.0 {
            (v / scale_max * PLOT_WIDTH as f64).max(0.0)
        } else {
            0.0
        }
    };

    let mut svg = String::new();
    svg.push_str(
        &SvgTag::new("svg")
            .attr("xmlns", "http://www.w3.org/2000/svg")
            .attr("width", width)
            .attr("height", height)
            .attr("font-family", "sans-serif")
            .render(false),
    );
    svg.push('\n');
    svg.push_str(
        &SvgTag::new("rect")
            .attr("width", width)
            .attr("height", height)
            .attr("fill", "#ffffff")
            .render(true),
    );
    svg.push('\n');
    svg.push_str(
        &SvgTag::new("text")
            .attr("x", width / 2)
            .attr("y", 26)
            .attr("font-size", 16)
            .attr("font-weight", "bold")
            .attr("text-anchor", "middle")
            .wrap(title),
    );
    svg.push('\n');
    svg.push_str(
        &SvgTag::new("text")
            .attr("x", width / 2)
            .attr("y", 48)
            .attr("font-size", 12)
            .attr("text-anchor", "middle")
            .wrap(subtitle),
    );
    svg.push('\n');

    for (i, row) in rows.iter().enumerate() {
        let top = HEADER_HEIGHT + ROW_HEIGHT * i as u32;
        let bar_y = top + (ROW_HEIGHT - BAR_HEIGHT) / 2;
        svg.push_str(
            &SvgTag::new("text")
                .attr("x", LABEL_WIDTH - 8)
                .attr("y", top + ROW_HEIGHT / 2 + 4)
                .attr("font-size", 11)
                .attr("text-anchor", "end")
                .attr("xml:space", "preserve")
                .wrap(&row.label),
        );
        svg.push('\n');
        if let Some(secondary) = row.secondary {
            svg.push_str(
                &SvgTag::new("rect")
                    .attr("x", LABEL_WIDTH)
                    .attr("y", bar_y)
                    .attr("width", format!("{:.1}", scale(secondary)))
                    .attr("height", BAR_HEIGHT)
                    .attr("fill", &row.color)
                    .attr("fill-opacity", "0.35")
                    .render(true),
            );
            svg.push('\n');
        }
        svg.push_str(
            &SvgTag::new("rect")
                .attr("x", LABEL_WIDTH)
                .attr("y", bar_y)
                .attr("width", format!("{:.1}", scale(row.value)))
                .attr("height", BAR_HEIGHT)
                .attr("fill", &row.color)
                .render(true),
        );
        svg.push('\n');
        svg.push_str(
            &SvgTag::new("text")
                .attr("x", LABEL_WIDTH + PLOT_WIDTH + 6)
                .attr("y", top + ROW_HEIGHT / 2 + 4)
                .attr("font-size", 10)
                .wrap(&row.value_text),
        );
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

fn label_stem(location_label: &str) -> String {
    location_label.to_lowercase().replace(' ', "_")
}

pub fn chart_file_name(location_label: &str, chart: &str) -> String {
    format!("{}_{}.svg", label_stem(location_label), chart)
}

/// Every chart for `report` as `(file name, svg)`. Haplogroup charts are
/// left out when no selected relative has that haplogroup.
pub fn render_charts(report: &AnalysisReport) -> Vec<(String, String)> {
    let stats = &report.stats;
    let label = &report.location_label;
    let subtitle = format!(
        "Relatives with 4 Grandparents Born in {} (n={})",
        label, stats.total_matches
    );

    let mut charts = vec![
        (
            chart_file_name(label, "ancestry_main_categories"),
            render_bar_chart(
                "Main Ancestry Categories (Avg vs Max)",
                &subtitle,
                &main_category_rows(&stats.average_regions),
            ),
        ),
        (
            chart_file_name(label, "ancestry_complete_hierarchy"),
            render_bar_chart(
                "Complete Ancestry Hierarchy",
                &subtitle,
                &hierarchy_rows(&stats.average_regions),
            ),
        ),
    ];
    if !stats.most_common_ydna.is_empty() {
        charts.push((
            chart_file_name(label, "ydna_haplogroups"),
            render_bar_chart(
                "Y-DNA Haplogroups (Paternal Line)",
                &format!("{} of {} relatives with Y-DNA data", stats.matches_with_ydna, stats.total_matches),
                &haplogroup_rows(&stats.most_common_ydna, &YDNA_PALETTE),
            ),
        ));
    }
    if !stats.most_common_mtdna.is_empty() {
        charts.push((
            chart_file_name(label, "mtdna_haplogroups"),
            render_bar_chart(
                "mtDNA Haplogroups (Maternal Line)",
                &format!("{} of {} relatives with mtDNA data", stats.matches_with_mtdna, stats.total_matches),
                &haplogroup_rows(&stats.most_common_mtdna, &MTDNA_PALETTE),
            ),
        ));
    }
    charts
}

pub fn write_charts(report: &AnalysisReport, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::new();
    for (name, svg) in render_charts(report) {
        let path = dir.join(name);
        std::fs::write(&path, svg)?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::analysis::tests::relative;

    fn region(id: &str, label: &str, percent: &str, color: Option<&str>, children: Option<Hierarchy>) -> RegionNode {
        RegionNode {
            id: id.to_string(),
            label: label.to_string(),
            total_percent: percent.to_string(),
            color: color.map(str::to_string),
            parent_id: "root".to_string(),
            max_percent: Some("90.00".to_string()),
            regions: children,
        }
    }

    #[test]
    fn svg_text_is_escaped() {
        let rows = vec![ChartRow {
            label: "Tom & \"Jerry\" <3".to_string(),
            value: 1.0,
            secondary: None,
            color: "#000".to_string(),
            value_text: "1".to_string(),
        }];
        let svg = render_bar_chart("A & B", "n=1", &rows);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains(">A &amp; B</text>"));
        assert!(svg.contains("Tom &amp; &quot;Jerry&quot; &lt;3"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn bars_scale_to_the_largest_value() {
        let rows = haplogroup_rows(
            &[
                HaplogroupFrequency {
                    label: "R-M269".to_string(),
                    count: 4,
                    percentage: "80.0".to_string(),
                },
                HaplogroupFrequency {
                    label: "E-M2".to_string(),
                    count: 1,
                    percentage: "20.0".to_string(),
                },
            ],
            &YDNA_PALETTE,
        );
        assert_eq!(rows[0].color, "#1f4e79");
        assert_eq!(rows[1].color, "#2e5a8a");
        assert_eq!(rows[0].value_text, "4 (80.0%)");

        let svg = render_bar_chart("t", "s", &rows);
        assert!(svg.contains("width=\"460.0\""));
        assert!(svg.contains("width=\"115.0\""));
    }

    #[test]
    fn hierarchy_rows_inherit_the_main_colour() {
        let mut south = Hierarchy::new();
        south.push("Iberian", region("ib", "Spanish & Portuguese", "30.5", None, None));
        south.push("Italian", region("it", "Italian", "0.05", None, None));
        let mut europe = Hierarchy::new();
        europe.push("Southern", region("se", "Southern European", "31", Some("#ff0000"), Some(south)));

        let mut regions = Hierarchy::new();
        regions.push("European", region("eur", "European", "60", Some("#3f51b5"), Some(europe)));
        regions.push("African", region("afr", "Sub-Saharan African", "0.4", Some("#00ff00"), None));
        regions.push("Native", region("nat", "Indigenous American", "10", None, None));

        let main = main_category_rows(&regions);
        assert_eq!(main.len(), 2);
        assert_eq!(main[0].label, "European");
        assert_eq!(main[0].secondary, Some(90.0));
        assert_eq!(main[1].color, FALLBACK_COLOR);

        let rows = hierarchy_rows(&regions);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "European",
                "   Southern European",
                "      Spanish & Portuguese",
                "Indigenous American",
            ]
        );
        assert!(rows[..3].iter().all(|r| r.color == "#3f51b5"));
    }

    #[test]
    fn charts_are_named_after_the_location() {
        let records = vec![
            relative("ab", ["PR"; 4], true, "R-M269", "70"),
            relative("cd", ["PR"; 4], true, "", "50"),
        ];
        let report = analyze(&records, "PR", "Puerto Rico");
        let names: Vec<String> = render_charts(&report).into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "puerto_rico_ancestry_main_categories.svg",
                "puerto_rico_ancestry_complete_hierarchy.svg",
                "puerto_rico_ydna_haplogroups.svg",
                "puerto_rico_mtdna_haplogroups.svg",
            ]
        );

        let dir = tempfile::tempdir().unwrap();
        let paths = write_charts(&report, dir.path()).unwrap();
        assert_eq!(paths.len(), 4);
        let main = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(main.contains("Relatives with 4 Grandparents Born in Puerto Rico (n=2)"));
        assert!(main.contains("60.0% / 70.0%"));
    }

    #[test]
    fn missing_haplogroups_skip_their_chart() {
        let mut record = relative("ab", ["PR"; 4], true, "", "70");
        if let Some(ancestry) = record.ancestry.as_mut() {
            ancestry.haplogroups.mtdna = None;
        }
        let report = analyze(&[record], "PR", "Puerto Rico");
        assert_eq!(render_charts(&report).len(), 2);
    }
}
