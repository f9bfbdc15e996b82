use super::{export_file_name, write_artifact, ExportError};
use crate::ancestry::{parse_percent, AggregateStatistics, HaplogroupFrequency, Hierarchy};
use crate::types::EnrichedMatch;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Makes serialized JSON safe inside a `<script>` block. The replaced
/// characters can only occur inside JSON strings, where `\uXXXX` escapes are
/// equivalent.
pub fn embed_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Renders the self-contained viewer: summary tables up front, the records
/// and statistics embedded as JSON, and the client-side table script.
pub fn render_html(
    records: &[EnrichedMatch],
    stats: &AggregateStatistics,
    generated_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let mut html = String::new();

    html.push_str(include_str!("templates/viewer_header.html"));
    html.push_str(&format!(
        "<p class='generated'>Generated {}</p>\n",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    write_summary_section(&mut html, stats);
    write_regions_section(&mut html, &stats.average_regions);

    html.push_str("<script id='match-data' type='application/json'>");
    html.push_str(&embed_json(&serde_json::to_string(records)?));
    html.push_str("</script>\n");
    html.push_str("<script id='stats-data' type='application/json'>");
    html.push_str(&embed_json(&serde_json::to_string(stats)?));
    html.push_str("</script>\n");

    html.push_str(include_str!("templates/viewer_footer.html"));
    Ok(html)
}

fn write_summary_section(html: &mut String, stats: &AggregateStatistics) {
    html.push_str("<section class='stats-box'>");
    html.push_str("<h2>Summary</h2><div class='stats-columns'>");
    html.push_str(&format!(
        r#"<dl>
            <dt>Total matches</dt><dd>{}</dd>
            <dt>With ancestry</dt><dd>{}</dd>
            <dt>With Y-DNA</dt><dd>{}</dd>
            <dt>With mtDNA</dt><dd>{}</dd>
        </dl>"#,
        stats.total_matches, stats.matches_with_ancestry, stats.matches_with_ydna, stats.matches_with_mtdna
    ));
    write_haplogroup_table(html, "Y-DNA haplogroups", &stats.most_common_ydna);
    write_haplogroup_table(html, "mtDNA haplogroups", &stats.most_common_mtdna);
    html.push_str("</div></section>\n");
}

fn write_haplogroup_table(html: &mut String, title: &str, rows: &[HaplogroupFrequency]) {
    html.push_str(&format!("<div><h3>{}</h3>", escape_html(title)));
    if rows.is_empty() {
        html.push_str("<p>No data</p></div>");
        return;
    }
    html.push_str("<table><tr><th>Haplogroup</th><th>Count</th><th>%</th></tr>");
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}%</td></tr>",
            escape_html(&row.label),
            row.count,
            escape_html(&row.percentage)
        ));
    }
    html.push_str("</table></div>");
}

fn write_regions_section(html: &mut String, regions: &Hierarchy) {
    html.push_str("<section class='stats-box'><h2>Average ancestry</h2>");
    if regions.is_empty() {
        html.push_str("<p>No ancestry data</p>");
    } else {
        write_region_list(html, regions);
    }
    html.push_str("</section>\n");
}

fn write_region_list(html: &mut String, regions: &Hierarchy) {
    let mut nodes: Vec<_> = regions.iter().flat_map(|(_, nodes)| nodes.iter()).collect();
    nodes.sort_by(|a, b| {
        let a = parse_percent(&a.total_percent).unwrap_or(0.0);
        let b = parse_percent(&b.total_percent).unwrap_or(0.0);
        b.total_cmp(&a)
    });

    html.push_str("<ul class='region-list'>");
    for node in nodes {
        html.push_str(&format!(
            "<li><span class='swatch' style='background:{}'></span>{} {}%",
            escape_html(node.color.as_deref().unwrap_or("#808080")),
            escape_html(&node.label),
            escape_html(&node.total_percent)
        ));
        if let Some(max) = &node.max_percent {
            html.push_str(&format!(" <small>(max {}%)</small>", escape_html(max)));
        }
        if let Some(children) = &node.regions {
            write_region_list(html, children);
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
}

pub fn write_html(
    records: &[EnrichedMatch],
    stats: &AggregateStatistics,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let html = render_html(records, stats, Utc::now())?;
    write_artifact(dir, &export_file_name("html", date), &html)
}
