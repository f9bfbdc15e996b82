//! Offline analysis of a JSON export: relatives whose four grandparents were
//! all born in one country, averaged the same way as the export statistics.

pub mod charts;
pub mod report;

pub use charts::write_charts;
pub use report::{render_report, report_file_name, write_report};

use crate::ancestry::{aggregate, AggregateStatistics};
use crate::types::EnrichedMatch;

/// Relatives shown in the detail listing.
pub const DETAIL_LIMIT: usize = 10;

pub fn has_all_grandparents_in(record: &EnrichedMatch, country_code: &str) -> bool {
    let Some(locations) = &record.entry.grandparent_birth_locations else {
        return false;
    };
    locations
        .all()
        .into_iter()
        .all(|location| location.and_then(|l| l.country.as_deref()) == Some(country_code))
}

/// A country all four grandparents of at least one relative were born in.
#[derive(Debug, Clone, PartialEq)]
pub struct GrandparentLocation {
    pub country_code: String,
    pub count: usize,
    /// Location text of the first relative's maternal grandmother, or the
    /// code when none was given.
    pub name: String,
}

/// The single country shared by all four grandparents, if there is one.
fn shared_country(record: &EnrichedMatch) -> Option<&str> {
    let locations = record.entry.grandparent_birth_locations.as_ref()?;
    let [first, rest @ ..] = locations.all();
    let country = first?.country.as_deref().filter(|c| !c.is_empty())?;
    rest.into_iter()
        .all(|location| location.and_then(|l| l.country.as_deref()) == Some(country))
        .then_some(country)
}

/// Every country where some relative's four grandparents agree, most
/// relatives first. Ties keep first-seen order.
pub fn grandparent_locations(records: &[EnrichedMatch]) -> Vec<GrandparentLocation> {
    let mut locations: Vec<GrandparentLocation> = Vec::new();
    for record in records {
        let Some(country) = shared_country(record) else {
            continue;
        };
        match locations.iter_mut().find(|l| l.country_code == country) {
            Some(location) => location.count += 1,
            None => {
                let name = record
                    .entry
                    .grandparent_birth_locations
                    .as_ref()
                    .and_then(|gp| gp.maternal_gma.as_ref())
                    .and_then(|gma| gma.extra.get("location"))
                    .and_then(|value| value.as_str())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(country);
                locations.push(GrandparentLocation {
                    country_code: country.to_string(),
                    count: 1,
                    name: name.to_string(),
                });
            }
        }
    }
    locations.sort_by(|a, b| b.count.cmp(&a.count));
    locations
}

/// Relatives passing the grandparent filter, narrowed to those on the latest
/// ancestry computation.
#[derive(Debug)]
pub struct Selection<'a> {
    pub with_grandparents: usize,
    pub selected: Vec<&'a EnrichedMatch>,
}

pub fn select_relatives<'a>(records: &'a [EnrichedMatch], country_code: &str) -> Selection<'a> {
    let mut with_grandparents = 0;
    let mut selected = Vec::new();
    for record in records.iter().filter(|r| has_all_grandparents_in(r, country_code)) {
        with_grandparents += 1;
        if record.uses_latest_compute() {
            selected.push(record);
        }
    }
    Selection {
        with_grandparents,
        selected,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelativeSummary {
    pub initials: String,
    pub relationship: String,
    pub ibd_percent: f64,
}

impl From<&EnrichedMatch> for RelativeSummary {
    fn from(record: &EnrichedMatch) -> Self {
        RelativeSummary {
            initials: record.entry.display_initials(),
            relationship: record.entry.relationship_title(),
            ibd_percent: record.entry.ibd_proportion.unwrap_or(0.0) * 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub country_code: String,
    pub location_label: String,
    pub total_relatives: usize,
    pub with_grandparents: usize,
    pub stats: AggregateStatistics,
    /// Carriers of the top-ranked Y-DNA haplogroup, if any.
    pub ydna_carriers: Vec<RelativeSummary>,
    pub mtdna_carriers: Vec<RelativeSummary>,
    pub relatives: Vec<RelativeSummary>,
}

fn carriers(
    selected: &[&EnrichedMatch],
    top: Option<&str>,
    pick: fn(&EnrichedMatch) -> Option<&str>,
) -> Vec<RelativeSummary> {
    let Some(top) = top else {
        return Vec::new();
    };
    selected
        .iter()
        .filter(|r| pick(**r).map(str::trim) == Some(top))
        .map(|r| RelativeSummary::from(*r))
        .collect()
}

fn ydna_of(record: &EnrichedMatch) -> Option<&str> {
    record.ancestry.as_ref()?.haplogroups.ydna.as_deref()
}

fn mtdna_of(record: &EnrichedMatch) -> Option<&str> {
    record.ancestry.as_ref()?.haplogroups.mtdna.as_deref()
}

pub fn analyze(records: &[EnrichedMatch], country_code: &str, location_label: &str) -> AnalysisReport {
    let selection = select_relatives(records, country_code);
    let stats = aggregate(selection.selected.iter().copied());

    let top_ydna = stats.most_common_ydna.first().map(|f| f.label.as_str());
    let top_mtdna = stats.most_common_mtdna.first().map(|f| f.label.as_str());
    let ydna_carriers = carriers(&selection.selected, top_ydna, ydna_of);
    let mtdna_carriers = carriers(&selection.selected, top_mtdna, mtdna_of);

    AnalysisReport {
        country_code: country_code.to_string(),
        location_label: location_label.to_string(),
        total_relatives: records.len(),
        with_grandparents: selection.with_grandparents,
        relatives: selection.selected.iter().map(|r| RelativeSummary::from(*r)).collect(),
        ydna_carriers,
        mtdna_carriers,
        stats,
    }
}
