use super::flatten::{build_hierarchy, parse_percent};
use super::types::{FlatEntry, Hierarchy, RegionNode};
use crate::types::EnrichedMatch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length of the ranked haplogroup tables.
pub const TOP_HAPLOGROUPS: usize = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HaplogroupFrequency {
    pub label: String,
    pub count: usize,
    pub percentage: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    pub total_matches: usize,
    pub matches_with_ancestry: usize,
    #[serde(rename = "matchesWithYDNA")]
    pub matches_with_ydna: usize,
    #[serde(rename = "matchesWithMtDNA")]
    pub matches_with_mtdna: usize,
    pub average_regions: Hierarchy,
    #[serde(rename = "mostCommonYDNA")]
    pub most_common_ydna: Vec<HaplogroupFrequency>,
    #[serde(rename = "mostCommonMtDNA")]
    pub most_common_mtdna: Vec<HaplogroupFrequency>,
}

/// Occurrence counts in first-encounter order.
#[derive(Default)]
struct Tally {
    counts: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, label: &str) {
        match self.positions.get(label) {
            Some(&position) => self.counts[position].1 += 1,
            None => {
                self.positions.insert(label.to_string(), self.counts.len());
                self.counts.push((label.to_string(), 1));
            }
        }
    }

    /// Descending by count; the stable sort keeps encounter order on ties.
    fn ranked(&self, denominator: usize) -> Vec<HaplogroupFrequency> {
        let mut ranked = self.counts.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(TOP_HAPLOGROUPS)
            .map(|(label, count)| HaplogroupFrequency {
                percentage: percentage_of(count, denominator),
                label,
                count,
            })
            .collect()
    }
}

fn percentage_of(count: usize, denominator: usize) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", count as f64 / denominator as f64 * 100.0)
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct RegionKey {
    id: String,
    label: String,
    parent_id: String,
}

struct RegionTotals {
    color: Option<String>,
    sum: f64,
    max: f64,
}

/// Per `(id, label, parentId)` sums and maxima, in first-encounter order.
#[derive(Default)]
struct RegionAccumulator {
    keys: Vec<RegionKey>,
    totals: HashMap<RegionKey, RegionTotals>,
}

impl RegionAccumulator {
    fn add_hierarchy(&mut self, hierarchy: &Hierarchy) {
        for (_, nodes) in hierarchy.iter() {
            for node in nodes {
                self.add(node);
                if let Some(regions) = &node.regions {
                    self.add_hierarchy(regions);
                }
            }
        }
    }

    fn add(&mut self, node: &RegionNode) {
        let Some(value) = parse_percent(&node.total_percent) else {
            return;
        };
        let key = RegionKey {
            id: node.id.clone(),
            label: node.label.clone(),
            parent_id: node.parent_id.clone(),
        };
        match self.totals.get_mut(&key) {
            Some(totals) => {
                totals.sum += value;
                totals.max = totals.max.max(value);
            }
            None => {
                self.keys.push(key.clone());
                self.totals.insert(
                    key,
                    RegionTotals {
                        color: node.color.clone(),
                        sum: value,
                        max: value,
                    },
                );
            }
        }
    }

    /// Averages over `divisor` matches, whether or not each match carried
    /// the region, and rebuilds the result into a hierarchy.
    fn finish(self, divisor: usize) -> Hierarchy {
        let entries: Vec<FlatEntry> = self
            .keys
            .iter()
            .map(|key| {
                let totals = &self.totals[key];
                let average = if divisor == 0 {
                    0.0
                } else {
                    totals.sum / divisor as f64
                };
                FlatEntry {
                    id: key.id.clone(),
                    label: key.label.clone(),
                    total_percent: format!("{average:.2}"),
                    color: totals.color.clone(),
                    parent_id: key.parent_id.clone(),
                    demonym: String::new(),
                }
            })
            .collect();

        let maxima: HashMap<&RegionKey, f64> = self
            .keys
            .iter()
            .map(|key| (key, self.totals[key].max))
            .collect();

        let mut hierarchy = build_hierarchy(&entries);
        annotate_maxima(&mut hierarchy, &maxima);
        hierarchy
    }
}

fn annotate_maxima(hierarchy: &mut Hierarchy, maxima: &HashMap<&RegionKey, f64>) {
    for (_, nodes) in hierarchy.iter_mut() {
        for node in nodes.iter_mut() {
            let key = RegionKey {
                id: node.id.clone(),
                label: node.label.clone(),
                parent_id: node.parent_id.clone(),
            };
            if let Some(max) = maxima.get(&key) {
                node.max_percent = Some(format!("{max:.2}"));
            }
            if let Some(regions) = node.regions.as_mut() {
                annotate_maxima(regions, maxima);
            }
        }
    }
}

/// Stand-in the service uses when a haplogroup is unknown.
const MISSING_HAPLOGROUP: &str = "N/A";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != MISSING_HAPLOGROUP)
}

/// Folds many enriched matches into one set of statistics.
///
/// Y-DNA percentages are taken over the matches that reported a Y-DNA
/// haplogroup; mtDNA percentages and region averages are taken over every
/// match passed in. No input produces zero counts, empty tables and an empty
/// hierarchy.
pub fn aggregate<'a>(matches: impl IntoIterator<Item = &'a EnrichedMatch>) -> AggregateStatistics {
    let mut total_matches = 0;
    let mut matches_with_ancestry = 0;
    let mut matches_with_ydna = 0;
    let mut matches_with_mtdna = 0;
    let mut ydna = Tally::default();
    let mut mtdna = Tally::default();
    let mut regions = RegionAccumulator::default();

    for relative in matches {
        total_matches += 1;
        let Some(ancestry) = &relative.ancestry else {
            continue;
        };
        matches_with_ancestry += 1;

        if let Some(haplogroup) = non_empty(ancestry.haplogroups.ydna.as_deref()) {
            ydna.add(haplogroup);
            matches_with_ydna += 1;
        }
        if let Some(haplogroup) = non_empty(ancestry.haplogroups.mtdna.as_deref()) {
            mtdna.add(haplogroup);
            matches_with_mtdna += 1;
        }
        regions.add_hierarchy(&ancestry.regions);
    }

    AggregateStatistics {
        total_matches,
        matches_with_ancestry,
        matches_with_ydna,
        matches_with_mtdna,
        average_regions: regions.finish(total_matches),
        most_common_ydna: ydna.ranked(matches_with_ydna),
        most_common_mtdna: mtdna.ranked(total_matches),
    }
}
