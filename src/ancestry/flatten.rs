use super::types::{FlatEntry, Hierarchy, PercentageTreeNode, RegionNode, ROOT_ID};
use std::collections::HashMap;

/// Parses the leading decimal number of `raw`, ignoring anything after it
/// (`"12.5"`, `" 7 "` and `"3.2%"` all parse). Non-finite values are rejected.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if has_digits || frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_included(node: &PercentageTreeNode) -> bool {
    if node.id == ROOT_ID {
        return false;
    }
    node.total_percent
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .and_then(parse_percent)
        .is_some_and(|value| value > 0.0)
}

/// Flattens a tree into its qualifying nodes in pre-order.
///
/// A node qualifies when it is not the synthetic root and its percentage
/// parses to something above zero. Children are visited even when their
/// parent does not qualify.
pub fn flatten(tree: &PercentageTreeNode) -> Vec<FlatEntry> {
    let mut entries = Vec::new();
    collect_entries(tree, &mut entries);
    entries
}

fn collect_entries(node: &PercentageTreeNode, entries: &mut Vec<FlatEntry>) {
    if is_included(node) {
        entries.push(FlatEntry::from(node));
    }

    for child in &node.children {
        collect_entries(child, entries);
    }
}

/// Groups flattened entries by demonym, keeping first-seen group order.
pub fn group_by_demonym(entries: &[FlatEntry]) -> Vec<(String, Vec<FlatEntry>)> {
    let mut groups: Vec<(String, Vec<FlatEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(demonym, _)| *demonym == entry.demonym) {
            Some((_, members)) => members.push(entry.clone()),
            None => groups.push((entry.demonym.clone(), vec![entry.clone()])),
        }
    }
    groups
}

pub fn build_hierarchy(entries: &[FlatEntry]) -> Hierarchy {
    build_hierarchy_with_orphans(entries).0
}

/// Rebuilds the parent-linked hierarchy and reports how many entries were
/// dropped because their `parentId` matched no entry.
///
/// Entries are indexed by id first, then attached: `parentId == "root"` goes
/// to the top level under the entry's label, anything else under the indexed
/// parent's `regions`. A later entry with the same id replaces an earlier one,
/// so every node is placed at most once.
pub fn build_hierarchy_with_orphans(entries: &[FlatEntry]) -> (Hierarchy, usize) {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        index.insert(entry.id.as_str(), position);
    }

    let mut top_level: Vec<(&str, usize)> = Vec::new();
    let mut children: Vec<Vec<(&str, usize)>> = vec![Vec::new(); entries.len()];
    let mut orphans = 0;

    for (node, entry) in entries.iter().enumerate() {
        if index[entry.id.as_str()] != node {
            continue;
        }
        if entry.parent_id == ROOT_ID {
            top_level.push((entry.label.as_str(), node));
        } else if let Some(&parent) = index.get(entry.parent_id.as_str()) {
            children[parent].push((entry.label.as_str(), node));
        } else {
            orphans += 1;
        }
    }

    let mut path = Vec::new();
    let mut hierarchy = Hierarchy::new();
    for (label, node) in top_level {
        if let Some(region) = materialize(node, entries, &children, &mut path) {
            hierarchy.push(label, region);
        }
    }

    (hierarchy, orphans)
}

fn materialize(
    node: usize,
    entries: &[FlatEntry],
    children: &[Vec<(&str, usize)>],
    path: &mut Vec<usize>,
) -> Option<RegionNode> {
    // Malformed parent pointers can form a cycle; cut it at the repeat.
    if path.contains(&node) {
        return None;
    }
    path.push(node);

    let mut regions = Hierarchy::new();
    for &(label, child) in &children[node] {
        if let Some(region) = materialize(child, entries, children, path) {
            regions.push(label, region);
        }
    }
    path.pop();

    let mut region = RegionNode::from(&entries[node]);
    if !regions.is_empty() {
        region.regions = Some(regions);
    }
    Some(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> PercentageTreeNode {
        serde_json::from_value(json!({
            "id": "root",
            "label": "World",
            "parentId": "",
            "totalPercent": "100.0",
            "children": [
                {
                    "id": "eur", "label": "European", "parentId": "root",
                    "totalPercent": "62.4", "demonym": "European", "color": "#3f51b5",
                    "children": [
                        {
                            "id": "nwe", "label": "Northwestern European", "parentId": "eur",
                            "totalPercent": "40.1", "demonym": "European",
                            "children": [
                                {"id": "brit", "label": "British & Irish", "parentId": "nwe",
                                 "totalPercent": "30.0", "demonym": "European"}
                            ]
                        },
                        {"id": "swe", "label": "Southern European", "parentId": "eur",
                         "totalPercent": "0.0", "demonym": "European",
                         "children": [
                             {"id": "iber", "label": "Spanish & Portuguese", "parentId": "swe",
                              "totalPercent": "12.0", "demonym": "European"}
                         ]}
                    ]
                },
                {
                    "id": "ssa", "label": "Sub-Saharan African", "parentId": "root",
                    "totalPercent": "not-a-number",
                    "children": [
                        {"id": "waf", "label": "West African", "parentId": "ssa", "totalPercent": "8.5"}
                    ]
                },
                {"id": "ind", "label": "Indigenous American", "parentId": "root", "totalPercent": "21.3",
                 "demonym": "Indigenous American"},
                {"id": "unk", "label": "Unassigned", "parentId": "root"}
            ]
        }))
        .unwrap()
    }

    fn entry(id: &str, label: &str, parent_id: &str, percent: &str) -> FlatEntry {
        FlatEntry {
            id: id.to_string(),
            label: label.to_string(),
            total_percent: percent.to_string(),
            color: None,
            parent_id: parent_id.to_string(),
            demonym: "Unknown".to_string(),
        }
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("12.5"), Some(12.5));
        assert_eq!(parse_percent(" 7 "), Some(7.0));
        assert_eq!(parse_percent("3.2%"), Some(3.2));
        assert_eq!(parse_percent(".5"), Some(0.5));
        assert_eq!(parse_percent("-1"), Some(-1.0));
        assert_eq!(parse_percent("1e2"), Some(100.0));
        assert_eq!(parse_percent("abc"), None);
        assert_eq!(parse_percent(""), None);
        assert_eq!(parse_percent("."), None);
        assert_eq!(parse_percent("NaN"), None);
    }

    #[test]
    fn test_flatten_skips_root_and_non_positive_nodes() {
        let entries = flatten(&sample_tree());
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();

        assert!(!ids.contains(&"root"));
        assert!(!ids.contains(&"swe"), "zero percent must be excluded");
        assert!(!ids.contains(&"ssa"), "unparsable percent must be excluded");
        assert!(!ids.contains(&"unk"), "missing percent must be excluded");
        for entry in &entries {
            assert!(parse_percent(&entry.total_percent).unwrap() > 0.0);
        }
    }

    #[test]
    fn test_flatten_is_preorder_and_keeps_descendants_of_excluded_nodes() {
        let entries = flatten(&sample_tree());
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["eur", "nwe", "brit", "iber", "waf", "ind"]);
    }

    #[test]
    fn test_group_by_demonym_defaults_to_unknown() {
        let groups = group_by_demonym(&flatten(&sample_tree()));
        let names: Vec<&str> = groups.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(names, ["European", "Unknown", "Indigenous American"]);
        assert_eq!(groups[0].1.len(), 4);
        assert_eq!(groups[1].1[0].id, "waf");
    }

    #[test]
    fn test_build_hierarchy_nests_by_parent() {
        let (hierarchy, orphans) = build_hierarchy_with_orphans(&flatten(&sample_tree()));

        // "iber" hangs off the excluded "swe" node and "waf" off "ssa".
        assert_eq!(orphans, 2);

        let labels: Vec<&str> = hierarchy.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["European", "Indigenous American"]);

        let europe = &hierarchy.get("European").unwrap()[0];
        assert_eq!(europe.color.as_deref(), Some("#3f51b5"));
        let northwest = &europe.regions.as_ref().unwrap().get("Northwestern European").unwrap()[0];
        let british = &northwest.regions.as_ref().unwrap().get("British & Irish").unwrap()[0];
        assert_eq!(british.total_percent, "30.0");
        assert!(british.regions.is_none());

        let indigenous = &hierarchy.get("Indigenous American").unwrap()[0];
        assert!(indigenous.regions.is_none());
    }

    #[test]
    fn test_every_resolvable_entry_appears_exactly_once() {
        let entries = flatten(&sample_tree());
        let (hierarchy, orphans) = build_hierarchy_with_orphans(&entries);
        let placed: Vec<&str> = hierarchy.preorder().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(placed.len() + orphans, entries.len());
        assert_eq!(placed, ["eur", "nwe", "brit", "ind"]);
    }

    #[test]
    fn test_leaf_nodes_have_no_regions_key() {
        let hierarchy = build_hierarchy(&[entry("ind", "Indigenous American", "root", "21.3")]);
        let json = serde_json::to_value(&hierarchy).unwrap();
        let node = &json["Indigenous American"][0];
        assert!(node.get("regions").is_none());
        assert_eq!(node["totalPercent"], "21.3");
        assert_eq!(node["parentId"], "root");
    }

    #[test]
    fn test_children_listed_before_parents_still_attach() {
        let entries = vec![
            entry("nwe", "Northwestern European", "eur", "40.0"),
            entry("eur", "European", "root", "60.0"),
        ];
        let (hierarchy, orphans) = build_hierarchy_with_orphans(&entries);
        assert_eq!(orphans, 0);
        let europe = &hierarchy.get("European").unwrap()[0];
        assert!(europe.regions.as_ref().unwrap().get("Northwestern European").is_some());
    }

    #[test]
    fn test_duplicate_ids_resolve_to_the_last_entry() {
        let entries = vec![
            entry("dup", "First", "root", "10.0"),
            entry("dup", "Second", "root", "20.0"),
        ];
        let hierarchy = build_hierarchy(&entries);

        assert!(hierarchy.get("First").is_none());
        assert_eq!(hierarchy.get("Second").unwrap().len(), 1);
        assert_eq!(hierarchy.get("Second").unwrap()[0].total_percent, "20.0");
    }

    #[test]
    fn test_duplicated_id_chains_stay_linear() {
        let mut entries = Vec::new();
        for level in 0..40 {
            let parent = if level == 0 { "root".to_string() } else { format!("l{}", level - 1) };
            let id = format!("l{level}");
            entries.push(entry(&id, &id, &parent, "1.0"));
            entries.push(entry(&id, &id, &parent, "2.0"));
        }
        let (hierarchy, orphans) = build_hierarchy_with_orphans(&entries);
        assert_eq!(orphans, 0);
        let placed = hierarchy.preorder();
        assert_eq!(placed.len(), 40);
        assert!(placed.iter().all(|n| n.total_percent == "2.0"));
    }

    #[test]
    fn test_parent_cycles_are_cut() {
        let entries = vec![
            entry("a", "A", "root", "10.0"),
            entry("b", "B", "c", "5.0"),
            entry("c", "C", "b", "5.0"),
            entry("d", "D", "d", "1.0"),
        ];
        let (hierarchy, orphans) = build_hierarchy_with_orphans(&entries);
        assert_eq!(orphans, 0);
        assert_eq!(hierarchy.preorder().len(), 1);
    }
}
