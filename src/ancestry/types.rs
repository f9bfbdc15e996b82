use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Id of the synthetic node every ancestry tree hangs from.
pub const ROOT_ID: &str = "root";

/// Grouping used when a tree node carries no demonym.
pub const DEFAULT_DEMONYM: &str = "Unknown";

/// One node of a population tree as served by the ancestry endpoint.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PercentageTreeNode {
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub label: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub parent_id: String,
    #[serde(default, deserialize_with = "deserialize_percent")]
    pub total_percent: Option<String>,
    #[serde(default)]
    pub demonym: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_vec")]
    pub children: Vec<PercentageTreeNode>,
}

impl PercentageTreeNode {
    pub fn demonym(&self) -> &str {
        self.demonym.as_deref().unwrap_or(DEFAULT_DEMONYM)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    pub id: String,
    pub label: String,
    pub total_percent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub parent_id: String,
    #[serde(skip, default = "default_demonym")]
    pub demonym: String,
}

impl From<&PercentageTreeNode> for FlatEntry {
    fn from(node: &PercentageTreeNode) -> Self {
        FlatEntry {
            id: node.id.clone(),
            label: node.label.clone(),
            total_percent: node.total_percent.clone().unwrap_or_default(),
            color: node.color.clone(),
            parent_id: node.parent_id.clone(),
            demonym: node.demonym().to_string(),
        }
    }
}

/// A hierarchy node. `regions` stays `None` for leaves so the key is omitted
/// from the serialized form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegionNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "deserialize_percent_string")]
    pub total_percent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_percent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Hierarchy>,
}

impl From<&FlatEntry> for RegionNode {
    fn from(entry: &FlatEntry) -> Self {
        RegionNode {
            id: entry.id.clone(),
            label: entry.label.clone(),
            total_percent: entry.total_percent.clone(),
            color: entry.color.clone(),
            parent_id: entry.parent_id.clone(),
            max_percent: None,
            regions: None,
        }
    }
}

/// Label-keyed groups of region nodes, kept in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    groups: Vec<(String, Vec<RegionNode>)>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct labels at this level.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, label: &str) -> Option<&[RegionNode]> {
        self.groups
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, nodes)| nodes.as_slice())
    }

    /// Appends `node` under `label`, opening the group if this is the first
    /// node seen for it.
    pub fn push(&mut self, label: &str, node: RegionNode) {
        match self.groups.iter_mut().find(|(l, _)| l == label) {
            Some((_, nodes)) => nodes.push(node),
            None => self.groups.push((label.to_string(), vec![node])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RegionNode])> {
        self.groups
            .iter()
            .map(|(label, nodes)| (label.as_str(), nodes.as_slice()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<RegionNode>)> {
        self.groups
            .iter_mut()
            .map(|(label, nodes)| (label.as_str(), nodes))
    }

    /// Every node at every depth, parents before their children.
    pub fn preorder(&self) -> Vec<&RegionNode> {
        fn walk<'a>(hierarchy: &'a Hierarchy, out: &mut Vec<&'a RegionNode>) {
            for (_, nodes) in hierarchy.iter() {
                for node in nodes {
                    out.push(node);
                    if let Some(regions) = &node.regions {
                        walk(regions, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

impl Serialize for Hierarchy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (label, nodes) in &self.groups {
            map.serialize_entry(label, nodes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Hierarchy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HierarchyVisitor;

        impl<'de> Visitor<'de> for HierarchyVisitor {
            type Value = Hierarchy;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of region labels to region lists")
            }

            fn visit_unit<E>(self) -> Result<Hierarchy, E> {
                Ok(Hierarchy::new())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Hierarchy, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut hierarchy = Hierarchy::new();
                while let Some((label, nodes)) = access.next_entry::<String, Vec<RegionNode>>()? {
                    for node in nodes {
                        hierarchy.push(&label, node);
                    }
                }
                Ok(hierarchy)
            }
        }

        deserializer.deserialize_any(HierarchyVisitor)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct HaplogroupPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ydna: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtdna: Option<String>,
}

fn default_demonym() -> String {
    DEFAULT_DEMONYM.to_string()
}

pub(crate) fn deserialize_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_null_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Percentages arrive as decimal strings, but numbers are tolerated.
fn deserialize_percent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_percent_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_percent(deserializer)?.unwrap_or_default())
}
