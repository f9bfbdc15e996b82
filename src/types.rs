use crate::ancestry::types::{HaplogroupPair, Hierarchy};
use serde::{Deserialize, Serialize};

/// Where one grandparent was born, as reported by the relative.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BirthLocation {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GrandparentBirthLocations {
    #[serde(default)]
    pub maternal_gma: Option<BirthLocation>,
    #[serde(default)]
    pub maternal_gpa: Option<BirthLocation>,
    #[serde(default)]
    pub paternal_gma: Option<BirthLocation>,
    #[serde(default)]
    pub paternal_gpa: Option<BirthLocation>,
}

impl GrandparentBirthLocations {
    pub fn all(&self) -> [Option<&BirthLocation>; 4] {
        [
            self.maternal_gma.as_ref(),
            self.maternal_gpa.as_ref(),
            self.paternal_gma.as_ref(),
            self.paternal_gpa.as_ref(),
        ]
    }
}

/// A DNA relative as listed by the match-list endpoint. Fields are copied
/// through to the export untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MatchEntry {
    #[serde(alias = "relativeProfileId")]
    pub relative_profile_id: String,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_open_sharing: Option<bool>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub predicted_relationship_id: Option<String>,
    #[serde(default)]
    pub ibd_proportion: Option<f64>,
    #[serde(default)]
    pub num_segments: Option<u32>,
    #[serde(default)]
    pub total_segment_length: Option<f64>,
    #[serde(default)]
    pub is_maternal_side: Option<bool>,
    #[serde(default)]
    pub is_paternal_side: Option<bool>,
    #[serde(default)]
    pub opt_in_date: Option<String>,
    #[serde(default)]
    pub grandparent_birth_locations: Option<GrandparentBirthLocations>,
}

impl MatchEntry {
    /// Initials, falling back to the name fields, then to `"N/A"`.
    pub fn display_initials(&self) -> String {
        if let Some(initials) = self.initials.as_deref().filter(|i| !i.is_empty()) {
            return initials.to_string();
        }
        let letters: String = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|name| name.chars().next())
            .collect();
        if letters.is_empty() {
            "N/A".to_string()
        } else {
            letters.to_uppercase()
        }
    }

    /// `"second_cousin"` becomes `"Second Cousin"`.
    pub fn relationship_title(&self) -> String {
        let raw = self.predicted_relationship_id.as_deref().unwrap_or("Unknown");
        raw.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Ancestry attached to a match after the second round of fetches.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AncestryRecord {
    #[serde(default)]
    pub regions: Hierarchy,
    #[serde(default)]
    pub haplogroups: HaplogroupPair,
    #[serde(default)]
    pub using_latest_compute: bool,
}

/// A match plus either its ancestry or the reason it could not be fetched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnrichedMatch {
    #[serde(flatten)]
    pub entry: MatchEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<AncestryRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry_error: Option<String>,
}

impl EnrichedMatch {
    pub fn with_ancestry(entry: MatchEntry, ancestry: AncestryRecord) -> Self {
        Self {
            entry,
            ancestry: Some(ancestry),
            ancestry_error: None,
        }
    }

    pub fn with_error(entry: MatchEntry, error: String) -> Self {
        Self {
            entry,
            ancestry: None,
            ancestry_error: Some(error),
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.entry.relative_profile_id
    }

    pub fn uses_latest_compute(&self) -> bool {
        self.ancestry.as_ref().is_some_and(|a| a.using_latest_compute)
    }
}
