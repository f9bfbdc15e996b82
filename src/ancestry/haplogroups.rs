use super::types::{deserialize_null_string, HaplogroupPair};
use serde::{Deserialize, Serialize};

/// Result name carrying the paternal-line (Y-DNA) haplogroup.
pub const PATERNAL_MARKER: &str = "paternal_haplogroup";
/// Result name carrying the maternal-line (mtDNA) haplogroup.
pub const MATERNAL_MARKER: &str = "maternal_haplogroup";
/// Appears in the paternal value of subjects without a Y chromosome.
pub const FEMALE_MARKER: &str = "female";

/// One row of the flat haplogroup result list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HaplogroupResult {
    #[serde(alias = "profileId")]
    pub profile_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub value: String,
}

fn after_first_colon(value: &str) -> &str {
    value.split_once(':').map_or(value, |(_, rest)| rest)
}

/// Picks the Y-DNA and mtDNA haplogroups for `target_id` out of a result
/// list that may hold rows for several profiles.
///
/// Missing rows leave the matching field `None`.
pub fn extract_haplogroups(results: &[HaplogroupResult], target_id: &str) -> HaplogroupPair {
    let for_target = || results.iter().filter(|r| r.profile_id == target_id);

    let ydna = for_target().find(|r| r.name == PATERNAL_MARKER).map(|r| {
        if r.value.contains(FEMALE_MARKER) {
            String::new()
        } else {
            after_first_colon(&r.value).to_string()
        }
    });

    let mtdna = for_target()
        .find(|r| r.name == MATERNAL_MARKER)
        .map(|r| after_first_colon(&r.value).to_string());

    HaplogroupPair { ydna, mtdna }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(profile_id: &str, name: &str, value: &str) -> HaplogroupResult {
        HaplogroupResult {
            profile_id: profile_id.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn strips_up_to_first_colon() {
        let results = vec![
            result("abc", PATERNAL_MARKER, "haplogroup:R-M269"),
            result("abc", MATERNAL_MARKER, "haplogroup:H1:c"),
        ];
        let pair = extract_haplogroups(&results, "abc");
        assert_eq!(pair.ydna.as_deref(), Some("R-M269"));
        assert_eq!(pair.mtdna.as_deref(), Some("H1:c"));
    }

    #[test]
    fn keeps_values_without_colon() {
        let results = vec![result("abc", MATERNAL_MARKER, "L2a1")];
        let pair = extract_haplogroups(&results, "abc");
        assert_eq!(pair.mtdna.as_deref(), Some("L2a1"));
        assert_eq!(pair.ydna, None);
    }

    #[test]
    fn female_marker_blanks_ydna() {
        let results = vec![result("abc", PATERNAL_MARKER, "female:R-M269")];
        let pair = extract_haplogroups(&results, "abc");
        assert_eq!(pair.ydna.as_deref(), Some(""));
    }

    #[test]
    fn ignores_other_profiles() {
        let results = vec![
            result("other", PATERNAL_MARKER, "haplogroup:I-M253"),
            result("other", MATERNAL_MARKER, "haplogroup:U5"),
        ];
        assert_eq!(extract_haplogroups(&results, "abc"), HaplogroupPair::default());
    }

    #[test]
    fn parses_camel_case_rows() {
        let rows: Vec<HaplogroupResult> = serde_json::from_str(
            r#"[{"profileId": "abc", "name": "maternal_haplogroup", "value": null}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].value, "");
        assert_eq!(extract_haplogroups(&rows, "abc").mtdna.as_deref(), Some(""));
    }
}
