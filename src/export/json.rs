use super::{export_file_name, write_artifact, ExportError};
use crate::types::EnrichedMatch;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub fn to_json_string(records: &[EnrichedMatch]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Writes the pretty-printed record array as the dated `.json` artifact.
pub fn write_json(records: &[EnrichedMatch], dir: &Path, date: NaiveDate) -> Result<PathBuf, ExportError> {
    let contents = to_json_string(records)?;
    write_artifact(dir, &export_file_name("json", date), &contents)
}

/// Reads a JSON export back for offline commands.
pub fn load_json(path: &Path) -> Result<Vec<EnrichedMatch>, ExportError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}
