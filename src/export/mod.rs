pub mod html;
pub mod json;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Stem shared by every export artifact.
pub const EXPORT_PREFIX: &str = "23andme-matches";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `23andme-matches-YYYY-MM-DD.<extension>`
pub fn export_file_name(extension: &str, date: NaiveDate) -> String {
    format!("{EXPORT_PREFIX}-{}.{extension}", date.format("%Y-%m-%d"))
}

pub(crate) fn write_artifact(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf, ExportError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ExportError::Io { path, source }
    };

    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents).map_err(io_error(&path))?;
    Ok(path)
}
