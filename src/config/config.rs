use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Per-request timeout in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,
    /// Minimum pause between successive enrichment requests.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Page scraped for the signed-in profile id.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// URL templates; `{profile_id}` and `{match_id}` are substituted.
    #[serde(default = "default_matches_url")]
    pub matches_url: String,
    #[serde(default = "default_ancestry_url")]
    pub ancestry_url: String,
    #[serde(default = "default_haplogroups_url")]
    pub haplogroups_url: String,
    #[serde(default)]
    pub match_limit: Option<usize>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub last_country_code: Option<String>,
    #[serde(default)]
    pub last_location_label: Option<String>,
}

fn default_download_timeout() -> u64 {
    60
}

fn default_request_delay_ms() -> u64 {
    1500
}

fn default_base_url() -> String {
    "https://you.23andme.com/".to_string()
}

fn default_matches_url() -> String {
    "https://you.23andme.com/p/{profile_id}/family/relatives/ajax/".to_string()
}

fn default_ancestry_url() -> String {
    "https://you.23andme.com/p/{profile_id}/profile/{match_id}/ancestry_composition/".to_string()
}

fn default_haplogroups_url() -> String {
    "https://you.23andme.com/p/{profile_id}/profile/{match_id}/haplogroups/".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_timeout: default_download_timeout(),
            request_delay_ms: default_request_delay_ms(),
            base_url: default_base_url(),
            matches_url: default_matches_url(),
            ancestry_url: default_ancestry_url(),
            haplogroups_url: default_haplogroups_url(),
            match_limit: None,
            output_dir: default_output_dir(),
            last_country_code: None,
            last_location_label: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ttam-relatives", "ttam-relatives")
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reads `config.toml` from the platform config directory, falling back
    /// to defaults when it is missing or unreadable.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Config::default(),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring invalid config");
                    Config::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config");
                Config::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(path) = Self::path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Records the filter values used by the last analysis run.
    pub fn remember_location(&mut self, country_code: &str, location_label: &str) {
        self.last_country_code = Some(country_code.to_string());
        self.last_location_label = Some(location_label.to_string());
    }
}
