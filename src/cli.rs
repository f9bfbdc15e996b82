use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Html,
    Both,
}

impl ExportFormat {
    pub fn writes_json(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }

    pub fn writes_html(self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::Both)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download DNA relatives with their ancestry and haplogroups
    Fetch {
        /// Cookie header copied from a signed-in browser session
        #[arg(long, env = "TTAM_COOKIE", hide_env_values = true, conflicts_with = "cookie_file")]
        cookie: Option<String>,

        /// File containing the cookie header
        #[arg(long)]
        cookie_file: Option<PathBuf>,

        /// Directory for the export files (default: from config)
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Minimum delay between requests in milliseconds (default: from config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Only enrich the first N matches
        #[arg(long)]
        limit: Option<usize>,

        /// Which artifacts to write
        #[arg(long, value_enum, default_value = "both")]
        format: ExportFormat,
    },

    /// Print summary statistics for a JSON export
    Stats {
        /// Path to a JSON export
        export_file: PathBuf,
    },

    /// Average the ancestry of relatives whose grandparents were all born in one country
    Analyze {
        /// Path to a JSON export
        export_file: PathBuf,

        /// Country code to match on all four grandparents (default: last used, else the most common)
        #[arg(long)]
        country: Option<String>,

        /// Human-readable name of the location (default: last used for this country, else from the data)
        #[arg(long)]
        label: Option<String>,

        /// Directory for the report and charts (default: from config)
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// List the countries found on all four grandparents and exit
        #[arg(long)]
        list_locations: bool,
    },
}
