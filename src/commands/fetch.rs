use crate::ancestry::aggregate;
use crate::api::{ProgressCallback, ProgressEvent};
use crate::cli::ExportFormat;
use crate::config::Config;
use crate::enrich::{Pacer, Session};
use crate::export::{html, json};
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use crate::utils::LogAroundBar;
use crate::vendor::{CookieJar, TtamClient};
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct FetchOptions {
    pub cookie: Option<String>,
    pub cookie_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub delay_ms: Option<u64>,
    pub limit: Option<usize>,
    pub format: ExportFormat,
}

fn read_cookie(options: &FetchOptions) -> Result<CookieJar> {
    let raw = match (&options.cookie, &options.cookie_file) {
        (Some(cookie), _) => cookie.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cookie file {}", path.display()))?,
        (None, None) => bail!("No session cookie given; use --cookie, --cookie-file or TTAM_COOKIE"),
    };
    let jar = CookieJar::parse(&raw);
    if jar.is_empty() {
        bail!("Session cookie is empty");
    }
    Ok(jar)
}

fn bar_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Arc::new(move |event: ProgressEvent| match event {
        ProgressEvent::Started { total, .. } => pb.set_length(total),
        ProgressEvent::Progress { current, .. } => pb.set_position(current),
        ProgressEvent::Message { message, .. } => pb.set_message(message),
        ProgressEvent::Error { error, .. } => pb.set_message(format!("failed: {error}")),
        ProgressEvent::Completed { .. } => pb.finish_with_message("Enrichment complete"),
    })
}

pub fn run(config: &Config, options: FetchOptions) -> Result<()> {
    let cookies = read_cookie(&options)?;
    let client = TtamClient::new(config, cookies).context("Failed to build HTTP client")?;

    let spinner = ProgressBarBuilder::new("Finding your profile...").with_tick().build()?;
    let spinner_logs = LogAroundBar::new(&spinner);
    let mut session = Session::discover(&client).context("Could not discover the signed-in profile")?;
    spinner.set_message("Downloading match list...");
    let count = session.load_matches(&client).context("Failed to fetch the match list")?;
    spinner.finish_with_message(format!("Found {count} matches"));
    drop(spinner_logs);

    let limit = options.limit.or(config.match_limit);
    let mut pacer = Pacer::from_millis(options.delay_ms.unwrap_or(config.request_delay_ms));
    let pb = ProgressBarBuilder::new("Enriching matches")
        .with_length(limit.map_or(count, |l| l.min(count)) as u64)
        .build()?;
    let callback = bar_callback(&pb);

    let bar_logs = LogAroundBar::new(&pb);
    let results = session.enrich_all(&client, &mut pacer, limit, Some(&callback));
    drop(bar_logs);
    let stats = aggregate(results);

    let output_dir = options.output_dir.unwrap_or_else(|| config.output_dir.clone());
    let today = chrono::Local::now().date_naive();

    if options.format.writes_json() {
        let path = json::write_json(results, &output_dir, today).context("Failed to write JSON export")?;
        info!(path = %path.display(), "wrote JSON export");
        println!("JSON export: {}", path.display());
    }
    if options.format.writes_html() {
        let path =
            html::write_html(results, &stats, &output_dir, today).context("Failed to write HTML export")?;
        info!(path = %path.display(), "wrote HTML export");
        println!("HTML export: {}", path.display());
    }

    let failed = results.iter().filter(|r| r.ancestry_error.is_some()).count();
    println!(
        "{} matches exported, {} with ancestry, {} failed",
        stats.total_matches, stats.matches_with_ancestry, failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(cookie: Option<&str>, cookie_file: Option<PathBuf>) -> FetchOptions {
        FetchOptions {
            cookie: cookie.map(str::to_string),
            cookie_file,
            output_dir: None,
            delay_ms: None,
            limit: None,
            format: ExportFormat::Json,
        }
    }

    #[test]
    fn cookie_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookie.txt");
        std::fs::write(&path, "Cookie: sessionid=abc; csrftoken=tok\n").unwrap();

        let jar = read_cookie(&options(None, Some(path))).unwrap();
        assert_eq!(jar.csrf_token(), Some("tok"));
    }

    #[test]
    fn missing_cookie_is_an_error() {
        assert!(read_cookie(&options(None, None)).is_err());
        assert!(read_cookie(&options(Some("   "), None)).is_err());
    }

    #[test]
    fn bar_follows_events() {
        let pb = ProgressBar::hidden();
        let callback = bar_callback(&pb);
        callback(ProgressEvent::Started { task: "t".into(), total: 4 });
        callback(ProgressEvent::Progress { task: "t".into(), current: 3, total: 4 });
        assert_eq!(pb.length(), Some(4));
        assert_eq!(pb.position(), 3);
    }
}
