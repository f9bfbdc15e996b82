//! Session state and the serial enrichment loop.

pub mod pacer;

pub use pacer::Pacer;

use crate::ancestry::{build_hierarchy_with_orphans, extract_haplogroups, flatten};
use crate::api::{emit, ProgressCallback, ProgressEvent};
use crate::types::{AncestryRecord, EnrichedMatch, MatchEntry};
use crate::vendor::{FetchError, RelativesProvider};
use tracing::{debug, info, warn};

const ENRICH_TASK: &str = "Enriching matches";

/// What one run knows about the signed-in user: their profile id, the match
/// list, and the enriched records collected so far.
#[derive(Debug, Clone, Default)]
pub struct Session {
    profile_id: String,
    matches: Vec<MatchEntry>,
    results: Vec<EnrichedMatch>,
}

impl Session {
    pub fn new(profile_id: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            ..Self::default()
        }
    }

    /// Opens a session by asking the service who is signed in. Nothing else
    /// can run without this, so the error goes straight back to the caller.
    pub fn discover(provider: &dyn RelativesProvider) -> Result<Self, FetchError> {
        let profile_id = provider.current_profile_id()?;
        info!(profile_id = %profile_id, "session discovered");
        Ok(Self::new(profile_id))
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn matches(&self) -> &[MatchEntry] {
        &self.matches
    }

    pub fn results(&self) -> &[EnrichedMatch] {
        &self.results
    }

    pub fn into_results(self) -> Vec<EnrichedMatch> {
        self.results
    }

    /// Replaces the match list with a fresh fetch.
    pub fn load_matches(&mut self, provider: &dyn RelativesProvider) -> Result<usize, FetchError> {
        self.matches = provider.fetch_matches(&self.profile_id)?;
        info!(count = self.matches.len(), "match list loaded");
        Ok(self.matches.len())
    }

    /// Enriches the first `limit` matches (all when `None`), one at a time.
    ///
    /// Previous results are discarded. A match whose fetches fail is kept
    /// with `ancestry_error` set and the loop moves on.
    pub fn enrich_all(
        &mut self,
        provider: &dyn RelativesProvider,
        pacer: &mut Pacer,
        limit: Option<usize>,
        progress: Option<&ProgressCallback>,
    ) -> &[EnrichedMatch] {
        let count = limit.map_or(self.matches.len(), |l| l.min(self.matches.len()));
        let total = count as u64;
        self.results = Vec::with_capacity(count);

        emit(progress, ProgressEvent::Started { task: ENRICH_TASK.to_string(), total });

        for (position, entry) in self.matches.iter().take(count).enumerate() {
            emit(
                progress,
                ProgressEvent::Message {
                    task: ENRICH_TASK.to_string(),
                    message: format!("Fetching {}", entry.relative_profile_id),
                },
            );
            let record = enrich_match(provider, &self.profile_id, entry, pacer);
            if let Some(error) = &record.ancestry_error {
                emit(
                    progress,
                    ProgressEvent::Error {
                        task: ENRICH_TASK.to_string(),
                        error: format!("{}: {error}", entry.relative_profile_id),
                    },
                );
            }
            self.results.push(record);
            emit(
                progress,
                ProgressEvent::Progress {
                    task: ENRICH_TASK.to_string(),
                    current: position as u64 + 1,
                    total,
                },
            );
        }

        let failed = self.results.iter().filter(|r| r.ancestry_error.is_some()).count();
        info!(enriched = self.results.len() - failed, failed, "enrichment finished");
        emit(progress, ProgressEvent::Completed { task: ENRICH_TASK.to_string() });

        &self.results
    }
}

/// Fetches and reshapes one match's ancestry, capturing any failure on the
/// returned record.
pub fn enrich_match(
    provider: &dyn RelativesProvider,
    profile_id: &str,
    entry: &MatchEntry,
    pacer: &mut Pacer,
) -> EnrichedMatch {
    match fetch_ancestry_record(provider, profile_id, &entry.relative_profile_id, pacer) {
        Ok(ancestry) => EnrichedMatch::with_ancestry(entry.clone(), ancestry),
        Err(e) => {
            warn!(match_id = %entry.relative_profile_id, error = %e, "ancestry fetch failed");
            EnrichedMatch::with_error(entry.clone(), e.to_string())
        }
    }
}

fn fetch_ancestry_record(
    provider: &dyn RelativesProvider,
    profile_id: &str,
    match_id: &str,
    pacer: &mut Pacer,
) -> Result<AncestryRecord, FetchError> {
    pacer.wait();
    let ancestry = provider.fetch_ancestry(profile_id, match_id)?;
    let (regions, orphans) = build_hierarchy_with_orphans(&flatten(&ancestry.tree));
    if orphans > 0 {
        debug!(match_id, orphans, "dropped regions with unknown parents");
    }

    pacer.wait();
    let results = provider.fetch_haplogroups(profile_id, match_id)?;
    let haplogroups = extract_haplogroups(&results, match_id);

    Ok(AncestryRecord {
        regions,
        haplogroups,
        using_latest_compute: ancestry.using_latest_compute,
    })
}
