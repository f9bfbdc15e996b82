use serde_json::json;
use std::cell::RefCell;
use std::sync::{Arc, Mutex};
use ttam_relatives::ancestry::{aggregate, HaplogroupResult, PercentageTreeNode};
use ttam_relatives::enrich::{Pacer, Session};
use ttam_relatives::types::MatchEntry;
use ttam_relatives::vendor::{FetchError, MatchAncestry, RelativesProvider};
use ttam_relatives::{ProgressCallback, ProgressEvent};

/// Canned service: a fixed match list, one tree per match, and a set of
/// match ids whose ancestry request fails.
struct ScriptedProvider {
    profile_id: Option<String>,
    match_ids: Vec<String>,
    failing: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedProvider {
    fn new(count: usize) -> Self {
        Self {
            profile_id: Some("me".to_string()),
            match_ids: (1..=count).map(|i| format!("m{i}")).collect(),
            failing: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn tree() -> PercentageTreeNode {
        serde_json::from_value(json!({
            "id": "root",
            "label": "World",
            "children": [{
                "id": "eur",
                "label": "European",
                "parentId": "root",
                "totalPercent": 80,
                "demonym": "European",
                "children": [{
                    "id": "nwe",
                    "label": "Northwestern European",
                    "parentId": "eur",
                    "totalPercent": "80"
                }]
            }, {
                "id": "waf",
                "label": "West African",
                "parentId": "root",
                "totalPercent": "20",
                "demonym": "African"
            }]
        }))
        .unwrap()
    }
}

impl RelativesProvider for ScriptedProvider {
    fn current_profile_id(&self) -> Result<String, FetchError> {
        self.calls.borrow_mut().push("profile".to_string());
        self.profile_id.clone().ok_or(FetchError::MissingSessionId {
            url: "https://example.test/".to_string(),
        })
    }

    fn fetch_matches(&self, _profile_id: &str) -> Result<Vec<MatchEntry>, FetchError> {
        self.calls.borrow_mut().push("matches".to_string());
        Ok(self
            .match_ids
            .iter()
            .map(|id| MatchEntry {
                relative_profile_id: id.clone(),
                ..MatchEntry::default()
            })
            .collect())
    }

    fn fetch_ancestry(&self, _profile_id: &str, match_id: &str) -> Result<MatchAncestry, FetchError> {
        self.calls.borrow_mut().push(format!("ancestry:{match_id}"));
        if self.failing.iter().any(|id| id == match_id) {
            return Err(FetchError::Http {
                status: 500,
                url: format!("https://example.test/ancestry/{match_id}"),
                body: "boom".to_string(),
            });
        }
        Ok(MatchAncestry {
            tree: Self::tree(),
            using_latest_compute: true,
        })
    }

    fn fetch_haplogroups(&self, _profile_id: &str, match_id: &str) -> Result<Vec<HaplogroupResult>, FetchError> {
        self.calls.borrow_mut().push(format!("haplogroups:{match_id}"));
        Ok(vec![
            HaplogroupResult {
                profile_id: match_id.to_string(),
                name: "paternal_haplogroup".to_string(),
                value: "haplogroup:R-M269".to_string(),
            },
            HaplogroupResult {
                profile_id: match_id.to_string(),
                name: "maternal_haplogroup".to_string(),
                value: "haplogroup:H1".to_string(),
            },
        ])
    }
}

fn run(provider: &ScriptedProvider, limit: Option<usize>, progress: Option<&ProgressCallback>) -> Session {
    let mut session = Session::discover(provider).unwrap();
    session.load_matches(provider).unwrap();
    let mut pacer = Pacer::from_millis(0);
    session.enrich_all(provider, &mut pacer, limit, progress);
    session
}

#[test]
fn one_failed_match_does_not_stop_the_batch() {
    let mut provider = ScriptedProvider::new(5);
    provider.failing.push("m3".to_string());

    let session = run(&provider, None, None);
    let results = session.results();

    assert_eq!(results.len(), 5);
    for (i, record) in results.iter().enumerate() {
        assert_eq!(record.profile_id(), format!("m{}", i + 1));
    }
    assert!(results[2].ancestry.is_none());
    assert!(results[2].ancestry_error.as_deref().unwrap().contains("HTTP 500"));
    for i in [0, 1, 3, 4] {
        assert!(results[i].ancestry_error.is_none());
        let ancestry = results[i].ancestry.as_ref().unwrap();
        assert_eq!(ancestry.haplogroups.ydna.as_deref(), Some("R-M269"));
        let european = &ancestry.regions.get("European").unwrap()[0];
        assert_eq!(european.total_percent, "80");
        assert!(european.regions.as_ref().unwrap().get("Northwestern European").is_some());
    }

    // The failed match never reached its haplogroup request.
    let calls = provider.calls.borrow();
    assert!(calls.contains(&"ancestry:m3".to_string()));
    assert!(!calls.contains(&"haplogroups:m3".to_string()));
}

#[test]
fn requests_run_serially_in_match_order() {
    let provider = ScriptedProvider::new(2);
    run(&provider, None, None);
    assert_eq!(
        *provider.calls.borrow(),
        vec![
            "profile",
            "matches",
            "ancestry:m1",
            "haplogroups:m1",
            "ancestry:m2",
            "haplogroups:m2"
        ]
    );
}

#[test]
fn missing_profile_id_halts_before_any_match_request() {
    let mut provider = ScriptedProvider::new(3);
    provider.profile_id = None;

    let err = Session::discover(&provider).unwrap_err();
    assert!(matches!(err, FetchError::MissingSessionId { .. }));
    assert_eq!(*provider.calls.borrow(), vec!["profile"]);
}

#[test]
fn limit_caps_the_batch() {
    let provider = ScriptedProvider::new(5);
    let session = run(&provider, Some(2), None);
    assert_eq!(session.matches().len(), 5);
    assert_eq!(session.results().len(), 2);
}

#[test]
fn progress_events_track_each_match() {
    let mut provider = ScriptedProvider::new(3);
    provider.failing.push("m2".to_string());

    let events = Arc::new(Mutex::new(Vec::<ProgressEvent>::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| sink.lock().unwrap().push(event));
    run(&provider, None, Some(&callback));

    let events = events.lock().unwrap();
    assert!(matches!(events.first(), Some(ProgressEvent::Started { total: 3, .. })));
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
    let positions: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress { current, .. } => Some(*current),
            _ => None,
        })
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);
    let fetching: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Message { message, .. } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(fetching, vec!["Fetching m1", "Fetching m2", "Fetching m3"]);
    assert_eq!(
        events.iter().filter(|e| matches!(e, ProgressEvent::Error { .. })).count(),
        1
    );
}

#[test]
fn statistics_over_a_partly_failed_batch() {
    let mut provider = ScriptedProvider::new(4);
    provider.failing.push("m4".to_string());
    let session = run(&provider, None, None);

    let stats = aggregate(session.results());
    assert_eq!(stats.total_matches, 4);
    assert_eq!(stats.matches_with_ancestry, 3);
    assert_eq!(stats.matches_with_ydna, 3);
    assert_eq!(stats.most_common_ydna[0].percentage, "100.0");
    assert_eq!(stats.most_common_mtdna[0].percentage, "75.0");
    // 3 * 80 / 4
    assert_eq!(stats.average_regions.get("European").unwrap()[0].total_percent, "60.00");
}
