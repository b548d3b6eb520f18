use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::progress::Progress;
use crate::results::{FailureKind, LookupOutcome, ResultSet};
use crate::worms::{self, AphiaRecord};

// -------------------------------------------------------------------------------------------------
// MatchService
// -------------------------------------------------------------------------------------------------
/// Something that can match a scientific name against a taxonomic registry.
///
/// The answer is a list of groups of candidate records, as the WoRMS API returns them.
#[allow(async_fn_in_trait)]
pub trait MatchService {
    async fn match_name(&self, name: &str) -> worms::Result<Vec<Vec<AphiaRecord>>>;
}

impl MatchService for worms::Client {
    async fn match_name(&self, name: &str) -> worms::Result<Vec<Vec<AphiaRecord>>> {
        worms::Client::match_name(self, name).await
    }
}

// -------------------------------------------------------------------------------------------------
// Resolver
// -------------------------------------------------------------------------------------------------
/// Looks up each of a sequence of distinct names exactly once, turning every answer (including
/// failures) into result rows.
pub struct Resolver<'a, S> {
    service: &'a S,
    jobs: usize,
    request_interval: Option<Duration>,
    progress: Progress,
}

impl<'a, S: MatchService> Resolver<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Resolver {
            service,
            jobs: 1,
            request_interval: None,
            progress: Progress::hidden(),
        }
    }

    /// Allow up to `jobs` lookups in flight at once. Values below 1 are treated as 1.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Start successive requests at least `interval` apart.
    pub fn request_interval(mut self, interval: Option<Duration>) -> Self {
        self.request_interval = interval.filter(|d| !d.is_zero());
        self
    }

    pub fn progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Look up every name in `keys`.
    ///
    /// Rows come back in the order of `keys`, regardless of the order in which concurrent
    /// lookups complete. `keys` is expected to be free of duplicates; each entry is looked up.
    pub async fn resolve(&self, keys: &[String]) -> ResultSet {
        let throttle = Throttle::new(self.request_interval);
        stream::iter(keys)
            .map(|key| self.resolve_throttled(key, &throttle))
            .buffered(self.jobs)
            .collect::<Vec<LookupOutcome>>()
            .await
            .into_iter()
            .collect()
    }

    /// Like `resolve`, driving the lookups on a new single-threaded runtime.
    pub fn resolve_blocking(&self, keys: &[String]) -> std::io::Result<ResultSet> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.resolve(keys)))
    }

    /// Look up a single name. This never fails: failures are reported as `LookupOutcome::Failed`.
    pub async fn resolve_one(&self, key: &str) -> LookupOutcome {
        let outcome = match self.service.match_name(key).await {
            Ok(groups) => {
                let candidates: Vec<AphiaRecord> = groups.into_iter().flatten().collect();
                if candidates.is_empty() {
                    self.progress.suspend(|| {
                        warn!("Error fetching data for {key:?}: no close match was found")
                    });
                    LookupOutcome::Failed {
                        key: key.to_owned(),
                        kind: FailureKind::Fetch,
                    }
                } else {
                    self.progress.suspend(|| {
                        info!("Found {} candidate records for {key:?}", candidates.len())
                    });
                    LookupOutcome::Matched {
                        key: key.to_owned(),
                        candidates,
                    }
                }
            }
            Err(e) if e.is_http_status() => {
                self.progress
                    .suspend(|| warn!("HTTP error looking up {key:?}: {e}"));
                LookupOutcome::Failed {
                    key: key.to_owned(),
                    kind: FailureKind::Http,
                }
            }
            Err(e) => {
                self.progress.suspend(|| {
                    warn!("Error fetching data for {key:?}: {e}. Likely this means no close match was found.")
                });
                LookupOutcome::Failed {
                    key: key.to_owned(),
                    kind: FailureKind::Fetch,
                }
            }
        };
        self.progress.inc(1);
        outcome
    }

    async fn resolve_throttled(&self, key: &str, throttle: &Throttle) -> LookupOutcome {
        throttle.wait().await;
        self.resolve_one(key).await
    }
}

// -------------------------------------------------------------------------------------------------
// Throttle
// -------------------------------------------------------------------------------------------------
/// Spaces out request starts by a minimum interval, across concurrent lookups.
struct Throttle {
    interval: Option<Duration>,
    next_start: Mutex<Option<Instant>>,
}

impl Throttle {
    fn new(interval: Option<Duration>) -> Self {
        Throttle {
            interval,
            next_start: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let Some(interval) = self.interval else {
            return;
        };
        // The lock is held while sleeping so that waiters are released one interval apart
        let mut next_start = self.next_start.lock().await;
        if let Some(t) = *next_start {
            tokio::time::sleep_until(t).await;
        }
        *next_start = Some(Instant::now() + interval);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::results::ResultRow;
    use pretty_assertions::assert_eq;
    use reqwest::{StatusCode, Url};
    use std::cell::RefCell;
    use std::collections::HashMap;

    enum Reply {
        Groups(Vec<Vec<AphiaRecord>>),
        Status(StatusCode),
        Garbled,
    }

    /// An in-memory registry that records the names it was asked about.
    #[derive(Default)]
    struct MockService {
        replies: HashMap<&'static str, Reply>,
        requests: RefCell<Vec<String>>,
    }

    impl MockService {
        fn with(mut self, name: &'static str, reply: Reply) -> Self {
            self.replies.insert(name, reply);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl MatchService for MockService {
        async fn match_name(&self, name: &str) -> worms::Result<Vec<Vec<AphiaRecord>>> {
            self.requests.borrow_mut().push(name.to_owned());
            match self.replies.get(name) {
                Some(Reply::Groups(groups)) => Ok(groups.clone()),
                Some(Reply::Status(status)) => Err(worms::Error::HttpStatus {
                    status: *status,
                    url: Url::parse("http://registry.test/AphiaRecordsByMatchNames").unwrap(),
                }),
                Some(Reply::Garbled) => Err(worms::Error::JsonError(
                    serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
                )),
                None => Err(worms::Error::EmptyResponse(StatusCode::NO_CONTENT)),
            }
        }
    }

    fn record(aphia_id: i64, name: &str) -> AphiaRecord {
        AphiaRecord {
            aphia_id: Some(aphia_id),
            scientificname: Some(name.to_owned()),
            match_type: Some("exact".to_owned()),
            ..Default::default()
        }
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn mola_mola() -> Reply {
        Reply::Groups(vec![vec![record(127405, "Mola mola")]])
    }

    #[tokio::test]
    async fn match_and_http_error() {
        let service = MockService::default()
            .with("Mola mola", mola_mola())
            .with("Unknownus fakeicus", Reply::Status(StatusCode::NOT_FOUND));
        let results = Resolver::new(&service)
            .resolve(&keys(&["Mola mola", "Unknownus fakeicus"]))
            .await;

        assert_eq!(results.len(), 2);
        match &results.rows()[0] {
            ResultRow::Match(m) => {
                assert_eq!(m.entered_name, "Mola mola");
                assert_eq!(m.record.aphia_id, Some(127405));
                assert_eq!(m.record.match_type.as_deref(), Some("exact"));
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert_eq!(
            results.rows()[1],
            ResultRow::Error {
                entered_name: "Unknownus fakeicus".into(),
                kind: FailureKind::Http,
            }
        );
    }

    #[tokio::test]
    async fn failure_is_isolated() {
        let service = MockService::default()
            .with("K1", Reply::Groups(vec![vec![record(1, "K1")]]))
            .with("K2", Reply::Garbled)
            .with("K3", Reply::Groups(vec![vec![record(3, "K3a"), record(4, "K3b")]]));
        let results = Resolver::new(&service).resolve(&keys(&["K1", "K2", "K3"])).await;

        let names: Vec<&str> = results.rows().iter().map(ResultRow::entered_name).collect();
        assert_eq!(names, vec!["K1", "K2", "K3", "K3"]);
        assert_eq!(
            results.rows()[1],
            ResultRow::Error {
                entered_name: "K2".into(),
                kind: FailureKind::Fetch,
            }
        );
        assert_eq!(service.requests(), keys(&["K1", "K2", "K3"]));
    }

    #[tokio::test]
    async fn groups_are_flattened() {
        let service = MockService::default().with(
            "Gadus",
            Reply::Groups(vec![vec![record(1, "Gadus")], vec![], vec![record(2, "Gadus morhua")]]),
        );
        let results = Resolver::new(&service).resolve(&keys(&["Gadus"])).await;
        assert_eq!(results.len(), 2);
        assert!(results.rows().iter().all(|r| r.entered_name() == "Gadus"));
    }

    #[tokio::test]
    async fn no_candidates_is_a_fetch_error() {
        let service = MockService::default().with("Nomatchus", Reply::Groups(vec![vec![]]));
        let results = Resolver::new(&service)
            .resolve(&keys(&["Nomatchus", "Emptybodyus"]))
            .await;
        assert_eq!(
            results.rows(),
            &[
                ResultRow::Error {
                    entered_name: "Nomatchus".into(),
                    kind: FailureKind::Fetch,
                },
                ResultRow::Error {
                    entered_name: "Emptybodyus".into(),
                    kind: FailureKind::Fetch,
                },
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_lookups_keep_submission_order() {
        let service = MockService::default()
            .with("A", Reply::Groups(vec![vec![record(1, "A")]]))
            .with("B", Reply::Status(StatusCode::INTERNAL_SERVER_ERROR))
            .with("C", Reply::Groups(vec![vec![record(3, "C")]]));
        let names = keys(&["A", "B", "C", "D"]);

        let sequential = Resolver::new(&service).resolve(&names).await;
        let concurrent = Resolver::new(&service).jobs(4).resolve(&names).await;
        assert_eq!(sequential, concurrent);

        let entered: Vec<&str> = concurrent.rows().iter().map(ResultRow::entered_name).collect();
        assert_eq!(entered, vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn rerun_is_identical() {
        let service = MockService::default()
            .with("Mola mola", mola_mola())
            .with("Unknownus fakeicus", Reply::Status(StatusCode::NOT_FOUND));
        let names = keys(&["Mola mola", "Unknownus fakeicus"]);
        let first = Resolver::new(&service).resolve(&names).await;
        let second = Resolver::new(&service).resolve(&names).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn progress_counts_every_name() {
        let service = MockService::default().with("Mola mola", mola_mola());
        let progress = Progress::new_bar(3, "Looking up names", false);
        Resolver::new(&service)
            .progress(progress.clone())
            .resolve(&keys(&["Mola mola", "X", "Y"]))
            .await;
        assert_eq!(progress.position(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn request_interval_spaces_requests() {
        let service = MockService::default().with("Mola mola", mola_mola());
        let start = Instant::now();
        Resolver::new(&service)
            .jobs(3)
            .request_interval(Some(Duration::from_millis(100)))
            .resolve(&keys(&["Mola mola", "X", "Y"]))
            .await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn resolve_blocking_empty() {
        let service = MockService::default();
        let results = Resolver::new(&service).resolve_blocking(&[]).unwrap();
        assert!(results.is_empty());
        assert!(service.requests().is_empty());
    }
}
