//! Integration Test Utilities and Common Code

#![allow(dead_code)]

use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::{Arc, Mutex};

pub use assert_cmd::prelude::*;
pub use assert_fs::prelude::*;
pub use assert_fs::{fixture::ChildPath, TempDir};
pub use indoc::indoc;
pub use predicates::prelude::*;
pub use predicates::str::{contains, is_empty, RegexPredicate};
pub use pretty_assertions::{assert_eq, assert_ne};
pub use std::path::Path;
pub use std::process::Command;

/// Build a `Command` for the `wormslookup` crate binary with variadic command-line arguments.
///
/// The arguments can be anything that is allowed by `Command::arg`.
#[macro_export]
macro_rules! wormslookup {
    ( $( $arg:expr ),* ) => {
        {
            let mut cmd = wormslookup_cmd();
            $(
                cmd.arg($arg);
            )*
            cmd
        }
    }
}

/// Build an `assert_cmd::assert::Assert` by calling `wormslookup!(args).assert().success()`.
#[macro_export]
macro_rules! wormslookup_success {
    ( $( $arg:expr ),* ) => { wormslookup!($( $arg ),*).assert().success() }
}

/// Build an `assert_cmd::assert::Assert` by calling `wormslookup!(args).assert().failure()`.
#[macro_export]
macro_rules! wormslookup_failure {
    ( $( $arg:expr ),* ) => { wormslookup!($( $arg ),*).assert().failure() }
}

// make macros easily visible to other modules
pub use {wormslookup, wormslookup_failure, wormslookup_success};

/// Build a `Command` for the `wormslookup` crate binary.
///
/// The registry URL and log filter environment variables are cleared, and progress bars are
/// disabled, so that the caller's environment doesn't leak into tests.
pub fn wormslookup_cmd() -> Command {
    let mut cmd = Command::cargo_bin("wormslookup").expect("wormslookup should be executable");
    cmd.env_remove("WORMSLOOKUP_API_URL")
        .env_remove("WORMSLOOKUP_LOG")
        .env("NO_COLOR", "1")
        .arg("--progress=never");
    cmd
}

/// Create a `RegexPredicate` from the given pattern.
pub fn is_match(pat: &str) -> RegexPredicate {
    predicates::str::is_match(pat).expect("pattern should compile")
}

// -------------------------------------------------------------------------------------------------
// MockRegistry
// -------------------------------------------------------------------------------------------------
/// A local stand-in for the WoRMS `AphiaRecordsByMatchNames` endpoint.
///
/// Known names:
///
/// - `Mola mola`: one exact match
/// - `Gadus`: two matches, exact and fuzzy
/// - `Unknownus fakeicus`: HTTP 404
/// - `Brokenus`: HTTP 500
/// - `Garbledus`: HTTP 200 with a body that isn't JSON
/// - `Brackishus`: one match, but only when `marine_only=false`
///
/// Anything else gets HTTP 204 with no body, as the real registry does for no match.
pub struct MockRegistry {
    pub url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub names: Vec<String>,
    pub marine_only: Option<String>,
}

impl MockRegistry {
    /// Start serving on an ephemeral local port, on a background thread that lives as long as
    /// the test process.
    pub fn start() -> Self {
        let requests: Arc<Mutex<Vec<Request>>> = Default::default();
        let app = Router::new()
            .route("/rest/AphiaRecordsByMatchNames", get(match_names))
            .with_state(requests.clone());

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("should be able to build runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("should be able to bind mock registry");
                tx.send(listener.local_addr().expect("listener should have an address"))
                    .expect("should be able to send mock registry address");
                axum::serve(listener, app)
                    .await
                    .expect("mock registry should serve");
            });
        });
        let addr = rx.recv().expect("mock registry should start");

        MockRegistry {
            url: format!("http://{addr}/rest/"),
            requests,
        }
    }

    /// All requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("lock should not be poisoned").clone()
    }

    /// The names of all requests received so far, in arrival order.
    pub fn requested_names(&self) -> Vec<String> {
        self.requests().into_iter().flat_map(|r| r.names).collect()
    }
}

async fn match_names(
    State(requests): State<Arc<Mutex<Vec<Request>>>>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = query.unwrap_or_default();
    let mut request = Request {
        names: Vec::new(),
        marine_only: None,
    };
    for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
        match k.as_ref() {
            "scientificnames[]" => request.names.push(v.into_owned()),
            "marine_only" => request.marine_only = Some(v.into_owned()),
            _ => {}
        }
    }
    requests.lock().expect("lock should not be poisoned").push(request.clone());

    let marine_only = request.marine_only.as_deref() != Some("false");
    let name = request.names.first().cloned().unwrap_or_default();
    let json = |body: String| (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body).into_response();

    match name.as_str() {
        "Mola mola" => json(format!("[[{MOLA_MOLA}]]")),
        "Gadus" => json(format!("[[{GADUS}, {GADUS_MORHUA}]]")),
        "Unknownus fakeicus" => StatusCode::NOT_FOUND.into_response(),
        "Brokenus" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "Garbledus" => json("<html>oops</html>".to_owned()),
        "Brackishus" if !marine_only => json(format!("[[{BRACKISHUS}]]")),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

pub const MOLA_MOLA: &str = r#"{
    "AphiaID": 127405,
    "url": "https://www.marinespecies.org/aphia.php?p=taxdetails&id=127405",
    "scientificname": "Mola mola",
    "authority": "(Linnaeus, 1758)",
    "status": "accepted",
    "unacceptreason": null,
    "taxonRankID": 220,
    "rank": "Species",
    "valid_AphiaID": 127405,
    "valid_name": "Mola mola",
    "valid_authority": "(Linnaeus, 1758)",
    "parentNameUsageID": 126238,
    "kingdom": "Animalia",
    "phylum": "Chordata",
    "class": "Teleostei",
    "order": "Tetraodontiformes",
    "family": "Molidae",
    "genus": "Mola",
    "citation": null,
    "lsid": "urn:lsid:marinespecies.org:taxname:127405",
    "isMarine": 1,
    "isBrackish": 0,
    "isFreshwater": 0,
    "isTerrestrial": 0,
    "isExtinct": null,
    "match_type": "exact",
    "modified": "2008-01-15T17:27:08.177Z"
}"#;

pub const GADUS: &str = r#"{
    "AphiaID": 125732,
    "scientificname": "Gadus",
    "status": "accepted",
    "rank": "Genus",
    "valid_AphiaID": 125732,
    "valid_name": "Gadus",
    "lsid": "urn:lsid:marinespecies.org:taxname:125732",
    "isMarine": 1,
    "match_type": "exact"
}"#;

pub const GADUS_MORHUA: &str = r#"{
    "AphiaID": 126436,
    "scientificname": "Gadus morhua",
    "status": "accepted",
    "rank": "Species",
    "valid_AphiaID": 126436,
    "valid_name": "Gadus morhua",
    "lsid": "urn:lsid:marinespecies.org:taxname:126436",
    "isMarine": 1,
    "match_type": "near_2"
}"#;

pub const BRACKISHUS: &str = r#"{
    "AphiaID": 999001,
    "scientificname": "Brackishus",
    "status": "accepted",
    "rank": "Genus",
    "valid_name": "Brackishus",
    "lsid": "urn:lsid:marinespecies.org:taxname:999001",
    "isMarine": 0,
    "isBrackish": 1,
    "match_type": "exact"
}"#;

// -------------------------------------------------------------------------------------------------
// Tables
// -------------------------------------------------------------------------------------------------
/// Read a CSV document into its header and rows.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("table should be readable");
    let headers = reader
        .headers()
        .expect("table should have a header")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("row should parse").iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

/// Get the named column of a table read by `read_csv`.
pub fn column<'a>(table: &'a (Vec<String>, Vec<Vec<String>>), name: &str) -> Vec<&'a str> {
    let idx = table
        .0
        .iter()
        .position(|h| h == name)
        .unwrap_or_else(|| panic!("column {name:?} should exist"));
    table.1.iter().map(|row| row[idx].as_str()).collect()
}

/// A scratch directory holding an input table.
pub struct TableEnv {
    pub root: TempDir,
}

impl TableEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("should be able to create tempdir");
        Self { root }
    }

    /// Create an input table with the given contents.
    pub fn input_table(&self, name: &str, contents: &str) -> ChildPath {
        let input = self.root.child(name);
        input
            .write_str(contents)
            .expect("should be able to write input table");
        input
    }

    pub fn child(&self, name: &str) -> ChildPath {
        self.root.child(name)
    }
}
