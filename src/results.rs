use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use crate::table::Table;
use crate::worms::AphiaRecord;

/// Column that tags every result row with the name that was looked up.
pub const ENTERED_NAME_COLUMN: &str = "PI_entered_name";

/// Column that carries the failure category of an error row.
pub const ERROR_MESSAGE_COLUMN: &str = "error_message";

// -------------------------------------------------------------------------------------------------
// FailureKind
// -------------------------------------------------------------------------------------------------
/// The coarse category of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The registry answered with a non-success HTTP status.
    Http,

    /// Anything else: the request failed, the response was unusable, or nothing matched.
    Fetch,
}

impl FailureKind {
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::Http => "HTTP error",
            FailureKind::Fetch => "Error fetching data",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for FailureKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

// -------------------------------------------------------------------------------------------------
// LookupOutcome
// -------------------------------------------------------------------------------------------------
/// The result of looking up one name.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// At least one candidate record, in the order the registry returned them.
    Matched {
        key: String,
        candidates: Vec<AphiaRecord>,
    },

    Failed {
        key: String,
        kind: FailureKind,
    },
}

impl LookupOutcome {
    pub fn key(&self) -> &str {
        match self {
            LookupOutcome::Matched { key, .. } => key,
            LookupOutcome::Failed { key, .. } => key,
        }
    }

    /// Tag each candidate with the looked-up name, or produce the single error row.
    pub fn into_rows(self) -> Vec<ResultRow> {
        match self {
            LookupOutcome::Matched { key, candidates } => candidates
                .into_iter()
                .map(|record| {
                    ResultRow::Match(MatchCandidate {
                        entered_name: key.clone(),
                        record,
                    })
                })
                .collect(),
            LookupOutcome::Failed { key, kind } => vec![ResultRow::Error {
                entered_name: key,
                kind,
            }],
        }
    }
}

// -------------------------------------------------------------------------------------------------
// MatchCandidate
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    #[serde(flatten)]
    pub record: AphiaRecord,

    #[serde(rename = "PI_entered_name")]
    pub entered_name: String,
}

// -------------------------------------------------------------------------------------------------
// ResultRow
// -------------------------------------------------------------------------------------------------
/// One row of the result set: a candidate match, or the error row of a failed lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultRow {
    Match(MatchCandidate),

    Error {
        #[serde(rename = "PI_entered_name")]
        entered_name: String,

        #[serde(rename = "error_message")]
        kind: FailureKind,
    },
}

impl ResultRow {
    pub fn entered_name(&self) -> &str {
        match self {
            ResultRow::Match(m) => &m.entered_name,
            ResultRow::Error { entered_name, .. } => entered_name,
        }
    }

    /// The column name and cell text of every field this row has.
    pub fn cells(&self) -> Vec<(String, String)> {
        match self {
            ResultRow::Match(m) => {
                let mut cells = m.record.cells();
                cells.push((ENTERED_NAME_COLUMN.to_owned(), m.entered_name.clone()));
                cells
            }
            ResultRow::Error { entered_name, kind } => vec![
                (ENTERED_NAME_COLUMN.to_owned(), entered_name.clone()),
                (ERROR_MESSAGE_COLUMN.to_owned(), kind.message().to_owned()),
            ],
        }
    }
}

// -------------------------------------------------------------------------------------------------
// ResultSet
// -------------------------------------------------------------------------------------------------
/// Every result row across all lookups, in the order the names were submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: LookupOutcome) {
        self.rows.extend(outcome.into_rows());
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let mut names = HashSet::new();
        let mut matched_names = HashSet::new();
        let mut summary = Summary::default();
        for row in &self.rows {
            names.insert(row.entered_name());
            match row {
                ResultRow::Match(m) => {
                    matched_names.insert(m.entered_name.as_str());
                    summary.num_candidates += 1;
                }
                ResultRow::Error { kind, .. } => {
                    summary.num_failed += 1;
                    if *kind == FailureKind::Http {
                        summary.num_http_errors += 1;
                    }
                }
            }
        }
        summary.num_names = names.len();
        summary.num_matched = matched_names.len();
        summary
    }

    /// Flatten to a table whose columns are the union of every row's fields, in first-seen
    /// order. Fields a row doesn't have are left empty.
    pub fn to_table(&self) -> Table {
        let row_cells: Vec<Vec<(String, String)>> = self.rows.iter().map(ResultRow::cells).collect();

        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for cells in &row_cells {
            for (name, _) in cells {
                if !positions.contains_key(name) {
                    positions.insert(name.clone(), headers.len());
                    headers.push(name.clone());
                }
            }
        }

        let num_columns = headers.len();
        let mut table = Table::new(headers);
        for cells in row_cells {
            let mut row = vec![String::new(); num_columns];
            for (name, value) in cells {
                row[positions[&name]] = value;
            }
            table.push_row(row);
        }
        table
    }
}

impl FromIterator<LookupOutcome> for ResultSet {
    fn from_iter<I: IntoIterator<Item = LookupOutcome>>(iter: I) -> Self {
        let mut results = ResultSet::new();
        for outcome in iter {
            results.push(outcome);
        }
        results
    }
}

// -------------------------------------------------------------------------------------------------
// Summary
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Distinct names looked up
    pub num_names: usize,

    /// Names with at least one candidate
    pub num_matched: usize,

    /// Candidate rows across all matched names
    pub num_candidates: usize,

    /// Names whose lookup failed
    pub num_failed: usize,

    /// Of the failed names, those rejected with an HTTP error status
    pub num_http_errors: usize,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Looked up {} names: {} matched with {} candidate records; {} failed ({} HTTP errors)",
            self.num_names, self.num_matched, self.num_candidates, self.num_failed, self.num_http_errors,
        )
    }
}
