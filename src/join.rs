//! Merging lookup results back onto the table the names came from.
//!
//! This is a left outer join on exact string equality between the join column of the original
//! table and `PI_entered_name` of the result rows. Names that differ only in case or surrounding
//! whitespace do not join.

use std::collections::HashMap;

use crate::results::{ResultRow, ResultSet, ENTERED_NAME_COLUMN};
use crate::table::Table;

/// The result fields carried onto merged rows, in output order.
pub const MERGE_COLUMNS: [&str; 8] = [
    ENTERED_NAME_COLUMN,
    "AphiaID",
    "scientificname",
    "status",
    "rank",
    "valid_name",
    "LSID",
    "match_type",
];

/// Suffixes for column names present on both sides of the join.
const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("join column {column:?} not found in the original table; available columns: {}", .available.join(", "))]
    MissingJoinColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Project a result row onto `MERGE_COLUMNS`. Error rows carry only the entered name.
fn project(row: &ResultRow) -> [String; 8] {
    fn text(v: &Option<String>) -> String {
        v.clone().unwrap_or_default()
    }

    match row {
        ResultRow::Match(m) => {
            let r = &m.record;
            [
                m.entered_name.clone(),
                r.aphia_id.map(|v| v.to_string()).unwrap_or_default(),
                text(&r.scientificname),
                text(&r.status),
                text(&r.rank),
                text(&r.valid_name),
                text(&r.lsid),
                text(&r.match_type),
            ]
        }
        ResultRow::Error { entered_name, .. } => {
            let mut projected: [String; 8] = Default::default();
            projected[0] = entered_name.clone();
            projected
        }
    }
}

/// Left-join `original` against the projected `results` on `join_column`.
///
/// Each original row appears once per result row sharing its name, or once with empty result
/// fields when there is none. A name whose lookup failed contributes one row whose match fields
/// are all empty. Original row order is kept, and a name's candidates stay in result order.
pub fn merge(original: &Table, join_column: &str, results: &ResultSet) -> Result<Table, JoinError> {
    let key_idx = original
        .column_index(join_column)
        .ok_or_else(|| JoinError::MissingJoinColumn {
            column: join_column.to_owned(),
            available: original.headers().to_vec(),
        })?;

    let mut by_name: HashMap<&str, Vec<[String; 8]>> = HashMap::new();
    for row in results.rows() {
        by_name.entry(row.entered_name()).or_default().push(project(row));
    }

    let mut merged = Table::new(merged_headers(original.headers()));
    let empty: [String; 8] = Default::default();
    for row in original.rows() {
        match by_name.get(row[key_idx].as_str()) {
            Some(projected) => {
                for p in projected {
                    merged.push_row(row.iter().chain(p.iter()).cloned().collect());
                }
            }
            None => merged.push_row(row.iter().chain(empty.iter()).cloned().collect()),
        }
    }
    Ok(merged)
}

fn merged_headers(original: &[String]) -> Vec<String> {
    let left = original.iter().map(|h| {
        if MERGE_COLUMNS.contains(&h.as_str()) {
            format!("{h}{LEFT_SUFFIX}")
        } else {
            h.clone()
        }
    });
    let right = MERGE_COLUMNS.iter().map(|c| {
        if original.iter().any(|h| h == c) {
            format!("{c}{RIGHT_SUFFIX}")
        } else {
            c.to_string()
        }
    });
    left.chain(right).collect()
}
