use std::collections::HashSet;
use tracing::debug;

use crate::table::{self, Table};

/// Get the distinct non-empty values of the named column, in first-seen order.
///
/// Empty cells are nulls and are never looked up.
pub fn distinct_keys(table: &Table, column: &str) -> table::Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut num_empty = 0usize;

    for value in table.column(column)? {
        if value.is_empty() {
            num_empty += 1;
            continue;
        }
        if seen.insert(value) {
            keys.push(value.to_owned());
        }
    }

    if num_empty > 0 {
        debug!("Skipped {num_empty} empty values in column {column:?}");
    }
    Ok(keys)
}
