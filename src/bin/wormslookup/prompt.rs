use anyhow::{bail, Result};
use std::io::{BufRead, Write};

use wormslookup::table::Table;

/// Make sure `requested` names a column of `table`.
///
/// If it doesn't and stdin is a terminal, keep asking for another name until an existing column
/// is given. Otherwise, fail with the list of available columns.
pub fn resolve_column(table: &Table, requested: &str) -> Result<String> {
    if let Err(e) = table.require_column(requested) {
        if !atty::is(atty::Stream::Stdin) {
            bail!(e);
        }
        let stdin = std::io::stdin();
        return prompt_for_column(table, requested, stdin.lock(), std::io::stderr());
    }
    Ok(requested.to_owned())
}

fn prompt_for_column<R: BufRead, W: Write>(
    table: &Table,
    requested: &str,
    mut input: R,
    mut output: W,
) -> Result<String> {
    let mut candidate = requested.to_owned();
    let mut line = String::new();
    loop {
        writeln!(output, "Column {candidate:?} not found. Available columns: {}", table.headers().join(", "))?;
        write!(output, "Enter the name of the column that contains the scientific names: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            bail!("No valid column name given");
        }
        candidate = line.trim_end_matches(['\r', '\n']).to_owned();
        if table.column_index(&candidate).is_some() {
            return Ok(candidate);
        }
    }
}
