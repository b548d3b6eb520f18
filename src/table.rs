use std::io;
use std::path::{Path, PathBuf};

// -------------------------------------------------------------------------------------------------
// TableError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error reading delimited data: {0}")]
    Csv(#[from] csv::Error),

    #[error("error writing delimited data: {0}")]
    Io(#[from] io::Error),

    #[error("column {column:?} not found; available columns: {}", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, TableError>;

// -------------------------------------------------------------------------------------------------
// Table
// -------------------------------------------------------------------------------------------------
/// An in-memory delimited table with a header row.
///
/// Every cell is kept as a string. An empty string is the null marker: it is what a missing
/// value reads as, and what is written when a row has no value for a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with nulls; long rows are truncated.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Read a table from the file at `path`, using the given field delimiter.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| TableError::Open {
            path: path.to_owned(),
            source,
        })?;
        Self::from_reader(io::BufReader::new(file), delimiter)
    }

    pub fn from_reader<R: io::Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(String::from).collect());
        }
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like `column_index`, but a missing column is an error that lists the available columns.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_owned(),
                available: self.headers.clone(),
            })
    }

    /// Iterate over the values of the named column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &str>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Write this table to a new file at `path`, replacing any existing file.
    pub fn to_path<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| TableError::Open {
            path: path.to_owned(),
            source,
        })?;
        self.to_writer(io::BufWriter::new(file), delimiter)
    }

    pub fn to_writer<W: io::Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        // A table with no columns is written as an empty document
        if !self.headers.is_empty() {
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
