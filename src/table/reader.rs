use csv::ReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::errors::SetupError;
use crate::translation::SourceRow;

/// An input table held in memory: headers, records and the text column index
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
    pub text_column: usize,
}

impl SourceTable {
    /// One `SourceRow` per record, identified by its position
    pub fn rows(&self) -> Vec<SourceRow> {
        self.records
            .iter()
            .enumerate()
            .map(|(id, record)| {
                SourceRow::new(id, record.get(self.text_column).cloned().unwrap_or_default())
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}

/// Reads a CSV file with a header row
pub struct TableReader;

impl TableReader {
    /// Read the whole table and locate `text_column`
    pub fn open<P: AsRef<Path>>(path: P, text_column: &str) -> Result<SourceTable, SetupError> {
        let path = path.as_ref();
        let unreadable = |reason: String| SetupError::InputUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| unreadable(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let text_column = headers
            .iter()
            .position(|h| h.trim() == text_column.trim())
            .ok_or_else(|| SetupError::MissingColumn {
                column: text_column.to_string(),
                available: headers.join(", "),
            })?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| unreadable(e.to_string()))?;
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(headers.len().max(cells.len()), String::new());
            records.push(cells);
        }

        Ok(SourceTable {
            path: path.to_path_buf(),
            headers,
            records,
            text_column,
        })
    }
}
