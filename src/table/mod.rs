/*!
 * Tabular input and output.
 *
 * - `reader`: CSV input with a designated text column
 * - `writer`: CSV output with one `<Name>(<CODE>)` column per target language
 *
 * `CsvBatch` ties both to the dispatch engine through `BatchIo`.
 */

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, SetupError};
use crate::translation::{BatchIo, ResultStore, SourceRow, TranslationJob};

pub mod reader;
pub mod writer;

pub use reader::{SourceTable, TableReader};
pub use writer::{TableWriter, build_output, column_order, sanitize_cell};

/// Default output file name, e.g. `ai_translations_20240101_120000.csv`
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "ai_translations_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// CSV file in, CSV file out
#[derive(Debug)]
pub struct CsvBatch {
    input: PathBuf,
    output: PathBuf,
    text_column: String,
    table: Option<SourceTable>,
    writer: Option<TableWriter>,
}

impl CsvBatch {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, text_column: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            text_column: text_column.into(),
            table: None,
            writer: None,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }
}

impl BatchIo for CsvBatch {
    fn input_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.input.display().to_string())
    }

    fn load_rows(&mut self) -> Result<Vec<SourceRow>, SetupError> {
        let table = TableReader::open(&self.input, &self.text_column)?;
        let rows = table.rows();
        self.table = Some(table);
        Ok(rows)
    }

    fn prepare_output(&mut self) -> Result<(), SetupError> {
        self.writer = Some(TableWriter::prepare(&self.output)?);
        Ok(())
    }

    fn materialize(&mut self, job: &TranslationJob, results: &ResultStore) -> Result<String, AppError> {
        let (Some(table), Some(writer)) = (&self.table, &self.writer) else {
            return Err(AppError::Unknown("output requested before input was loaded".to_string()));
        };
        let path = writer.write(table, job, results)?;
        Ok(path.display().to_string())
    }
}
