use csv::Writer;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::errors::{AppError, SetupError};
use crate::language_utils::{column_name, extract_bracket_text};
use crate::translation::{ResultStore, TranslationJob};

use super::reader::SourceTable;

/// Writes the input table plus one column per target language
#[derive(Debug, Clone)]
pub struct TableWriter {
    path: PathBuf,
}

impl TableWriter {
    /// Make sure the destination can be created before any task runs
    ///
    /// A file that did not exist before the probe is removed again.
    pub fn prepare<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref().to_path_buf();
        let unwritable = |reason: String| SetupError::OutputUnwritable {
            path: path.clone(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| unwritable(e.to_string()))?;
        }

        let existed = path.exists();
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| unwritable(e.to_string()))?;
        if !existed {
            fs::remove_file(&path).map_err(|e| unwritable(e.to_string()))?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `table` with translated columns filled from `results`
    pub fn write(&self, table: &SourceTable, job: &TranslationJob, results: &ResultStore) -> Result<PathBuf, AppError> {
        let (headers, rows) = build_output(table, job, results);

        let file = File::create(&self.path)?;
        let mut writer = Writer::from_writer(file);
        writer.write_record(&headers)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(self.path.clone())
    }
}

/// Output headers and rows, columns already in final order
pub fn build_output(
    table: &SourceTable,
    job: &TranslationJob,
    results: &ResultStore,
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = table.headers.clone();
    let mut rows = table.records.clone();

    for target in job.target_languages() {
        let name = column_name(target);
        let index = match headers.iter().position(|h| *h == name) {
            Some(existing) => existing,
            None => {
                headers.push(name);
                headers.len() - 1
            }
        };

        for (row_id, row) in rows.iter_mut().enumerate() {
            if row.len() <= index {
                row.resize(index + 1, String::new());
            }
            // Cells of tasks never launched stay empty
            if let Some(outcome) = results.get(row_id, target) {
                row[index] = sanitize_cell(outcome.cell_value());
            }
        }
    }

    let order = column_order(&headers);
    let headers = order.iter().map(|&i| headers[i].clone()).collect();
    let rows = rows
        .into_iter()
        .map(|row| order.iter().map(|&i| row.get(i).cloned().unwrap_or_default()).collect())
        .collect();

    (headers, rows)
}

/// First column stays first; the rest are stably sorted by their parenthesized code
pub fn column_order(headers: &[String]) -> Vec<usize> {
    if headers.is_empty() {
        return Vec::new();
    }
    let mut rest: Vec<usize> = (1..headers.len()).collect();
    rest.sort_by(|&a, &b| extract_bracket_text(&headers[a]).cmp(extract_bracket_text(&headers[b])));

    let mut order = Vec::with_capacity(headers.len());
    order.push(0);
    order.extend(rest);
    order
}

/// Neutralize values a spreadsheet would evaluate as formulas
pub fn sanitize_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}
