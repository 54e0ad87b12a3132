/*!
 * Batch and task descriptors.
 */

use std::sync::Arc;

use crate::errors::SetupError;
use crate::language_utils;

/// One input row: its identifier (position in the input) and source text
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub id: usize,
    pub text: String,
}

impl SourceRow {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self { id, text: text.into() }
    }
}

/// Key of one output cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row_id: usize,
    pub target_language: String,
}

impl CellKey {
    pub fn new(row_id: usize, target_language: impl Into<String>) -> Self {
        Self {
            row_id,
            target_language: target_language.into(),
        }
    }
}

/// A single (row, target language) unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    pub row_id: usize,
    pub text: Arc<str>,
    pub target_language: String,
}

impl TaskDescriptor {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.row_id, self.target_language.clone())
    }
}

/// Immutable description of a whole batch
#[derive(Debug, Clone)]
pub struct TranslationJob {
    rows: Vec<SourceRow>,
    source_language: String,
    target_languages: Vec<String>,
}

impl TranslationJob {
    /// Build a job, rejecting empty or duplicate target selections
    pub fn new(
        rows: Vec<SourceRow>,
        source_language: impl Into<String>,
        target_languages: Vec<String>,
    ) -> Result<Self, SetupError> {
        if target_languages.is_empty() {
            return Err(SetupError::InvalidConfig(
                "at least one target language must be selected".to_string(),
            ));
        }

        let mut normalized: Vec<String> = Vec::with_capacity(target_languages.len());
        for code in target_languages {
            let code = code.trim().to_uppercase();
            if !language_utils::is_supported_target(&code) {
                return Err(SetupError::InvalidConfig(format!(
                    "unsupported target language code: {}",
                    code
                )));
            }
            if normalized.contains(&code) {
                return Err(SetupError::InvalidConfig(format!(
                    "target language selected twice: {}",
                    code
                )));
            }
            normalized.push(code);
        }

        Ok(Self {
            rows,
            source_language: source_language.into(),
            target_languages: normalized,
        })
    }

    pub fn rows(&self) -> &[SourceRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_languages(&self) -> &[String] {
        &self.target_languages
    }

    /// rows x target languages
    pub fn total_tasks(&self) -> usize {
        self.rows.len() * self.target_languages.len()
    }

    /// All task descriptors: rows in input order, targets in selection order
    pub fn descriptors(&self) -> impl Iterator<Item = TaskDescriptor> + '_ {
        self.rows.iter().flat_map(move |row| {
            let text: Arc<str> = Arc::from(row.text.as_str());
            self.target_languages.iter().map(move |target| TaskDescriptor {
                row_id: row.id,
                text: Arc::clone(&text),
                target_language: target.clone(),
            })
        })
    }
}
