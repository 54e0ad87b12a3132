/*!
 * Per-cell outcomes and the shared store they are collected into.
 */

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::language_utils::ERROR_MARKER;

use super::job::CellKey;

/// Longest error summary kept in a failed outcome, in characters
pub const MAX_ERROR_CHARS: usize = 100;

/// Result of attempting one task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Translated(String),
    Failed(String),
}

impl TaskOutcome {
    /// Build a failed outcome with a truncated error summary
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed(truncate_chars(&error.to_string(), MAX_ERROR_CHARS))
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Self::Translated(_))
    }

    /// Value written into the output cell
    pub fn cell_value(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Failed(_) => ERROR_MARKER,
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Shared map from cell key to outcome
///
/// Cloning yields another handle to the same store. Each insert replaces a
/// whole outcome under the lock, so readers never see a partial write.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<Mutex<HashMap<CellKey, TaskOutcome>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an outcome, returning the one it replaced
    pub fn record(&self, key: CellKey, outcome: TaskOutcome) -> Option<TaskOutcome> {
        self.inner.lock().insert(key, outcome)
    }

    pub fn get(&self, row_id: usize, target_language: &str) -> Option<TaskOutcome> {
        self.inner
            .lock()
            .get(&CellKey::new(row_id, target_language))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// (translated, failed) counts
    pub fn counts(&self) -> (usize, usize) {
        let guard = self.inner.lock();
        let translated = guard.values().filter(|o| o.is_translated()).count();
        (translated, guard.len() - translated)
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> HashMap<CellKey, TaskOutcome> {
        self.inner.lock().clone()
    }
}
