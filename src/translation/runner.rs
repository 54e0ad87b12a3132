/*!
 * Execution of a single (row, target language) task.
 */

use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::Translator;

use super::job::TaskDescriptor;
use super::progress::{ProgressSink, ProgressTracker};
use super::rate_limiter::RateLimiter;
use super::results::{ResultStore, TaskOutcome};

/// Runs tasks against the shared slot pool, limiter, store and progress counter
///
/// Cheap to clone: every clone shares the same underlying state.
#[derive(Clone)]
pub struct TaskRunner {
    translator: Arc<dyn Translator>,
    slots: Arc<Semaphore>,
    limiter: Arc<RateLimiter>,
    store: ResultStore,
    tracker: Arc<ProgressTracker>,
    sink: Arc<dyn ProgressSink>,
    source_language: String,
    row_count: usize,
    request_timeout: Duration,
    code_overrides: Arc<BTreeMap<String, String>>,
}

impl TaskRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        translator: Arc<dyn Translator>,
        slots: Arc<Semaphore>,
        limiter: Arc<RateLimiter>,
        store: ResultStore,
        tracker: Arc<ProgressTracker>,
        sink: Arc<dyn ProgressSink>,
        source_language: impl Into<String>,
        row_count: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            translator,
            slots,
            limiter,
            store,
            tracker,
            sink,
            source_language: source_language.into(),
            row_count,
            request_timeout,
            code_overrides: Arc::new(BTreeMap::new()),
        }
    }

    /// Substitute provider-side codes for some target codes
    ///
    /// Keys are matched case-insensitively, like every other target code.
    pub fn with_code_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.code_overrides = Arc::new(
            overrides
                .into_iter()
                .map(|(target, provider_code)| (target.trim().to_uppercase(), provider_code))
                .collect(),
        );
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Translate one cell, record the outcome and report progress
    ///
    /// Never fails: provider errors and timeouts become `TaskOutcome::Failed`.
    pub async fn execute(&self, descriptor: TaskDescriptor) -> TaskOutcome {
        let outcome = match self.call_translator(&descriptor).await {
            Ok(text) => TaskOutcome::Translated(text),
            Err(e) => {
                debug!(
                    "Row {} {} failed: {}",
                    descriptor.row_id + 1,
                    descriptor.target_language,
                    e
                );
                TaskOutcome::failed(e)
            }
        };

        self.store.record(descriptor.key(), outcome.clone());

        let language_name = language_utils::get_language_name(&descriptor.target_language)
            .unwrap_or(descriptor.target_language.as_str());
        self.tracker.complete_one(|completed| {
            let percent = self.tracker.percent_of(completed);
            let message = match &outcome {
                TaskOutcome::Translated(_) => format!(
                    "Row {}/{} | {} | {}% complete",
                    descriptor.row_id + 1,
                    self.row_count,
                    language_name,
                    percent
                ),
                TaskOutcome::Failed(error) => format!(
                    "Error: row {} {}: {}",
                    descriptor.row_id + 1,
                    language_name,
                    error
                ),
            };
            self.sink.progress(percent, &message);
        });

        outcome
    }

    // Holds the concurrency slot for the limiter wait and the call; dropped on every path.
    async fn call_translator(&self, descriptor: &TaskDescriptor) -> Result<String, ProviderError> {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("concurrency pool closed: {}", e)))?;

        self.limiter.acquire().await;

        let target = self
            .code_overrides
            .get(&descriptor.target_language)
            .map(String::as_str)
            .unwrap_or(descriptor.target_language.as_str());

        let call = self
            .translator
            .translate(&descriptor.text, &self.source_language, target);

        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.request_timeout)),
        }
    }
}
