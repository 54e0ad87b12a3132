/*!
 * Batch dispatch engine.
 *
 * Expands a job into tasks, runs them through `TaskRunner` with a bounded
 * number in flight, honours cooperative cancellation and emits exactly one
 * terminal signal per batch.
 */

use futures::future;
use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::app_config::Config;
use crate::errors::{AppError, SetupError};
use crate::providers::Translator;

use super::job::{SourceRow, TranslationJob};
use super::progress::{ProgressSink, ProgressTracker};
use super::rate_limiter::RateLimiter;
use super::results::ResultStore;
use super::runner::TaskRunner;

/// Terminal failure message for a user-cancelled batch
pub const CANCELLED_MESSAGE: &str = "cancelled by user";

/// Terminal state of one batch
///
/// A batch is idle until `run` is called and running until `run` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Completed,
    Cancelled,
    FatallyFailed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::FatallyFailed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Per-batch stop request, set at most once from outside
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Dispatch limits for one engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub min_request_interval: Duration,
    pub target_code_overrides: BTreeMap<String, String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            request_timeout: Duration::from_secs(30),
            min_request_interval: Duration::from_millis(100),
            target_code_overrides: BTreeMap::new(),
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent_requests: config.concurrency.max_concurrent_requests,
            request_timeout: config.concurrency.request_timeout(),
            min_request_interval: config.concurrency.min_request_interval(),
            target_code_overrides: config.target_code_overrides.clone(),
        }
    }
}

/// Tabular input/output used around the dispatch phase
pub trait BatchIo: Send {
    /// Human-readable name of the input, used in progress messages
    fn input_name(&self) -> String;

    /// Read the rows to translate
    fn load_rows(&mut self) -> Result<Vec<SourceRow>, SetupError>;

    /// Check the output destination before any task starts
    fn prepare_output(&mut self) -> Result<(), SetupError>;

    /// Write the collected outcomes and return the output location
    fn materialize(&mut self, job: &TranslationJob, results: &ResultStore) -> Result<String, AppError>;
}

/// What the dispatch phase produced
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    pub total: usize,
    pub launched: usize,
    pub translated: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub results: ResultStore,
}

/// Final report of one batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub state: EngineState,
    pub success: bool,
    /// Output location on success, reason on failure
    pub message: String,
    pub output: Option<String>,
    pub total_tasks: usize,
    pub translated: usize,
    pub failed: usize,
    pub not_launched: usize,
}

impl BatchReport {
    fn from_summary(state: EngineState, summary: &DispatchSummary, success: bool, message: String) -> Self {
        Self {
            state,
            success,
            output: if success { Some(message.clone()) } else { None },
            message,
            total_tasks: summary.total,
            translated: summary.translated,
            failed: summary.failed,
            not_launched: summary.total - summary.launched,
        }
    }

    fn setup_failure(error: &SetupError) -> Self {
        Self {
            state: EngineState::FatallyFailed,
            success: false,
            message: error.to_string(),
            output: None,
            total_tasks: 0,
            translated: 0,
            failed: 0,
            not_launched: 0,
        }
    }
}

/// Runs one batch from setup to terminal signal
pub struct DispatchEngine {
    translator: Arc<dyn Translator>,
    options: EngineOptions,
}

impl DispatchEngine {
    pub fn new(translator: Arc<dyn Translator>, options: EngineOptions) -> Self {
        Self {
            translator,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run a whole batch: load, prepare, dispatch, materialize, signal
    ///
    /// Consumes the engine, so the terminal signal goes out exactly once.
    /// The terminal state is carried by the returned report.
    pub async fn run(
        self,
        io: &mut dyn BatchIo,
        source_language: &str,
        target_languages: &[String],
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationFlag,
    ) -> BatchReport {
        info!("Batch started: {} -> {}", source_language, target_languages.join(", "));

        let report = self
            .run_phases(io, source_language, target_languages, Arc::clone(&sink), cancel)
            .await;

        sink.finished(report.success, &report.message);
        report
    }

    async fn run_phases(
        &self,
        io: &mut dyn BatchIo,
        source_language: &str,
        target_languages: &[String],
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationFlag,
    ) -> BatchReport {
        let setup = io
            .load_rows()
            .and_then(|rows| {
                sink.progress(5, &format!("Loaded {} rows from {}", rows.len(), io.input_name()));
                io.prepare_output()?;
                TranslationJob::new(rows, source_language, target_languages.to_vec())
            });

        let job = match setup {
            Ok(job) => job,
            Err(e) => {
                error!("Batch setup failed: {}", e);
                return BatchReport::setup_failure(&e);
            }
        };

        let summary = self.dispatch(&job, Arc::clone(&sink), cancel).await;

        if summary.cancelled {
            warn!(
                "Batch cancelled: {} of {} tasks launched",
                summary.launched, summary.total
            );
            return BatchReport::from_summary(
                EngineState::Cancelled,
                &summary,
                false,
                CANCELLED_MESSAGE.to_string(),
            );
        }

        match io.materialize(&job, &summary.results) {
            Ok(location) => {
                sink.progress(100, &format!("Translation complete, saved to {}", location));
                BatchReport::from_summary(EngineState::Completed, &summary, true, location)
            }
            Err(e) => {
                error!("Failed to save output: {}", e);
                BatchReport::from_summary(
                    EngineState::FatallyFailed,
                    &summary,
                    false,
                    format!("Failed to save output: {}", e),
                )
            }
        }
    }

    /// Run every task of `job`, at most `max_concurrent_requests` at a time
    ///
    /// The cancellation flag is checked before each launch; tasks already
    /// started always run to completion.
    pub async fn dispatch(
        &self,
        job: &TranslationJob,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationFlag,
    ) -> DispatchSummary {
        let workers = self.options.max_concurrent_requests.max(1);
        let total = job.total_tasks();
        let results = ResultStore::new();
        let runner = TaskRunner::new(
            Arc::clone(&self.translator),
            Arc::new(Semaphore::new(workers)),
            Arc::new(RateLimiter::new(self.options.min_request_interval)),
            results.clone(),
            Arc::new(ProgressTracker::new(total)),
            sink,
            job.source_language(),
            job.row_count(),
            self.options.request_timeout,
        )
        .with_code_overrides(self.options.target_code_overrides.clone());

        let launched = AtomicUsize::new(0);
        let start_time = Instant::now();

        let outcomes: Vec<_> = stream::iter(job.descriptors())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|descriptor| {
                launched.fetch_add(1, Ordering::SeqCst);
                let runner = runner.clone();
                async move { runner.execute(descriptor).await }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let launched = launched.into_inner();
        let translated = outcomes.iter().filter(|o| o.is_translated()).count();
        let failed = outcomes.len() - translated;

        info!(
            "Dispatched {}/{} tasks in {:?}: {} translated, {} failed",
            launched,
            total,
            start_time.elapsed(),
            translated,
            failed
        );

        DispatchSummary {
            total,
            launched,
            translated,
            failed,
            cancelled: launched < total,
            results,
        }
    }
}
