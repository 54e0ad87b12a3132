/*!
 * Common test utilities for the sheetglot test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tempfile::TempDir;

use sheetglot::errors::{AppError, ProviderError, SetupError};
use sheetglot::providers::{MockTranslator, Translator};
use sheetglot::translation::{
    BatchIo, CancellationFlag, EngineOptions, ProgressEvent, ProgressSink, ResultStore, SourceRow,
    TranslationJob,
};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a small Chinese-source CSV
pub fn create_test_table(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, "id,中文,备注\n1,你好,greeting\n2,谢谢,thanks\n")
}

/// Engine options without request spacing, for fast tests
pub fn fast_options(workers: usize) -> EngineOptions {
    EngineOptions {
        max_concurrent_requests: workers,
        request_timeout: Duration::from_secs(5),
        min_request_interval: Duration::ZERO,
        ..EngineOptions::default()
    }
}

pub fn targets(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

pub fn rows(count: usize) -> Vec<SourceRow> {
    (0..count).map(|i| SourceRow::new(i, format!("text {}", i))).collect()
}

/// Sink keeping every event for later inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn finished_events(&self) -> Vec<(bool, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Finished { success, message } => Some((success, message)),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn progress(&self, percent: u8, message: &str) {
        self.events.lock().push(ProgressEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }

    fn finished(&self, success: bool, message: &str) {
        self.events.lock().push(ProgressEvent::Finished {
            success,
            message: message.to_string(),
        });
    }
}

/// In-memory batch input/output with switchable setup failures
#[derive(Debug, Default)]
pub struct MemoryBatch {
    pub rows: Vec<SourceRow>,
    pub input_error: Option<SetupError>,
    pub output_error: Option<SetupError>,
    pub materialized: Option<ResultStore>,
}

impl MemoryBatch {
    pub fn with_rows(rows: Vec<SourceRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

impl BatchIo for MemoryBatch {
    fn input_name(&self) -> String {
        "memory".to_string()
    }

    fn load_rows(&mut self) -> Result<Vec<SourceRow>, SetupError> {
        match &self.input_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.rows.clone()),
        }
    }

    fn prepare_output(&mut self) -> Result<(), SetupError> {
        match &self.output_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn materialize(&mut self, _job: &TranslationJob, results: &ResultStore) -> Result<String, AppError> {
        self.materialized = Some(results.clone());
        Ok("memory://output".to_string())
    }
}

/// Translator that raises the cancellation flag during its Nth call
#[derive(Debug)]
pub struct CancellingTranslator {
    pub inner: MockTranslator,
    pub cancel: CancellationFlag,
    pub cancel_on_call: usize,
    calls: AtomicUsize,
}

impl CancellingTranslator {
    pub fn new(cancel: CancellationFlag, cancel_on_call: usize) -> Self {
        Self {
            inner: MockTranslator::working(),
            cancel,
            cancel_on_call,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Translator for CancellingTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.cancel_on_call {
            self.cancel.cancel();
        }
        self.inner.translate(text, source, target).await
    }
}

/// Translator recording the instant of every call
#[derive(Debug, Default)]
pub struct TimestampingTranslator {
    pub calls: Mutex<Vec<Instant>>,
}

#[async_trait]
impl Translator for TimestampingTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String, ProviderError> {
        self.calls.lock().push(Instant::now());
        Ok(MockTranslator::expected_translation(text, target))
    }
}
