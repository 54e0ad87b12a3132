use anyhow::{Result, anyhow};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_config::Config;
use crate::language_utils;
use crate::providers::{Translator, WorkflowTranslator};
use crate::table::{CsvBatch, default_output_path};
use crate::translation::{
    BatchReport, CancellationFlag, DispatchEngine, EngineOptions, ProgressSink,
};

// @module: Application controller for batch translation

/// Main application controller: one validated configuration, many batches
pub struct Controller {
    config: Config,
}

impl Controller {
    /// Create a controller; the configuration is validated once here
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translator talking to the configured workflow endpoint
    pub fn build_translator(&self) -> Arc<dyn Translator> {
        Arc::new(WorkflowTranslator::from_config(
            &self.config.api,
            self.config.concurrency.request_timeout(),
        ))
    }

    /// Translate `input` into `output` (or a timestamped default) with the configured API
    pub async fn run(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationFlag,
    ) -> Result<BatchReport> {
        let translator = self.build_translator();
        self.run_with_translator(input, output, translator, sink, cancel).await
    }

    /// Same as `run`, with an explicit translator
    pub async fn run_with_translator(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationFlag,
    ) -> Result<BatchReport> {
        let text_column = self
            .config
            .effective_text_column()
            .ok_or_else(|| anyhow!("No text column configured"))?;
        let output = output.unwrap_or_else(default_output_path);

        self.log_batch_header(&input, &output, &text_column);

        let mut io = CsvBatch::new(input, output, text_column);
        let engine = DispatchEngine::new(translator, EngineOptions::from(&self.config));
        let report = engine
            .run(
                &mut io,
                &self.config.source_language,
                &self.config.target_languages,
                sink,
                cancel,
            )
            .await;

        info!(
            "Batch {}: {} translated, {} failed, {} not launched",
            report.state, report.translated, report.failed, report.not_launched
        );
        Ok(report)
    }

    fn log_batch_header(&self, input: &std::path::Path, output: &std::path::Path, text_column: &str) {
        let names: Vec<&str> = self
            .config
            .target_languages
            .iter()
            .map(|code| language_utils::get_language_name(code).unwrap_or(code.as_str()))
            .collect();

        info!("=== Starting translation ===");
        info!("Source file: {:?}", input);
        info!("Source language: {}", self.config.source_language);
        info!("Target languages: {}", names.join(", "));
        info!("Text column: {}", text_column);
        info!("Output file: {:?}", output);
    }
}
