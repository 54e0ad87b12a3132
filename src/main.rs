// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use sheetglot::app_config::{self, Config};
use sheetglot::language_utils;
use sheetglot::translation::{CancellationFlag, LogProgressSink, ProgressSink};
use sheetglot::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the text column of a CSV file into the selected languages
    Translate(TranslateArgs),

    /// List the supported target languages
    Languages,

    /// Generate shell completions for sheetglot
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input CSV file
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output CSV file (default: ./ai_translations_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code (e.g. 'zh', 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language codes; repeat or comma-separate (default: all)
    #[arg(short, long, value_delimiter = ',')]
    target_language: Vec<String>,

    /// Name of the column holding the source text
    #[arg(short = 'c', long)]
    text_column: Option<String>,

    /// Configuration file path
    #[arg(long, default_value = "conf.json")]
    config_path: String,

    /// Translation API endpoint
    #[arg(long, env = "TRANSLATION_API_URL")]
    api_url: Option<String>,

    /// Translation API key
    #[arg(long, env = "TRANSLATION_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum number of concurrent requests
    #[arg(short, long, env = "MAX_CONCURRENT_REQUESTS")]
    workers: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// sheetglot - batch translation of spreadsheet cells
#[derive(Parser, Debug)]
#[command(name = "sheetglot")]
#[command(version)]
#[command(about = "Translate a CSV text column into many languages")]
#[command(long_about = "sheetglot sends every (row, target language) pair of a CSV file to a translation API,
with a cap on concurrent requests and a minimum spacing between them.

EXAMPLES:
    sheetglot translate input.csv                       # All languages, default config
    sheetglot translate input.csv -t FR,DE -o out.csv   # Selected languages
    sheetglot translate input.csv -s en -c English      # English source column
    sheetglot languages                                 # List target languages
    sheetglot completions bash > sheetglot.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. The API endpoint, key and
    worker count can also come from TRANSLATION_API_URL, TRANSLATION_API_KEY and
    MAX_CONCURRENT_REQUESTS.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Progress sink drawing an indicatif bar; messages go above the bar
struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        Self { bar }
    }
}

impl ProgressSink for ProgressBarSink {
    fn progress(&self, percent: u8, message: &str) {
        self.bar.set_position(percent as u64);
        self.bar.println(format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message));
    }

    fn finished(&self, success: bool, message: &str) {
        if success {
            self.bar.finish_with_message(format!("✔ Translation succeeded: {}", message));
        } else {
            self.bar.abandon_with_message(format!("✖ Translation failed: {}", message));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sheetglot", &mut std::io::stdout());
            Ok(())
        }
        Commands::Languages => {
            for (code, name) in language_utils::TARGET_LANGUAGES {
                println!("{}  {}", code, name);
            }
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        log::set_max_level(app_config::LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;

    let cancel = CancellationFlag::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if on_interrupt(&ctrl_c_flag) == InterruptAction::Abort {
                error!("Second interrupt received, aborting without saving");
                std::process::exit(130);
            }
            warn!("Cancellation requested, waiting for running requests to finish (Ctrl-C again to abort)...");
        }
    });

    // No bar when stderr is redirected
    let sink: Arc<dyn ProgressSink> = if std::io::stderr().is_terminal() {
        Arc::new(ProgressBarSink::new())
    } else {
        Arc::new(LogProgressSink)
    };
    let report = controller
        .run(options.input_path.clone(), options.output.clone(), sink, &cancel)
        .await?;

    info!("=== Translation finished ===");
    if report.success {
        Ok(())
    } else {
        Err(anyhow!(report.message))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
    /// Stop launching new requests, let running ones finish
    Cancel,
    /// Leave immediately
    Abort,
}

// First interrupt cancels the batch, any later one aborts
fn on_interrupt(flag: &CancellationFlag) -> InterruptAction {
    if flag.is_cancelled() {
        InterruptAction::Abort
    } else {
        flag.cancel();
        InterruptAction::Cancel
    }
}

// Command line values win over the configuration file
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if !options.target_language.is_empty() {
        config.target_languages = options
            .target_language
            .iter()
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .collect();
    }
    if let Some(text_column) = &options.text_column {
        config.text_column = text_column.clone();
    }
    if let Some(api_url) = &options.api_url {
        config.api.endpoint = api_url.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.api.api_key = api_key.clone();
    }
    if let Some(workers) = options.workers {
        config.concurrency.max_concurrent_requests = workers;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
