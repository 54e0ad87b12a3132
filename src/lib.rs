/*!
 * # sheetglot - batch translation of spreadsheet cells
 *
 * Translates one text column of a table into many target languages by
 * issuing independent calls to a translation API, under a concurrency cap
 * and a minimum spacing between requests.
 *
 * ## Features
 *
 * - One task per (row, target language) pair, run concurrently
 * - Engine-wide request spacing and per-call timeouts
 * - Failed cells are marked in the output instead of aborting the batch
 * - Progress events after every finished cell, one terminal signal per batch
 * - Cooperative cancellation: running calls finish, nothing new starts
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `translation`: The dispatch core:
 *   - `translation::rate_limiter`: Minimum spacing between calls
 *   - `translation::runner`: Single-task execution with failure isolation
 *   - `translation::engine`: Fan-out, cancellation and terminal signal
 * - `providers`: The `Translator` capability and its implementations
 * - `table`: CSV input/output
 * - `app_controller`: Wires configuration, table I/O and the engine
 * - `language_utils`: Target language table and column naming
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod table;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, SetupError};
pub use providers::Translator;
pub use translation::{
    BatchReport, CancellationFlag, DispatchEngine, EngineOptions, EngineState, ProgressSink,
    ResultStore, TaskOutcome,
};
