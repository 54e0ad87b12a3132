/*!
 * Error types for the sheetglot application.
 *
 * Batch-level setup failures, provider call failures and the umbrella
 * application error, defined with the thiserror crate.
 */

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the translation API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The call did not finish within the configured bound
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that stop a batch before any translation is attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    /// The input table could not be opened or parsed
    #[error("Cannot read input file {path:?}: {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    /// The configured text column is not present in the input
    #[error("Column '{column}' not found in input (available: {available})")]
    MissingColumn { column: String, available: String },

    /// The output destination cannot be created
    #[error("Cannot open output file {path:?}: {reason}")]
    OutputUnwritable { path: PathBuf, reason: String },

    /// The batch parameters are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error while preparing a batch
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(error: csv::Error) -> Self {
        Self::File(error.to_string())
    }
}
