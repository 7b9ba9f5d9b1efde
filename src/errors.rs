/*!
 * Error types for the subsplit application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur while loading or saving subtitle files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file extension does not map to a supported subtitle format
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// A line could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the source file
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file parsed but contained no usable events
    #[error("No valid subtitle entries found")]
    NoEntries,

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the external cutting tool boundary
#[derive(Error, Debug)]
pub enum CutError {
    /// The tool could not be located
    #[error("Cutting tool not found: {0}")]
    ToolNotFound(String),

    /// The process could not be started
    #[error("Failed to start {tool}: {message}")]
    Spawn {
        /// Tool path
        tool: String,
        /// OS error message
        message: String,
    },

    /// The tool ran but exited unsuccessfully
    #[error("Cutting tool exited with status {status}: {stderr}")]
    Failed {
        /// Exit code, if the process was not killed by a signal
        status: String,
        /// Filtered stderr
        stderr: String,
    },

    /// The tool did not finish in time
    #[error("Cutting tool timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors raised while reading diarization output
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// A malformed RTTM record
    #[error("Invalid RTTM record at line {line}: {message}")]
    InvalidRecord {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the cutting tool
    #[error("Cut error: {0}")]
    Cut(#[from] CutError),

    /// Error from speaker alignment
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
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
