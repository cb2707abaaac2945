//! Error types for usenet-ul
//!
//! Only configuration and input-validation failures are raised as [`Error`].
//! A tool that runs and exits non-zero is not an error: it is reported as a
//! structured outcome (see [`crate::types::ProcessOutput`]) so that a batch can
//! keep going with the next item.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for usenet-ul operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for usenet-ul
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "nzb_output_path")
        key: Option<String>,
    },

    /// The input path handed to the classifier is unusable
    #[error("invalid input {path}: {reason}")]
    InvalidInput {
        /// The offending path
        path: PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// A glob pattern could not be compiled
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// External tool could not be started (missing binary, permissions, ...)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// A receipt could not be relocated into the output tree
    #[error("failed to move {source_path} to {dest_path}: {reason}")]
    MoveFailed {
        /// Where the receipt was produced
        source_path: PathBuf,
        /// Where it was supposed to go
        dest_path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// The resume ledger contains a line that is not a valid record
    #[error("malformed resume record at {path}:{line}")]
    MalformedRecord {
        /// Ledger file
        path: PathBuf,
        /// 1-based line number
        line: usize,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Shorthand for [`Error::InvalidInput`]
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error should abort the whole run rather than a single item
    ///
    /// Input and configuration problems are fatal; everything that can only
    /// affect the item currently being processed is not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::InvalidInput { .. }
                | Error::Glob(_)
                | Error::Yaml(_)
                | Error::MalformedRecord { .. }
        )
    }
}
