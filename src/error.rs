//! Error handling for the nonce search worker
//!
//! Every failure the worker can hit, from rejected assignments to lost
//! reports, is one variant of [`Error`].

use thiserror::Error;

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the nonce search worker
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The encoded blob could not be turned into a usable header template
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// Zero or inverted difficulty thresholds
    #[error("Invalid difficulty: {message}")]
    InvalidDifficulty { message: String },

    /// Empty or inverted nonce range
    #[error("Invalid nonce range: {message}")]
    InvalidRange { message: String },

    /// The hash capability failed for a candidate
    #[error("Hash error: {message}")]
    Hash { message: String },

    /// Connect or write failure while delivering a report
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Invalid state errors
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Serialized report does not fit the send buffer
    #[error("Report payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a malformed input error
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Create an invalid difficulty error
    pub fn invalid_difficulty(message: impl Into<String>) -> Self {
        Self::InvalidDifficulty {
            message: message.into(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Create a hash error
    pub fn hash(message: impl Into<String>) -> Self {
        Self::Hash {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Whether the error rejects the assignment before any work is done
    pub fn is_rejected_assignment(&self) -> bool {
        matches!(
            self,
            Error::MalformedInput { .. } | Error::InvalidDifficulty { .. } | Error::InvalidRange { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Io(_) => "io",
            Error::Config { .. } => "config",
            Error::MalformedInput { .. } => "malformed_input",
            Error::InvalidDifficulty { .. } => "invalid_difficulty",
            Error::InvalidRange { .. } => "invalid_range",
            Error::Hash { .. } => "hash",
            Error::Transport { .. } => "transport",
            Error::InvalidState { .. } => "invalid_state",
            Error::PayloadTooLarge { .. } => "payload_too_large",
        }
    }

    /// Process exit status for a run that ended with this error.
    ///
    /// Malformed input gets its own non-zero status so a scheduler can tell
    /// "did no work" apart from a completed scan.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::MalformedInput { .. } => 2,
            Error::InvalidDifficulty { .. } | Error::InvalidRange { .. } => 3,
            _ => 1,
        }
    }
}
