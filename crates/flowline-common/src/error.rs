//! Error types for Flowline

use thiserror::Error;

/// Result type alias for Flowline operations
pub type Result<T> = std::result::Result<T, FlowlineError>;

/// Main error type for Flowline
///
/// The Validator recovers `Parse`, `EmptyInput` and `SchemaViolation` into
/// its returned result payload; the remaining variants propagate to the
/// platform runtime.
#[derive(Error, Debug)]
pub enum FlowlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("error reading source: {0}")]
    Parse(String),

    #[error("no record found")]
    EmptyInput,

    #[error("{detail} in record number {record}")]
    SchemaViolation { record: usize, detail: String },

    #[error("Retry limit reach")]
    RetryLimitExceeded { attempts: u32 },

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
