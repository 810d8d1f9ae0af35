use std::path::PathBuf;

use thiserror::Error;

use crate::config::Slot;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the failures that cross the pipeline boundary. Every
/// other condition is recorded as a diagnostic and the run keeps going.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as listing the input folder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a delimited file cannot be tokenised.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a data row does not line up with the header row.
    #[error("row at line {line} has {found} fields, header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Raised when a configuration document is structurally unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when an input folder or configuration file does not exist.
    #[error("input not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when one or more source slots cannot be matched to a file.
    #[error("missing required files for: {}", join_slots(.0))]
    UnresolvedSlots(Vec<Slot>),

    /// Raised when the tidy stage finds none of the columns it should keep.
    #[error("none of the expected columns were found in the merged table")]
    NoColumnsRetained,

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

fn join_slots(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(Slot::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
