//! Error types for loading and charting frame statistics.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

/// Everything that can stop a chart from being produced.
///
/// None of these are recoverable within one invocation: the binary reports
/// the message and exits non-zero.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Cannot read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Read failed: {0}")]
    Read(#[from] io::Error),

    #[error("Malformed row at line {line}: expected {expected} field(s), found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Invalid {field} '{value}' at line {line}")]
    Format {
        field: &'static str,
        value: String,
        line: u64,
    },

    #[error("No frame statistics found in {}", .0.display())]
    EmptyDataset(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StatsError {
    /// Format error for a value that is not tied to a CSV line.
    pub fn format(field: &'static str, value: impl Into<String>) -> Self {
        StatsError::Format {
            field,
            value: value.into(),
            line: 0,
        }
    }

    /// Attach a line number to a format error raised without one.
    pub fn at_line(self, line: u64) -> Self {
        match self {
            StatsError::Format { field, value, .. } => StatsError::Format { field, value, line },
            other => other,
        }
    }
}
