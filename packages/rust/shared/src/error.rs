//! Error types for clipbatch.
//!
//! Library crates use [`ClipBatchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// What was wrong with a single list-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDefect {
    /// The line did not split into exactly three `" | "`-separated columns.
    Columns { found: usize },
    /// A start or duration field was not shaped like `HH:MM:SS`.
    Time,
}

impl fmt::Display for LineDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Columns { found } => {
                write!(f, "expected columns: 3, found: {found}")
            }
            Self::Time => f.write_str("times aren't formatted as HH:MM:SS"),
        }
    }
}

/// Top-level error type for all clipbatch operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipBatchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    Timestamp { input: String, reason: String },

    /// A list-file line is malformed.
    #[error("line {line} isn't formatted correctly: {defect}")]
    MalformedLine { line: usize, defect: LineDefect },

    /// The list file itself could not be found.
    #[error("list {} not found", .path.display())]
    ListNotFound { path: PathBuf },

    /// The fetch tool failed to produce a raw media file.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The trim tool exited unsuccessfully.
    #[error("trim failed: {0}")]
    Trim(String),

    /// The trim destination already exists and overwriting is not allowed.
    #[error("output {} already exists", .path.display())]
    DestinationExists { path: PathBuf },

    /// An external tool ran past its configured time limit.
    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Run report serialization error.
    #[error("report error: {0}")]
    Report(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ClipBatchError>;

impl ClipBatchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn timestamp(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Timestamp {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_line(line: usize, defect: LineDefect) -> Self {
        Self::MalformedLine { line, defect }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
