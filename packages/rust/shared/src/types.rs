//! Core domain types for a clipbatch run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

// ---------------------------------------------------------------------------
// RawLine
// ---------------------------------------------------------------------------

/// One line of a list file, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// 1-based line number, used in diagnostics.
    pub number: usize,
    pub text: &'a str,
}

// ---------------------------------------------------------------------------
// ParsedJob
// ---------------------------------------------------------------------------

/// A validated list entry with run-wide offsets already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedJob {
    /// Whatever the fetch tool accepts: a URL or a bare video id.
    pub source_id: String,
    /// Effective start (list start minus the begin offset, clamped at zero).
    pub start: Timestamp,
    /// Effective duration (list duration plus the duration offset).
    pub duration: Timestamp,
    /// 1-based position among successfully parsed lines.
    pub ordinal: usize,
}

impl ParsedJob {
    /// Output file name for this job, e.g. `3.mp4`.
    pub fn output_file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.ordinal)
    }

    /// Full destination path under `output_dir`.
    pub fn output_path(&self, output_dir: &Path, extension: &str) -> PathBuf {
        output_dir.join(self.output_file_name(extension))
    }
}

// ---------------------------------------------------------------------------
// JobOutcome
// ---------------------------------------------------------------------------

/// Which collaborator a failed job stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Fetch,
    Trim,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Trim => f.write_str("trim"),
        }
    }
}

/// Result of processing one job. Reported, never fed back into later jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The trimmed file was written.
    Succeeded { output: PathBuf },
    /// The destination already existed and overriding was not allowed.
    Skipped { output: PathBuf },
    /// A collaborator failed; the batch carried on.
    Failed { stage: JobStage, reason: String },
}

impl JobOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
