//! JSON run report.
//!
//! The file is written to a temp sibling first and renamed into place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use clipbatch_shared::{ClipBatchError, Result};

use crate::pipeline::{BatchSummary, CleanupSummary, JobRecord};

/// Serializable view of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Time-sortable run identifier.
    pub run_id: Uuid,
    pub list: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub totals: ReportTotals,
    pub jobs: Vec<JobRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed_lines: Vec<ReportLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub jobs: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub malformed_lines: usize,
}

/// A list line that was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub line: usize,
    pub defect: String,
}

impl From<&BatchSummary> for RunReport {
    fn from(summary: &BatchSummary) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            list: summary.list.clone(),
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            elapsed_secs: summary.elapsed.as_secs_f64(),
            totals: ReportTotals {
                jobs: summary.records.len(),
                succeeded: summary.succeeded(),
                skipped: summary.skipped(),
                failed: summary.failed(),
                malformed_lines: summary.skipped_lines.len(),
            },
            jobs: summary.records.clone(),
            malformed_lines: summary
                .skipped_lines
                .iter()
                .map(|s| ReportLine {
                    line: s.line,
                    defect: s.defect.to_string(),
                })
                .collect(),
            cleanup: summary.cleanup.clone(),
        }
    }
}

/// Write `report` as pretty JSON to `path`, atomically.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| ClipBatchError::Report(format!("failed to serialize report: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ClipBatchError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| ClipBatchError::Report(format!("invalid report path {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&tmp, json).map_err(|e| ClipBatchError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| ClipBatchError::io(path, e))?;

    info!(path = %path.display(), run_id = %report.run_id, "wrote run report");
    Ok(())
}
