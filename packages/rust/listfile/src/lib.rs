//! List-file parser.
//!
//! A list file holds one job per line:
//!
//! ```text
//! <source-identifier> | <start HH:MM:SS> | <duration HH:MM:SS>
//! ```
//!
//! The column delimiter is exactly `" | "`. Every line counts, including an
//! empty one left by a trailing newline, so a list with a trailing blank line
//! needs `ignore_errors` to parse.

use std::path::Path;
use std::sync::LazyLock;

use clipbatch_shared::{
    BatchConfig, ClipBatchError, LineDefect, ParsedJob, RawLine, Result, Timestamp,
};
use regex::Regex;
use tracing::{info, warn};

/// Column delimiter.
pub const DELIMITER: &str = " | ";

/// Matches the `H:M:S` shape. Field ranges are not checked.
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+:[0-9]+:[0-9]+$").expect("time regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Output of a successful parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedList {
    /// Jobs in ordinal order.
    pub jobs: Vec<ParsedJob>,
    /// Lines dropped because `ignore_errors` was set.
    pub skipped: Vec<SkippedLine>,
}

/// A malformed line that was skipped rather than aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub defect: LineDefect,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Read and parse the list file at `path`.
pub fn read_list(path: &Path, config: &BatchConfig) -> Result<ParsedList> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ClipBatchError::ListNotFound {
            path: path.to_path_buf(),
        },
        _ => ClipBatchError::io(path, e),
    })?;

    let parsed = parse_list(&content, config)?;
    info!(
        list = %path.display(),
        jobs = parsed.jobs.len(),
        skipped = parsed.skipped.len(),
        "parsed list"
    );
    Ok(parsed)
}

/// Parse list-file text into jobs with the run's offsets applied.
///
/// The first malformed line is returned as an error unless
/// `config.ignore_errors` is set, in which case it is logged and skipped
/// without consuming an ordinal.
pub fn parse_list(content: &str, config: &BatchConfig) -> Result<ParsedList> {
    let mut parsed = ParsedList::default();

    for (idx, text) in content.split('\n').enumerate() {
        let raw = RawLine {
            number: idx + 1,
            text: text.strip_suffix('\r').unwrap_or(text),
        };

        match parse_line(raw, parsed.jobs.len() + 1, config) {
            Ok(job) => parsed.jobs.push(job),
            Err(defect) if config.ignore_errors => {
                warn!(line = raw.number, %defect, "skipping malformed line");
                parsed.skipped.push(SkippedLine {
                    line: raw.number,
                    defect,
                });
            }
            Err(defect) => return Err(ClipBatchError::malformed_line(raw.number, defect)),
        }
    }

    Ok(parsed)
}

/// Validate one line and build its job.
fn parse_line(raw: RawLine<'_>, ordinal: usize, config: &BatchConfig) -> std::result::Result<ParsedJob, LineDefect> {
    let columns: Vec<&str> = raw.text.split(DELIMITER).collect();
    let [source_id, start, duration] = columns.as_slice() else {
        return Err(LineDefect::Columns {
            found: columns.len(),
        });
    };

    // Padding around a time field is tolerated. The field itself must match in full.
    let (start, duration) = (start.trim_ascii(), duration.trim_ascii());
    if !TIME_RE.is_match(start) || !TIME_RE.is_match(duration) {
        return Err(LineDefect::Time);
    }
    let start = Timestamp::parse(start).map_err(|_| LineDefect::Time)?;
    let duration = Timestamp::parse(duration).map_err(|_| LineDefect::Time)?;

    Ok(ParsedJob {
        source_id: (*source_id).to_string(),
        start: start.subtract(config.begin_offset),
        duration: duration.add(config.duration_offset),
        ordinal,
    })
}
