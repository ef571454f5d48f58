//! Fetching source media into the scratch directory.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, instrument};

use clipbatch_shared::{ClipBatchError, Result};

use crate::process::{ToolOptions, run_tool};

/// Prefix of the stdout line yt-dlp prints once the final file is in place.
const OUTPUT_MARKER: &str = "CLIPBATCH_FILE|";

/// One fetch: which source, where to put it, in what quality.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub source_id: &'a str,
    /// Directory the raw file lands in. The file is named after the
    /// fetcher's own id for the source, never the job ordinal.
    pub scratch_dir: &'a Path,
    /// Format selector, e.g. `bestvideo+bestaudio`.
    pub format: &'a str,
    /// Keep the separate streams after merging them.
    pub keep_original: bool,
    pub options: ToolOptions,
}

/// A raw media file that is ready to be trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub path: PathBuf,
}

/// Something that can turn a source id into a local media file.
pub trait Fetcher {
    /// Fetch the source and return the path of the materialized file.
    /// Blocks (asynchronously) until the file is complete.
    fn fetch(&self, request: &FetchRequest<'_>) -> impl Future<Output = Result<FetchedMedia>> + Send;
}

// ---------------------------------------------------------------------------
// yt-dlp
// ---------------------------------------------------------------------------

/// [`Fetcher`] backed by the `yt-dlp` command line tool.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, request: &FetchRequest<'_>) -> Command {
        let template = request.scratch_dir.join("%(id)s.%(ext)s");

        let mut command = Command::new(&self.binary);
        command
            .arg("--no-playlist")
            .arg("--no-simulate")
            .arg("-f")
            .arg(request.format)
            .arg("-o")
            .arg(template)
            .arg("--print")
            .arg(format!("after_move:{OUTPUT_MARKER}%(filepath)s"));

        if request.options.verbose {
            command.arg("--no-quiet");
        } else {
            command.arg("--no-warnings");
        }
        if request.keep_original {
            command.arg("-k");
        }

        // Ids may start with '-'.
        command.arg("--").arg(request.source_id);
        command
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl Fetcher for YtDlp {
    #[instrument(skip_all, fields(source = %request.source_id))]
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedMedia> {
        info!(source = %request.source_id, "downloading video");

        let output = run_tool(
            self.command(request),
            &self.binary,
            request.options,
            ClipBatchError::Fetch,
        )
        .await?;

        if !output.status.success() {
            return Err(ClipBatchError::Fetch(output.failure_reason(&self.binary)));
        }

        let path = reported_path(&output.stdout).ok_or_else(|| {
            ClipBatchError::Fetch(format!(
                "{} finished without reporting a file for {}",
                self.binary, request.source_id
            ))
        })?;

        Ok(FetchedMedia { path })
    }
}

/// The last file path announced by the output marker.
fn reported_path(stdout: &[String]) -> Option<PathBuf> {
    stdout
        .iter()
        .rev()
        .find_map(|line| line.trim_end().strip_prefix(OUTPUT_MARKER))
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}
