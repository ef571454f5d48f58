//! Cutting a time window out of a fetched file.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, instrument};

use clipbatch_shared::{ClipBatchError, Result, Timestamp};

use crate::process::{ToolOptions, run_tool};

/// One trim: source file, window, destination.
#[derive(Debug, Clone)]
pub struct TrimRequest<'a> {
    pub input: &'a Path,
    pub start: Timestamp,
    pub duration: Timestamp,
    pub output: &'a Path,
    /// Replace `output` if it already exists.
    pub overwrite: bool,
    pub options: ToolOptions,
}

/// Something that can write a window of a media file to a new file.
///
/// Implementations must refuse to replace an existing `output` unless
/// `overwrite` is set, reporting [`ClipBatchError::DestinationExists`].
pub trait Trimmer {
    /// Write the window and return the path of the new file.
    fn trim(&self, request: &TrimRequest<'_>) -> impl Future<Output = Result<PathBuf>> + Send;
}

// ---------------------------------------------------------------------------
// ffmpeg
// ---------------------------------------------------------------------------

/// [`Trimmer`] backed by the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, request: &TrimRequest<'_>) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg(if request.overwrite { "-y" } else { "-n" });
        if !request.options.verbose {
            command.args(["-hide_banner", "-loglevel", "error"]);
        }
        command
            .arg("-i")
            .arg(request.input)
            .arg("-ss")
            .arg(request.start.to_string())
            .arg("-t")
            .arg(request.duration.to_string())
            .arg(request.output);
        command
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Trimmer for Ffmpeg {
    #[instrument(skip_all, fields(input = %request.input.display(), output = %request.output.display()))]
    async fn trim(&self, request: &TrimRequest<'_>) -> Result<PathBuf> {
        if !request.overwrite && request.output.exists() {
            return Err(ClipBatchError::DestinationExists {
                path: request.output.to_path_buf(),
            });
        }
        if !request.input.is_file() {
            return Err(ClipBatchError::Trim(format!(
                "input {} does not exist",
                request.input.display()
            )));
        }

        debug!(start = %request.start, duration = %request.duration, "running ffmpeg");

        let output = run_tool(
            self.command(request),
            &self.binary,
            request.options,
            ClipBatchError::Trim,
        )
        .await?;

        if !output.status.success() {
            return Err(ClipBatchError::Trim(output.failure_reason(&self.binary)));
        }

        Ok(request.output.to_path_buf())
    }
}
