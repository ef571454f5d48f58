//! Running an external tool to completion.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use command_group::AsyncCommandGroup;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use clipbatch_shared::{ClipBatchError, Result};

/// What a finished tool run left behind.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    /// Every stdout line, in order. Invalid UTF-8 is replaced, not rejected.
    pub stdout: Vec<String>,
    /// Last non-empty stderr line. Always `None` when stderr was shown.
    pub stderr_tail: Option<String>,
}

impl ToolOutput {
    /// Short human-readable reason for a failed run.
    pub fn failure_reason(&self, tool: &str) -> String {
        match &self.stderr_tail {
            Some(line) => format!("{tool} exited with {}: {line}", self.status),
            None => format!("{tool} exited with {}", self.status),
        }
    }
}

/// Settings shared by every tool invocation in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolOptions {
    /// Pass the tool's own output through to the terminal.
    pub verbose: bool,
    /// Kill the tool, and anything it started, if it runs longer than this.
    pub timeout: Option<Duration>,
}

/// Spawn `command` in its own process group and wait for it.
///
/// Stdout is always captured line by line (and echoed when verbose). Stderr is
/// inherited when verbose, otherwise drained to EOF so its last line can
/// explain a failure. `fail` builds the error for spawn and read failures so
/// callers keep their own error category.
///
/// On timeout the whole group is killed, so helpers the tool spawned (yt-dlp
/// running ffmpeg to merge streams) do not outlive the job.
pub(crate) async fn run_tool(
    mut command: Command,
    tool: &str,
    options: ToolOptions,
    fail: fn(String) -> ClipBatchError,
) -> Result<ToolOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(if options.verbose {
            Stdio::inherit()
        } else {
            Stdio::piped()
        })
        .kill_on_drop(true);

    debug!(tool, command = ?command.as_std(), "spawning tool");

    let mut child = command
        .group_spawn()
        .map_err(|e| fail(format!("failed to start {tool}: {e}. Is `{tool}` installed?")))?;

    let stderr_task = child.inner().stderr.take().map(|stderr| tokio::spawn(stderr_tail(stderr)));

    let stdout = child
        .inner()
        .stdout
        .take()
        .ok_or_else(|| fail(format!("failed to capture {tool} stdout")))?;
    let stdout_task = tokio::spawn(read_lines(stdout, tool.to_string(), options.verbose));

    let waited = match options.timeout {
        Some(limit) => {
            let bounded = tokio::time::timeout(limit, child.wait()).await;
            let Ok(waited) = bounded else {
                warn!(tool, secs = limit.as_secs(), "tool timed out, killing its process group");
                if let Err(e) = child.kill().await {
                    warn!(tool, error = %e, "failed to kill process group");
                }
                return Err(ClipBatchError::Timeout {
                    tool: tool.to_string(),
                    secs: limit.as_secs(),
                });
            };
            waited
        }
        None => child.wait().await,
    };
    let status = waited.map_err(|e| fail(format!("failed to wait for {tool}: {e}")))?;

    let captured = stdout_task
        .await
        .map_err(|e| fail(format!("{tool} output reader stopped: {e}")))?
        .map_err(|e| fail(format!("failed to read {tool} output: {e}")))?;

    let stderr_tail = match stderr_task {
        Some(task) => task.await.ok().flatten(),
        None => None,
    };

    Ok(ToolOutput {
        status,
        stdout: captured,
        stderr_tail,
    })
}

/// Read `stream` to EOF as lossily decoded lines.
async fn read_lines<R>(stream: R, tool: String, verbose: bool) -> std::io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut captured = Vec::new();
    while reader.read_until(b'\n', &mut buf).await? > 0 {
        let line = decode_line(&buf);
        if verbose {
            println!("{line}");
        } else {
            trace!(tool = %tool, %line, "tool output");
        }
        captured.push(line);
        buf.clear();
    }
    Ok(captured)
}

/// Drain `stream` to EOF, keeping the last non-empty line.
async fn stderr_tail<R>(stream: R) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut tail = None;
    while let Ok(read) = reader.read_until(b'\n', &mut buf).await {
        if read == 0 {
            break;
        }
        let line = decode_line(&buf);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            tail = Some(trimmed.to_string());
        }
        buf.clear();
    }
    tail
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
