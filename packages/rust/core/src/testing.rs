//! Fake collaborators and scratch directories for pipeline tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clipbatch_media::{FetchRequest, FetchedMedia, Fetcher, TrimRequest, Trimmer};
use clipbatch_shared::{BatchConfig, ClipBatchError, JobOutcome, ParsedJob, Result};

use crate::pipeline::{BatchProgress, BatchSummary, CleanupSummary};

/// A temp directory holding `raw/` and `output/`, removed on drop.
pub(crate) struct Sandbox {
    pub root: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("cb-core-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(root.join("raw")).unwrap();
        std::fs::create_dir_all(root.join("output")).unwrap();
        Self { root }
    }

    pub fn config(&self) -> BatchConfig {
        BatchConfig {
            raw_dir: self.root.join("raw"),
            output_dir: self.root.join("output"),
            ..BatchConfig::default()
        }
    }

    pub fn write_list(&self, content: &str) -> PathBuf {
        let path = self.root.join("list.txt");
        std::fs::write(&path, content).unwrap();
        path
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Writes `<scratch>/<source>.mkv`, or fails for listed sources.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    fail_on: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn failing_on<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fail_on: sources.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for FakeFetcher {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedMedia> {
        self.calls.lock().unwrap().push(request.source_id.to_string());

        if self.fail_on.iter().any(|s| s == request.source_id) {
            return Err(ClipBatchError::Fetch(format!(
                "video unavailable: {}",
                request.source_id
            )));
        }

        let path = request.scratch_dir.join(format!("{}.mkv", request.source_id));
        std::fs::write(&path, b"raw media").map_err(|e| ClipBatchError::io(&path, e))?;
        Ok(FetchedMedia { path })
    }
}

/// A recorded trim call, timestamps already formatted.
#[derive(Debug, Clone)]
pub(crate) struct TrimCall {
    pub input: PathBuf,
    pub start: String,
    pub duration: String,
    pub output: PathBuf,
}

/// Copies a marker into the output, honouring the overwrite rule, or fails
/// when the input file stem is listed.
#[derive(Default)]
pub(crate) struct FakeTrimmer {
    fail_on: Vec<String>,
    calls: Mutex<Vec<TrimCall>>,
}

impl FakeTrimmer {
    pub fn failing_on<'a>(stems: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fail_on: stems.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TrimCall> {
        self.calls.lock().unwrap().clone()
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Trimmer for FakeTrimmer {
    async fn trim(&self, request: &TrimRequest<'_>) -> Result<PathBuf> {
        self.calls.lock().unwrap().push(TrimCall {
            input: request.input.to_path_buf(),
            start: request.start.to_string(),
            duration: request.duration.to_string(),
            output: request.output.to_path_buf(),
        });

        if !request.overwrite && request.output.exists() {
            return Err(ClipBatchError::DestinationExists {
                path: request.output.to_path_buf(),
            });
        }
        if self.fail_on.contains(&stem(request.input)) {
            return Err(ClipBatchError::Trim("decode error".into()));
        }

        std::fs::write(request.output, format!("clip of {}", stem(request.input)))
            .map_err(|e| ClipBatchError::io(request.output, e))?;
        Ok(request.output.to_path_buf())
    }
}

/// Records progress callbacks as strings.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl BatchProgress for RecordingProgress {
    fn parsed(&self, _list: &Path, jobs: usize, skipped_lines: usize) {
        self.push(format!("parsed {jobs} skipped {skipped_lines}"));
    }

    fn job_started(&self, job: &ParsedJob, _total: usize) {
        self.push(format!("start #{}", job.ordinal));
    }

    fn job_finished(&self, job: &ParsedJob, outcome: &JobOutcome) {
        let status = match outcome {
            JobOutcome::Succeeded { .. } => "ok",
            JobOutcome::Skipped { .. } => "skipped",
            JobOutcome::Failed { .. } => "failed",
        };
        self.push(format!("finish #{} {status}", job.ordinal));
    }

    fn cleaned(&self, summary: &CleanupSummary) {
        self.push(format!("cleaned {}", summary.removed));
    }

    fn done(&self, _summary: &BatchSummary) {
        self.push("done".into());
    }
}
