//! End-to-end batch run: bootstrap → parse list → jobs in order → cleanup.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use clipbatch_listfile::{ParsedList, SkippedLine, read_list};
use clipbatch_media::{Fetcher, Trimmer};
use clipbatch_shared::{BatchConfig, ClipBatchError, JobOutcome, ParsedJob, Result};

use crate::orchestrator::process_job;

/// One processed job and what happened to it.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    #[serde(flatten)]
    pub job: ParsedJob,
    pub outcome: JobOutcome,
}

/// Result of emptying the scratch directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// Files deleted.
    pub removed: usize,
    /// Files that could not be deleted.
    pub failed: usize,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// The list file the run was driven by.
    pub list: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Jobs in ordinal order.
    pub records: Vec<JobRecord>,
    /// Malformed lines skipped under `ignore_errors`.
    pub skipped_lines: Vec<SkippedLine>,
    /// `None` when cleanup was not requested.
    pub cleanup: Option<CleanupSummary>,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Succeeded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(JobOutcome::is_failure)
    }
}

/// Progress callback for reporting batch status.
pub trait BatchProgress {
    /// Called once the list has been parsed.
    fn parsed(&self, list: &Path, jobs: usize, skipped_lines: usize);
    /// Called before a job's fetch starts.
    fn job_started(&self, job: &ParsedJob, total: usize);
    /// Called after a job's trim (or failure).
    fn job_finished(&self, job: &ParsedJob, outcome: &JobOutcome);
    /// Called after the scratch directory has been emptied.
    fn cleaned(&self, summary: &CleanupSummary);
    /// Called when the run completes.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn parsed(&self, _list: &Path, _jobs: usize, _skipped_lines: usize) {}
    fn job_started(&self, _job: &ParsedJob, _total: usize) {}
    fn job_finished(&self, _job: &ParsedJob, _outcome: &JobOutcome) {}
    fn cleaned(&self, _summary: &CleanupSummary) {}
    fn done(&self, _summary: &BatchSummary) {}
}

/// Create the scratch and output directories. Existing directories are fine.
pub fn bootstrap_dirs(config: &BatchConfig) -> Result<()> {
    for dir in [&config.raw_dir, &config.output_dir] {
        std::fs::create_dir_all(dir).map_err(|e| ClipBatchError::io(dir, e))?;
    }
    Ok(())
}

/// Delete every file directly inside `dir`, carrying on past failures.
/// Subdirectories are left alone.
pub fn clean_scratch(dir: &Path) -> CleanupSummary {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read scratch directory");
            return CleanupSummary::default();
        }
    };

    let files = entries.map(|entry| -> std::io::Result<(PathBuf, bool)> {
        let entry = entry?;
        Ok((entry.path(), entry.file_type()?.is_file()))
    });
    let summary = remove_files(dir, files);

    info!(dir = %dir.display(), removed = summary.removed, failed = summary.failed, "cleaned scratch directory");
    summary
}

/// Remove each `(path, is_file)` entry that is a file. Unreadable entries
/// count as failures.
fn remove_files<I>(dir: &Path, entries: I) -> CleanupSummary
where
    I: IntoIterator<Item = std::io::Result<(PathBuf, bool)>>,
{
    let mut summary = CleanupSummary::default();
    for entry in entries {
        let path = match entry {
            Ok((path, true)) => path,
            Ok((_, false)) => continue,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read scratch entry");
                summary.failed += 1;
                continue;
            }
        };
        match std::fs::remove_file(&path) {
            Ok(()) => summary.removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove scratch file");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Run the full batch.
///
/// 1. Create the scratch and output directories
/// 2. Read and parse the list (errors here abort the run)
/// 3. Process each job in ordinal order, one at a time
/// 4. Empty the scratch directory if `clean` is set
///
/// Individual job failures never make this return `Err`; they are recorded
/// in the summary.
#[instrument(skip_all, fields(list = %list_path.display()))]
pub async fn run_batch<F, T>(
    list_path: &Path,
    config: &BatchConfig,
    fetcher: &F,
    trimmer: &T,
    progress: &dyn BatchProgress,
) -> Result<BatchSummary>
where
    F: Fetcher,
    T: Trimmer,
{
    let start = Instant::now();
    let started_at = Utc::now();
    config.validate()?;

    bootstrap_dirs(config)?;

    let ParsedList { jobs, skipped } = read_list(list_path, config)?;
    progress.parsed(list_path, jobs.len(), skipped.len());

    let records = run_jobs(&jobs, config, fetcher, trimmer, progress).await;

    let cleanup = if config.clean {
        let summary = clean_scratch(&config.raw_dir);
        progress.cleaned(&summary);
        Some(summary)
    } else {
        None
    };

    let summary = BatchSummary {
        list: list_path.to_path_buf(),
        started_at,
        finished_at: Utc::now(),
        records,
        skipped_lines: skipped,
        cleanup,
        elapsed: start.elapsed(),
    };

    info!(
        jobs = summary.records.len(),
        succeeded = summary.succeeded(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "batch finished"
    );
    progress.done(&summary);

    Ok(summary)
}

/// Process already-parsed jobs strictly in order.
pub async fn run_jobs<F, T>(
    jobs: &[ParsedJob],
    config: &BatchConfig,
    fetcher: &F,
    trimmer: &T,
    progress: &dyn BatchProgress,
) -> Vec<JobRecord>
where
    F: Fetcher,
    T: Trimmer,
{
    let mut records = Vec::with_capacity(jobs.len());
    for job in jobs {
        progress.job_started(job, jobs.len());
        let outcome = process_job(job, config, fetcher, trimmer).await;
        progress.job_finished(job, &outcome);
        records.push(JobRecord {
            job: job.clone(),
            outcome,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, FakeTrimmer, RecordingProgress, Sandbox};
    use clipbatch_shared::{JobStage, LineDefect};

    const THREE_JOBS: &str = "one | 00:01:00 | 00:00:10\ntwo | 00:02:00 | 00:00:20\nthree | 00:03:00 | 00:00:30";

    #[tokio::test]
    async fn runs_jobs_in_ordinal_order() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let list = sandbox.write_list(THREE_JOBS);
        let fetcher = FakeFetcher::default();
        let trimmer = FakeTrimmer::default();
        let progress = RecordingProgress::default();

        let summary = run_batch(&list, &config, &fetcher, &trimmer, &progress).await.unwrap();

        assert_eq!(summary.succeeded(), 3);
        assert_eq!(fetcher.calls(), vec!["one", "two", "three"]);
        let outputs: Vec<PathBuf> = trimmer.calls().into_iter().map(|c| c.output).collect();
        assert_eq!(
            outputs,
            vec![
                config.output_dir.join("1.mp4"),
                config.output_dir.join("2.mp4"),
                config.output_dir.join("3.mp4"),
            ]
        );
        assert_eq!(
            progress.events(),
            vec![
                "parsed 3 skipped 0",
                "start #1",
                "finish #1 ok",
                "start #2",
                "finish #2 ok",
                "start #3",
                "finish #3 ok",
                "done",
            ]
        );
        assert!(summary.cleanup.is_none());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_work() {
        let sandbox = Sandbox::new();
        let config = BatchConfig {
            extension: ".mp4".into(),
            raw_dir: sandbox.root.join("fresh-raw"),
            ..sandbox.config()
        };
        let list = sandbox.write_list(THREE_JOBS);
        let fetcher = FakeFetcher::default();
        let trimmer = FakeTrimmer::default();

        let err = run_batch(&list, &config, &fetcher, &trimmer, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ClipBatchError::Config { .. }));
        assert!(!config.raw_dir.exists());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_line_aborts_before_any_job() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let list = sandbox.write_list("one | 00:01:00 | 00:00:10\ntwo | 00:02:00\nthree | 00:03:00 | 00:00:30");
        let fetcher = FakeFetcher::default();
        let trimmer = FakeTrimmer::default();

        let err = run_batch(&list, &config, &fetcher, &trimmer, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClipBatchError::MalformedLine { line: 2, defect: LineDefect::Columns { found: 2 } }
        ));
        assert!(fetcher.calls().is_empty());
        assert!(trimmer.calls().is_empty());
    }

    #[tokio::test]
    async fn ignored_lines_do_not_consume_ordinals() {
        let sandbox = Sandbox::new();
        let config = BatchConfig {
            ignore_errors: true,
            ..sandbox.config()
        };
        let list = sandbox.write_list(
            "one | 00:01:00 | 00:00:10\ntwo | 00:02:00\nthree | 00:03:00 | 00:00:30\nfour | 00:04:00 | 00:00:40\n",
        );
        let fetcher = FakeFetcher::default();
        let trimmer = FakeTrimmer::default();

        let summary = run_batch(&list, &config, &fetcher, &trimmer, &SilentProgress)
            .await
            .unwrap();

        let ordinals: Vec<usize> = summary.records.iter().map(|r| r.job.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(fetcher.calls(), vec!["one", "three", "four"]);
        // Line 2 (two columns) and line 5 (trailing newline).
        let lines: Vec<usize> = summary.skipped_lines.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[tokio::test]
    async fn trim_failure_does_not_affect_other_jobs() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let list = sandbox.write_list(THREE_JOBS);
        let fetcher = FakeFetcher::default();
        let trimmer = FakeTrimmer::failing_on(["two"]);

        let summary = run_batch(&list, &config, &fetcher, &trimmer, &SilentProgress)
            .await
            .unwrap();

        let outcomes: Vec<&JobOutcome> = summary.records.iter().map(|r| &r.outcome).collect();
        assert_eq!(
            outcomes[0],
            &JobOutcome::Succeeded { output: config.output_dir.join("1.mp4") }
        );
        assert!(matches!(outcomes[1], JobOutcome::Failed { stage: JobStage::Trim, .. }));
        assert_eq!(
            outcomes[2],
            &JobOutcome::Succeeded { output: config.output_dir.join("3.mp4") }
        );
        assert_eq!(summary.failed(), 1);
        assert_eq!(trimmer.calls().len(), 3);
    }

    #[tokio::test]
    async fn rerun_without_override_skips_existing_outputs() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let list = sandbox.write_list("abc123 | 00:01:00 | 00:00:10");
        std::fs::write(config.output_dir.join("1.mp4"), b"keep me").unwrap();

        let summary = run_batch(
            &list,
            &config,
            &FakeFetcher::default(),
            &FakeTrimmer::default(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 0);
        assert_eq!(std::fs::read(config.output_dir.join("1.mp4")).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn offsets_reach_the_trimmer() {
        let sandbox = Sandbox::new();
        let config = BatchConfig {
            begin_offset: 5,
            duration_offset: 2,
            ..sandbox.config()
        };
        let list = sandbox.write_list("abc123 | 00:01:00 | 00:00:10\ndef456 | 00:10:00 | 00:00:30");
        let trimmer = FakeTrimmer::default();

        run_batch(&list, &config, &FakeFetcher::default(), &trimmer, &SilentProgress)
            .await
            .unwrap();

        let windows: Vec<(String, String)> = trimmer
            .calls()
            .into_iter()
            .map(|c| (c.start, c.duration))
            .collect();
        assert_eq!(
            windows,
            vec![
                ("00:00:55".to_string(), "00:00:12".to_string()),
                ("00:09:55".to_string(), "00:00:32".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn clean_empties_scratch_after_all_jobs() {
        let sandbox = Sandbox::new();
        let config = BatchConfig {
            clean: true,
            ..sandbox.config()
        };
        let list = sandbox.write_list(THREE_JOBS);
        let progress = RecordingProgress::default();

        let summary = run_batch(
            &list,
            &config,
            &FakeFetcher::failing_on(["three"]),
            &FakeTrimmer::default(),
            &progress,
        )
        .await
        .unwrap();

        assert_eq!(summary.cleanup, Some(CleanupSummary { removed: 2, failed: 0 }));
        assert_eq!(std::fs::read_dir(&config.raw_dir).unwrap().count(), 0);
        assert!(config.output_dir.join("1.mp4").exists());
        let events = progress.events();
        assert_eq!(events[events.len() - 2], "cleaned 2");
    }

    #[tokio::test]
    async fn missing_list_is_fatal() {
        let sandbox = Sandbox::new();
        let config = sandbox.config();
        let err = run_batch(
            &sandbox.root.join("nope.txt"),
            &config,
            &FakeFetcher::default(),
            &FakeTrimmer::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClipBatchError::ListNotFound { .. }));
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let sandbox = Sandbox::new();
        let config = BatchConfig {
            raw_dir: sandbox.root.join("a/raw"),
            output_dir: sandbox.root.join("b/out"),
            ..BatchConfig::default()
        };
        bootstrap_dirs(&config).unwrap();
        bootstrap_dirs(&config).unwrap();
        assert!(config.raw_dir.is_dir());
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn clean_scratch_leaves_subdirectories() {
        let sandbox = Sandbox::new();
        let raw = sandbox.root.join("raw");
        std::fs::write(raw.join("a.mkv"), b"a").unwrap();
        std::fs::write(raw.join("b.webm"), b"b").unwrap();
        std::fs::create_dir_all(raw.join("nested")).unwrap();

        let summary = clean_scratch(&raw);

        assert_eq!(summary, CleanupSummary { removed: 2, failed: 0 });
        assert!(raw.join("nested").is_dir());
    }

    #[test]
    fn clean_scratch_tolerates_missing_dir() {
        let sandbox = Sandbox::new();
        let summary = clean_scratch(&sandbox.root.join("absent"));
        assert_eq!(summary, CleanupSummary::default());
    }

    #[test]
    fn unreadable_scratch_entries_count_as_failures() {
        let sandbox = Sandbox::new();
        let raw = sandbox.root.join("raw");
        std::fs::write(raw.join("a.mkv"), b"a").unwrap();

        let entries = vec![
            Err(std::io::Error::other("stale handle")),
            Ok((raw.join("a.mkv"), true)),
            Ok((raw.join("nested"), false)),
            Ok((raw.join("vanished.webm"), true)),
        ];
        let summary = remove_files(&raw, entries);

        assert_eq!(summary, CleanupSummary { removed: 1, failed: 2 });
        assert!(!raw.join("a.mkv").exists());
    }
}
