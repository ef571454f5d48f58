//! Per-job pipeline: fetch → trim → emit.
//!
//! Every collaborator failure ends up in the returned [`JobOutcome`]; nothing
//! here can stop the batch.

use tracing::{error, info, instrument, warn};

use clipbatch_media::{FetchRequest, Fetcher, ToolOptions, TrimRequest, Trimmer};
use clipbatch_shared::{BatchConfig, ClipBatchError, JobOutcome, JobStage, ParsedJob};

/// Tool settings derived from the run config.
pub(crate) fn tool_options(config: &BatchConfig) -> ToolOptions {
    ToolOptions {
        verbose: config.verbose,
        timeout: config.tool_timeout,
    }
}

/// Turn one parsed job into one outcome.
#[instrument(skip_all, fields(ordinal = job.ordinal, source = %job.source_id))]
pub async fn process_job<F, T>(
    job: &ParsedJob,
    config: &BatchConfig,
    fetcher: &F,
    trimmer: &T,
) -> JobOutcome
where
    F: Fetcher,
    T: Trimmer,
{
    let options = tool_options(config);

    // --- Fetch ---
    let fetch = FetchRequest {
        source_id: &job.source_id,
        scratch_dir: &config.raw_dir,
        format: &config.format,
        keep_original: config.keep_original,
        options,
    };
    let media = match fetcher.fetch(&fetch).await {
        Ok(media) => media,
        Err(e) => {
            error!(ordinal = job.ordinal, source = %job.source_id, error = %e, "fetch failed");
            return JobOutcome::Failed {
                stage: JobStage::Fetch,
                reason: e.to_string(),
            };
        }
    };

    // --- Trim ---
    let output = job.output_path(&config.output_dir, &config.extension);
    info!(
        input = %media.path.display(),
        start = %job.start,
        duration = %job.duration,
        "cutting video"
    );
    let trim = TrimRequest {
        input: &media.path,
        start: job.start,
        duration: job.duration,
        output: &output,
        overwrite: config.override_existing,
        options,
    };

    match trimmer.trim(&trim).await {
        Ok(path) => {
            info!(output = %path.display(), "clip written");
            JobOutcome::Succeeded { output: path }
        }
        Err(ClipBatchError::DestinationExists { path }) => {
            warn!(
                ordinal = job.ordinal,
                output = %path.display(),
                "output exists and override is off, skipping"
            );
            JobOutcome::Skipped { output: path }
        }
        Err(e) => {
            error!(
                ordinal = job.ordinal,
                input = %media.path.display(),
                error = %e,
                "error when cutting video"
            );
            JobOutcome::Failed {
                stage: JobStage::Trim,
                reason: e.to_string(),
            }
        }
    }
}
