//! Batch pipeline orchestration for clipbatch.
//!
//! This crate ties the list parser and the media tools together into a
//! sequential run (`run_batch`): one job's fetch and trim finish before the
//! next job starts.

pub mod orchestrator;
pub mod pipeline;
pub mod report;

#[cfg(test)]
mod testing;

pub use orchestrator::process_job;
pub use pipeline::{
    BatchProgress, BatchSummary, CleanupSummary, JobRecord, SilentProgress, bootstrap_dirs,
    clean_scratch, run_batch, run_jobs,
};
pub use report::{RunReport, write_report};
