//! Shared types, error model, and configuration for clipbatch.
//!
//! This crate is the foundation depended on by all other clipbatch crates.
//! It provides:
//! - [`ClipBatchError`]: the unified error type
//! - [`Timestamp`] and its offset arithmetic
//! - Domain types ([`ParsedJob`], [`JobOutcome`], [`RawLine`])
//! - Configuration ([`AppConfig`], [`BatchConfig`], config loading)

pub mod config;
pub mod error;
pub mod timestamp;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchConfig, DefaultsConfig, PathsConfig, ToolsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ClipBatchError, LineDefect, Result};
pub use timestamp::Timestamp;
pub use types::{JobOutcome, JobStage, ParsedJob, RawLine};
