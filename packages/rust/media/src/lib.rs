//! External media tools behind small traits.
//!
//! This crate provides:
//! - [`Fetcher`] / [`YtDlp`]: download a source into the scratch directory
//! - [`Trimmer`] / [`Ffmpeg`]: cut a time window into a numbered output file
//!
//! Both calls run to completion before returning; nothing here runs in the
//! background.

pub mod fetch;
mod process;
pub mod trim;

pub use fetch::{FetchRequest, FetchedMedia, Fetcher, YtDlp};
pub use process::ToolOptions;
pub use trim::{Ffmpeg, TrimRequest, Trimmer};
