//! clipbatch CLI: batch video downloader and trimmer.
//!
//! Reads a list of `<source> | <start> | <duration>` lines, downloads each
//! source with yt-dlp and cuts the requested window with ffmpeg into
//! numbered output files.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
