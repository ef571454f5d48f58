//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use clipbatch_core::{BatchProgress, BatchSummary, CleanupSummary, RunReport, run_batch, write_report};
use clipbatch_media::{Ffmpeg, YtDlp};
use clipbatch_shared::{
    AppConfig, BatchConfig, JobOutcome, ParsedJob, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// clipbatch: download a list of videos and cut each one to a set window.
#[derive(Parser)]
#[command(
    name = "clipbatch",
    version,
    about = "Download a list of videos and cut them to a set size.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v shows yt-dlp/ffmpeg output, -vv adds trace logs).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download and cut every video in a list.
    Run(RunArgs),

    /// Parse a list and print each job's effective window without running it.
    Check(ListArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments that affect how the list is parsed.
#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// List file with lines formatted as '[LINK] | [STARTING TIME] | [DURATION]',
    /// times in HH:MM:SS.
    pub list: PathBuf,

    /// Subtract this many seconds from every starting time.
    #[arg(short, long, default_value_t = 0)]
    pub begin_offset: u64,

    /// Add this many seconds to every duration.
    #[arg(short, long, default_value_t = 0)]
    pub duration_offset: u64,

    /// Skip invalid lines in the list instead of aborting.
    #[arg(short, long)]
    pub ignore_errors: bool,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub list: ListArgs,

    /// Overwrite existing files in the output directory.
    #[arg(short = 'o', long = "override")]
    pub override_existing: bool,

    /// Empty the raw download directory afterwards to free disk space.
    #[arg(short, long)]
    pub clean: bool,

    /// Keep the unmerged downloaded streams. Takes up additional disk space.
    #[arg(short, long)]
    pub keep_original: bool,

    /// Output file extension (defaults to the config value, usually mp4).
    #[arg(long)]
    pub ext: Option<String>,

    /// Directory for raw downloads.
    #[arg(long)]
    pub raw_dir: Option<PathBuf>,

    /// Directory for the numbered output files.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Kill yt-dlp/ffmpeg if a single call runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write a JSON report of every job's outcome to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit with an error if any job failed.
    #[arg(long)]
    pub fail_on_error: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

impl ListArgs {
    fn apply(&self, config: &mut BatchConfig) {
        config.begin_offset = self.begin_offset;
        config.duration_offset = self.duration_offset;
        config.ignore_errors = self.ignore_errors;
    }
}

impl RunArgs {
    /// Merge flags over the config file values.
    fn batch_config(&self, app: &AppConfig, verbose: bool) -> BatchConfig {
        let mut config = BatchConfig::from(app);
        self.list.apply(&mut config);
        config.override_existing = self.override_existing;
        config.clean = self.clean;
        config.keep_original = self.keep_original;
        config.verbose = verbose;
        if let Some(ext) = &self.ext {
            config.extension = ext.clone();
        }
        if let Some(dir) = &self.raw_dir {
            config.raw_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(secs) = self.timeout {
            config.tool_timeout = Some(Duration::from_secs(secs));
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "clipbatch=info",
        1 => "clipbatch=debug",
        _ => "clipbatch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let verbose = cli.verbose > 0;
    match cli.command {
        Command::Run(args) => cmd_run(&args, verbose).await,
        Command::Check(args) => cmd_check(&args),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_run(args: &RunArgs, verbose: bool) -> Result<()> {
    let app = load_config()?;
    let config = args.batch_config(&app, verbose);

    let fetcher = YtDlp::new(app.tools.ytdlp.as_str());
    let trimmer = Ffmpeg::new(app.tools.ffmpeg.as_str());

    info!(
        list = %args.list.list.display(),
        raw_dir = %config.raw_dir.display(),
        output_dir = %config.output_dir.display(),
        "starting batch"
    );

    let progress = CliProgress::new(config.verbose);
    let result = run_batch(&args.list.list, &config, &fetcher, &trimmer, &progress).await;
    progress.finish();
    let summary = result?;

    if let Some(path) = &args.report {
        write_report(path, &RunReport::from(&summary))?;
    }

    println!();
    println!("  Finished downloading videos!");
    println!("  Jobs:      {}", summary.records.len());
    println!("  Succeeded: {}", summary.succeeded());
    println!("  Skipped:   {}", summary.skipped());
    println!("  Failed:    {}", summary.failed());
    if !summary.skipped_lines.is_empty() {
        println!("  Ignored:   {} malformed line(s)", summary.skipped_lines.len());
    }
    println!(
        "  Time:      {:.1}s",
        summary.elapsed.as_secs_f64()
    );
    println!();

    if args.fail_on_error && summary.failed() > 0 {
        return Err(eyre!(
            "{} of {} jobs failed",
            summary.failed(),
            summary.records.len()
        ));
    }

    Ok(())
}

fn cmd_check(args: &ListArgs) -> Result<()> {
    let app = load_config()?;
    let mut config = BatchConfig::from(&app);
    args.apply(&mut config);

    let parsed = clipbatch_listfile::read_list(&args.list, &config)?;

    println!(
        "Parsed {} with {} videos.",
        args.list.display(),
        parsed.jobs.len()
    );
    for skipped in &parsed.skipped {
        println!("  line {:>4}: ignored ({})", skipped.line, skipped.defect);
    }
    for job in &parsed.jobs {
        println!(
            "  #{:<4} {}  start {}  duration {}  -> {}",
            job.ordinal,
            job.source_id,
            job.start,
            job.duration,
            job.output_path(&config.output_dir, &config.extension).display()
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
///
/// The bar is hidden while tool output is shown so the two don't fight over
/// the terminal.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(show_tool_output: bool) -> Self {
        if show_tool_output {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Print a line above the bar (or plainly if there is no bar).
    fn line(&self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.bar.is_hidden() {
            println!("{msg}");
        } else {
            self.bar.println(msg);
        }
    }

    fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl BatchProgress for CliProgress {
    fn parsed(&self, list: &Path, jobs: usize, skipped_lines: usize) {
        self.bar.set_length(jobs as u64);
        self.line(format!("Parsed {} with {jobs} videos.", list.display()));
        if skipped_lines > 0 {
            self.line(format!("Ignored {skipped_lines} malformed line(s)."));
        }
    }

    fn job_started(&self, job: &ParsedJob, _total: usize) {
        self.line(format!("==[ Video #{} ]==", job.ordinal));
        self.bar.set_message(format!("Video #{} {}", job.ordinal, job.source_id));
    }

    fn job_finished(&self, job: &ParsedJob, outcome: &JobOutcome) {
        self.bar.inc(1);
        match outcome {
            JobOutcome::Succeeded { output } => {
                self.line(format!("  wrote {}", output.display()));
            }
            JobOutcome::Skipped { output } => {
                self.line(format!(
                    "  {} already exists, skipped (use --override to replace)",
                    output.display()
                ));
            }
            JobOutcome::Failed { stage, reason } => {
                self.line(format!(
                    "  Error during {stage} of video #{} ({}): {reason}",
                    job.ordinal, job.source_id
                ));
            }
        }
    }

    fn cleaned(&self, summary: &CleanupSummary) {
        self.line(format!(
            "Cleaned raw downloads: {} removed, {} failed.",
            summary.removed, summary.failed
        ));
    }

    fn done(&self, _summary: &BatchSummary) {
        self.finish();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
