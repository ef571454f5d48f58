//! Application configuration for clipbatch.
//!
//! User config lives at `~/.clipbatch/clipbatch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClipBatchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "clipbatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".clipbatch";

// ---------------------------------------------------------------------------
// Config structs (matching clipbatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scratch and output directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// External tool locations and limits.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Output defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where raw fetched media is stored before trimming.
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Where numbered output files are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("./raw_downloads")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

/// `[tools]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// yt-dlp binary (name on `PATH` or absolute path).
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,

    /// ffmpeg binary (name on `PATH` or absolute path).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Kill a tool invocation after this many seconds. Unset means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: default_ytdlp(),
            ffmpeg: default_ffmpeg(),
            tool_timeout_secs: None,
        }
    }
}

fn default_ytdlp() -> String {
    "yt-dlp".into()
}
fn default_ffmpeg() -> String {
    "ffmpeg".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Extension of the numbered output files.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// yt-dlp format selector.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            format: default_format(),
        }
    }
}

fn default_extension() -> String {
    "mp4".into()
}
fn default_format() -> String {
    "bestvideo+bestaudio".into()
}

// ---------------------------------------------------------------------------
// Batch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Resolved options for one run. Built once, then only read.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Seconds subtracted from every start time.
    pub begin_offset: u64,
    /// Seconds added to every duration.
    pub duration_offset: u64,
    /// Overwrite existing output files instead of skipping the job.
    pub override_existing: bool,
    /// Skip malformed list lines instead of aborting the run.
    pub ignore_errors: bool,
    /// Show the external tools' own output.
    pub verbose: bool,
    /// Empty the scratch directory once all jobs have been attempted.
    pub clean: bool,
    /// Ask the fetch tool to keep unmerged source streams.
    pub keep_original: bool,
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Output extension without the leading dot.
    pub extension: String,
    /// Fetch format selector.
    pub format: String,
    /// Per tool-call limit.
    pub tool_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for BatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            begin_offset: 0,
            duration_offset: 0,
            override_existing: false,
            ignore_errors: false,
            verbose: false,
            clean: false,
            keep_original: false,
            raw_dir: config.paths.raw_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
            extension: config.defaults.extension.clone(),
            format: config.defaults.format.clone(),
            tool_timeout: config.tools.tool_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl BatchConfig {
    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        let ext = self.extension.trim();
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(ClipBatchError::config(format!(
                "invalid output extension '{}': expected something like 'mp4'",
                self.extension
            )));
        }
        if self.format.trim().is_empty() {
            return Err(ClipBatchError::config("format selector must not be empty"));
        }
        if self.tool_timeout == Some(Duration::ZERO) {
            return Err(ClipBatchError::config("tool timeout must be at least one second"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.clipbatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ClipBatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.clipbatch/clipbatch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ClipBatchError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ClipBatchError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ClipBatchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ClipBatchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ClipBatchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
