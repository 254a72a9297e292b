//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use config_loader::ConfigOverrides;
use std::path::PathBuf;

/// Replay Builder - uniform-step race replays from irregular telemetry
#[derive(Parser, Debug)]
#[command(
    name = "replay-builder",
    author,
    version,
    about = "Build frame-by-frame race replays from recorded telemetry",
    long_about = "Acquires the raw telemetry of one session, resamples every entity onto a \n\
                  shared fixed-step timeline, derives distance and lap state, and writes \n\
                  the frame sequence plus a course outline as JSON."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "REPLAY_BUILDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level used when RUST_LOG is unset
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a replay and write it as JSON
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Summarize the acquired session without building a replay
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "replay.toml",
        env = "REPLAY_BUILDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override session year
    #[arg(long)]
    pub year: Option<u16>,

    /// Override event name
    #[arg(long)]
    pub event: Option<String>,

    /// Override session kind (e.g. R, Q)
    #[arg(long)]
    pub session: Option<String>,

    /// Override timeline step in milliseconds
    #[arg(long)]
    pub step_ms: Option<i64>,

    /// Override output file (stdout when neither is set)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Acquisition timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "REPLAY_BUILDER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without building
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "REPLAY_BUILDER_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            year: self.year,
            event: self.event.clone(),
            session: self.session.clone(),
            step_ms: self.step_ms,
            output: self.output.clone(),
        }
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "replay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "replay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-lap events of every entity
    #[arg(long)]
    pub laps: bool,

    /// List recorded sessions under the file source root instead
    #[arg(long)]
    pub list: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
