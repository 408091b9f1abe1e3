//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{EngineConfig, DEFAULT_CONFIG_FILE};
use crate::error::{EngineError, Result};
use crate::pose::EstimatorKind;

/// Push-up rep counter: pose analysis, rep counting and live sessions
#[derive(Parser, Debug)]
#[command(name = "repcount")]
#[command(about = "Counts exercise repetitions from streamed pose landmarks")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, env = "REPCOUNT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration file in effect
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands for repcount
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the streaming daemon and the companion HTTP surface
    Serve(ServeArgs),

    /// Analyze a recorded frame, or replay a recording through a session
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// Manage repcount configuration
    Config(ConfigArgs),
}

// ============================================
// Serve Subcommand
// ============================================

/// Listener overrides, shared with the daemon binary
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// WebSocket port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Companion HTTP port (0 disables it)
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Pose estimator (passthrough, synthetic)
    #[arg(long)]
    pub estimator: Option<String>,
}

impl ServeArgs {
    /// Apply the flags on top of file configuration
    pub fn apply_to(&self, config: &mut EngineConfig) -> Result<()> {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(http_port) = self.http_port {
            config.server.http_port = http_port;
        }
        if let Some(name) = &self.estimator {
            config.estimator.kind =
                EstimatorKind::parse(name).ok_or_else(|| EngineError::Config {
                    message: format!(
                        "Unknown estimator: {}. Must be one of: passthrough, synthetic",
                        name
                    ),
                })?;
        }
        Ok(())
    }
}

// ============================================
// Analyze Subcommand
// ============================================

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JSON file holding one frame, or an array of frames to replay in order
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Depth threshold for the replay session (degrees)
    #[arg(long)]
    pub min_depth_angle: Option<f64>,

    /// Extension threshold for the replay session (degrees)
    #[arg(long)]
    pub min_extension_angle: Option<f64>,
}

// ============================================
// Config Subcommand
// ============================================

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config operation: show, get, set, reset
    #[command(subcommand)]
    pub operation: ConfigOperation,
}

/// Config subcommand operations
#[derive(Subcommand, Debug)]
pub enum ConfigOperation {
    /// Show current configuration
    Show,

    /// Print a single value
    Get {
        /// Configuration key (e.g., server.port, session.min_depth_angle)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., server.port, logging.level)
        key: String,
        /// Value to set
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// JSON - standard JSON output for machine parsing
    Json,
}
