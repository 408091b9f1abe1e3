//! Command modules for the repcount CLI
//!
//! Each command module implements a single top-level command:
//! - `serve` - Streaming daemon plus companion HTTP surface
//! - `analyze` - Single-frame analysis or recorded session replay
//! - `config` - Show and edit the configuration file
//!
//! Handlers return the text to print; errors carry their own exit code.

pub mod analyze;
pub mod config;
pub mod serve;

pub use analyze::run_analyze;
pub use config::run_config;
pub use serve::run_serve;

use crate::cli::OutputFormat;

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
}

impl CommandContext {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }
}

/// Pretty JSON for command output
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> crate::Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| crate::EngineError::InvalidMessage {
        message: format!("JSON serialization failed: {}", e),
    })
}
