//! Config command handler

use std::path::Path;

use crate::cli::{ConfigOperation, OutputFormat};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

use super::{to_json, CommandContext};

/// Run a config operation against the file at `path`
pub fn run_config(ctx: &CommandContext, operation: &ConfigOperation, path: &Path) -> Result<String> {
    match operation {
        ConfigOperation::Show => {
            let config = EngineConfig::load_from(path)?;
            match ctx.format {
                OutputFormat::Json => Ok(format!("{}\n", to_json(&config)?)),
                OutputFormat::Text => {
                    let body = toml::to_string_pretty(&config).map_err(|e| {
                        EngineError::Config {
                            message: format!("Failed to serialize config: {}", e),
                        }
                    })?;
                    Ok(format!("# {}\n{}", path.display(), body))
                }
            }
        }

        ConfigOperation::Get { key } => {
            let config = EngineConfig::load_from(path)?;
            let value = config.get(key).ok_or_else(|| EngineError::Config {
                message: format!("Unknown configuration key: {}", key),
            })?;
            Ok(format!("{}\n", value))
        }

        ConfigOperation::Set { key, value } => {
            let mut config = EngineConfig::load_from(path)?;
            config.set(key, value)?;
            config.save_to(path)?;
            Ok(format!("{} = {}\n", key, value))
        }

        ConfigOperation::Reset => {
            EngineConfig::default().save_to(path)?;
            Ok(format!("Reset {} to defaults\n", path.display()))
        }
    }
}
