//! Serve command handler

use crate::cli::ServeArgs;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::logging;

/// Run the daemon in the foreground until Ctrl-C.
///
/// Creates its own tokio runtime so the rest of the CLI stays synchronous.
pub fn run_serve(args: &ServeArgs, mut config: EngineConfig) -> Result<String> {
    args.apply_to(&mut config)?;
    config.validate()?;
    logging::init(&config.logging.level);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| EngineError::Config {
        message: format!("Failed to create tokio runtime: {}", e),
    })?;
    runtime.block_on(crate::socket_server::run(&config))?;

    Ok(String::new())
}
