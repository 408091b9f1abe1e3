//! repcount daemon binary
//!
//! Runs the streaming server and the companion HTTP surface.
//!
//! # Usage
//!
//! ```bash
//! repcount-daemon --port 9847
//! repcount-daemon --port 9847 --host 0.0.0.0 --http-port 0
//! REPCOUNT_CONFIG=/etc/repcount.toml repcount-daemon
//! ```

use std::path::PathBuf;

use clap::Parser;

use repcount_engine::cli::ServeArgs;
use repcount_engine::config::{EngineConfig, DEFAULT_CONFIG_FILE};
use repcount_engine::{logging, socket_server};

/// repcount streaming daemon
#[derive(Parser, Debug)]
#[command(name = "repcount-daemon")]
#[command(about = "Streaming push-up rep counter daemon")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "REPCOUNT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = EngineConfig::load_from(&args.config)?;
    args.serve.apply_to(&mut config)?;
    config.validate()?;

    logging::init(&config.logging.level);
    tracing::debug!("Configuration: {:?}", config);

    socket_server::run(&config).await?;
    Ok(())
}
