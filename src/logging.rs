//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` directives take precedence over
/// the configured default `level`. Logs go to stderr so stdout stays clean
/// for command output.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "repcount_engine={0},repcount={0},repcount_daemon={0}",
            level
        ))
    });

    // May already be initialized (tests, embedding), which is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
