//! repcount CLI entry point

use std::process::ExitCode;

use clap::Parser;

use repcount_engine::cli::{Cli, Commands};
use repcount_engine::commands::{run_analyze, run_config, run_serve, CommandContext};
use repcount_engine::config::EngineConfig;

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> repcount_engine::Result<String> {
    let cli = Cli::parse();
    let ctx = CommandContext::new(cli.format, cli.verbose);
    let config_path = cli.config_path();

    match &cli.command {
        Commands::Serve(args) => run_serve(args, EngineConfig::load_from(&config_path)?),
        Commands::Analyze(args) => {
            run_analyze(&ctx, args, &EngineConfig::load_from(&config_path)?)
        }
        Commands::Config(args) => run_config(&ctx, &args.operation, &config_path),
    }
}
