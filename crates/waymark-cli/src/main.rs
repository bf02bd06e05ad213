//! Waymark CLI
//!
//! ## Usage
//!
//! ```bash
//! waymark env                          # Show the `test` environment
//! WAYMARK_ENV=stage waymark env --json # Resolve another environment
//! waymark plan scenarios.yaml -e prod  # Preview gating
//! waymark data person -n 5 --seed 7    # Synthetic guests as JSON lines
//! ```

use clap::Parser;
use std::process::ExitCode;
use waymark_cli::{
    handlers::{execute_data, execute_env, execute_plan},
    logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    config.color.apply();
    logging::init(config.verbosity);

    match cli.command {
        Commands::Env(args) => execute_env(&config, &args),
        Commands::Plan(args) => execute_plan(&config, &args),
        Commands::Data(args) => execute_data(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_environment(cli.env.as_str())
        .with_config_dir(cli.config_dir.clone())
}
