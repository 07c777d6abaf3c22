//! Perfsweep CLI: profile an instrumented executable
//!
//! ## Usage
//!
//! ```bash
//! perfsweep run                      # one validated trial
//! perfsweep perf --passes 5          # averaged counters over 5 trials
//! perfsweep sweep --aggregate        # rebuild + profile every configuration
//! perfsweep serve --results results  # browse archived profiles
//! ```

use clap::Parser;
use perfsweep_cli::{
    handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity);

    match run(&config, &cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handlers::reporter(&config).failure(&format!("Error: {e}"));
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(config: &CliConfig, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Run(args) => handlers::execute_run(config, args),
        Commands::Perf(args) => handlers::execute_perf(config, args),
        Commands::Sweep(args) => handlers::execute_sweep(config, args),
        Commands::Serve(args) => handlers::execute_serve(config, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}
