//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Perfsweep: run, aggregate and sweep profiled executables
#[derive(Parser, Debug)]
#[command(name = "perfsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one validated trial and publish its profile
    Run(RunArgs),

    /// Run N trials and write averaged summary and detail reports
    Perf(PerfArgs),

    /// Rebuild and profile every configured module set
    Sweep(SweepArgs),

    /// Serve archived results over HTTP
    Serve(ServeArgs),
}

/// Harness file location and per-field overrides shared by run/perf/sweep
#[derive(Args, Debug, Clone, Default)]
pub struct HarnessArgs {
    /// Harness file (default: ./perfsweep.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Executable produced by the build
    #[arg(long)]
    pub executable: Option<PathBuf>,

    /// Directory trials run in
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Input payload staged for every trial
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Reference output to validate against
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Profiling level
    #[arg(long)]
    pub profiling: Option<u8>,

    /// Run every trial in the work dir itself instead of `trial-<n>` subdirectories
    #[arg(long)]
    pub shared_work_dir: bool,

    /// External comparison program, called as `<program> <reference> <output>`
    #[arg(long, value_name = "PROGRAM")]
    pub validator: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Harness options
    #[command(flatten)]
    pub harness: HarnessArgs,
}

/// Arguments for the perf command
#[derive(Args, Debug)]
pub struct PerfArgs {
    /// Harness options
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Number of trials (default: from the harness file)
    #[arg(short = 'n', long)]
    pub passes: Option<usize>,

    /// Output format for the averaged counters
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the sweep command
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Harness options
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Aggregate several trials per configuration
    #[arg(short, long)]
    pub aggregate: bool,

    /// Trials per configuration when aggregating
    #[arg(short = 'n', long)]
    pub passes: Option<usize>,

    /// Output format for the archive listing
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Results directory to serve
    #[arg(short, long, default_value = "results")]
    pub results: PathBuf,

    /// Enable CORS for cross-origin requests
    #[arg(long)]
    pub cors: bool,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Aligned text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from(["perfsweep", "run", "--input", "in.txt", "-r", "ref.txt"]);
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.harness.input, Some(PathBuf::from("in.txt")));
            assert_eq!(args.harness.reference, Some(PathBuf::from("ref.txt")));
            assert!(args.harness.config.is_none());
        } else {
            panic!("expected Run command");
        }
    }

    #[test]
    fn test_parse_perf_passes() {
        let cli = Cli::parse_from(["perfsweep", "perf", "-n", "7", "--format", "json"]);
        if let Commands::Perf(args) = cli.command {
            assert_eq!(args.passes, Some(7));
            assert!(matches!(args.format, FormatArg::Json));
        } else {
            panic!("expected Perf command");
        }
    }

    #[test]
    fn test_parse_sweep_aggregate() {
        let cli = Cli::parse_from(["perfsweep", "sweep", "--aggregate", "--shared-work-dir"]);
        if let Commands::Sweep(args) = cli.command {
            assert!(args.aggregate);
            assert!(args.harness.shared_work_dir);
            assert!(args.passes.is_none());
        } else {
            panic!("expected Sweep command");
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["perfsweep", "serve"]);
        if let Commands::Serve(args) = cli.command {
            assert_eq!(args.port, 8080);
            assert_eq!(args.results, PathBuf::from("results"));
            assert!(!args.cors);
        } else {
            panic!("expected Serve command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["perfsweep", "-vv", "--color", "never", "serve"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.color, ColorArg::Never));
    }
}
