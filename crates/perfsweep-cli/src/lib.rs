//! Perfsweep CLI Library
//!
//! Command-line interface for the Perfsweep profiling harness.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting
#![allow(clippy::cast_possible_truncation)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, FormatArg, HarnessArgs, PerfArgs, RunArgs, ServeArgs, SweepArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_manifest, render_summary, OutputFormat, ProgressReporter};
