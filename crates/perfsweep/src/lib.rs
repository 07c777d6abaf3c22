//! Perfsweep: performance-profile harness for instrumented executables
//!
//! Stages an input payload next to an externally built executable, runs it,
//! validates its output against a reference, and turns the counter profiles
//! it leaves behind into per-key means across repeated trials. A sweep
//! rebuilds the executable for each module configuration and archives one
//! profile per configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ SweepDriver  │──►│ BuildSystem  │   │ TrialRunner  │──►│  Validator   │
//! │ (per config) │   │ configure /  │   │ copy + exec  │   │ exact / cmd  │
//! │              │──►│ build/clean  │   └──────▲───────┘   └──────────────┘
//! │              │   └──────────────┘          │
//! │              │──►┌──────────────┐   ┌──────┴───────┐   ┌──────────────┐
//! └──────────────┘   │   Pipeline   │──►│TaskScheduler │──►│ collect /    │
//!                    │ single / agg │   │ phase groups │   │ aggregate    │
//!                    └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use perfsweep::{ExactMatchValidator, HarnessConfig, Pipeline, ProcessExecutor};
//!
//! # fn main() -> perfsweep::HarnessResult<()> {
//! let config = HarnessConfig::new("build/program", "build", "data/input.txt")
//!     .with_reference("data/reference.txt");
//! let executor = ProcessExecutor::new();
//! let outcome = Pipeline::new(&config, &executor, &ExactMatchValidator).run_aggregate(5)?;
//! if let Some(summary) = outcome.summary {
//!     for (key, mean) in summary.means() {
//!         println!("{key} {mean}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

/// Per-key means and detail series across trials
pub mod aggregator;

/// External configure/build/clean boundary
pub mod build;

/// Accumulates trial profiles with a consistent key set
pub mod collector;

/// Harness definition (`perfsweep.yaml`)
pub mod config;

/// File staging and process execution
pub mod exec;

/// Single and aggregate passes
pub mod pipeline;

/// Counter profile file format
pub mod profile;

mod result;

/// One staged, executed and validated trial
pub mod runner;

/// Phase-barrier task scheduling
pub mod scheduler;

/// Configuration sweeps
pub mod sweep;

/// Output validation
pub mod validator;

pub use aggregator::{aggregate, AggregateSummary, DetailReport};
pub use build::{BuildOptions, BuildRequest, BuildSystem, CommandBuildSystem};
pub use collector::{collect, ProfileSet};
pub use config::{
    BuildCommands, CommandSpec, Configuration, HarnessConfig, ModuleSchema, DEFAULT_CONFIG_FILE,
    DEFAULT_PASSES,
};
pub use exec::{Executor, ProcessExecutor};
pub use pipeline::{PassOutcome, Pipeline};
pub use profile::{Profile, DETAIL_FILE, PROFILE_FILE};
pub use result::{ErrorKind, HarnessError, HarnessResult};
pub use runner::{TrialRunner, WorkDirPolicy};
pub use scheduler::{ScheduleReport, Task, TaskScheduler, TaskTiming};
pub use sweep::{SweepArtifacts, SweepDriver, SweepManifest, SweepReport, MANIFEST_FILE};
pub use validator::{CommandValidator, ExactMatchValidator, Validator};
