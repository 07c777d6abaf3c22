//! `run`: one validated trial

use super::{load_harness, make_validator, reporter};
use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use perfsweep::{Pipeline, ProcessExecutor};
use std::time::Instant;

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let harness = load_harness(&args.harness)?;
    let reporter = reporter(config);
    let validator = make_validator(&args.harness);
    let executor = ProcessExecutor::new();

    reporter.header("perfsweep run");
    reporter.info(&format!("executable: {}", harness.executable.display()));

    let start = Instant::now();
    let outcome = Pipeline::new(&harness, &executor, validator.as_ref()).run_single()?;

    if harness.reference_file.is_some() {
        reporter.success("output matches reference");
    }
    match outcome.summary_path {
        Some(path) => reporter.success(&format!("profile written to {}", path.display())),
        None => reporter.warning("executable left no profile"),
    }
    reporter.summary("trial", outcome.trials, start.elapsed());
    Ok(())
}
