//! `perf`: N trials averaged into summary and detail reports

use super::{load_harness, make_validator, reporter};
use crate::commands::PerfArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::render_summary;
use perfsweep::pipeline::check_aggregate_preconditions;
use perfsweep::{Pipeline, ProcessExecutor, TaskTiming};
use std::time::Instant;

/// Execute the perf command
pub fn execute_perf(config: &CliConfig, args: &PerfArgs) -> CliResult<()> {
    let harness = load_harness(&args.harness)?;
    let passes = args.passes.unwrap_or(harness.passes);
    check_aggregate_preconditions(passes, harness.profiling)?;
    let mut reporter = reporter(config);
    let validator = make_validator(&args.harness);
    let executor = ProcessExecutor::new();

    reporter.header(&format!("perfsweep perf ({passes} trials)"));
    reporter.start_progress(Pipeline::aggregate_task_count(passes) as u64, "starting");

    let start = Instant::now();
    let result = {
        let progress = |timing: &TaskTiming| {
            reporter.set_message(&timing.name);
            reporter.increment(1);
        };
        Pipeline::new(&harness, &executor, validator.as_ref())
            .with_observer(&progress)
            .run_aggregate(passes)
    };
    reporter.finish();
    let outcome = result?;

    if let Some(ref path) = outcome.summary_path {
        reporter.success(&format!("summary written to {}", path.display()));
    }
    if let Some(ref path) = outcome.detail_path {
        reporter.success(&format!("detail written to {}", path.display()));
    }
    reporter.summary("trials", outcome.trials, start.elapsed());

    if let Some(ref summary) = outcome.summary {
        println!("{}", render_summary(summary, args.format.into()));
    }
    Ok(())
}
