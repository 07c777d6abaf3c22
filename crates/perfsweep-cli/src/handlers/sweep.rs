//! `sweep`: rebuild and profile every configuration

use super::{load_harness, make_validator, reporter};
use crate::commands::SweepArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::render_manifest;
use perfsweep::{CommandBuildSystem, Configuration, ProcessExecutor, SweepDriver};
use std::time::Instant;

/// Execute the sweep command
pub fn execute_sweep(config: &CliConfig, args: &SweepArgs) -> CliResult<()> {
    let mut harness = load_harness(&args.harness)?;
    if let Some(passes) = args.passes {
        harness.passes = passes;
    }
    let commands = harness.build.clone().ok_or_else(|| {
        CliError::config("sweeps need a `build` section with configure, build and clean commands")
    })?;

    let mut build = CommandBuildSystem::new(commands);
    let executor = ProcessExecutor::new();
    let validator = make_validator(&args.harness);
    let mut reporter = reporter(config);

    let total = harness.configurations.len();
    let mode = if args.aggregate {
        format!("{} trials each", harness.passes)
    } else {
        "single trial each".to_string()
    };
    reporter.header(&format!("perfsweep sweep ({total} configurations, {mode})"));
    reporter.start_progress(total as u64, "starting");

    let start = Instant::now();
    let result = {
        let progress = |index: usize, configuration: &Configuration| {
            if index > 0 {
                reporter.increment(1);
            }
            reporter.set_message(&configuration.id);
        };
        SweepDriver::new(&harness, &mut build, &executor, validator.as_ref())
            .with_progress(&progress)
            .run(args.aggregate)
    };
    if result.is_ok() && total > 0 {
        reporter.increment(1);
    }
    reporter.finish();
    let report = result?;

    reporter.success(&format!(
        "manifest written to {}",
        report.manifest_path.display()
    ));
    reporter.summary("configurations", report.manifest.entries.len(), start.elapsed());

    let listing = render_manifest(&report.manifest, args.format.into());
    if !listing.is_empty() {
        println!("{listing}");
    }
    Ok(())
}
