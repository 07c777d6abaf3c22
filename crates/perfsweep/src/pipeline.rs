//! Test passes wired onto the phase scheduler.
//!
//! An aggregate pass of `N` trials is scheduled as
//!
//! ```text
//! [run-1] [collect-1] [run-2] [collect-2] ... [run-N] [collect-N] [aggregate]
//! ```
//!
//! so `collect-i` always reads what `run-i` produced before `run-(i+1)` may
//! touch the working directory. With
//! [`WorkDirPolicy::Isolated`](crate::runner::WorkDirPolicy::Isolated) each trial
//! additionally writes into its own directory.

use crate::aggregator::{aggregate, AggregateSummary, DetailReport};
use crate::collector::{collect, ProfileSet};
use crate::config::HarnessConfig;
use crate::exec::Executor;
use crate::profile::{self, DETAIL_FILE, PROFILE_FILE};
use crate::result::{HarnessError, HarnessResult};
use crate::runner::TrialRunner;
use crate::scheduler::{ScheduleReport, TaskScheduler, TaskTiming};
use crate::validator::Validator;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Highest profiling level an aggregate pass accepts
pub const MAX_AGGREGATE_PROFILING: u8 = 1;

/// What a finished pass left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    /// Profile written to the results directory, if the executable produced one
    pub summary_path: Option<PathBuf>,
    /// Detail report (aggregate passes only)
    pub detail_path: Option<PathBuf>,
    /// Trials executed
    pub trials: usize,
    /// Aggregated means (aggregate passes only)
    pub summary: Option<AggregateSummary>,
    /// Scheduler timings
    pub schedule: ScheduleReport,
}

#[derive(Debug, Default)]
struct PassState {
    profiles: ProfileSet,
    reports: Option<(AggregateSummary, DetailReport)>,
    published: Option<PathBuf>,
}

/// Runs single or aggregate passes for one built executable
pub struct Pipeline<'a> {
    config: &'a HarnessConfig,
    executor: &'a dyn Executor,
    validator: &'a dyn Validator,
    observer: Option<&'a dyn Fn(&TaskTiming)>,
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("executable", &self.config.executable)
            .field("work_dir", &self.config.work_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline for `config`
    #[must_use]
    pub fn new(
        config: &'a HarnessConfig,
        executor: &'a dyn Executor,
        validator: &'a dyn Validator,
    ) -> Self {
        Self {
            config,
            executor,
            validator,
            observer: None,
        }
    }

    /// Receive a callback after every completed task
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn Fn(&TaskTiming)) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Number of tasks an aggregate pass of `passes` trials schedules
    #[must_use]
    pub const fn aggregate_task_count(passes: usize) -> usize {
        passes.saturating_mul(2).saturating_add(1)
    }

    /// One validated trial.
    ///
    /// The profile the executable leaves behind, if any, is copied to the
    /// results directory unchanged.
    pub fn run_single(&self) -> HarnessResult<PassOutcome> {
        let cfg = self.config;
        let runner = TrialRunner::new(self.executor, self.validator);
        let trial_dir = cfg.work_dir_policy.trial_dir(&cfg.work_dir, 1);
        let results_dir = cfg.results_dir.as_path();

        let mut sched: TaskScheduler<'_, PassState> = TaskScheduler::new();
        {
            let dir = trial_dir.clone();
            sched.add_fn("run-1", move |_| {
                remove_stale_profile(&dir)?;
                runner.run(
                    &cfg.input_file,
                    &cfg.executable,
                    &dir,
                    cfg.reference_file.as_deref(),
                )
            });
        }
        sched.add_group();
        sched.add_fn("publish", move |state| {
            let source = trial_dir.join(PROFILE_FILE);
            if !source.is_file() {
                warn!(path = %source.display(), "executable left no profile");
                return Ok(());
            }
            fs::create_dir_all(results_dir)?;
            let target = results_dir.join(PROFILE_FILE);
            if source != target {
                self.executor.copy(&source, &target)?;
            }
            state.published = Some(target);
            Ok(())
        });

        let mut state = PassState::default();
        let schedule = self.execute(sched, &mut state)?;
        Ok(PassOutcome {
            summary_path: state.published,
            detail_path: None,
            trials: 1,
            summary: None,
            schedule,
        })
    }

    /// `passes` trials, collected and reduced to a summary and detail report
    pub fn run_aggregate(&self, passes: usize) -> HarnessResult<PassOutcome> {
        check_aggregate_preconditions(passes, self.config.profiling)?;

        let cfg = self.config;
        let runner = TrialRunner::new(self.executor, self.validator);
        let results_dir = cfg.results_dir.as_path();

        let mut sched: TaskScheduler<'_, PassState> = TaskScheduler::new();
        for trial in 1..=passes {
            let dir = cfg.work_dir_policy.trial_dir(&cfg.work_dir, trial);

            let run_dir = dir.clone();
            sched.add_fn(format!("run-{trial}"), move |_| {
                info!(trial, "running trial");
                remove_stale_profile(&run_dir)?;
                runner.run(
                    &cfg.input_file,
                    &cfg.executable,
                    &run_dir,
                    cfg.reference_file.as_deref(),
                )
            });
            sched.add_group();

            sched.add_fn(format!("collect-{trial}"), move |state| {
                collect(&dir.join(PROFILE_FILE), &mut state.profiles)
            });
            sched.add_group();
        }

        sched.add_fn("aggregate", move |state| {
            info!(trials = state.profiles.len(), "processing data");
            let (summary, detail) = aggregate(&state.profiles)?;
            write_reports(results_dir, &summary, &detail)?;
            state.reports = Some((summary, detail));
            Ok(())
        });

        let mut state = PassState::default();
        let schedule = self.execute(sched, &mut state)?;
        let (summary, _) = state
            .reports
            .ok_or_else(|| HarnessError::precondition("aggregate phase did not run"))?;

        Ok(PassOutcome {
            summary_path: Some(results_dir.join(PROFILE_FILE)),
            detail_path: Some(results_dir.join(DETAIL_FILE)),
            trials: passes,
            summary: Some(summary),
            schedule,
        })
    }

    fn execute(
        &self,
        sched: TaskScheduler<'_, PassState>,
        state: &mut PassState,
    ) -> HarnessResult<ScheduleReport> {
        let report = match self.observer {
            Some(observer) => sched.run_observed(state, &mut |t: &TaskTiming| observer(t))?,
            None => sched.run(state)?,
        };
        debug!(
            tasks = report.tasks_completed(),
            elapsed_ms = report.total_elapsed().as_millis(),
            "pass finished"
        );
        Ok(report)
    }
}

/// Reject aggregate passes that cannot produce comparable counters
pub fn check_aggregate_preconditions(passes: usize, profiling: u8) -> HarnessResult<()> {
    if passes == 0 {
        return Err(HarnessError::precondition(
            "an aggregate pass needs at least one trial",
        ));
    }
    if profiling > MAX_AGGREGATE_PROFILING {
        return Err(HarnessError::precondition(format!(
            "aggregate passes require profiling level {MAX_AGGREGATE_PROFILING} or lower, got {profiling}"
        )));
    }
    Ok(())
}

fn remove_stale_profile(dir: &Path) -> HarnessResult<()> {
    let stale = dir.join(PROFILE_FILE);
    if stale.is_file() {
        fs::remove_file(&stale)?;
    }
    Ok(())
}

fn write_reports(
    results_dir: &Path,
    summary: &AggregateSummary,
    detail: &DetailReport,
) -> HarnessResult<()> {
    fs::create_dir_all(results_dir)?;
    profile::write_summary(&results_dir.join(PROFILE_FILE), summary)?;
    profile::write_detail(&results_dir.join(DETAIL_FILE), detail)?;
    info!(results_dir = %results_dir.display(), "reports written");
    Ok(())
}
