//! Phase-barrier task scheduling.
//!
//! Work is organised into ordered groups. Every task in group `k` finishes
//! before any task in group `k + 1` starts, and the first failing task
//! aborts everything that has not run yet. Execution is single-threaded:
//! tasks run on the caller's thread in insertion order.

use crate::result::HarnessResult;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// A unit of work operating on shared pipeline state `S`
pub trait Task<S> {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Execute the task
    fn run(&mut self, state: &mut S) -> HarnessResult<()>;
}

/// Task backed by a closure
pub struct FnTask<'a, S> {
    name: String,
    body: Box<dyn FnMut(&mut S) -> HarnessResult<()> + 'a>,
}

impl<'a, S> FnTask<'a, S> {
    /// Wrap a closure as a task
    pub fn new(
        name: impl Into<String>,
        body: impl FnMut(&mut S) -> HarnessResult<()> + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            body: Box::new(body),
        }
    }
}

impl<S> std::fmt::Debug for FnTask<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

impl<S> Task<S> for FnTask<'_, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, state: &mut S) -> HarnessResult<()> {
        (self.body)(state)
    }
}

/// Timing for one completed task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTiming {
    /// Task name
    pub name: String,
    /// Zero-based group index
    pub group: usize,
    /// Wall-clock time spent in the task
    pub elapsed: Duration,
}

/// Summary of a completed schedule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Groups that ran to completion
    pub groups_completed: usize,
    /// Completed tasks in execution order
    pub tasks: Vec<TaskTiming>,
}

impl ScheduleReport {
    /// Number of tasks that ran
    #[must_use]
    pub fn tasks_completed(&self) -> usize {
        self.tasks.len()
    }

    /// Total time across all tasks
    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.tasks.iter().map(|t| t.elapsed).sum()
    }
}

/// Ordered phase groups with barrier semantics
pub struct TaskScheduler<'a, S> {
    groups: Vec<Vec<Box<dyn Task<S> + 'a>>>,
}

impl<S> std::fmt::Debug for TaskScheduler<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("groups", &self.group_count())
            .field("tasks", &self.task_count())
            .finish()
    }
}

impl<'a, S: 'a> Default for TaskScheduler<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: 'a> TaskScheduler<'a, S> {
    /// Create a scheduler with one empty group
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![Vec::new()],
        }
    }

    /// Add a task to the current group
    pub fn add_to_group(&mut self, task: impl Task<S> + 'a) {
        if let Some(group) = self.groups.last_mut() {
            group.push(Box::new(task));
        } else {
            self.groups.push(vec![Box::new(task)]);
        }
    }

    /// Add a closure task to the current group
    pub fn add_fn(
        &mut self,
        name: impl Into<String>,
        body: impl FnMut(&mut S) -> HarnessResult<()> + 'a,
    ) {
        self.add_to_group(FnTask::new(name, body));
    }

    /// Close the current group; later tasks wait for it to finish
    pub fn add_group(&mut self) {
        if self.groups.last().is_some_and(|g| !g.is_empty()) {
            self.groups.push(Vec::new());
        }
    }

    /// Number of non-empty groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.iter().filter(|g| !g.is_empty()).count()
    }

    /// Number of scheduled tasks
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Run every group in order, stopping at the first failure
    pub fn run(self, state: &mut S) -> HarnessResult<ScheduleReport> {
        self.run_observed(state, &mut |_| {})
    }

    /// Like [`run`](Self::run), calling `observer` after each completed task
    pub fn run_observed(
        self,
        state: &mut S,
        observer: &mut dyn FnMut(&TaskTiming),
    ) -> HarnessResult<ScheduleReport> {
        let mut report = ScheduleReport::default();

        for (index, mut group) in self
            .groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .enumerate()
        {
            debug!(group = index, tasks = group.len(), "starting group");
            for task in &mut group {
                let start = Instant::now();
                if let Err(e) = task.run(state) {
                    error!(
                        task = task.name(),
                        group = index,
                        kind = %e.kind(),
                        error = %e,
                        "task failed, aborting pipeline"
                    );
                    return Err(e);
                }
                let timing = TaskTiming {
                    name: task.name().to_string(),
                    group: index,
                    elapsed: start.elapsed(),
                };
                observer(&timing);
                report.tasks.push(timing);
            }
            report.groups_completed += 1;
        }

        Ok(report)
    }
}
