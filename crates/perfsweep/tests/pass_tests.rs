//! End-to-end single and aggregate passes against a fake executable

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{FakeProgram, Workspace};
use perfsweep::profile::{self, read_detail};
use perfsweep::{ErrorKind, ExactMatchValidator, Pipeline, WorkDirPolicy, DETAIL_FILE, PROFILE_FILE};
use std::cell::RefCell;
use std::fs;

// ============================================================================
// Aggregate passes
// ============================================================================

#[test]
fn test_shared_work_dir_collects_every_trial() {
    let ws = Workspace::new(WorkDirPolicy::Shared);
    let program = FakeProgram::with_values([10, 20, 30]);

    let outcome = Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .run_aggregate(3)
        .unwrap();

    let summary = outcome.summary.unwrap();
    assert_eq!(summary.get("A"), Some(20));
    assert_eq!(summary.get("B"), Some(40));
    assert_eq!(summary.trials(), 3);

    let detail = read_detail(&ws.results(DETAIL_FILE)).unwrap();
    assert_eq!(detail.get("A"), Some(&[10, 20, 30][..]));
    assert_eq!(detail.get("B"), Some(&[20, 40, 60][..]));

    let written = profile::parse(&ws.results(PROFILE_FILE)).unwrap();
    assert_eq!(written.keys().collect::<Vec<_>>(), ["A", "B"]);
    assert_eq!(written.get("A"), Some(20));
}

#[test]
fn test_isolated_trials_keep_their_own_profiles() {
    let ws = Workspace::new(WorkDirPolicy::Isolated);
    let program = FakeProgram::with_values([1, 2]);

    Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .run_aggregate(2)
        .unwrap();

    for (trial, value) in [(1, 1), (2, 2)] {
        let dir = ws.config.work_dir.join(format!("trial-{trial}"));
        let trial_profile = profile::parse(&dir.join(PROFILE_FILE)).unwrap();
        assert_eq!(trial_profile.get("A"), Some(value));
    }
    // floor of 1.5
    let written = profile::parse(&ws.results(PROFILE_FILE)).unwrap();
    assert_eq!(written.get("A"), Some(1));
}

#[test]
fn test_schedule_interleaves_run_and_collect() {
    let ws = Workspace::new(WorkDirPolicy::Shared);
    let program = FakeProgram::with_values([5, 5]);
    let seen = RefCell::new(Vec::new());
    let observer = |t: &perfsweep::TaskTiming| seen.borrow_mut().push(t.name.clone());

    let outcome = Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .with_observer(&observer)
        .run_aggregate(2)
        .unwrap();

    assert_eq!(
        *seen.borrow(),
        ["run-1", "collect-1", "run-2", "collect-2", "aggregate"]
    );
    assert_eq!(outcome.schedule.groups_completed, Pipeline::aggregate_task_count(2));
}

#[test]
fn test_failed_trial_aborts_before_aggregation() {
    let ws = Workspace::new(WorkDirPolicy::Shared);
    let program = FakeProgram {
        fail_on_run: Some(2),
        ..FakeProgram::with_values([10, 20, 30])
    };

    let err = Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .run_aggregate(3)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExecFailure);
    assert_eq!(err.exit_code(), 3);
    assert_eq!(program.runs.get(), 2);
    assert!(!ws.results(PROFILE_FILE).exists());
    assert!(!ws.results(DETAIL_FILE).exists());
}

#[test]
fn test_validation_failure_stops_the_pass() {
    let ws = Workspace::new(WorkDirPolicy::Shared);
    let program = FakeProgram {
        corrupt_output: true,
        ..FakeProgram::with_values([10, 20])
    };

    let err = Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .run_aggregate(2)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(program.runs.get(), 1);
}

#[test]
fn test_profiling_level_rejected_without_running() {
    let ws = Workspace::new(WorkDirPolicy::Shared);
    let config = ws.config.clone().with_profiling(2);
    let program = FakeProgram::with_values([1]);

    let err = Pipeline::new(&config, &program, &ExactMatchValidator)
        .run_aggregate(1)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(program.runs.get(), 0);
}

// ============================================================================
// Single passes
// ============================================================================

#[test]
fn test_single_pass_publishes_raw_profile() {
    let ws = Workspace::new(WorkDirPolicy::Isolated);
    let program = FakeProgram::with_values([7]);

    let outcome = Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .run_single()
        .unwrap();

    assert_eq!(outcome.trials, 1);
    assert!(outcome.summary.is_none());
    assert!(outcome.detail_path.is_none());
    let published = outcome.summary_path.unwrap();
    assert_eq!(
        fs::read_to_string(published).unwrap(),
        "// Verbose: 1\n2\nA 7\nB 14\n"
    );
}

#[test]
fn test_single_pass_without_reference_skips_validation() {
    let mut ws = Workspace::new(WorkDirPolicy::Shared);
    ws.config.reference_file = None;
    let program = FakeProgram {
        corrupt_output: true,
        ..FakeProgram::with_values([1])
    };

    Pipeline::new(&ws.config, &program, &ExactMatchValidator)
        .run_single()
        .unwrap();
    assert_eq!(program.runs.get(), 1);
}
