//! Configuration sweeps driven against fake build and program collaborators

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{FakeBuild, FakeProgram, Workspace};
use perfsweep::profile;
use perfsweep::{
    Configuration, ErrorKind, ExactMatchValidator, ModuleSchema, SweepDriver, SweepManifest,
    WorkDirPolicy, MANIFEST_FILE,
};
use std::cell::RefCell;
use std::fs;

fn sweep_workspace() -> Workspace {
    let mut ws = Workspace::new(WorkDirPolicy::Shared);
    ws.config.modules = ModuleSchema::new(["simd", "threads"]).unwrap();
    ws.config.configurations = vec![
        Configuration::new("baseline", Vec::<String>::new()),
        Configuration::new("simd", ["simd"]),
        Configuration::new("both", ["simd", "threads"]),
    ];
    ws.config.passes = 2;
    ws
}

#[test]
fn test_aggregate_sweep_archives_every_configuration() {
    let ws = sweep_workspace();
    let program = FakeProgram::with_values([10, 20, 30, 50, 100, 101]);
    let mut build = FakeBuild::default();

    let report = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .run(true)
        .unwrap();

    assert_eq!(
        build.log,
        [
            "configure baseline",
            "build",
            "configure simd",
            "build",
            "configure both",
            "build",
            "clean"
        ]
    );

    let means: Vec<_> = ["baseline", "simd", "both"]
        .iter()
        .map(|id| {
            profile::parse(&ws.results(&format!("{id}_profile.txt")))
                .unwrap()
                .get("A")
                .unwrap()
        })
        .collect();
    assert_eq!(means, [15, 40, 100]);

    let detail = profile::read_detail(&ws.results("simd_profile_detailed.json")).unwrap();
    assert_eq!(detail.get("A"), Some(&[30, 50][..]));

    assert_eq!(report.summaries.len(), 3);
    let manifest = SweepManifest::load(&ws.config.results_dir).unwrap();
    assert!(manifest.aggregate);
    assert_eq!(manifest.entries.len(), 3);
    assert_eq!(manifest.entry("both").unwrap().modules, ["simd", "threads"]);
    assert_eq!(manifest.entry("both").unwrap().trials, 2);
}

#[test]
fn test_build_failure_stops_sweep_without_clean() {
    let ws = sweep_workspace();
    let program = FakeProgram::with_values([1, 2, 3, 4, 5, 6]);
    let mut build = FakeBuild {
        fail_configure: Some("simd"),
        ..FakeBuild::default()
    };

    let err = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .run(true)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Build);
    assert_eq!(build.log, ["configure baseline", "build", "configure simd"]);
    assert_eq!(program.runs.get(), 2);
    assert!(ws.results("baseline_profile.txt").is_file());
    assert!(!ws.results("simd_profile.txt").exists());
    assert!(!ws.results("both_profile.txt").exists());
    assert!(!ws.results(MANIFEST_FILE).exists());
}

#[test]
fn test_build_step_failure_stops_sweep() {
    let ws = sweep_workspace();
    let program = FakeProgram::with_values([1, 2, 3, 4, 5, 6]);
    let mut build = FakeBuild {
        fail_build: Some("simd"),
        ..FakeBuild::default()
    };

    let err = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .run(true)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Build);
    assert_eq!(err.exit_code(), 4);
    assert_eq!(
        build.log,
        ["configure baseline", "build", "configure simd", "build"]
    );
    assert_eq!(program.runs.get(), 2);
    assert!(ws.results("baseline_profile.txt").is_file());
    assert!(!ws.results("simd_profile.txt").exists());
    assert!(!ws.results(MANIFEST_FILE).exists());
}

#[test]
fn test_single_sweep_without_profile_fails_before_clean() {
    let mut ws = sweep_workspace();
    ws.config.configurations.truncate(2);
    let program = FakeProgram {
        skip_profile: true,
        ..FakeProgram::default()
    };
    let mut build = FakeBuild::default();

    let err = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .run(false)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("baseline"));
    assert_eq!(build.log, ["configure baseline", "build"]);
    assert_eq!(program.runs.get(), 1);
    assert!(!ws.results("baseline_profile.txt").exists());
    assert!(!ws.results(MANIFEST_FILE).exists());
}

#[test]
fn test_empty_sweep_still_cleans() {
    let mut ws = sweep_workspace();
    ws.config.configurations.clear();
    let program = FakeProgram::default();
    let mut build = FakeBuild::default();

    let report = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .run(false)
        .unwrap();

    assert_eq!(build.log, ["clean"]);
    assert!(report.manifest.entries.is_empty());
    assert!(report.manifest_path.is_file());
}

#[test]
fn test_single_sweep_archives_profile_only() {
    let ws = sweep_workspace();
    let program = FakeProgram::with_values([4, 5, 6]);
    let mut build = FakeBuild::default();
    let started = RefCell::new(Vec::new());
    let progress = |index: usize, c: &Configuration| {
        started.borrow_mut().push(format!("{index}:{}", c.id));
    };

    SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .with_progress(&progress)
        .run(false)
        .unwrap();

    assert_eq!(*started.borrow(), ["0:baseline", "1:simd", "2:both"]);
    assert_eq!(program.runs.get(), 3);
    assert_eq!(
        fs::read_to_string(ws.results("simd_profile.txt")).unwrap(),
        "// Verbose: 1\n2\nA 5\nB 10\n"
    );
    assert!(!ws.results("simd_profile_detailed.json").exists());
}

#[test]
fn test_aggregate_preconditions_checked_before_building() {
    let mut ws = sweep_workspace();
    ws.config.profiling = 2;
    let program = FakeProgram::default();
    let mut build = FakeBuild::default();

    let err = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .run(true)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(build.log.is_empty());
}

#[test]
fn test_unknown_module_rejected_before_building() {
    let ws = sweep_workspace();
    let program = FakeProgram::default();
    let mut build = FakeBuild::default();
    let configurations = [
        Configuration::new("ok", ["simd"]),
        Configuration::new("bad", ["gpu"]),
    ];

    let err = SweepDriver::new(&ws.config, &mut build, &program, &ExactMatchValidator)
        .sweep(false, &ws.config.modules, &configurations)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(build.log.is_empty());
}
