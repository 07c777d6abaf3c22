//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for one CLI command.
//! Harness loading and validator selection are shared here.

pub mod perf;
pub mod run;
pub mod serve;
pub mod sweep;

pub use perf::execute_perf;
pub use run::execute_run;
pub use serve::{execute_serve, router};
pub use sweep::execute_sweep;

use crate::commands::HarnessArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use perfsweep::{
    CommandValidator, ExactMatchValidator, HarnessConfig, Validator, WorkDirPolicy,
    DEFAULT_CONFIG_FILE,
};
use std::path::PathBuf;
use tracing::debug;

/// Load the harness file (explicit, or `./perfsweep.yaml` when present) and
/// apply command-line overrides.
///
/// Without a harness file, `--executable`, `--work-dir` and `--input` are
/// required.
pub fn load_harness(args: &HarnessArgs) -> CliResult<HarnessConfig> {
    let path = args.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    });

    let mut harness = if let Some(path) = path {
        debug!(path = %path.display(), "loading harness file");
        HarnessConfig::load(&path)?
    } else {
        let (Some(executable), Some(work_dir), Some(input)) =
            (&args.executable, &args.work_dir, &args.input)
        else {
            return Err(CliError::config(format!(
                "no {DEFAULT_CONFIG_FILE} found; pass --config, or --executable, --work-dir and --input"
            )));
        };
        HarnessConfig::new(executable.clone(), work_dir.clone(), input.clone())
    };

    apply_overrides(&mut harness, args);
    harness.validate()?;
    Ok(harness)
}

fn apply_overrides(harness: &mut HarnessConfig, args: &HarnessArgs) {
    if let Some(ref executable) = args.executable {
        harness.executable.clone_from(executable);
    }
    if let Some(ref work_dir) = args.work_dir {
        harness.work_dir.clone_from(work_dir);
    }
    if let Some(ref input) = args.input {
        harness.input_file.clone_from(input);
    }
    if let Some(ref reference) = args.reference {
        harness.reference_file = Some(reference.clone());
    }
    if let Some(ref results) = args.results {
        harness.results_dir.clone_from(results);
    }
    if let Some(level) = args.profiling {
        harness.profiling = level;
    }
    if args.shared_work_dir {
        harness.work_dir_policy = WorkDirPolicy::Shared;
    }
}

/// Exact line comparison unless an external validator was requested
#[must_use]
pub fn make_validator(args: &HarnessArgs) -> Box<dyn Validator> {
    match args.validator {
        Some(ref program) => Box::new(CommandValidator::new(program.clone())),
        None => Box::new(ExactMatchValidator),
    }
}

/// Reporter honouring the CLI's colour and quiet settings
#[must_use]
pub fn reporter(config: &CliConfig) -> ProgressReporter {
    ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_without_harness_file() {
        let args = HarnessArgs {
            executable: Some("prog".into()),
            work_dir: Some("work".into()),
            input: Some("in.txt".into()),
            shared_work_dir: true,
            profiling: Some(1),
            ..HarnessArgs::default()
        };
        let harness = load_harness(&args).unwrap();
        assert_eq!(harness.executable, PathBuf::from("prog"));
        assert_eq!(harness.work_dir_policy, WorkDirPolicy::Shared);
        assert_eq!(harness.profiling, 1);
        assert!(harness.reference_file.is_none());
    }

    #[test]
    fn test_missing_required_flags() {
        let args = HarnessArgs {
            config: None,
            executable: Some("prog".into()),
            ..HarnessArgs::default()
        };
        // Only fails when no perfsweep.yaml sits in the test's working directory
        if !PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            let err = load_harness(&args).unwrap_err();
            assert!(err.to_string().contains("--work-dir"));
        }
    }

    #[test]
    fn test_overrides_win_over_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("harness.yaml");
        fs::write(
            &path,
            "executable: a\nwork_dir: w\ninput_file: i\nreference_file: r\n",
        )
        .unwrap();

        let args = HarnessArgs {
            config: Some(path),
            results: Some("/tmp/elsewhere".into()),
            reference: Some("/data/ref.txt".into()),
            ..HarnessArgs::default()
        };
        let harness = load_harness(&args).unwrap();
        assert_eq!(harness.executable, temp.path().join("a"));
        assert_eq!(harness.results_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(harness.reference_file, Some(PathBuf::from("/data/ref.txt")));
    }

    #[test]
    fn test_bad_harness_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("harness.yaml");
        fs::write(&path, "executable: [").unwrap();
        let args = HarnessArgs {
            config: Some(path),
            ..HarnessArgs::default()
        };
        assert!(load_harness(&args)
            .unwrap_err()
            .to_string()
            .contains("Configuration error"));
    }
}
