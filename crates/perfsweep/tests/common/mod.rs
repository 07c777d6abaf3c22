//! Shared fakes for the integration tests

#![allow(dead_code)]

use perfsweep::{BuildRequest, BuildSystem, Executor, HarnessConfig, HarnessError, HarnessResult};
use perfsweep::{PROFILE_FILE, WorkDirPolicy};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in for the instrumented executable.
///
/// Each exec pops the next value `v` and leaves a profile with `A v` and
/// `B 2v` in its working directory, then echoes the input as output. With
/// `skip_profile` set it echoes the input but leaves no profile.
#[derive(Default)]
pub struct FakeProgram {
    pub values: RefCell<VecDeque<i64>>,
    pub runs: Cell<usize>,
    pub fail_on_run: Option<usize>,
    pub corrupt_output: bool,
    pub skip_profile: bool,
}

impl FakeProgram {
    pub fn with_values(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: RefCell::new(values.into_iter().collect()),
            ..Self::default()
        }
    }
}

impl Executor for FakeProgram {
    fn copy(&self, src: &Path, dst: &Path) -> HarnessResult<()> {
        fs::copy(src, dst)?;
        Ok(())
    }

    fn exec(&self, program: &Path, args: &[String], work_dir: Option<&Path>) -> HarnessResult<()> {
        let run = self.runs.get() + 1;
        self.runs.set(run);
        if self.fail_on_run == Some(run) {
            return Err(HarnessError::ExecFailure {
                command: program.display().to_string(),
                code: 3,
            });
        }

        let dir = work_dir.expect("trials run inside a work dir");
        let v = self.values.borrow_mut().pop_front().unwrap_or_default();
        if !self.skip_profile {
            fs::write(
                dir.join(PROFILE_FILE),
                format!("// Verbose: 1\n2\nA {v}\nB {}\n", v * 2),
            )?;
        }

        let input = fs::read_to_string(dir.join(&args[0]))?;
        let output = if self.corrupt_output {
            format!("{input}garbage\n")
        } else {
            input
        };
        fs::write(dir.join(&args[1]), output)?;
        Ok(())
    }
}

/// Build system that only records what it was asked to do.
///
/// `fail_configure` and `fail_build` name the configuration whose configure
/// or build step fails; a failed build exits with code 4.
#[derive(Default)]
pub struct FakeBuild {
    pub log: Vec<String>,
    pub fail_configure: Option<&'static str>,
    pub fail_build: Option<&'static str>,
    pub current: Option<String>,
}

impl BuildSystem for FakeBuild {
    fn configure(&mut self, request: &BuildRequest) -> HarnessResult<()> {
        self.log.push(format!("configure {}", request.configuration));
        self.current = Some(request.configuration.clone());
        if self.fail_configure == Some(request.configuration.as_str()) {
            return Err(HarnessError::build("configure", "exit status 1"));
        }
        Ok(())
    }

    fn build(&mut self) -> HarnessResult<()> {
        self.log.push("build".into());
        if self.fail_build.is_some() && self.fail_build == self.current.as_deref() {
            let cause = HarnessError::ExecFailure {
                command: "make".into(),
                code: 4,
            };
            return Err(HarnessError::build_step("build", &cause));
        }
        Ok(())
    }

    fn clean(&mut self) -> HarnessResult<()> {
        self.log.push("clean".into());
        Ok(())
    }
}

/// Temp layout with an input payload and a matching reference
pub struct Workspace {
    pub temp: TempDir,
    pub config: HarnessConfig,
}

impl Workspace {
    pub fn new(policy: WorkDirPolicy) -> Self {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("input.txt");
        let reference = temp.path().join("reference.txt");
        fs::write(&input, "1 0 1\n0 1 1\n").unwrap();
        fs::write(&reference, "1 0 1\n0 1 1\n").unwrap();

        let config = HarnessConfig::new(temp.path().join("program"), temp.path().join("work"), input)
            .with_reference(reference)
            .with_results_dir(temp.path().join("results"))
            .with_work_dir_policy(policy);
        Self { temp, config }
    }

    pub fn results(&self, name: &str) -> PathBuf {
        self.config.results_dir.join(name)
    }
}
