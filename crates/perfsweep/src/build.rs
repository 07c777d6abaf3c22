//! External build system boundary.
//!
//! Each sweep entry is turned into an immutable [`BuildRequest`] that is
//! handed straight to [`BuildSystem::configure`]; nothing about the
//! requested configuration lives in shared state between builds.

use crate::config::{BuildCommands, CommandSpec, Configuration, ModuleSchema};
use crate::exec::{render_command, Executor, ProcessExecutor};
use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Everything the build needs to know about one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Configuration identifier
    pub configuration: String,
    /// Every schema module and whether it is enabled, in schema order
    pub modules: Vec<(String, bool)>,
    /// Input payload path
    pub input_file: Option<PathBuf>,
    /// Reference output path
    pub reference_file: Option<PathBuf>,
    /// Profiling level
    pub profiling: u8,
}

impl BuildRequest {
    /// Derive a request for `configuration`; fails when it enables a
    /// module outside `schema`
    pub fn for_configuration(
        schema: &ModuleSchema,
        configuration: &Configuration,
        options: &BuildOptions,
    ) -> HarnessResult<Self> {
        schema.validate(configuration)?;
        Ok(Self {
            configuration: configuration.id.clone(),
            modules: schema
                .modules()
                .iter()
                .map(|m| (m.clone(), configuration.enables(m)))
                .collect(),
            input_file: options.input_file.clone(),
            reference_file: options.reference_file.clone(),
            profiling: options.profiling,
        })
    }

    /// Names of the switched-on modules, in schema order
    pub fn enabled_modules(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .filter(|(_, on)| *on)
            .map(|(m, _)| m.as_str())
    }

    /// Command-line flags for the configure step.
    ///
    /// Modules become `--<name>` or `--no-<name>`; file and level options
    /// are passed as `--input-file=`, `--reference-file=` and `--profiling=`.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .modules
            .iter()
            .map(|(name, on)| {
                if *on {
                    format!("--{name}")
                } else {
                    format!("--no-{name}")
                }
            })
            .collect();
        if let Some(ref input) = self.input_file {
            args.push(format!("--input-file={}", input.display()));
        }
        if let Some(ref reference) = self.reference_file {
            args.push(format!("--reference-file={}", reference.display()));
        }
        args.push(format!("--profiling={}", self.profiling));
        args
    }
}

/// Options shared by every configuration of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Input payload path
    pub input_file: Option<PathBuf>,
    /// Reference output path
    pub reference_file: Option<PathBuf>,
    /// Profiling level
    pub profiling: u8,
}

/// Opaque configure/build/clean collaborator
pub trait BuildSystem {
    /// Prepare a build for the requested configuration
    fn configure(&mut self, request: &BuildRequest) -> HarnessResult<()>;

    /// Produce the executable
    fn build(&mut self) -> HarnessResult<()>;

    /// Remove all build artifacts
    fn clean(&mut self) -> HarnessResult<()>;
}

/// Build system driven by external commands
#[derive(Debug, Clone)]
pub struct CommandBuildSystem<E = ProcessExecutor> {
    commands: BuildCommands,
    executor: E,
}

impl CommandBuildSystem {
    /// Create a build system running `commands` as local processes
    #[must_use]
    pub fn new(commands: BuildCommands) -> Self {
        Self::with_executor(commands, ProcessExecutor::new())
    }
}

impl<E: Executor> CommandBuildSystem<E> {
    /// Create a build system with a custom executor
    #[must_use]
    pub fn with_executor(commands: BuildCommands, executor: E) -> Self {
        Self { commands, executor }
    }

    fn run_step(&self, step: &str, spec: &CommandSpec, extra: Vec<String>) -> HarnessResult<()> {
        let mut args = spec.args.clone();
        args.extend(extra);
        let command = render_command(&spec.program, &args);
        info!(step, %command, "build step");

        let start = Instant::now();
        self.executor
            .exec(&spec.program, &args, self.commands.work_dir.as_deref())
            .map_err(|e| HarnessError::build_step(step, &e))?;
        info!(step, elapsed_ms = start.elapsed().as_millis() as u64, "build step finished");
        Ok(())
    }
}

impl<E: Executor> BuildSystem for CommandBuildSystem<E> {
    fn configure(&mut self, request: &BuildRequest) -> HarnessResult<()> {
        let enabled: Vec<&str> = request.enabled_modules().collect();
        info!(configuration = %request.configuration, modules = ?enabled, "configuring");
        self.run_step("configure", &self.commands.configure, request.to_args())
    }

    fn build(&mut self) -> HarnessResult<()> {
        self.run_step("build", &self.commands.build, Vec::new())
    }

    fn clean(&mut self) -> HarnessResult<()> {
        self.run_step("clean", &self.commands.clean, Vec::new())
    }
}
