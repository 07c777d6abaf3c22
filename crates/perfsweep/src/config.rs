//! Harness definition loaded from `perfsweep.yaml`.
//!
//! ```yaml
//! executable: build_tests/uim_program
//! work_dir: build_tests
//! results_dir: build
//! input_file: data/input.txt
//! reference_file: data/reference.txt
//! profiling: 1
//! passes: 5
//! modules: [irredundant_vector, different_matrices]
//! configurations:
//!   - id: baseline
//!     modules: []
//!   - id: vector
//!     modules: [irredundant_vector]
//! build:
//!   configure: { program: ./waf, args: [configure] }
//!   build: { program: ./waf, args: [build] }
//!   clean: { program: ./waf, args: [distclean] }
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use crate::result::{HarnessError, HarnessResult};
use crate::runner::WorkDirPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Default harness file name
pub const DEFAULT_CONFIG_FILE: &str = "perfsweep.yaml";

/// Default number of trials for an aggregate pass
pub const DEFAULT_PASSES: usize = 5;

/// True when `id` can name archived files: not empty, no path separators,
/// no leading `.`
#[must_use]
pub fn is_archive_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && !id.starts_with('.')
}

/// Closed set of build module flags a configuration may enable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleSchema {
    modules: Vec<String>,
}

impl ModuleSchema {
    /// Create a schema, rejecting duplicate or empty names
    pub fn new<S: Into<String>>(modules: impl IntoIterator<Item = S>) -> HarnessResult<Self> {
        let schema = Self {
            modules: modules.into_iter().map(Into::into).collect(),
        };
        schema.check()?;
        Ok(schema)
    }

    fn check(&self) -> HarnessResult<()> {
        let mut seen = HashSet::new();
        for name in &self.modules {
            if name.trim().is_empty() {
                return Err(HarnessError::config("module names must not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(HarnessError::config(format!(
                    "module `{name}` is declared twice"
                )));
            }
        }
        Ok(())
    }

    /// Module names in declaration order
    #[must_use]
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// True when `name` belongs to the schema
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }

    /// Reject configurations that enable modules outside the schema
    pub fn validate(&self, configuration: &Configuration) -> HarnessResult<()> {
        for module in &configuration.modules {
            if !self.contains(module) {
                return Err(HarnessError::config(format!(
                    "configuration `{}` enables unknown module `{module}` (known: {})",
                    configuration.id,
                    self.modules.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// A named set of enabled build modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Identifier, used to name archived artifacts
    pub id: String,
    /// Enabled modules
    #[serde(default)]
    pub modules: BTreeSet<String>,
}

impl Configuration {
    /// Create a configuration
    #[must_use]
    pub fn new<S: Into<String>>(id: impl Into<String>, modules: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: id.into(),
            modules: modules.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `module` is enabled
    #[must_use]
    pub fn enables(&self, module: &str) -> bool {
        self.modules.contains(module)
    }
}

/// A program plus leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to run
    pub program: PathBuf,
    /// Arguments placed before any generated ones
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command spec
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Commands driving the external build system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommands {
    /// Configure step; receives the module toggles
    pub configure: CommandSpec,
    /// Build step
    pub build: CommandSpec,
    /// Full environment reset after a sweep
    pub clean: CommandSpec,
    /// Directory the commands run in
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

/// Complete harness definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Executable produced by the build
    pub executable: PathBuf,
    /// Directory trials run in
    pub work_dir: PathBuf,
    /// Directory summary/detail reports and archives are written to
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Input payload staged for every trial
    pub input_file: PathBuf,
    /// Reference output for validated runs
    #[serde(default)]
    pub reference_file: Option<PathBuf>,
    /// Profiling level the executable is built with
    #[serde(default)]
    pub profiling: u8,
    /// Trials per aggregate pass
    #[serde(default = "default_passes")]
    pub passes: usize,
    /// Per-trial working directory layout
    #[serde(default)]
    pub work_dir_policy: WorkDirPolicy,
    /// Module flags configurations may toggle
    #[serde(default)]
    pub modules: ModuleSchema,
    /// Sweep entries, in run order
    #[serde(default)]
    pub configurations: Vec<Configuration>,
    /// External build commands (required for sweeps)
    #[serde(default)]
    pub build: Option<BuildCommands>,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

const fn default_passes() -> usize {
    DEFAULT_PASSES
}

impl HarnessConfig {
    /// Minimal definition for a single executable
    #[must_use]
    pub fn new(
        executable: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        input_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            work_dir: work_dir.into(),
            results_dir: default_results_dir(),
            input_file: input_file.into(),
            reference_file: None,
            profiling: 0,
            passes: DEFAULT_PASSES,
            work_dir_policy: WorkDirPolicy::default(),
            modules: ModuleSchema::default(),
            configurations: Vec::new(),
            build: None,
        }
    }

    /// Load, resolve and validate a harness file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse and validate YAML text without resolving paths
    pub fn from_yaml(content: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml_ng::from_str(content)
            .map_err(|e| HarnessError::config(format!("invalid harness file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() && !base.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.executable);
        join(&mut self.work_dir);
        join(&mut self.results_dir);
        join(&mut self.input_file);
        if let Some(reference) = self.reference_file.as_mut() {
            join(reference);
        }
        if let Some(build) = self.build.as_mut() {
            if let Some(dir) = build.work_dir.as_mut() {
                join(dir);
            }
        }
    }

    /// Check the schema and every configuration against it.
    ///
    /// Ids must pass [`is_archive_id`] and be unique.
    pub fn validate(&self) -> HarnessResult<()> {
        self.modules.check()?;

        let mut ids = HashSet::new();
        for configuration in &self.configurations {
            let id = configuration.id.as_str();
            if !is_archive_id(id) {
                return Err(HarnessError::config(format!(
                    "configuration id `{id}` cannot be used as a file name"
                )));
            }
            if !ids.insert(id) {
                return Err(HarnessError::config(format!(
                    "configuration `{id}` is declared twice"
                )));
            }
            self.modules.validate(configuration)?;
        }
        Ok(())
    }

    /// Set the trial count
    #[must_use]
    pub const fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    /// Set the reference file
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<PathBuf>) -> Self {
        self.reference_file = Some(reference.into());
        self
    }

    /// Set the results directory
    #[must_use]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Set the working directory policy
    #[must_use]
    pub const fn with_work_dir_policy(mut self, policy: WorkDirPolicy) -> Self {
        self.work_dir_policy = policy;
        self
    }

    /// Set the profiling level
    #[must_use]
    pub const fn with_profiling(mut self, level: u8) -> Self {
        self.profiling = level;
        self
    }
}
