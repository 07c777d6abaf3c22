//! Configuration sweeps.
//!
//! For every configuration, in order: configure and build the target with
//! that configuration's modules, run one pass, and archive the pass's
//! reports under `<id>_profile.txt` / `<id>_profile_detailed.json`. A
//! successful sweep ends with a manifest and a full clean of the build.
//! Any failure stops the sweep immediately, including a pass that left no
//! profile to archive; artifacts already archived for earlier
//! configurations stay on disk.

use crate::aggregator::AggregateSummary;
use crate::build::{BuildOptions, BuildRequest, BuildSystem};
use crate::config::{Configuration, HarnessConfig, ModuleSchema};
use crate::exec::Executor;
use crate::pipeline::{check_aggregate_preconditions, PassOutcome, Pipeline};
use crate::profile::PROFILE_FILE;
use crate::result::{HarnessError, HarnessResult};
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Manifest file written at the end of a sweep
pub const MANIFEST_FILE: &str = "sweep_manifest.json";

/// Archived reports for one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepArtifacts {
    /// Configuration identifier
    pub configuration: String,
    /// Enabled modules
    pub modules: Vec<String>,
    /// Archived profile (`<id>_profile.txt`)
    pub profile: Option<PathBuf>,
    /// Archived detail report (`<id>_profile_detailed.json`)
    pub detail: Option<PathBuf>,
    /// Trials behind the profile
    pub trials: usize,
}

/// Index of a finished sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepManifest {
    /// When the sweep finished
    pub generated_at: DateTime<Utc>,
    /// Whether passes were aggregated
    pub aggregate: bool,
    /// Archived entries in sweep order
    pub entries: Vec<SweepArtifacts>,
}

impl SweepManifest {
    /// Read a manifest from `results_dir`
    pub fn load(results_dir: &Path) -> HarnessResult<Self> {
        let path = results_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| HarnessError::format(path, e.to_string()))
    }

    /// Look up one configuration's entry
    #[must_use]
    pub fn entry(&self, configuration: &str) -> Option<&SweepArtifacts> {
        self.entries.iter().find(|e| e.configuration == configuration)
    }
}

/// Archive name for a configuration's profile
#[must_use]
pub fn archived_profile_name(id: &str) -> String {
    format!("{id}_profile.txt")
}

/// Archive name for a configuration's detail report
#[must_use]
pub fn archived_detail_name(id: &str) -> String {
    format!("{id}_profile_detailed.json")
}

/// Outcome of a full sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Manifest written to the results directory
    pub manifest: SweepManifest,
    /// Where the manifest was written
    pub manifest_path: PathBuf,
    /// Summaries in sweep order (aggregate sweeps only)
    pub summaries: Vec<(String, AggregateSummary)>,
}

/// Drives build + pass + archive for a list of configurations
pub struct SweepDriver<'a> {
    config: &'a HarnessConfig,
    build: &'a mut dyn BuildSystem,
    executor: &'a dyn Executor,
    validator: &'a dyn Validator,
    on_configuration: Option<&'a dyn Fn(usize, &Configuration)>,
}

impl std::fmt::Debug for SweepDriver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepDriver")
            .field("results_dir", &self.config.results_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> SweepDriver<'a> {
    /// Create a driver
    pub fn new(
        config: &'a HarnessConfig,
        build: &'a mut dyn BuildSystem,
        executor: &'a dyn Executor,
        validator: &'a dyn Validator,
    ) -> Self {
        Self {
            config,
            build,
            executor,
            validator,
            on_configuration: None,
        }
    }

    /// Callback invoked before each configuration is built
    #[must_use]
    pub fn with_progress(mut self, callback: &'a dyn Fn(usize, &Configuration)) -> Self {
        self.on_configuration = Some(callback);
        self
    }

    /// Sweep the configurations listed in the harness definition
    pub fn run(&mut self, aggregate: bool) -> HarnessResult<SweepReport> {
        let config = self.config;
        self.sweep(aggregate, &config.modules, &config.configurations)
    }

    /// Build, run and archive each configuration in order, then clean.
    ///
    /// The clean step also runs for an empty configuration list, but never
    /// after a failure.
    pub fn sweep(
        &mut self,
        aggregate: bool,
        schema: &ModuleSchema,
        configurations: &[Configuration],
    ) -> HarnessResult<SweepReport> {
        let cfg = self.config;
        if aggregate {
            check_aggregate_preconditions(cfg.passes, cfg.profiling)?;
        }
        for configuration in configurations {
            schema.validate(configuration)?;
        }

        let options = BuildOptions {
            input_file: Some(cfg.input_file.clone()),
            reference_file: cfg.reference_file.clone(),
            profiling: cfg.profiling,
        };
        fs::create_dir_all(&cfg.results_dir)?;

        let mut entries = Vec::with_capacity(configurations.len());
        let mut summaries = Vec::new();

        for (index, configuration) in configurations.iter().enumerate() {
            if let Some(callback) = self.on_configuration {
                callback(index, configuration);
            }
            info!(configuration = %configuration.id, "testing build");

            let request = BuildRequest::for_configuration(schema, configuration, &options)?;
            self.build.configure(&request)?;
            self.build.build()?;

            let pipeline = Pipeline::new(cfg, self.executor, self.validator);
            let outcome = if aggregate {
                pipeline.run_aggregate(cfg.passes)?
            } else {
                pipeline.run_single()?
            };

            let entry = self.archive(configuration, &outcome)?;
            if let Some(summary) = outcome.summary {
                summaries.push((configuration.id.clone(), summary));
            }
            entries.push(entry);
        }

        let manifest = SweepManifest {
            generated_at: Utc::now(),
            aggregate,
            entries,
        };
        let manifest_path = cfg.results_dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        info!("cleaning build environment");
        self.build.clean()?;

        Ok(SweepReport {
            manifest,
            manifest_path,
            summaries,
        })
    }

    fn archive(
        &self,
        configuration: &Configuration,
        outcome: &PassOutcome,
    ) -> HarnessResult<SweepArtifacts> {
        let dir = &self.config.results_dir;
        let id = configuration.id.as_str();

        let profile = match outcome.summary_path {
            Some(ref source) => {
                let target = dir.join(archived_profile_name(id));
                self.executor.copy(source, &target)?;
                Some(target)
            }
            None => {
                warn!(configuration = id, "no profile to archive");
                return Err(HarnessError::format(
                    dir.join(PROFILE_FILE),
                    format!("configuration `{id}` left no profile to archive"),
                ));
            }
        };

        let detail = match outcome.detail_path {
            Some(ref source) => {
                let target = dir.join(archived_detail_name(id));
                self.executor.copy(source, &target)?;
                Some(target)
            }
            None => None,
        };

        info!(configuration = id, "artifacts archived");
        Ok(SweepArtifacts {
            configuration: configuration.id.clone(),
            modules: configuration.modules.iter().cloned().collect(),
            profile,
            detail,
            trials: outcome.trials,
        })
    }
}
