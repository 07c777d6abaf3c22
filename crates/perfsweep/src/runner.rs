//! Single-trial execution: stage input, run the executable, validate output.

use crate::exec::Executor;
use crate::result::{HarnessError, HarnessResult};
use crate::validator::Validator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// Name the input payload is staged under
pub const INPUT_FILE: &str = "input_data.txt";

/// Name the executable writes its functional output to
pub const OUTPUT_FILE: &str = "output_data.txt";

/// Where each trial runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkDirPolicy {
    /// Each trial gets `work_dir/trial-<n>`
    #[default]
    Isolated,
    /// Every trial reuses `work_dir`; ordering relies on the phase barrier
    Shared,
}

impl WorkDirPolicy {
    /// Working directory for trial `trial` (1-based)
    #[must_use]
    pub fn trial_dir(self, base: &Path, trial: usize) -> PathBuf {
        match self {
            Self::Isolated => base.join(format!("trial-{trial}")),
            Self::Shared => base.to_path_buf(),
        }
    }
}

/// Runs the target executable once against an input payload
#[derive(Clone, Copy)]
pub struct TrialRunner<'a> {
    executor: &'a dyn Executor,
    validator: &'a dyn Validator,
}

impl std::fmt::Debug for TrialRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialRunner").finish_non_exhaustive()
    }
}

impl<'a> TrialRunner<'a> {
    /// Create a runner over the given collaborators
    #[must_use]
    pub fn new(executor: &'a dyn Executor, validator: &'a dyn Validator) -> Self {
        Self {
            executor,
            validator,
        }
    }

    /// Run one trial.
    ///
    /// Steps run in order and the first failure is returned: stage the
    /// input as `work_dir/input_data.txt`, run
    /// `<executable> input_data.txt output_data.txt` inside `work_dir`, then
    /// validate `work_dir/output_data.txt` when a reference is given. Any
    /// validator error comes back as [`HarnessError::ValidationFailure`].
    pub fn run(
        &self,
        input: &Path,
        executable: &Path,
        work_dir: &Path,
        reference: Option<&Path>,
    ) -> HarnessResult<()> {
        let start = Instant::now();
        fs::create_dir_all(work_dir)?;

        info!(work_dir = %work_dir.display(), "creating environment");
        self.executor.copy(input, &work_dir.join(INPUT_FILE))?;

        // A relative program path must not be resolved against the child's directory
        let program = fs::canonicalize(executable).unwrap_or_else(|_| executable.to_path_buf());
        info!(executable = %program.display(), "working");
        self.executor.exec(
            &program,
            &[INPUT_FILE.to_string(), OUTPUT_FILE.to_string()],
            Some(work_dir),
        )?;

        if let Some(reference) = reference {
            info!(reference = %reference.display(), "reference checking");
            if let Err(e) = self.validator.validate(reference, &work_dir.join(OUTPUT_FILE)) {
                let message = match e {
                    HarnessError::ValidationFailure { message } => message,
                    other => other.to_string(),
                };
                error!(%message, "output does not match reference");
                return Err(HarnessError::validation(message));
            }
            info!("everything is ok");
        }

        info!(elapsed_ms = start.elapsed().as_millis() as u64, "trial finished");
        Ok(())
    }
}
