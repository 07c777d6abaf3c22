//! Output validation against a reference file.

use crate::exec::{Executor, ProcessExecutor};
use crate::result::{HarnessError, HarnessResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Checks a trial's output against a reference
pub trait Validator {
    /// Return `Ok(())` when `output` matches `reference`, otherwise an
    /// error with a human-readable diagnostic
    fn validate(&self, reference: &Path, output: &Path) -> HarnessResult<()>;
}

/// Line-by-line comparison; trailing whitespace on each line is ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchValidator;

impl Validator for ExactMatchValidator {
    fn validate(&self, reference: &Path, output: &Path) -> HarnessResult<()> {
        let expected = read(reference, "reference")?;
        let actual = read(output, "output")?;

        let mut expected_lines = expected.lines().map(str::trim_end);
        let mut actual_lines = actual.lines().map(str::trim_end);
        let mut line_no = 0usize;

        loop {
            line_no += 1;
            match (expected_lines.next(), actual_lines.next()) {
                (None, None) => return Ok(()),
                (Some(e), Some(a)) if e == a => {}
                (Some(e), Some(a)) => {
                    return Err(HarnessError::validation(format!(
                        "line {line_no} differs: expected `{e}`, got `{a}`"
                    )))
                }
                (Some(e), None) => {
                    return Err(HarnessError::validation(format!(
                        "output ends at line {}, reference continues with `{e}`",
                        line_no - 1
                    )))
                }
                (None, Some(a)) => {
                    return Err(HarnessError::validation(format!(
                        "output has extra line {line_no}: `{a}`"
                    )))
                }
            }
        }
    }
}

fn read(path: &Path, what: &str) -> HarnessResult<String> {
    fs::read_to_string(path).map_err(|e| {
        HarnessError::validation(format!("cannot read {what} {}: {e}", path.display()))
    })
}

/// Delegates to an external program invoked as `<program> <args..> <reference> <output>`
#[derive(Debug, Clone)]
pub struct CommandValidator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandValidator {
    /// Create a validator for the given program
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add leading arguments
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl Validator for CommandValidator {
    fn validate(&self, reference: &Path, output: &Path) -> HarnessResult<()> {
        let mut args = self.args.clone();
        args.push(reference.display().to_string());
        args.push(output.display().to_string());

        ProcessExecutor::new()
            .exec(&self.program, &args, None)
            .map_err(|e| HarnessError::validation(e.to_string()))
    }
}
