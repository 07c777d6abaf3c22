//! Copy and process-execution primitives.
//!
//! The harness never changes its own working directory: a child's working
//! directory is set on the [`Command`] and ends with the child, so the
//! caller's directory is untouched on every exit path.

use crate::result::{HarnessError, HarnessResult};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Copy/exec collaborator used by the trial runner and build system
pub trait Executor {
    /// Copy `src` to `dst`, replacing `dst` if it exists
    fn copy(&self, src: &Path, dst: &Path) -> HarnessResult<()>;

    /// Run `program` with `args`, blocking until it exits.
    ///
    /// Returns [`HarnessError::ExecFailure`] on a non-zero exit status.
    fn exec(&self, program: &Path, args: &[String], work_dir: Option<&Path>) -> HarnessResult<()>;
}

/// Executor backed by the local filesystem and `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Create a new process executor
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Render a command line for logs and error messages
#[must_use]
pub fn render_command(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl Executor for ProcessExecutor {
    fn copy(&self, src: &Path, dst: &Path) -> HarnessResult<()> {
        debug!(from = %src.display(), to = %dst.display(), "copy");
        fs::copy(src, dst)
            .map(|_| ())
            .map_err(|e| HarnessError::CopyFailure {
                from: src.to_path_buf(),
                to: dst.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn exec(&self, program: &Path, args: &[String], work_dir: Option<&Path>) -> HarnessResult<()> {
        let command = render_command(program, args);
        debug!(%command, work_dir = ?work_dir, "exec");

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = work_dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|e| {
            debug!(%command, error = %e, "spawn failed");
            HarnessError::ExecFailure {
                command: format!("{command} ({e})"),
                code: 1,
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(HarnessError::ExecFailure {
                command,
                code: status.code().unwrap_or(1),
            })
        }
    }
}
