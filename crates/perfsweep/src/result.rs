//! Result and error types for Perfsweep.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Coarse classification of a [`HarnessError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Staging a file into the work directory failed
    CopyFailure,
    /// The subordinate process exited with a non-zero status
    ExecFailure,
    /// Output did not match the reference
    ValidationFailure,
    /// Malformed profile or detail file
    Format,
    /// Caller asked for something the harness cannot do
    Precondition,
    /// External configure/build/clean step failed
    Build,
    /// Harness definition is invalid
    Config,
    /// Underlying I/O error
    Io,
}

impl ErrorKind {
    /// Stable lowercase name, used in logs and JSON output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CopyFailure => "copy_failure",
            Self::ExecFailure => "exec_failure",
            Self::ValidationFailure => "validation_failure",
            Self::Format => "format",
            Self::Precondition => "precondition",
            Self::Build => "build",
            Self::Config => "config",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while running the harness
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Copy of a staged file failed
    #[error("Failed to copy {} to {}: {message}", from.display(), to.display())]
    CopyFailure {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Error message
        message: String,
    },

    /// Subordinate process failed
    #[error("Command `{command}` failed with exit code {code}")]
    ExecFailure {
        /// Rendered command line
        command: String,
        /// Exit code (1 when the process was killed by a signal or never started)
        code: i32,
    },

    /// Output mismatch against the reference
    #[error("Validation failed: {message}")]
    ValidationFailure {
        /// Validator diagnostic
        message: String,
    },

    /// Malformed profile data
    #[error("Invalid profile format in {}: {message}", path.display())]
    Format {
        /// File being parsed
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Precondition violated before any work started
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Error message
        message: String,
    },

    /// Build step failed
    #[error("Build step `{step}` failed: {message}")]
    Build {
        /// Step name (configure, build, clean)
        step: String,
        /// Error message
        message: String,
        /// Exit code of the failed command (1 when it has none)
        code: i32,
    },

    /// Harness configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Create a validation failure
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
        }
    }

    /// Create a format error for the given file
    #[must_use]
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a precondition error
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create a build step error
    #[must_use]
    pub fn build(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Build {
            step: step.into(),
            message: message.into(),
            code: 1,
        }
    }

    /// Wrap the failure of a build command, keeping its exit code
    #[must_use]
    pub fn build_step(step: impl Into<String>, cause: &Self) -> Self {
        Self::Build {
            step: step.into(),
            message: cause.to_string(),
            code: cause.exit_code(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CopyFailure { .. } => ErrorKind::CopyFailure,
            Self::ExecFailure { .. } => ErrorKind::ExecFailure,
            Self::ValidationFailure { .. } => ErrorKind::ValidationFailure,
            Self::Format { .. } | Self::Json(_) => ErrorKind::Format,
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Build { .. } => ErrorKind::Build,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Process exit status for this failure.
    ///
    /// A failed child process (trial executable or build command)
    /// propagates its own code unchanged; every other failure maps to 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ExecFailure { code, .. } | Self::Build { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}
