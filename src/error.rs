//! Launcher Errors
//!
//! Every failure the launcher can hit before or during submission.
//! Workflow failures themselves are reported by the workflow manager
//! in the scheduler log and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Errors raised while loading configuration, composing, or submitting.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{}': {source}. Check that the file exists and is readable.", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected schema.
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration could not be serialized.
    #[error("Failed to serialize config for '{}': {source}", .path.display())]
    ConfigSerialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration file could not be written.
    #[error("Failed to write config file '{}': {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more required keys are absent or blank.
    #[error("Missing required config key(s): {}", .keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    /// A key is present but its value cannot be used.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Two command-line flags cannot be combined.
    #[error("--{first} cannot be combined with --{second}")]
    ConflictingFlags {
        first: &'static str,
        second: &'static str,
    },

    /// The sample-metadata table is unreadable or inconsistent.
    #[error("Sample sheet '{}': {reason}", .path.display())]
    SampleSheet { path: PathBuf, reason: String },

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The batch scheduler rejected the submission.
    #[error("sbatch exited with status {status:?}: {stderr}")]
    SubmissionFailed { status: Option<i32>, stderr: String },

    /// sbatch succeeded but printed no recognizable job identifier.
    #[error("Could not find a job id in sbatch output: '{output}'")]
    JobIdNotFound { output: String },
}

impl LaunchError {
    /// Wraps an I/O error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for [`LaunchError::InvalidValue`].
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::MissingKeys { .. }
            | Self::InvalidValue { .. }
            | Self::ConflictingFlags { .. } => 2,
            Self::SampleSheet { .. } => 3,
            Self::SubmissionFailed { .. } | Self::JobIdNotFound { .. } => 4,
            Self::ConfigSerialize { .. } | Self::ConfigWrite { .. } | Self::Io { .. } => 1,
        }
    }
}
