//! Working Directory State
//!
//! The workflow manager keeps its locks and incomplete-job markers under
//! `.snakemake/` in the working directory. The launcher only looks at
//! them: clearing a lock is the workflow manager's job (`--unlock`).
//!
//! Each successful submission is also appended to
//! `{results}/logs/submissions.jsonl` so that a job id can be traced back
//! to the exact command that produced it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, Result};
use crate::execution::RunOptions;

/// Metadata directory of the workflow manager.
pub const METADATA_DIR: &str = ".snakemake";

/// File name of the submission history inside the log directory.
pub const HISTORY_FILE: &str = "submissions.jsonl";

/// What the workflow manager left behind in a working directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkdirState {
    /// Lock files under `.snakemake/locks`
    pub locks: Vec<PathBuf>,
    /// Markers under `.snakemake/incomplete`
    pub incomplete: Vec<PathBuf>,
}

impl WorkdirState {
    pub fn is_locked(&self) -> bool {
        !self.locks.is_empty()
    }

    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }
}

/// Lists locks and incomplete markers in `workdir`.
///
/// A missing `.snakemake` directory means a fresh working directory.
pub fn inspect_workdir(workdir: impl AsRef<Path>) -> Result<WorkdirState> {
    let metadata = workdir.as_ref().join(METADATA_DIR);

    let state = WorkdirState {
        locks: list_entries(&metadata.join("locks"))?,
        incomplete: list_entries(&metadata.join("incomplete"))?,
    };

    debug!(
        "Workdir state: {} lock(s), {} incomplete marker(s)",
        state.locks.len(),
        state.incomplete.len()
    );
    Ok(state)
}

fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| LaunchError::io(format!("Failed to read {}", dir.display()), e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| LaunchError::io(format!("Failed to read {}", dir.display()), e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// One submitted launcher job.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SubmissionRecord {
    pub submitted_at: DateTime<Local>,
    pub job_id: String,
    pub config_path: String,
    pub command: String,
    pub dry_run: bool,
    pub unlock: bool,
    pub force: bool,
    pub dag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl SubmissionRecord {
    /// Creates a record stamped with the current local time.
    pub fn new(
        job_id: impl Into<String>,
        config_path: impl Into<String>,
        command: impl Into<String>,
        options: &RunOptions,
    ) -> Self {
        Self {
            submitted_at: Local::now(),
            job_id: job_id.into(),
            config_path: config_path.into(),
            command: command.into(),
            dry_run: options.dry_run,
            unlock: options.unlock,
            force: options.force,
            dag: options.dag,
            rule: options.rule.clone(),
        }
    }

    /// Appends the record as one JSON line to `log_dir/submissions.jsonl`.
    pub fn append(&self, log_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)
            .map_err(|e| LaunchError::io(format!("Failed to create {}", log_dir.display()), e))?;

        let history = log_dir.join(HISTORY_FILE);
        let line = serde_json::to_string(self).map_err(|e| {
            LaunchError::io(
                "Failed to encode submission record",
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&history)
            .map_err(|e| LaunchError::io(format!("Failed to open {}", history.display()), e))?;
        writeln!(file, "{}", line)
            .map_err(|e| LaunchError::io(format!("Failed to write {}", history.display()), e))?;

        info!("Recorded submission in {}", history.display());
        Ok(history)
    }
}

/// Reads every record from a submission history, oldest first.
pub fn load_history(log_dir: impl AsRef<Path>) -> Result<Vec<SubmissionRecord>> {
    let history = log_dir.as_ref().join(HISTORY_FILE);
    if !history.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&history)
        .map_err(|e| LaunchError::io(format!("Failed to read {}", history.display()), e))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                LaunchError::io(
                    format!("Corrupt entry in {}", history.display()),
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                )
            })
        })
        .collect()
}
