//! Job Submission
//!
//! Runs the composed `sbatch` call and extracts the batch job id.

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, error, info};

use super::sbatch::SubmitCommand;
use crate::error::{LaunchError, Result};

/// Identifier SLURM assigns to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the job id from sbatch output.
///
/// Understands the default `Submitted batch job 123` line as well as the
/// `--parsable` form `123` or `123;cluster`.
pub fn parse_job_id(stdout: &str) -> Option<JobId> {
    let is_id = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    for line in stdout.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Submitted batch job") {
            if let Some(id) = rest.split_whitespace().next().filter(|&id| is_id(id)) {
                return Some(JobId(id.to_string()));
            }
        }

        let first = line.split(';').next().unwrap_or_default();
        if is_id(first) {
            return Some(JobId(first.to_string()));
        }
    }
    None
}

/// Submits the command and returns the job id.
///
/// The scheduler log directory is created first; SLURM does not create
/// missing directories for `--output` and would drop the log.
pub fn submit(command: &SubmitCommand, log_dir: &Path) -> Result<JobId> {
    fs::create_dir_all(log_dir).map_err(|e| {
        LaunchError::io(format!("Failed to create log directory {}", log_dir.display()), e)
    })?;
    debug!("Log directory ready: {}", log_dir.display());

    let output = Command::new(&command.program)
        .args(&command.args)
        .output()
        .map_err(|e| LaunchError::io(format!("Failed to run '{}'", command.program), e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        error!(
            "{} failed with exit code: {:?}",
            command.program,
            output.status.code()
        );
        return Err(LaunchError::SubmissionFailed {
            status: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    if !stderr.trim().is_empty() {
        debug!("{} stderr:\n{}", command.program, stderr);
    }

    let job_id = parse_job_id(&stdout).ok_or_else(|| LaunchError::JobIdNotFound {
        output: stdout.trim().to_string(),
    })?;

    info!("Scheduler accepted job {}", job_id);
    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_output() {
        assert_eq!(
            parse_job_id("Submitted batch job 18834561\n"),
            Some(JobId("18834561".to_string()))
        );
    }

    #[test]
    fn test_parse_parsable_output() {
        assert_eq!(parse_job_id("4242\n").unwrap().as_str(), "4242");
        assert_eq!(parse_job_id("4242;puhti\n").unwrap().as_str(), "4242");
    }

    #[test]
    fn test_parse_with_leading_noise() {
        let stdout = "sbatch: Job submitted to partition small\nSubmitted batch job 77\n";
        assert_eq!(parse_job_id(stdout).unwrap().to_string(), "77");
    }

    #[test]
    fn test_parse_no_id() {
        assert!(parse_job_id("").is_none());
        assert!(parse_job_id("Submitted batch job").is_none());
        assert!(parse_job_id("error: invalid account").is_none());
    }

    #[test]
    fn test_submit_missing_binary() {
        let temp_dir = tempfile::tempdir().unwrap();
        let command = SubmitCommand {
            program: "definitely-not-sbatch-xyz".to_string(),
            args: vec!["--wrap=true".to_string()],
        };
        let result = submit(&command, &temp_dir.path().join("logs"));
        assert!(matches!(result, Err(LaunchError::Io { .. })));
        assert!(temp_dir.path().join("logs").is_dir());
    }

    #[cfg(unix)]
    fn fake_sbatch(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("sbatch");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn test_submit_success() {
        let temp_dir = tempfile::tempdir().unwrap();
        let program = fake_sbatch(temp_dir.path(), "echo \"Submitted batch job 9001\"");
        let command = SubmitCommand {
            program,
            args: vec!["--wrap=echo hi".to_string()],
        };

        let job_id = submit(&command, &temp_dir.path().join("logs")).unwrap();
        assert_eq!(job_id.as_str(), "9001");
    }

    #[cfg(unix)]
    #[test]
    fn test_submit_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let program = fake_sbatch(
            temp_dir.path(),
            "echo 'sbatch: error: Invalid account' >&2\nexit 1",
        );
        let command = SubmitCommand {
            program,
            args: Vec::new(),
        };

        match submit(&command, &temp_dir.path().join("logs")) {
            Err(LaunchError::SubmissionFailed { status, stderr }) => {
                assert_eq!(status, Some(1));
                assert!(stderr.contains("Invalid account"));
            }
            other => panic!("expected SubmissionFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_submit_unparseable_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let program = fake_sbatch(temp_dir.path(), "echo queued");
        let command = SubmitCommand {
            program,
            args: Vec::new(),
        };

        assert!(matches!(
            submit(&command, &temp_dir.path().join("logs")),
            Err(LaunchError::JobIdNotFound { .. })
        ));
    }
}
