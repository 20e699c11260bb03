//! Launcher
//!
//! Orchestrates one launch: every check runs before the command is
//! composed, and nothing is submitted unless all of them pass.

use std::path::{Path, PathBuf};

use log::{info, warn};

use super::invocation::WorkflowInvocation;
use super::options::RunOptions;
use super::sbatch::{SubmitCommand, SBATCH};
use super::submit::{submit, JobId};
use crate::environment::check_runtime;
use crate::error::Result;
use crate::workflow::{
    check_container, check_sample_sheet, inspect_workdir, validate_config, validate_options,
    LaunchConfig, SubmissionRecord,
};

/// Result of a launch.
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub command: SubmitCommand,
    /// `None` when submission was skipped
    pub job_id: Option<JobId>,
    /// Scheduler log of the launcher job
    pub log_file: PathBuf,
}

impl LaunchOutcome {
    pub fn submitted(&self) -> bool {
        self.job_id.is_some()
    }
}

/// Composes and submits the launcher job.
///
/// # Example
///
/// ```rust,no_run
/// use run_workflow::execution::{Launcher, RunOptions};
/// use run_workflow::load_config;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("config/config.yaml")?;
///     let mut launcher = Launcher::new(config, "config/config.yaml");
///     launcher.set_options(RunOptions { dry_run: true, ..RunOptions::default() });
///
///     let outcome = launcher.run()?;
///     println!("{}", outcome.command.render());
///     Ok(())
/// }
/// ```
pub struct Launcher {
    config: LaunchConfig,
    config_path: String,
    options: RunOptions,
    sbatch: String,
    submit: bool,
}

impl Launcher {
    pub fn new(config: LaunchConfig, config_path: impl Into<String>) -> Self {
        Self {
            config,
            config_path: config_path.into(),
            options: RunOptions::default(),
            sbatch: SBATCH.to_string(),
            submit: true,
        }
    }

    pub fn set_options(&mut self, options: RunOptions) {
        self.options = options;
    }

    /// Sets the submission binary (default `sbatch`).
    pub fn set_sbatch(&mut self, sbatch: impl Into<String>) {
        self.sbatch = sbatch.into();
    }

    /// When false, the command is composed and returned but not submitted.
    pub fn set_submit(&mut self, submit: bool) {
        self.submit = submit;
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Runs the checks, then composes the command.
    pub fn compose(&self) -> Result<SubmitCommand> {
        validate_options(&self.options)?;
        validate_config(&self.config)?;
        check_container(&self.config)?;

        if !self.options.unlock {
            check_sample_sheet(&self.config)?;
        }

        self.check_locks()?;
        check_runtime(self.config.container_runtime);

        let invocation = WorkflowInvocation::build(&self.config, &self.options, &self.config_path)?;
        Ok(SubmitCommand::compose(&self.config, &invocation).with_program(self.sbatch.clone()))
    }

    /// Composes and, unless disabled, submits the launcher job.
    pub fn run(&self) -> Result<LaunchOutcome> {
        info!("Mode: {}", self.options.mode());
        let command = self.compose()?;

        if !self.submit {
            info!("Submission skipped");
            return Ok(LaunchOutcome {
                command,
                job_id: None,
                log_file: self.config.log_file_pattern(),
            });
        }

        let job_id = submit(&command, &self.config.log_dir())?;

        let record = SubmissionRecord::new(
            job_id.as_str(),
            self.config_path.as_str(),
            command.render(),
            &self.options,
        );
        if let Err(e) = record.append(self.config.log_dir()) {
            warn!("Could not record submission: {}", e);
        }

        Ok(LaunchOutcome {
            log_file: self.config.log_file_for(job_id.as_str()),
            command,
            job_id: Some(job_id),
        })
    }

    fn check_locks(&self) -> Result<()> {
        let state = inspect_workdir(Path::new(&self.config.workdir))?;

        if self.options.unlock {
            if !state.is_locked() {
                info!("No locks found in {}; unlocking anyway", self.config.workdir);
            }
            return Ok(());
        }

        if state.is_locked() && !self.options.dry_run {
            warn!(
                "Working directory '{}' holds {} lock(s) from a previous run.",
                self.config.workdir,
                state.locks.len()
            );
            warn!("If no other run is active, inspect its log and rerun with --unlock first.");
        }

        if state.has_incomplete() {
            warn!(
                "{} incomplete output(s) from an interrupted run will be regenerated or reported",
                state.incomplete.len()
            );
        }

        Ok(())
    }
}
