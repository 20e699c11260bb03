//! Submission Module
//!
//! Turns a validated configuration and the selected run options into a
//! single batch submission.
//!
//! # Architecture
//!
//! - [`options`]: Workflow-manager modes chosen on the command line
//! - [`invocation`]: Nested workflow-manager command
//! - [`sbatch`]: Outer `sbatch` command and shell quoting
//! - [`submit`]: Running `sbatch` and reading back the job id
//! - [`launcher`]: Checks, composition and submission in order

pub mod invocation;
pub mod launcher;
pub mod options;
pub mod sbatch;
pub mod submit;

pub use invocation::{DagRender, WorkflowInvocation};
pub use launcher::{LaunchOutcome, Launcher};
pub use options::RunOptions;
pub use sbatch::{SubmitCommand, SBATCH};
pub use submit::{parse_job_id, submit, JobId};
