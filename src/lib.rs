//! run-workflow - SLURM launcher for containerized Snakemake workflows
//!
//! Reads a key-value configuration file, composes one `sbatch` call whose
//! payload runs the workflow manager inside a container image, submits
//! it, and reports the batch job id. Scheduling, wildcard matching,
//! cluster resource negotiation and lock recovery stay with the workflow
//! manager; the launcher only passes its modes through.
//!
//! # Architecture
//!
//! - [`workflow`]: Configuration model, loading, validation, sample table, lock state
//! - [`execution`]: Nested invocation, `sbatch` composition and submission
//! - [`environment`]: Container runtime integration
//! - [`cli`]: Command-line flags
//! - [`error`]: Error type shared by all of the above
//!
//! # Example
//!
//! ```rust,no_run
//! use run_workflow::{load_config, Launcher, RunOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("config/config.yaml")?;
//!
//!     let mut launcher = Launcher::new(config, "config/config.yaml");
//!     launcher.set_options(RunOptions { dry_run: true, ..RunOptions::default() });
//!
//!     let outcome = launcher.run()?;
//!     println!("{}", outcome.command.render());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod environment;
pub mod error;
pub mod execution;
pub mod workflow;

// Re-export commonly used types
pub use error::{LaunchError, Result};
pub use execution::{JobId, LaunchOutcome, Launcher, RunOptions, SubmitCommand};
pub use workflow::model::LaunchConfig;
pub use workflow::parser::load_config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "run-workflow";
