//! Command-line interface.
//!
//! Defined apart from `main.rs` so integration tests can parse argument
//! lists directly.

use std::path::PathBuf;

use clap::Parser;

use crate::execution::{RunOptions, SBATCH};
use crate::workflow::validator::is_rule_name;
use crate::workflow::DEFAULT_CONFIG_PATH;

/// Version line shown by `--version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nworkflow manager: snakemake (inside the configured container)",
    "\nscheduler: SLURM (sbatch)"
);

/// Submit a containerized Snakemake workflow to SLURM.
#[derive(Debug, Parser)]
#[command(
    name = "run-workflow",
    about = "Submit a containerized Snakemake workflow to a SLURM cluster",
    version,
    long_version = LONG_VERSION
)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Plan only: list the jobs that would run without running them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Remove a stale lock left behind by a failed or killed run.
    #[arg(long, conflicts_with_all = ["dry_run", "force", "dag", "rule"])]
    pub unlock: bool,

    /// Only run the named rule (and whatever it needs).
    #[arg(long, value_name = "NAME", value_parser = parse_rule_name)]
    pub rule: Option<String>,

    /// Run the target even if its outputs are up to date.
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Render the dependency graph to the configured output file.
    #[arg(long, conflicts_with = "dry_run")]
    pub dag: bool,

    /// Print the composed command without submitting it.
    #[arg(long)]
    pub no_submit: bool,

    /// Submission binary.
    #[arg(long, value_name = "PATH", env = "RUN_WORKFLOW_SBATCH", default_value = SBATCH)]
    pub sbatch: String,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_rule_name(value: &str) -> Result<String, String> {
    if is_rule_name(value) {
        Ok(value.to_string())
    } else {
        Err("rule names are letters, digits and '_', not starting with a digit".to_string())
    }
}

impl Cli {
    /// Workflow-manager modes selected by the flags.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            unlock: self.unlock,
            rule: self.rule.clone(),
            force: self.force,
            dag: self.dag,
        }
    }
}
