//! run-workflow CLI Entry Point
//!
//! Submits a containerized Snakemake workflow to SLURM.
//!
//! # Usage
//!
//! ```bash
//! # Submit the workflow described by config/config.yaml
//! run-workflow
//!
//! # Plan only; the job list ends up in the scheduler log
//! run-workflow --dry-run
//!
//! # Clear the lock left by a failed run
//! run-workflow --unlock
//!
//! # Re-run a single rule with another config
//! run-workflow --config config/test.yaml --rule align_reads --force
//!
//! # Render the dependency graph
//! run-workflow --dag
//! ```

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use log::{debug, info};

use run_workflow::cli::Cli;
use run_workflow::execution::{LaunchOutcome, Launcher};
use run_workflow::workflow::load_config;
use run_workflow::{LaunchError, APP_NAME, VERSION};

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!("Snakemake launcher for SLURM");
    println!();
}

/// Prints the composed command and, when submitted, the job id.
fn print_outcome(outcome: &LaunchOutcome) {
    println!();
    println!("{}", "Submission command:".bold());
    println!("{}", outcome.command.render());
    println!();

    match &outcome.job_id {
        Some(job_id) => {
            println!("{} {}", "Submitted batch job".green().bold(), job_id);
            println!("Log: {}", outcome.log_file.display());
        }
        None => {
            println!("{}", "Not submitted (--no-submit)".yellow());
            println!("Log would be: {}", outcome.log_file.display());
        }
    }
}

/// Main application entry point.
fn run(cli: Cli) -> Result<(), LaunchError> {
    print_banner();

    let config = load_config(&cli.config)?;

    // The job may run in another directory, so hand over an absolute path
    let config_path = std::fs::canonicalize(&cli.config).unwrap_or_else(|e| {
        debug!("Could not canonicalize {}: {}", cli.config.display(), e);
        cli.config.clone()
    });
    info!("Config: {}", config_path.display());

    let mut launcher = Launcher::new(config, config_path.display().to_string());
    launcher.set_options(cli.run_options());
    launcher.set_sbatch(cli.sbatch.clone());
    launcher.set_submit(!cli.no_submit);

    let outcome = launcher.run()?;
    print_outcome(&outcome);

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            if matches!(e, LaunchError::SubmissionFailed { .. }) {
                eprintln!("Nothing was submitted. Check the account and partition in the config.");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
