//! Workflow Manager Invocation
//!
//! Builds the nested `snakemake` command that the launcher job runs
//! inside the container. Each launcher flag maps to exactly one
//! workflow-manager option:
//!
//! | launcher      | snakemake                              |
//! |---------------|----------------------------------------|
//! | `--dry-run`   | `--dry-run`                            |
//! | `--unlock`    | `--unlock`                             |
//! | `--force`     | `--force`                              |
//! | `--rule NAME` | target `NAME`                          |
//! | `--dag`       | `--dag`, then `dot -T<fmt> -o`         |
//!
//! For `--dag` the graph source is written next to the rendering and
//! `dot` only runs when the workflow manager succeeded, so a failure
//! shows up as the job's exit status.

use std::path::PathBuf;

use log::debug;

use super::options::RunOptions;
use super::sbatch::{join_quoted, quote};
use crate::environment::ContainerExec;
use crate::error::Result;
use crate::workflow::validator::dag_format;
use crate::workflow::LaunchConfig;

/// Workflow manager executable inside the container.
pub const WORKFLOW_BINARY: &str = "snakemake";

/// Graphviz renderer used for `--dag`.
pub const DOT_BINARY: &str = "dot";

/// Where and how the dependency graph is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagRender {
    pub format: String,
    pub output: PathBuf,
    /// Graphviz source written by the workflow manager
    pub source: PathBuf,
}

impl DagRender {
    fn new(format: String, output: PathBuf) -> Self {
        let source = output.with_extension("dot");
        Self {
            format,
            output,
            source,
        }
    }

    fn command(&self) -> Vec<String> {
        vec![
            DOT_BINARY.to_string(),
            format!("-T{}", self.format),
            "-o".to_string(),
            self.output.display().to_string(),
            self.source.display().to_string(),
        ]
    }
}

/// `producer > source && renderer`: the renderer is skipped and the
/// producer's status kept when the producer fails.
fn render_after(producer: &str, source: &str, renderer: &str) -> String {
    format!("{} > {} && {}", producer, quote(source), renderer)
}

/// The complete nested invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInvocation {
    /// `snakemake` and its arguments
    pub workflow: Vec<String>,
    /// Set when the graph is rendered instead of running jobs
    pub dag: Option<DagRender>,
    pub container: ContainerExec,
}

impl WorkflowInvocation {
    /// Builds the invocation from a validated config and run options.
    ///
    /// `config_path` is handed to the workflow manager as `--configfile`,
    /// which is how the pass-through parameters reach the rules.
    pub fn build(config: &LaunchConfig, options: &RunOptions, config_path: &str) -> Result<Self> {
        let mut workflow = vec![
            WORKFLOW_BINARY.to_string(),
            "--profile".to_string(),
            config.profile.clone(),
        ];

        if let Some(snakefile) = config.snakefile.as_deref().filter(|s| !s.trim().is_empty()) {
            workflow.push("--snakefile".to_string());
            workflow.push(snakefile.to_string());
        }

        workflow.push("--configfile".to_string());
        workflow.push(config_path.to_string());

        if options.dry_run {
            workflow.push("--dry-run".to_string());
        }
        if options.unlock {
            workflow.push("--unlock".to_string());
        }
        if options.force {
            workflow.push("--force".to_string());
        }

        let dag = if options.dag {
            workflow.push("--dag".to_string());
            Some(DagRender::new(dag_format(config)?, config.dag_output_path()))
        } else {
            None
        };

        if let Some(rule) = &options.rule {
            workflow.push(rule.clone());
        }

        workflow.extend(config.snakemake_args.iter().cloned());

        debug!("Workflow arguments: {:?}", workflow);

        Ok(Self {
            workflow,
            dag,
            container: ContainerExec::from_config(config),
        })
    }

    /// Shell payload for `sbatch --wrap`.
    pub fn payload(&self) -> String {
        let main = join_quoted(&self.container.wrap(&self.workflow));
        match &self.dag {
            Some(dag) => render_after(
                &main,
                &dag.source.display().to_string(),
                &join_quoted(&self.container.wrap(&dag.command())),
            ),
            None => main,
        }
    }
}
