//! Batch Submission Command
//!
//! Composes the single `sbatch` call that starts the launcher job. The
//! command is kept as an argument vector and only rendered to a string
//! for display and the submission history.

use std::borrow::Cow;

use super::invocation::WorkflowInvocation;
use crate::workflow::LaunchConfig;

/// Default scheduler submission binary.
pub const SBATCH: &str = "sbatch";

/// Characters that never need quoting in a POSIX shell word.
fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-./:=,%@+".contains(c)
}

/// Quotes a single shell word if needed.
pub fn quote(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return Cow::Borrowed(arg);
    }
    Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
}

/// Joins words into a shell command line, quoting where needed.
pub fn join_quoted(args: &[String]) -> String {
    args.iter()
        .map(|a| quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders `--name=value` with only the value quoted, for readability.
fn render_arg(arg: &str) -> Cow<'_, str> {
    if let Some((name, value)) = arg.split_once('=') {
        if name.starts_with("--") && name.chars().all(is_shell_safe) {
            return match quote(value) {
                Cow::Borrowed(_) => Cow::Borrowed(arg),
                Cow::Owned(quoted) => Cow::Owned(format!("{}={}", name, quoted)),
            };
        }
    }
    quote(arg)
}

/// A composed `sbatch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SubmitCommand {
    /// Composes the submission for a validated config.
    ///
    /// The result depends only on its inputs.
    pub fn compose(config: &LaunchConfig, invocation: &WorkflowInvocation) -> Self {
        let args = vec![
            format!("--job-name={}", config.job_name),
            format!("--account={}", config.account()),
            format!("--partition={}", config.partition()),
            format!("--time={}", config.time.trim()),
            format!("--mem={}", config.mem.trim()),
            format!("--cpus-per-task={}", config.cpus_per_task),
            format!("--chdir={}", config.workdir),
            format!("--output={}", config.log_file_pattern().display()),
            format!("--wrap={}", invocation.payload()),
        ];

        Self {
            program: SBATCH.to_string(),
            args,
        }
    }

    /// Uses a different submission binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Value of an `--name=value` argument.
    pub fn option(&self, name: &str) -> Option<&str> {
        let prefix = format!("--{}=", name);
        self.args
            .iter()
            .find_map(|a| a.strip_prefix(prefix.as_str()))
    }

    /// Shell-ready single-line rendering.
    pub fn render(&self) -> String {
        std::iter::once(quote(&self.program))
            .chain(self.args.iter().map(|a| render_arg(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::RunOptions;

    fn config() -> LaunchConfig {
        LaunchConfig::new("/scratch/p1", "results", "/scratch/p1/smk.sif", "p1", "small")
    }

    fn compose(options: &RunOptions) -> SubmitCommand {
        let config = config();
        let invocation = WorkflowInvocation::build(&config, options, "config/config.yaml").unwrap();
        SubmitCommand::compose(&config, &invocation)
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain/path-1.txt"), "plain/path-1.txt");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn test_render_arg_quotes_value_only() {
        assert_eq!(render_arg("--time=02:00:00"), "--time=02:00:00");
        assert_eq!(render_arg("--wrap=echo hi"), "--wrap='echo hi'");
        assert_eq!(render_arg("x=y z"), "'x=y z'");
    }

    #[test]
    fn test_compose_options() {
        let command = compose(&RunOptions::default());
        assert_eq!(command.program, "sbatch");
        assert_eq!(command.option("job-name"), Some("snakemake"));
        assert_eq!(command.option("account"), Some("p1"));
        assert_eq!(command.option("partition"), Some("small"));
        assert_eq!(command.option("time"), Some("24:00:00"));
        assert_eq!(command.option("mem"), Some("4G"));
        assert_eq!(command.option("cpus-per-task"), Some("1"));
        assert_eq!(command.option("chdir"), Some("."));
        assert_eq!(
            command.option("output"),
            Some("/scratch/p1/results/logs/snakemake-%j.out")
        );
        assert!(command.option("qos").is_none());
    }

    #[test]
    fn test_render_full_command() {
        let command = compose(&RunOptions {
            dry_run: true,
            ..RunOptions::default()
        });
        assert_eq!(
            command.render(),
            "sbatch --job-name=snakemake --account=p1 --partition=small --time=24:00:00 --mem=4G \
             --cpus-per-task=1 --chdir=. --output=/scratch/p1/results/logs/snakemake-%j.out \
             --wrap='singularity exec --bind /scratch/p1 /scratch/p1/smk.sif snakemake --profile profile \
             --configfile config/config.yaml --dry-run'"
        );
    }

    #[test]
    fn test_render_nested_quotes() {
        let mut config = config();
        config.snakemake_args = vec!["--set-threads".to_string(), "align=8 sort=2".to_string()];
        let invocation = WorkflowInvocation::build(&config, &RunOptions::default(), "c.yaml").unwrap();
        let command = SubmitCommand::compose(&config, &invocation);

        assert!(command
            .option("wrap")
            .unwrap()
            .ends_with("--set-threads 'align=8 sort=2'"));
        assert!(command
            .render()
            .ends_with(r"--set-threads '\''align=8 sort=2'\'''"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let options = RunOptions {
            rule: Some("qc".to_string()),
            force: true,
            ..RunOptions::default()
        };
        assert_eq!(compose(&options), compose(&options));
        assert_eq!(compose(&options).render(), compose(&options).render());
    }

    #[test]
    fn test_with_program() {
        let command = compose(&RunOptions::default()).with_program("/opt/slurm/bin/sbatch");
        assert!(command.render().starts_with("/opt/slurm/bin/sbatch --job-name="));
    }
}
