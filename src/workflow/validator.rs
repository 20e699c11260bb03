//! Configuration Validation
//!
//! Everything that can be checked before a job is submitted is checked
//! here, so a bad configuration never turns into a malformed `sbatch`
//! call.

use std::path::{Component, Path};

use log::{debug, info, warn};

use super::model::LaunchConfig;
use crate::error::{LaunchError, Result};
use crate::execution::RunOptions;

/// Image formats a DAG rendering can be written as.
pub const DAG_FORMATS: &[&str] = &["pdf", "svg", "png"];

/// Validates a loaded configuration.
///
/// Missing required keys are reported together; the remaining checks
/// stop at the first offending key.
pub fn validate_config(config: &LaunchConfig) -> Result<()> {
    let missing = config.missing_keys();
    if !missing.is_empty() {
        return Err(LaunchError::MissingKeys { keys: missing });
    }

    if !Path::new(config.scratch_dir()).is_absolute() {
        return Err(LaunchError::invalid(
            "scratch_dir",
            format!("'{}' must be an absolute path", config.scratch_dir()),
        ));
    }

    validate_results_dir(config.required_value("results_dir").unwrap_or_default())?;

    // `--bind` splits entries on ',' and each entry on ':'
    for path in config.bind_paths() {
        if path.contains([',', ':']) {
            let key = if path == config.scratch_dir() { "scratch_dir" } else { "bind" };
            return Err(LaunchError::invalid(
                key,
                format!("'{}' must not contain ',' or ':'", path),
            ));
        }
    }

    for (key, value) in [
        ("account", config.account()),
        ("partition", config.partition()),
        ("job_name", config.job_name.as_str()),
    ] {
        if value.trim().is_empty() {
            return Err(LaunchError::invalid(key, "must not be empty"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(LaunchError::invalid(
                key,
                format!("'{}' must not contain whitespace", value),
            ));
        }
    }

    if config.profile.trim().is_empty() {
        return Err(LaunchError::invalid("profile", "must not be empty"));
    }

    if !is_slurm_time(&config.time) {
        return Err(LaunchError::invalid(
            "time",
            format!(
                "'{}' is not a SLURM time (MM, MM:SS, HH:MM:SS, D-HH, D-HH:MM or D-HH:MM:SS)",
                config.time
            ),
        ));
    }

    if config.mem.trim().is_empty() {
        return Err(LaunchError::invalid("mem", "must not be empty"));
    }

    if config.cpus_per_task == 0 {
        return Err(LaunchError::invalid("cpus_per_task", "must be at least 1"));
    }

    dag_format(config)?;

    if config.samples.is_none() && !config.sample_path_columns.is_empty() {
        warn!("sample_path_columns is set but no samples table is configured");
    }

    info!("Config validated");
    Ok(())
}

/// Rejects flag combinations the workflow manager cannot act on.
pub fn validate_options(options: &RunOptions) -> Result<()> {
    if options.unlock {
        let conflicts = [
            ("dry-run", options.dry_run),
            ("force", options.force),
            ("dag", options.dag),
            ("rule", options.rule.is_some()),
        ];
        if let Some((second, _)) = conflicts.into_iter().find(|(_, set)| *set) {
            return Err(LaunchError::ConflictingFlags {
                first: "unlock",
                second,
            });
        }
    }

    if options.dag && options.dry_run {
        return Err(LaunchError::ConflictingFlags {
            first: "dag",
            second: "dry-run",
        });
    }

    if let Some(rule) = &options.rule {
        if !is_rule_name(rule) {
            return Err(LaunchError::invalid(
                "rule",
                format!("'{}' is not a valid rule name", rule),
            ));
        }
    }

    Ok(())
}

/// Checks that the container image is visible from this node.
///
/// Login nodes do not always mount the same filesystems as compute
/// nodes, so an image that cannot be seen only produces a warning when
/// the scratch root itself is not visible either.
pub fn check_container(config: &LaunchConfig) -> Result<()> {
    let image = Path::new(config.container());

    if image.is_file() {
        debug!("Container image found: {}", image.display());
        return Ok(());
    }

    if Path::new(config.scratch_dir()).is_dir() {
        return Err(LaunchError::invalid(
            "container",
            format!("image '{}' does not exist", image.display()),
        ));
    }

    warn!(
        "Container image '{}' is not visible from this node; assuming it exists on the compute nodes",
        image.display()
    );
    Ok(())
}

/// Output format of the DAG rendering, taken from the file extension.
pub fn dag_format(config: &LaunchConfig) -> Result<String> {
    let path = config.dag_output_path();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if DAG_FORMATS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(LaunchError::invalid(
            "dag_output",
            format!(
                "'{}' must end in one of: {}",
                path.display(),
                DAG_FORMATS.join(", ")
            ),
        ))
    }
}

fn validate_results_dir(results_dir: &str) -> Result<()> {
    let path = Path::new(results_dir);

    if path.is_absolute() {
        return Err(LaunchError::invalid(
            "results_dir",
            format!("'{}' must be relative to scratch_dir", results_dir),
        ));
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(LaunchError::invalid(
            "results_dir",
            format!("'{}' must not leave scratch_dir", results_dir),
        ));
    }

    Ok(())
}

/// Rule names are Python identifiers. Anything else, in particular a
/// leading `-`, would reach the workflow manager as something other
/// than a target.
pub fn is_rule_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Accepts the time formats `sbatch --time` understands.
pub fn is_slurm_time(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    let numeric = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());

    let (days, clock) = match value.split_once('-') {
        Some((days, clock)) => (Some(days), clock),
        None => (None, value),
    };

    if let Some(days) = days {
        if !numeric(days) {
            return false;
        }
    }

    let parts: Vec<&str> = clock.split(':').collect();
    if !parts.iter().all(|p| numeric(p)) {
        return false;
    }

    // With days: HH, HH:MM or HH:MM:SS. Without: MM, MM:SS or HH:MM:SS.
    (1..=3).contains(&parts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> LaunchConfig {
        LaunchConfig::new("/scratch/p1", "results", "/scratch/p1/smk.sif", "p1", "small")
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let mut config = valid_config();
        config.account = None;
        config.container = Some(String::new());

        match validate_config(&config) {
            Err(LaunchError::MissingKeys { keys }) => {
                assert_eq!(keys, vec!["container", "account"]);
            }
            other => panic!("expected MissingKeys, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_scratch_rejected() {
        let mut config = valid_config();
        config.scratch_dir = Some("scratch/p1".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("scratch_dir"));
    }

    #[test]
    fn test_results_dir_must_stay_inside_scratch() {
        let mut config = valid_config();
        config.results_dir = Some("../elsewhere".to_string());
        assert!(validate_config(&config).is_err());

        config.results_dir = Some("/abs/results".to_string());
        assert!(validate_config(&config).is_err());

        config.results_dir = Some("runs/2024".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bind_separators_rejected() {
        let mut config = valid_config();
        config.scratch_dir = Some("/scratch/p1:/data".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidValue { ref key, .. } if key == "scratch_dir"));

        let config = valid_config().with_bind("/projappl/a,/projappl/b");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidValue { ref key, .. } if key == "bind"));

        let config = valid_config().with_bind("/projappl/p1");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_partition_with_whitespace_rejected() {
        let mut config = valid_config();
        config.partition = Some("small large".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidValue { ref key, .. } if key == "partition"));
    }

    #[test]
    fn test_zero_cpus_rejected() {
        let mut config = valid_config();
        config.cpus_per_task = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_time_rejected() {
        let config = valid_config().with_time("two hours");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_slurm_time_formats() {
        for ok in ["30", "30:00", "02:00:00", "1-12", "1-12:30", "3-00:00:00"] {
            assert!(is_slurm_time(ok), "{} should be accepted", ok);
        }
        for bad in ["", "1-", "-12", "1:2:3:4", "ab:cd", "1-2-3", "12::00"] {
            assert!(!is_slurm_time(bad), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_dag_format_from_extension() {
        let mut config = valid_config();
        assert_eq!(dag_format(&config).unwrap(), "pdf");

        config.dag_output = Some("/scratch/p1/dag.SVG".to_string());
        assert_eq!(dag_format(&config).unwrap(), "svg");

        config.dag_output = Some("/scratch/p1/dag.txt".to_string());
        assert!(dag_format(&config).is_err());
    }

    #[test]
    fn test_unlock_conflicts() {
        let options = RunOptions {
            unlock: true,
            force: true,
            ..RunOptions::default()
        };
        match validate_options(&options) {
            Err(LaunchError::ConflictingFlags { first, second }) => {
                assert_eq!(first, "unlock");
                assert_eq!(second, "force");
            }
            other => panic!("expected ConflictingFlags, got {:?}", other),
        }

        let options = RunOptions {
            unlock: true,
            rule: Some("align".to_string()),
            ..RunOptions::default()
        };
        assert!(validate_options(&options).is_err());
    }

    #[test]
    fn test_dag_with_dry_run_conflicts() {
        let options = RunOptions {
            dag: true,
            dry_run: true,
            ..RunOptions::default()
        };
        assert!(validate_options(&options).is_err());
    }

    #[test]
    fn test_rule_name_with_space_rejected() {
        let options = RunOptions {
            rule: Some("align reads".to_string()),
            ..RunOptions::default()
        };
        assert!(validate_options(&options).is_err());
    }

    #[test]
    fn test_rule_name_must_be_identifier() {
        for rule in ["--delete-all-output", "-n", "results/out.txt", "1qc", "qc-fast", ""] {
            let options = RunOptions {
                rule: Some(rule.to_string()),
                ..RunOptions::default()
            };
            assert!(validate_options(&options).is_err(), "{:?} should be rejected", rule);
        }

        assert!(is_rule_name("align_reads"));
        assert!(is_rule_name("_all"));
        assert!(is_rule_name("step2"));
    }

    #[test]
    fn test_plain_options_valid() {
        let options = RunOptions {
            dry_run: true,
            force: true,
            rule: Some("align".to_string()),
            ..RunOptions::default()
        };
        assert!(validate_options(&options).is_ok());
    }

    #[test]
    fn test_check_container_missing_with_visible_scratch() {
        let temp_dir = tempfile::tempdir().unwrap();
        let scratch = temp_dir.path().to_str().unwrap();
        let config = LaunchConfig::new(
            scratch,
            "results",
            temp_dir.path().join("missing.sif").to_str().unwrap(),
            "p1",
            "small",
        );
        assert!(check_container(&config).is_err());

        std::fs::write(temp_dir.path().join("missing.sif"), b"img").unwrap();
        assert!(check_container(&config).is_ok());
    }

    #[test]
    fn test_check_container_invisible_scratch_warns_only() {
        let config = LaunchConfig::new(
            "/nonexistent/scratch",
            "results",
            "/nonexistent/scratch/smk.sif",
            "p1",
            "small",
        );
        assert!(check_container(&config).is_ok());
    }
}
