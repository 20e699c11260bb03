//! Launch Configuration Model
//!
//! The key-value configuration shared by the launcher and the workflow
//! manager. The launcher reads the keys below; every other key is kept
//! as a pass-through parameter and reaches the workflow manager through
//! `--configfile`.
//!
//! # Example YAML Format
//!
//! ```yaml
//! scratch_dir: /scratch/project_2001234/alice
//! results_dir: results
//! container: /scratch/project_2001234/containers/snakemake.sif
//! account: project_2001234
//! partition: small
//!
//! # optional
//! profile: profile/slurm
//! time: "12:00:00"
//! bind:
//!   - /projappl/project_2001234
//! samples: config/samples.tsv
//! sample_path_columns: [fastq_1, fastq_2]
//!
//! # pass-through, read by the rules
//! genome: ref/GRCh38.fa
//! min_quality: 20
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys that must be present before anything is submitted.
pub const REQUIRED_KEYS: &[&str] = &["scratch_dir", "results_dir", "container", "account", "partition"];

/// Container runtime used to run the workflow manager.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    #[default]
    Singularity,
    Apptainer,
}

impl ContainerRuntime {
    /// Executable name of the runtime.
    pub fn binary_name(self) -> &'static str {
        match self {
            Self::Singularity => "singularity",
            Self::Apptainer => "apptainer",
        }
    }
}

/// Launcher configuration loaded from YAML.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Scratch-filesystem root (absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<String>,

    /// Results subdirectory under `scratch_dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<String>,

    /// Container image holding the workflow manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Cluster allocation key charged for the jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Default job partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,

    /// Workflow profile directory
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snakefile: Option<String>,

    /// Directory the launcher job runs in
    #[serde(default = "default_workdir")]
    pub workdir: String,

    #[serde(default = "default_job_name")]
    pub job_name: String,

    /// Wall time of the launcher job itself
    #[serde(default = "default_time")]
    pub time: String,

    #[serde(default = "default_mem")]
    pub mem: String,

    #[serde(default = "default_cpus")]
    pub cpus_per_task: u32,

    #[serde(default)]
    pub container_runtime: ContainerRuntime,

    /// Extra paths bound into the container
    #[serde(deserialize_with = "single_or_vec", default, skip_serializing_if = "Vec::is_empty")]
    pub bind: Vec<String>,

    /// Where `--dag` writes its rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dag_output: Option<String>,

    /// Optional sample-metadata table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<String>,

    /// Sample-table columns holding file paths
    #[serde(deserialize_with = "single_or_vec", default, skip_serializing_if = "Vec::is_empty")]
    pub sample_path_columns: Vec<String>,

    /// Extra workflow-manager arguments appended verbatim
    #[serde(deserialize_with = "single_or_vec", default, skip_serializing_if = "Vec::is_empty")]
    pub snakemake_args: Vec<String>,

    /// Everything else: parameters for the rules
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_yaml::Value>,
}

fn default_profile() -> String {
    "profile".to_string()
}

fn default_workdir() -> String {
    ".".to_string()
}

fn default_job_name() -> String {
    "snakemake".to_string()
}

fn default_time() -> String {
    "24:00:00".to_string()
}

fn default_mem() -> String {
    "4G".to_string()
}

fn default_cpus() -> u32 {
    1
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(de::Error::custom("Expected string in array")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

impl LaunchConfig {
    /// Creates a configuration with every required key set and defaults elsewhere.
    ///
    /// # Example
    ///
    /// ```
    /// use run_workflow::workflow::LaunchConfig;
    ///
    /// let config = LaunchConfig::new("/scratch/p1", "results", "/scratch/p1/smk.sif", "p1", "small")
    ///     .with_profile("profile/slurm")
    ///     .with_time("02:00:00");
    /// assert_eq!(config.results_path().to_str(), Some("/scratch/p1/results"));
    /// ```
    pub fn new(
        scratch_dir: impl Into<String>,
        results_dir: impl Into<String>,
        container: impl Into<String>,
        account: impl Into<String>,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            scratch_dir: Some(scratch_dir.into().trim().to_string()),
            results_dir: Some(results_dir.into().trim().to_string()),
            container: Some(container.into().trim().to_string()),
            account: Some(account.into().trim().to_string()),
            partition: Some(partition.into().trim().to_string()),
            ..Self::empty()
        }
    }

    /// A configuration with no required keys, only defaults.
    pub fn empty() -> Self {
        Self {
            scratch_dir: None,
            results_dir: None,
            container: None,
            account: None,
            partition: None,
            profile: default_profile(),
            snakefile: None,
            workdir: default_workdir(),
            job_name: default_job_name(),
            time: default_time(),
            mem: default_mem(),
            cpus_per_task: default_cpus(),
            container_runtime: ContainerRuntime::default(),
            bind: Vec::new(),
            dag_output: None,
            samples: None,
            sample_path_columns: Vec::new(),
            snakemake_args: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = workdir.into();
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    pub fn with_runtime(mut self, runtime: ContainerRuntime) -> Self {
        self.container_runtime = runtime;
        self
    }

    pub fn with_bind(mut self, path: impl Into<String>) -> Self {
        self.bind.push(path.into());
        self
    }

    pub fn with_samples(mut self, path: impl Into<String>, path_columns: Vec<String>) -> Self {
        self.samples = Some(path.into());
        self.sample_path_columns = path_columns;
        self
    }

    /// Sets a pass-through parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Looks up a required key by name; blank values count as absent.
    pub fn required_value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "scratch_dir" => self.scratch_dir.as_deref(),
            "results_dir" => self.results_dir.as_deref(),
            "container" => self.container.as_deref(),
            "account" => self.account.as_deref(),
            "partition" => self.partition.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Names of required keys that are missing or blank, in declaration order.
    pub fn missing_keys(&self) -> Vec<String> {
        REQUIRED_KEYS
            .iter()
            .filter(|key| self.required_value(key).is_none())
            .map(|key| key.to_string())
            .collect()
    }

    pub fn scratch_dir(&self) -> &str {
        self.required_value("scratch_dir").unwrap_or_default()
    }

    pub fn container(&self) -> &str {
        self.required_value("container").unwrap_or_default()
    }

    pub fn account(&self) -> &str {
        self.required_value("account").unwrap_or_default()
    }

    pub fn partition(&self) -> &str {
        self.required_value("partition").unwrap_or_default()
    }

    /// `scratch_dir/results_dir`.
    pub fn results_path(&self) -> PathBuf {
        Path::new(self.scratch_dir()).join(self.required_value("results_dir").unwrap_or_default())
    }

    /// Directory for scheduler logs and the submission history.
    pub fn log_dir(&self) -> PathBuf {
        self.results_path().join("logs")
    }

    /// Scheduler log pattern; `%j` is expanded by SLURM to the job id.
    pub fn log_file_pattern(&self) -> PathBuf {
        self.log_dir().join(format!("{}-%j.out", self.job_name))
    }

    /// Scheduler log for a known job id.
    pub fn log_file_for(&self, job_id: &str) -> PathBuf {
        self.log_dir().join(format!("{}-{}.out", self.job_name, job_id))
    }

    /// Target of the DAG rendering.
    pub fn dag_output_path(&self) -> PathBuf {
        match &self.dag_output {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => self.results_path().join("dag.pdf"),
        }
    }

    /// Paths bound into the container: scratch root first, then extras.
    pub fn bind_paths(&self) -> Vec<String> {
        let mut paths = vec![self.scratch_dir().to_string()];
        for path in &self.bind {
            let path = path.trim();
            if !path.is_empty() && !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        paths
    }

    /// Resolves a path from the config against `workdir` when relative.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.workdir).join(path)
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::empty()
    }
}
