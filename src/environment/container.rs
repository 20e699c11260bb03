//! Container Runtime Integration
//!
//! The workflow manager runs inside a container image, so every nested
//! command is prefixed with `<runtime> exec --bind <paths> <image>`.
//!
//! The runtime is referenced by its bare name in the composed command:
//! the command runs on a compute node whose PATH may differ from the
//! login node's. Resolution on this node is only used to warn early.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::sync::Lazy;

use crate::workflow::{ContainerRuntime, LaunchConfig};

/// Path to `singularity` on this node, if any.
pub static SINGULARITY_PATH: Lazy<Option<PathBuf>> =
    Lazy::new(|| locate(ContainerRuntime::Singularity.binary_name()));

/// Path to `apptainer` on this node, if any.
pub static APPTAINER_PATH: Lazy<Option<PathBuf>> =
    Lazy::new(|| locate(ContainerRuntime::Apptainer.binary_name()));

fn locate(binary: &str) -> Option<PathBuf> {
    match which::which(binary) {
        Ok(path) => {
            debug!("Found {}: {}", binary, path.display());
            Some(path)
        }
        Err(e) => {
            debug!("{} not found on PATH: {}", binary, e);
            None
        }
    }
}

/// Resolved location of a runtime on this node.
pub fn runtime_path(runtime: ContainerRuntime) -> Option<&'static Path> {
    let path = match runtime {
        ContainerRuntime::Singularity => &*SINGULARITY_PATH,
        ContainerRuntime::Apptainer => &*APPTAINER_PATH,
    };
    path.as_deref()
}

/// Warns when the configured runtime is missing on this node.
///
/// Not an error: the compute nodes usually provide the runtime through
/// a module even when the login node does not.
pub fn check_runtime(runtime: ContainerRuntime) -> bool {
    match runtime_path(runtime) {
        Some(path) => {
            info!("Container runtime: {}", path.display());
            true
        }
        None => {
            warn!(
                "'{}' was not found on this node; the job will rely on the compute node's PATH",
                runtime.binary_name()
            );
            false
        }
    }
}

/// `exec` prefix that runs a command inside the configured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerExec {
    pub runtime: ContainerRuntime,
    pub image: String,
    pub binds: Vec<String>,
}

impl ContainerExec {
    pub fn from_config(config: &LaunchConfig) -> Self {
        Self {
            runtime: config.container_runtime,
            image: config.container().to_string(),
            binds: config.bind_paths(),
        }
    }

    /// Argument vector of the prefix, image last.
    pub fn prefix(&self) -> Vec<String> {
        let mut args = vec![self.runtime.binary_name().to_string(), "exec".to_string()];
        if !self.binds.is_empty() {
            args.push("--bind".to_string());
            args.push(self.binds.join(","));
        }
        args.push(self.image.clone());
        args
    }

    /// Prefix followed by `command`.
    pub fn wrap(&self, command: &[String]) -> Vec<String> {
        let mut args = self.prefix();
        args.extend(command.iter().cloned());
        args
    }
}
