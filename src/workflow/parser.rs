//! Configuration Parser
//!
//! Loads and saves the launcher configuration as YAML.

use std::fs;
use std::path::Path;

use log::{debug, info};

use super::model::LaunchConfig;
use crate::error::{LaunchError, Result};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Loads the launcher configuration from a YAML file.
///
/// Only reading and parsing happen here; call
/// [`validate_config`](super::validator::validate_config) before composing
/// a submission.
///
/// # Example
///
/// ```rust,no_run
/// use run_workflow::workflow::load_config;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("config/config.yaml")?;
///     println!("Results go to {}", config.results_path().display());
///     Ok(())
/// }
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LaunchConfig> {
    let path = path.as_ref();
    info!("Loading config from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|source| LaunchError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    // An empty file parses as null, which serde rejects for a struct
    if yaml_content.trim().is_empty() {
        debug!("Config file is empty, using defaults");
        return Ok(LaunchConfig::empty());
    }

    let config: LaunchConfig =
        serde_yaml::from_str(&yaml_content).map_err(|source| LaunchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        "Parsed config: account={:?}, partition={:?}, {} pass-through parameter(s)",
        config.account,
        config.partition,
        config.params.len()
    );

    Ok(config)
}

/// Saves a configuration to a YAML file.
pub fn save_config(config: &LaunchConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let yaml_content = serde_yaml::to_string(config).map_err(|source| LaunchError::ConfigSerialize {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| LaunchError::ConfigWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    fs::write(path, yaml_content).map_err(|source| LaunchError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Config saved to: {}", path.display());
    Ok(())
}
