//! Environment Management Module
//!
//! Handles the container runtime the workflow manager runs in.

pub mod container;

pub use container::{check_runtime, runtime_path, ContainerExec, APPTAINER_PATH, SINGULARITY_PATH};
