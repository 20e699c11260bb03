//! Workflow Configuration Module
//!
//! Data structures and checks for the configuration consumed by both the
//! launcher and the workflow manager.
//!
//! # Structure
//!
//! - [`model`]: Configuration data model (LaunchConfig)
//! - [`parser`]: YAML loading and saving
//! - [`validator`]: Checks run before anything is submitted
//! - [`samples`]: Optional sample-metadata table
//! - [`state`]: Lock inspection and submission history

pub mod model;
pub mod parser;
pub mod samples;
pub mod state;
pub mod validator;

pub use model::{ContainerRuntime, LaunchConfig, REQUIRED_KEYS};
pub use parser::{load_config, save_config, DEFAULT_CONFIG_PATH};
pub use samples::{check_sample_sheet, SampleRecord, SampleSheet};
pub use state::{inspect_workdir, load_history, SubmissionRecord, WorkdirState};
pub use validator::{check_container, validate_config, validate_options};
