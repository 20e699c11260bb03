//! Run Options
//!
//! The workflow-manager modes selected on the command line, independent
//! of how they were parsed.

/// Modes passed through to the workflow manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Plan only, execute nothing
    pub dry_run: bool,
    /// Clear a stale lock left by a failed run
    pub unlock: bool,
    /// Target a single rule instead of the default target
    pub rule: Option<String>,
    /// Re-run the target even if its outputs look current
    pub force: bool,
    /// Render the dependency graph instead of running
    pub dag: bool,
}

impl RunOptions {
    /// Short human label for log lines.
    pub fn mode(&self) -> &'static str {
        if self.unlock {
            "UNLOCK"
        } else if self.dag {
            "DAG"
        } else if self.dry_run {
            "DRY RUN"
        } else {
            "RUN"
        }
    }
}
