//! Run reporting.
//!
//! - [`logs`] - structured log entries collected per run
//! - [`types`] - JSON run report written by `catalog process --report`
//!
//! [`Diagnostics`] pairs the log with the recoverable warnings a stage raised,
//! so stages take one `&mut` instead of two.

pub mod logs;
pub mod types;

pub use logs::{LogEntry, LogLevel, RunLog};
pub use types::RunReport;

use crate::error::PipelineWarning;

/// Log plus warnings accumulated while the stages run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub log: RunLog,
    pub warnings: Vec<PipelineWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it in the log.
    pub fn warn(&mut self, warning: PipelineWarning) {
        self.log.warning(warning.to_string());
        self.warnings.push(warning);
    }

    pub fn into_parts(self) -> (RunLog, Vec<PipelineWarning>) {
        (self.log, self.warnings)
    }
}
