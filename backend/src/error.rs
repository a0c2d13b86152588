//! Error types for the catalog processing pipeline.
//!
//! Fatal conditions are split by the stage that raises them:
//!
//! - [`LoadError`] - reading the source spreadsheet
//! - [`ProfileError`] - loading or validating a processing profile
//! - [`ExportError`] - writing the styled workbook
//! - [`PipelineError`] - top-level run errors (wraps all of the above)
//!
//! Recoverable anomalies (missing columns the pipeline can work around) are not
//! errors; they are reported as [`PipelineWarning`] values next to the result.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use thiserror::Error;

use crate::models::Zone;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while reading the source catalog.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The spreadsheet container could not be parsed.
    #[error("Invalid spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The delimited text could not be parsed.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook has no worksheet to read.
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// Fewer physical rows than the header position.
    #[error("Header row {row} not found (file has {available} rows)")]
    HeaderRowMissing { row: usize, available: usize },

    /// File extension not handled by any loader.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

// =============================================================================
// Profile Errors
// =============================================================================

/// Errors while loading a processing profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Failed to read the profile file.
    #[error("Failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    /// Profile is not valid JSON or has wrongly-typed fields.
    #[error("Profile JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Profile violates the embedded schema.
    #[error("Profile validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// The order-code pattern does not compile.
    #[error("Invalid order pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the output workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook serialization or save failed.
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// More rows or columns than a worksheet can hold.
    #[error("Table too large for a worksheet: {0}")]
    TooLarge(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level run errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`]
/// and [`crate::transform::pipeline::process_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Profile could not be loaded.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Output could not be written.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The caller selected no product line.
    #[error("At least one line must be selected")]
    NoLinesSelected,

    /// The caller selected a line outside the fixed set.
    #[error("Unknown line {0}")]
    UnknownLine(u32),
}

// =============================================================================
// Recoverable conditions
// =============================================================================

/// A stage anomaly the pipeline worked around.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PipelineWarning {
    /// No line column found; every row was processed.
    MissingLineColumn { candidates: Vec<String> },

    /// Neither the zone pair nor the fallback pair exists; prices left null.
    MissingPriceColumns { zone: Zone, tried: Vec<String> },

    /// Order or condition column absent; no offer could match.
    MissingOfferColumns { missing: Vec<String> },

    /// Interior pruning markers not found; no column dropped.
    NoPruneMarkers { start: String, end: String },

    /// Category or brand column absent; rows kept in filter order.
    MissingSortColumns { missing: Vec<String> },

    /// Category column absent; no padding applied.
    MissingCategoryColumn { column: String },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLineColumn { candidates } => {
                write!(f, "line column not found (tried {})", candidates.join(", "))
            }
            Self::MissingPriceColumns { zone, tried } => {
                write!(f, "price columns for {} not found (tried {})", zone, tried.join(", "))
            }
            Self::MissingOfferColumns { missing } => {
                write!(f, "offer rule skipped, missing {}", missing.join(", "))
            }
            Self::NoPruneMarkers { start, end } => {
                write!(f, "no column range '{}'..'{}' to drop", start, end)
            }
            Self::MissingSortColumns { missing } => {
                write!(f, "sort skipped, missing {}", missing.join(", "))
            }
            Self::MissingCategoryColumn { column } => {
                write!(f, "padding skipped, missing '{}'", column)
            }
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
