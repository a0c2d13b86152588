//! # Catalog - spreadsheet catalog processing
//!
//! Turns a "catálogo madre" workbook into a print-ready catalog for one
//! pricing zone: keeps the selected product lines, drops the zone's unused
//! price block, picks each product's selling price, orders by category and
//! brand, and pads every category to whole pages of 8.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / csv  │────▶│   Parser    │────▶│  Transform  │────▶│  Styled     │
//! │ (row 12 hdr)│     │  (calamine) │     │ rules + pad │     │  xlsx + log │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog::{process_file, ProcessOptions, Zone};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = process_file("catalogo.xlsx", &ProcessOptions::new(Zone::GbaCaba, vec![1, 2]))?;
//!     println!("{}", outcome.run.log.render());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types and recoverable warnings
//! - [`models`] - Zone, fixed lines, the catalog table and cell helpers
//! - [`config`] - Processing profile (every column name and constant)
//! - [`parser`] - Spreadsheet and CSV loading
//! - [`transform`] - Column resolution, rules, padding and the pipeline
//! - [`export`] - Styled workbook writer and preview
//! - [`validation`] - Profile schema validation
//! - [`report`] - Run log and JSON run report

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Loading
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod report;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError,
    LoadError,
    PipelineError,
    PipelineWarning,
    ProfileError,
};

// =============================================================================
// Re-exports - Models & config
// =============================================================================

pub use models::{Row, Table, Zone, FIXED_LINES};
pub use config::Profile;

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    load_catalog,
    load_spreadsheet,
    load_delimited_bytes,
    detect_encoding,
    detect_delimiter,
    decode_content,
    LoadedCatalog,
    SourceFormat,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    run_pipeline,
    process_file,
    default_output_path,
    normalize_lines,
    PipelineOutput,
    PipelineStats,
    ProcessOptions,
    ProcessOutcome,
};

// =============================================================================
// Re-exports - Export & report
// =============================================================================

pub use export::{export_catalog, normalize_numeric, preview, ExportMeta};
pub use report::{LogEntry, LogLevel, RunLog, RunReport};
