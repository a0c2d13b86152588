//! High-level pipeline API.
//!
//! [`run_pipeline`] is the pure transformation: table in, table + log +
//! warnings out. [`process_file`] brackets it with loading and export:
//!
//! ```text
//! load → filter lines → prune columns → select prices → sort → renumber → pad → export
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog::transform::pipeline::{process_file, ProcessOptions};
//! use catalog::Zone;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ProcessOptions::new(Zone::Interior, vec![1, 2, 8]);
//!     let outcome = process_file("catalogo.xlsx", &options)?;
//!     println!("{}", outcome.run.log.render());
//!     println!("Wrote {} rows to {}", outcome.run.table.len(), outcome.output.display());
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::padding::{pad_categories, GroupPadding};
use super::rules::{filter_lines, prune_zone_columns, renumber, select_prices, sort_catalog};
use crate::config::Profile;
use crate::error::{PipelineError, PipelineResult, PipelineWarning, ProfileError};
use crate::export::{export_catalog, normalize_numeric, preview, ExportMeta};
use crate::models::{Table, Zone};
use crate::parser::load_catalog;
use crate::report::{Diagnostics, RunLog};

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    /// Rows handed to the pipeline
    pub rows_in: usize,
    /// Rows left after the line filter
    pub rows_filtered: usize,
    /// Rows in the final table, fillers included
    pub rows_out: usize,
    pub filler_rows: usize,
    pub offers_applied: usize,
    /// Columns removed by zone pruning
    pub dropped_columns: Vec<String>,
}

/// Result of [`run_pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final table
    pub table: Table,

    /// Every decision taken, in order
    pub log: RunLog,

    /// Recoverable anomalies (also present in the log)
    pub warnings: Vec<PipelineWarning>,

    pub stats: PipelineStats,

    pub zone: Zone,

    /// Selected lines, normalized
    pub lines: Vec<u32>,

    /// Per-category padding breakdown
    pub groups: Vec<GroupPadding>,
}

/// Validate a line selection against the fixed set.
///
/// Returns the lines in fixed-set order without duplicates.
pub fn normalize_lines(selected: &[u32], fixed: &[u32]) -> PipelineResult<Vec<u32>> {
    if selected.is_empty() {
        return Err(PipelineError::NoLinesSelected);
    }
    if let Some(&unknown) = selected.iter().find(|l| !fixed.contains(l)) {
        return Err(PipelineError::UnknownLine(unknown));
    }
    Ok(fixed.iter().copied().filter(|l| selected.contains(l)).collect())
}

/// Run every stage on `table` for `zone` and the `selected` lines.
///
/// The input table is not modified.
pub fn run_pipeline(
    table: &Table,
    zone: Zone,
    selected: &[u32],
    profile: &Profile,
) -> PipelineResult<PipelineOutput> {
    let lines = normalize_lines(selected, &profile.lines.fixed)?;
    let order_pattern = profile.order_regex().map_err(ProfileError::Pattern)?;

    let mut diag = Diagnostics::new();
    diag.log.info(format!("Processing lines {:?} - zone {}", lines, zone));

    let filtered = filter_lines(table, &lines, &profile.lines, &mut diag);
    let (pruned, dropped_columns) = prune_zone_columns(&filtered, zone, &profile.pruning, &mut diag);
    let (priced, offers_applied) =
        select_prices(&pruned, zone, &profile.pricing, &order_pattern, &mut diag);
    let sorted = sort_catalog(&priced, &profile.sorting, &mut diag);

    let numbered = renumber(&sorted, &profile.sorting.order_number_column);
    diag.log.info(format!(
        "{} renumbered 1 to {}",
        profile.sorting.order_number_column,
        numbered.len()
    ));

    let (padded, groups) = pad_categories(&numbered, profile, &mut diag);

    let stats = PipelineStats {
        rows_in: table.len(),
        rows_filtered: filtered.len(),
        rows_out: padded.len(),
        filler_rows: groups.iter().map(|g| g.missing).sum(),
        offers_applied,
        dropped_columns,
    };

    let (log, warnings) = diag.into_parts();
    Ok(PipelineOutput {
        table: padded,
        log,
        warnings,
        stats,
        zone,
        lines,
        groups,
    })
}

/// Options for [`process_file`]
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub zone: Zone,

    /// Selected lines (validated against the profile's fixed set)
    pub lines: Vec<u32>,

    /// Output path; defaults to `<stem>_procesado.xlsx` next to the input
    pub output: Option<PathBuf>,

    pub profile: Profile,
}

impl ProcessOptions {
    pub fn new(zone: Zone, lines: Vec<u32>) -> Self {
        Self {
            zone,
            lines,
            output: None,
            profile: Profile::default(),
        }
    }
}

/// Result of [`process_file`]
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Pipeline result; its table is the exported one and its log covers
    /// loading and export too
    pub run: PipelineOutput,
    /// Console preview of the first rows
    pub preview: String,
}

impl ProcessOutcome {
    /// Closing line printed after the preview.
    pub fn ready_line(&self) -> String {
        format!("✅ File ready to open in Excel: {}", self.output.display())
    }
}

/// `<stem>_procesado.xlsx` in the input's directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalogo".to_string());
    input.with_file_name(format!("{}_procesado.xlsx", stem))
}

/// Load `input`, run the pipeline and write the styled workbook.
///
/// Line selection is checked before anything is read. Nothing is written
/// when loading or any stage fails.
pub fn process_file<P: AsRef<Path>>(input: P, options: &ProcessOptions) -> PipelineResult<ProcessOutcome> {
    let input = input.as_ref();
    let profile = &options.profile;
    normalize_lines(&options.lines, &profile.lines.fixed)?;

    let loaded = load_catalog(input, &profile.source)?;

    let mut log = RunLog::new();
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    log.success(format!("File loaded: {}", file_name));
    if let Some(sheet) = &loaded.sheet {
        log.info_indent(format!("Sheet: {}", sheet), 1);
    }
    if let (Some(encoding), Some(delimiter)) = (&loaded.encoding, loaded.delimiter) {
        log.info_indent(format!("Encoding: {}, delimiter: {:?}", encoding, delimiter), 1);
    }
    log.info_indent(
        format!(
            "Rows loaded (after skipping {} rows): {}",
            loaded.skipped_rows,
            loaded.table.len()
        ),
        1,
    );
    log.info_indent(
        format!(
            "Columns (from row {}): {:?}",
            profile.source.header_row + 1,
            loaded.table.columns()
        ),
        1,
    );

    let mut run = run_pipeline(&loaded.table, options.zone, &options.lines, profile)?;
    log.extend(std::mem::take(&mut run.log));

    let table = normalize_numeric(&run.table, &profile.export);
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));
    let meta = ExportMeta::new(options.zone, run.lines.clone());
    export_catalog(&table, &meta, &output, &profile.export)?;

    log.success(format!("Workbook exported: {}", output.display()));
    log.info_indent(format!("Total products: {}", table.len()), 1);
    log.info_indent("Formatting applied: 2-decimal numbers, styled header", 1);

    let preview = preview(&table, &profile.export, &profile.pricing.selected_column);
    run.table = table;
    run.log = log;

    Ok(ProcessOutcome {
        input: input.to_path_buf(),
        output,
        run,
        preview,
    })
}
