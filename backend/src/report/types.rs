//! JSON run report.
//!
//! Written by `catalog process --report <file>` for both successful and
//! failed runs, so a batch driver can pick up results without parsing the
//! console log.

use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use super::logs::{LogEntry, RunLog};
use crate::error::PipelineWarning;
use crate::models::Zone;
use crate::transform::pipeline::ProcessOutcome;

/// Summary of one `process` run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: String,

    /// Status: "ready", "warning", "error"
    pub status: String,

    pub input: String,

    /// Written workbook, absent on failure
    pub output: Option<String>,

    pub zone: Zone,

    pub lines: Vec<u32>,

    pub rows_in: usize,
    pub rows_out: usize,
    pub filler_rows: usize,
    pub offers_applied: usize,

    /// Columns removed for the zone
    pub dropped_columns: Vec<String>,

    pub warnings: Vec<PipelineWarning>,

    /// Failure message when status is "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub log: Vec<LogEntry>,
}

impl RunReport {
    /// Report for a completed run.
    pub fn from_outcome(outcome: &ProcessOutcome) -> Self {
        let run = &outcome.run;
        let status = if run.warnings.is_empty() { "ready" } else { "warning" };

        Self {
            run_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            input: outcome.input.display().to_string(),
            output: Some(outcome.output.display().to_string()),
            zone: run.zone,
            lines: run.lines.clone(),
            rows_in: run.stats.rows_in,
            rows_out: run.stats.rows_out,
            filler_rows: run.stats.filler_rows,
            offers_applied: run.stats.offers_applied,
            dropped_columns: run.stats.dropped_columns.clone(),
            warnings: run.warnings.clone(),
            error: None,
            log: run.log.entries().to_vec(),
        }
    }

    /// Report for a run that stopped with `message`.
    pub fn failure(input: &Path, zone: Zone, lines: &[u32], message: impl Into<String>) -> Self {
        let message = message.into();
        let mut log = RunLog::new();
        log.error(message.clone());

        Self {
            run_id: Uuid::new_v4().to_string(),
            status: "error".to_string(),
            input: input.display().to_string(),
            output: None,
            zone,
            lines: lines.to_vec(),
            rows_in: 0,
            rows_out: 0,
            filler_rows: 0,
            offers_applied: 0,
            dropped_columns: Vec::new(),
            warnings: Vec::new(),
            error: Some(message),
            log: log.entries().to_vec(),
        }
    }

    /// Pretty JSON written to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Table;
    use crate::transform::pipeline::{run_pipeline, ProcessOutcome};
    use crate::config::Profile;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn outcome() -> ProcessOutcome {
        let table = Table::from_records(
            ["Linea", "Rubro", "Marca", "l1 5", "l1 9"],
            vec![json!({"Linea": 1, "Rubro": "1", "Marca": "A", "l1 5": 10, "l1 9": 9})],
        );
        let run = run_pipeline(&table, Zone::GbaCaba, &[1], &Profile::default()).unwrap();
        ProcessOutcome {
            input: PathBuf::from("in.xlsx"),
            output: PathBuf::from("in_procesado.xlsx"),
            run,
            preview: String::new(),
        }
    }

    #[test]
    fn test_report_from_outcome() {
        let report = RunReport::from_outcome(&outcome());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["zone"], "GBA-CABA");
        assert_eq!(json["rowsIn"], 1);
        assert_eq!(json["rowsOut"], 8);
        assert_eq!(json["fillerRows"], 7);
        // no condicion/ord columns
        assert_eq!(json["status"], "warning");
        assert_eq!(json["warnings"][0]["kind"], "missingOfferColumns");
        assert!(json.get("error").is_none());
        assert!(Uuid::parse_str(&report.run_id).is_ok());
    }

    #[test]
    fn test_failure_report() {
        let report = RunReport::failure(Path::new("x.csv"), Zone::Interior, &[2], "Load error: boom");
        assert_eq!(report.status, "error");
        assert_eq!(report.output, None);
        assert_eq!(report.log.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"], "Load error: boom");
        assert_eq!(json["log"][0]["level"], "error");
    }

    #[test]
    fn test_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        RunReport::from_outcome(&outcome()).save(&path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["lines"], json!([1]));
    }
}
