//! Domain models for the catalog pipeline.
//!
//! - [`Zone`] - pricing region (selects price tiers and column pruning)
//! - [`FIXED_LINES`] - the product lines a run can select from
//! - [`Table`] / [`Row`] - the catalog table every stage consumes and produces
//! - cell helpers - explicit, failure-tolerant coercion of dynamic cell values
//!
//! Cells are `serde_json::Value`s restricted to `String`, `Number`, `Bool` and
//! `Null`. Nothing in the pipeline relies on implicit coercion: every numeric
//! or textual view of a cell goes through [`to_number`] or [`cell_text`].

pub mod table;

pub use table::{Row, Table};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Zone
// =============================================================================

/// Geographic pricing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Buenos Aires metro area (zone A).
    #[serde(rename = "GBA-CABA")]
    GbaCaba,
    /// Rest of the country (zone B). Also drops the list-price column block.
    #[serde(rename = "INTERIOR")]
    Interior,
}

impl Zone {
    /// Label used in logs and in the exported metadata block.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GbaCaba => "GBA-CABA",
            Self::Interior => "INTERIOR",
        }
    }

    pub fn all() -> [Zone; 2] {
        [Self::GbaCaba, Self::Interior]
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "gba-caba" | "gba" | "caba" | "a" => Ok(Self::GbaCaba),
            "interior" | "b" => Ok(Self::Interior),
            other => Err(format!("unknown zone '{}' (expected GBA-CABA or INTERIOR)", other)),
        }
    }
}

// =============================================================================
// Lines
// =============================================================================

/// Product lines offered for selection, in display order.
pub const FIXED_LINES: [u32; 5] = [1, 2, 8, 31, 32];

/// Line code held by a cell, if it holds a whole non-negative number.
///
/// Spreadsheet sources give numbers; CSV sources may give the digits as text.
pub fn line_code(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.fract() == 0.0 && n >= 0.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

// =============================================================================
// Cell helpers
// =============================================================================

/// Numeric view of a cell. Invalid or blank values give `None`.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Numeric cell value; non-finite numbers become `Null`.
pub fn number_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Coerce a cell to a number cell (`Null` when not numeric).
pub fn coerce_numeric(value: &Value) -> Value {
    to_number(value).map(number_value).unwrap_or(Value::Null)
}

/// Round half away from zero to two decimals.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Text view of a cell. `Null` is the empty string; whole floats drop the `.0`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Whether a cell is `Null` or blank text.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
