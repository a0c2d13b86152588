//! Processing profile - every column name and constant the pipeline relies on.
//!
//! The built-in [`Profile::default`] matches the layout of the "catálogo madre"
//! workbooks: header on the 12th row, `Rubro`/`Marca` for ordering, `l1`/`l2`
//! price tiers per zone, and so on. A JSON file can override any subset of it;
//! omitted fields keep their defaults.
//!
//! ```rust,ignore
//! use catalog::Profile;
//!
//! let profile = Profile::from_file("perfil.json")?;
//! println!("header row: {}", profile.source.header_row + 1);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{ProfileError, ProfileResult};
use crate::models::{Zone, FIXED_LINES};
use crate::validation::validate_profile;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Complete processing profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub source: SourceSettings,
    pub lines: LineSettings,
    pub pruning: PruneSettings,
    pub pricing: PricingSettings,
    pub sorting: SortSettings,
    pub padding: PaddingSettings,
    pub export: ExportSettings,
}

/// How the source spreadsheet is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceSettings {
    /// Zero-based physical row holding the header (11 = the 12th row).
    pub header_row: usize,
    /// Columns kept as text whatever their apparent shape.
    pub text_columns: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            header_row: 11,
            text_columns: strings(&["Codigo"]),
        }
    }
}

/// Product line selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineSettings {
    /// Lines a run may select, in display order.
    pub fixed: Vec<u32>,
    /// Exact header names tried in order.
    pub column_candidates: Vec<String>,
    /// Position of the headerless line column in the usual layout.
    pub fallback_index: usize,
    /// Lower-cased placeholder names a headerless column may carry.
    pub unnamed_placeholders: Vec<String>,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            fixed: FIXED_LINES.to_vec(),
            column_candidates: strings(&["Linea", "linea", "LINEA", "Línea"]),
            fallback_index: 1,
            unnamed_placeholders: strings(&["unnamed: 1", "unnamed: 0"]),
        }
    }
}

/// Column block dropped for the interior zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PruneSettings {
    pub start_marker: String,
    pub end_marker: String,
}

impl Default for PruneSettings {
    fn default() -> Self {
        Self {
            start_marker: "lista1".to_string(),
            end_marker: "ad 3".to_string(),
        }
    }
}

/// A default/offer price column pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePair {
    pub default: String,
    pub offer: String,
}

impl PricePair {
    pub fn new(default: &str, offer: &str) -> Self {
        Self {
            default: default.to_string(),
            offer: offer.to_string(),
        }
    }
}

/// Price tier selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingSettings {
    pub gba_caba: PricePair,
    pub interior: PricePair,
    /// Tried when the zone pair is incomplete.
    pub fallback: PricePair,
    /// Synthetic column receiving the resolved price.
    pub selected_column: String,
    /// Order-code column candidates, in preference order.
    pub order_columns: Vec<String>,
    pub condition_column: String,
    /// Regex searched (not anchored) in the order code.
    pub order_pattern: String,
    /// Case-insensitive substrings marking an offer condition.
    pub offer_markers: Vec<String>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            gba_caba: PricePair::new("l1 5", "l1 9"),
            interior: PricePair::new("l2 5", "l2 9"),
            fallback: PricePair::new("l1 5", "l1 9"),
            selected_column: "precio_seleccionado".to_string(),
            order_columns: strings(&["ord", "orden"]),
            condition_column: "condicion".to_string(),
            order_pattern: r"(?i)[a-z]\d{2}\.eps".to_string(),
            offer_markers: strings(&["oferta", "offer"]),
        }
    }
}

impl PricingSettings {
    pub fn pair(&self, zone: Zone) -> &PricePair {
        match zone {
            Zone::GbaCaba => &self.gba_caba,
            Zone::Interior => &self.interior,
        }
    }
}

/// Ordering and numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortSettings {
    pub category_column: String,
    pub brand_column: String,
    /// Key for categories without a leading number; sorts them last.
    pub missing_category_key: u64,
    /// Sequential position column rewritten after sorting and padding.
    pub order_number_column: String,
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            category_column: "Rubro".to_string(),
            brand_column: "Marca".to_string(),
            missing_category_key: 999,
            order_number_column: "orden".to_string(),
        }
    }
}

/// Filler rows added per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaddingSettings {
    /// Every category ends with a multiple of this many rows.
    pub group_size: usize,
    /// Column receiving [`Self::placeholder`] in filler rows.
    pub placeholder_column: String,
    pub placeholder: String,
    /// Numeric flag columns set to `0.00` in filler rows.
    pub zero_columns: Vec<String>,
}

impl Default for PaddingSettings {
    fn default() -> Self {
        Self {
            group_size: 8,
            placeholder_column: "ord".to_string(),
            placeholder: "Vacio.eps".to_string(),
            zero_columns: strings(&["0.05", "0.07", "9/especial", "0.11"]),
        }
    }
}

/// Output workbook layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub sheet_name: String,
    pub title: String,
    pub date_label: String,
    pub zone_label: String,
    pub lines_label: String,
    pub total_label: String,
    /// Columns coerced to 2-decimal numbers and formatted as such.
    pub numeric_columns: Vec<String>,
    pub number_format: String,
    /// Header fill, RGB hex without `#`.
    pub header_color: String,
    pub preview_rows: usize,
    pub preview_columns: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sheet_name: "Catálogo Procesado".to_string(),
            title: "CATÁLOGO MADRE - EXPORTACIÓN".to_string(),
            date_label: "Fecha".to_string(),
            zone_label: "Zona".to_string(),
            lines_label: "Líneas procesadas".to_string(),
            total_label: "Total productos".to_string(),
            numeric_columns: strings(&[
                "precio_seleccionado",
                "lista1", "lista 2", "lista 3", "lista 4", "lista 5",
                "l1 5", "l1 7", "l1 9", "l1 11",
                "l2 5", "l2 7", "l2 9", "l2 11",
                "l3 5", "l3 7", "l3 9", "l3 11",
                "l4 5", "l4 7", "l4 9", "l4 11",
                "l2 5.1", "l2 7.1", "l2 9.1", "l2 11.1",
                "0.05", "0.07", "9/especial", "0.11",
            ]),
            number_format: "0.00".to_string(),
            header_color: "366092".to_string(),
            preview_rows: 3,
            preview_columns: strings(&["orden", "Rubro", "Marca", "precio_seleccionado"]),
        }
    }
}

impl Profile {
    /// Load a profile from a JSON file, validating it before use.
    pub fn from_file(path: impl AsRef<Path>) -> ProfileResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse, schema-check and compile a profile from JSON text.
    pub fn from_json(content: &str) -> ProfileResult<Self> {
        let raw: Value = serde_json::from_str(content)?;
        validate_profile(&raw).map_err(ProfileError::Schema)?;
        let profile: Profile = serde_json::from_value(raw)?;
        profile.order_regex()?;
        Ok(profile)
    }

    /// Pretty JSON of the whole profile.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the profile as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ProfileResult<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Compiled order-code pattern.
    pub fn order_regex(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.pricing.order_pattern)
    }
}
