//! Rule engine stages.
//!
//! Each stage borrows the previous table and returns a new one; the input is
//! never modified. Anomalies go to the shared [`Diagnostics`].
//!
//! ```text
//! filter_lines → prune_zone_columns → select_prices → sort_catalog → renumber
//! ```

use regex::Regex;
use serde_json::{json, Value};

use super::columns::{resolve_line_column, resolve_order_column, resolve_price_columns, LineResolver};
use crate::config::{LineSettings, PricingSettings, PruneSettings, SortSettings};
use crate::error::PipelineWarning;
use crate::models::{cell_text, coerce_numeric, line_code, Table, Zone};
use crate::report::Diagnostics;

// =============================================================================
// Line filter
// =============================================================================

/// Keep the rows whose line code is in `selected`.
///
/// Without a line column every row passes and a warning is recorded.
pub fn filter_lines(
    table: &Table,
    selected: &[u32],
    settings: &LineSettings,
    diag: &mut Diagnostics,
) -> Table {
    let Some(column) = resolve_line_column(table, settings) else {
        diag.warn(PipelineWarning::MissingLineColumn {
            candidates: settings.column_candidates.clone(),
        });
        return table.clone();
    };

    let how = match column.resolver {
        LineResolver::Exact => "header match",
        LineResolver::UnnamedFallback => "unnamed column fallback",
    };
    diag.log.info(format!("Line column: '{}' ({})", column.name, how));

    let filtered = table.filter(|row| {
        row.get(&column.name)
            .and_then(line_code)
            .map_or(false, |code| selected.contains(&code))
    });
    diag.log.info(format!("Rows after line filter: {}", filtered.len()));
    filtered
}

// =============================================================================
// Zone column pruning
// =============================================================================

/// Drop the `start_marker..=end_marker` column block for the interior zone.
///
/// Returns the pruned table and the names of the dropped columns.
pub fn prune_zone_columns(
    table: &Table,
    zone: Zone,
    settings: &PruneSettings,
    diag: &mut Diagnostics,
) -> (Table, Vec<String>) {
    diag.log.info(format!("Applying column rules for zone {}", zone));
    if zone != Zone::Interior {
        return (table.clone(), Vec::new());
    }

    let start_marker = settings.start_marker.to_lowercase();
    let end_marker = settings.end_marker.to_lowercase();
    let columns = table.columns();

    let start = columns
        .iter()
        .position(|c| c.to_lowercase().contains(&start_marker));
    let end = start.and_then(|s| {
        columns[s..]
            .iter()
            .position(|c| c.to_lowercase().contains(&end_marker))
            .map(|offset| s + offset)
    });

    match (start, end) {
        (Some(start), Some(end)) => {
            let dropped = columns[start..=end].to_vec();
            diag.log.info_indent(
                format!("Columns dropped for {}: {:?}", zone, dropped),
                1,
            );
            (table.drop_columns(&dropped), dropped)
        }
        _ => {
            diag.warn(PipelineWarning::NoPruneMarkers {
                start: settings.start_marker.clone(),
                end: settings.end_marker.clone(),
            });
            (table.clone(), Vec::new())
        }
    }
}

// =============================================================================
// Price selection
// =============================================================================

/// Fill the selected-price column and apply the offer rule.
///
/// Every row starts at the default price. A row takes the offer price when its
/// order code contains a match of `order_pattern` and its condition text
/// contains one of the offer markers. Returns the table and the number of
/// offers applied.
pub fn select_prices(
    table: &Table,
    zone: Zone,
    pricing: &PricingSettings,
    order_pattern: &Regex,
    diag: &mut Diagnostics,
) -> (Table, usize) {
    diag.log.info("Applying price rules...");
    let mut out = table.clone();
    let selected = pricing.selected_column.as_str();

    let prices = match resolve_price_columns(&out, zone, pricing, &mut diag.log) {
        Ok(prices) => prices,
        Err(warning) => {
            diag.warn(warning);
            out.set_column_with(selected, |_, _| Value::Null);
            return (out, 0);
        }
    };

    out.map_column(&prices.default, coerce_numeric);
    out.map_column(&prices.offer, coerce_numeric);
    out.set_column_with(selected, |_, row| {
        row.get(&prices.default).cloned().unwrap_or(Value::Null)
    });

    let order_column = resolve_order_column(&out, pricing).map(String::from);
    let condition_column = out
        .has_column(&pricing.condition_column)
        .then(|| pricing.condition_column.clone());

    let (order_column, condition_column) = match (order_column, condition_column) {
        (Some(order), Some(condition)) => (order, condition),
        (order, condition) => {
            let mut missing = Vec::new();
            if order.is_none() {
                missing.push(pricing.order_columns.join("|"));
            }
            if condition.is_none() {
                missing.push(pricing.condition_column.clone());
            }
            diag.warn(PipelineWarning::MissingOfferColumns { missing });
            diag.log.info("Price rules applied. Offers found: 0");
            return (out, 0);
        }
    };

    let markers: Vec<String> = pricing.offer_markers.iter().map(|m| m.to_lowercase()).collect();
    let mut offers = 0;
    out.set_column_with(selected, |_, row| {
        let current = row.get(selected).cloned().unwrap_or(Value::Null);

        let order_matches = row
            .get(&order_column)
            .map_or(false, |v| order_pattern.is_match(&cell_text(v)));
        let condition = row
            .get(&condition_column)
            .map(|v| cell_text(v).to_lowercase())
            .unwrap_or_default();
        let is_offer = markers.iter().any(|m| condition.contains(m.as_str()));

        if order_matches && is_offer {
            offers += 1;
            row.get(&prices.offer).cloned().unwrap_or(Value::Null)
        } else {
            current
        }
    });

    diag.log.info(format!("Price rules applied. Offers found: {}", offers));
    (out, offers)
}

// =============================================================================
// Sort & renumber
// =============================================================================

/// Leading integer of a category label, or `missing` when there is none.
///
/// `"12 - Snacks"` gives 12; `""`, null and `"Varios"` give `missing`.
pub fn category_key(value: Option<&Value>, missing: u64) -> u64 {
    let text = value.map(cell_text).unwrap_or_default();
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(missing)
}

/// Stable sort by (category key, brand).
///
/// Brands compare as plain text; rows without a brand go after every brand
/// of their category.
pub fn sort_catalog(table: &Table, sorting: &SortSettings, diag: &mut Diagnostics) -> Table {
    let missing: Vec<String> = [&sorting.category_column, &sorting.brand_column]
        .into_iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        diag.warn(PipelineWarning::MissingSortColumns { missing });
        return table.clone();
    }

    let sorted = table.sorted_by_key(|row| {
        let key = category_key(row.get(&sorting.category_column), sorting.missing_category_key);
        let brand = match row.get(&sorting.brand_column) {
            None | Some(Value::Null) => (1u8, String::new()),
            Some(v) => (0u8, cell_text(v)),
        };
        (key, brand)
    });

    diag.log.info(format!(
        "Sorted by {} (numeric) and {} (alphabetical)",
        sorting.category_column, sorting.brand_column
    ));
    sorted
}

/// Overwrite `column` with 1..N in row order, appending it when absent.
pub fn renumber(table: &Table, column: &str) -> Table {
    let mut out = table.clone();
    out.set_column_with(column, |i, _| json!(i + 1));
    out
}
