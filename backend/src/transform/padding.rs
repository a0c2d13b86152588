//! Pad every category to a multiple of the page group size.
//!
//! Printed catalog pages hold a fixed number of products, so each category
//! must fill whole pages. Rows are grouped by category value and each group
//! gets filler rows appended until its size is a multiple of `group_size`:
//!
//! ```text
//! Rubro "5" × 10 rows  →  10 real + 6 filler  = 16
//! Rubro "7" × 8 rows   →   8 real + 0 filler  =  8
//! ```
//!
//! Groups come out in first-seen order. A category value that shows up in two
//! separate blocks forms one group, so its rows end up together.

use serde_json::{json, Value};

use super::rules::renumber;
use crate::config::Profile;
use crate::error::PipelineWarning;
use crate::models::{cell_text, to_number, Row, Table};
use crate::report::Diagnostics;

/// Outcome for one category group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPadding {
    pub category: Value,
    pub rows: usize,
    pub required: usize,
    pub missing: usize,
}

/// Pad each category, then renumber the order column 1..N.
///
/// Returns the padded table and the per-group breakdown. Without a category
/// column the table is returned unchanged with a warning.
pub fn pad_categories(
    table: &Table,
    profile: &Profile,
    diag: &mut Diagnostics,
) -> (Table, Vec<GroupPadding>) {
    let category_column = &profile.sorting.category_column;
    let order_column = &profile.sorting.order_number_column;
    let group_size = profile.padding.group_size.max(1);

    if !table.has_column(category_column) {
        diag.warn(PipelineWarning::MissingCategoryColumn {
            column: category_column.clone(),
        });
        return (table.clone(), Vec::new());
    }

    diag.log.info(format!("Applying multiple-of-{} rule...", group_size));

    let mut counter = table
        .column_values(order_column)
        .filter_map(to_number)
        .fold(None, |max: Option<f64>, n| Some(max.map_or(n, |m| m.max(n))))
        .map_or(1, |max| max.floor() as i64 + 1);

    let mut padded = Table::new(table.columns().to_vec());
    let mut groups = Vec::new();

    for (category, indices) in table.group_by(category_column) {
        let rows = indices.len();
        if rows == 0 {
            continue;
        }
        let required = rows.div_ceil(group_size) * group_size;
        let missing = required - rows;

        diag.log.info_indent(
            format!(
                "{} {}: {} rows, required {}, missing {}",
                category_column,
                category_label(&category),
                rows,
                required,
                missing
            ),
            1,
        );

        for &i in &indices {
            padded.push_row(table.rows()[i].clone());
        }
        for _ in 0..missing {
            padded.push_row(filler_row(table.columns(), &category, counter, profile));
            counter += 1;
        }

        groups.push(GroupPadding { category, rows, required, missing });
    }

    let padded = renumber(&padded, order_column);
    diag.log.info(format!(
        "Total rows after multiple-of-{} rule: {}",
        group_size,
        padded.len()
    ));
    (padded, groups)
}

/// Filler row for `category` carrying order number `order`.
pub fn filler_row(columns: &[String], category: &Value, order: i64, profile: &Profile) -> Row {
    let padding = &profile.padding;
    let mut row = Row::new();

    for column in columns {
        let value = if column == &profile.sorting.order_number_column {
            json!(order)
        } else if column == &padding.placeholder_column {
            json!(padding.placeholder)
        } else if column == &profile.sorting.category_column {
            category.clone()
        } else if column == &profile.pricing.selected_column {
            Value::Null
        } else if padding.zero_columns.contains(column) {
            json!(0.0)
        } else {
            json!("")
        };
        row.insert(column.clone(), value);
    }

    row
}

fn category_label(value: &Value) -> String {
    match value {
        Value::Null => "(empty)".to_string(),
        other => format!("'{}'", cell_text(other)),
    }
}
