//! Transformation module.
//!
//! - Columns: locate line, price and order columns among drifting headers
//! - Rules: line filter, zone pruning, price selection, sort, renumber
//! - Padding: fill each category to a multiple of the group size
//! - Pipeline: the stages in order, plus load/export around them

pub mod columns;
pub mod padding;
pub mod pipeline;
pub mod rules;

pub use columns::{resolve_line_column, resolve_order_column, resolve_price_columns, LineColumn, LineResolver, PriceColumns};
pub use padding::{pad_categories, GroupPadding};
pub use pipeline::*;
pub use rules::{category_key, filter_lines, prune_zone_columns, renumber, select_prices, sort_catalog};
