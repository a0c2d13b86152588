//! Column resolution.
//!
//! Headers in catalog exports drift between files (`Linea` vs `LINEA`, a
//! headerless line column, a missing price tier). Each logical column is
//! found by an ordered list of resolvers; the first one that matches wins and
//! is reported, so the log always says how a column was picked.

use crate::config::{LineSettings, PricingSettings};
use crate::error::PipelineWarning;
use crate::models::{Table, Zone};
use crate::report::RunLog;

/// Which resolver located the line column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineResolver {
    /// A header equal to one of the candidate names.
    Exact,
    /// The headerless column at the usual line position.
    UnnamedFallback,
}

/// Resolved line column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineColumn {
    pub name: String,
    pub resolver: LineResolver,
}

/// Find the product-line column.
///
/// Exact candidates are tried first, in order. Failing that, the column at
/// `fallback_index` is used when its lower-cased name is one of the
/// `Unnamed:` placeholders the loader gives blank headers.
pub fn resolve_line_column(table: &Table, settings: &LineSettings) -> Option<LineColumn> {
    if let Some(name) = table.find_column(&settings.column_candidates) {
        return Some(LineColumn {
            name: name.to_string(),
            resolver: LineResolver::Exact,
        });
    }

    let candidate = table.columns().get(settings.fallback_index)?;
    let lowered = candidate.to_lowercase();
    settings
        .unnamed_placeholders
        .iter()
        .any(|p| p.to_lowercase() == lowered)
        .then(|| LineColumn {
            name: candidate.clone(),
            resolver: LineResolver::UnnamedFallback,
        })
}

/// Resolved default/offer price columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceColumns {
    pub default: String,
    pub offer: String,
    /// Whether the alternate pair replaced the zone's own pair.
    pub fallback: bool,
}

/// Pick the price pair for `zone`, falling back to the alternate pair.
///
/// Both columns of a pair must exist for the pair to be used.
pub fn resolve_price_columns(
    table: &Table,
    zone: Zone,
    pricing: &PricingSettings,
    log: &mut RunLog,
) -> Result<PriceColumns, PipelineWarning> {
    let pair = pricing.pair(zone);
    if table.has_column(&pair.default) && table.has_column(&pair.offer) {
        return Ok(PriceColumns {
            default: pair.default.clone(),
            offer: pair.offer.clone(),
            fallback: false,
        });
    }

    log.warning(format!(
        "Price columns for {} not found ({}, {})",
        zone, pair.default, pair.offer
    ));

    let alt = &pricing.fallback;
    if table.has_column(&alt.default) && table.has_column(&alt.offer) {
        log.info_indent(format!("Using alternate columns: {}, {}", alt.default, alt.offer), 1);
        return Ok(PriceColumns {
            default: alt.default.clone(),
            offer: alt.offer.clone(),
            fallback: true,
        });
    }

    Err(PipelineWarning::MissingPriceColumns {
        zone,
        tried: vec![
            pair.default.clone(),
            pair.offer.clone(),
            alt.default.clone(),
            alt.offer.clone(),
        ],
    })
}

/// Order-code column: the first of `order_columns` present.
pub fn resolve_order_column<'a>(table: &'a Table, pricing: &PricingSettings) -> Option<&'a str> {
    table.find_column(&pricing.order_columns)
}
