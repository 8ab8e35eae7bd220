//! Applies a [`FilterState`] to the record set.

use lens_core::models::ExpenseRecord;

use crate::filter::{Facet, FilterState};

/// Records passing both facets, in their original relative order.
///
/// A record passes iff its month passes the month facet AND its category
/// passes the category facet; within a facet any checked value matches, and
/// a facet with nothing checked lets everything through.
pub fn filtered_records<'a>(
    records: &'a [ExpenseRecord],
    filter: &FilterState,
) -> Vec<&'a ExpenseRecord> {
    let months = filter.selection(Facet::Month);
    let categories = filter.selection(Facet::Category);

    let filtered: Vec<&ExpenseRecord> = records
        .iter()
        .filter(|r| months.matches(&r.month) && categories.matches(&r.category))
        .collect();

    tracing::debug!(
        total = records.len(),
        kept = filtered.len(),
        "records filtered"
    );
    filtered
}

// ── Tests ─────────────────────────────────────────────────────────────────────
