//! Group-by/sum over the filtered record set.
//!
//! Every view consumed by the chart renderers is built here from the output
//! of [`crate::query::filtered_records`]; nothing in this module filters.

use std::collections::HashMap;

use lens_core::formatting::percent_change;
use lens_core::models::{ExpenseRecord, IndividualExpenseRecord};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::filter::{Facet, FilterState};

// ── Output types ──────────────────────────────────────────────────────────────

/// One line of a multi-series chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub color: Option<&'static str>,
    /// One value per label of the owning [`LineChartData`].
    pub values: Vec<f64>,
}

/// Aligned multi-series data: every series has exactly one value per label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineChartData {
    pub labels: Vec<String>,
    pub series: Vec<NamedSeries>,
}

/// A label→value pair for bar and pie charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

/// Ordering of grouped totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalsOrder {
    /// Order in which each key first appears in the input.
    #[default]
    FirstSeen,
    /// Ascending by key.
    Sorted,
}

/// Single-series trend with period-over-period change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSeries {
    /// Months in chronological order.
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Percent change between each adjacent pair; one shorter than `values`.
    pub changes: Vec<f64>,
}

// ── ExpenseAggregator ─────────────────────────────────────────────────────────

/// Stateless helper grouping filtered records along month, category or
/// subcategory axes.
pub struct ExpenseAggregator;

impl ExpenseAggregator {
    /// Sum per category per month.
    ///
    /// Months are sorted chronologically; a month without records for a
    /// category contributes `0`, so all series share the same labels.
    pub fn series_by_category(
        filtered: &[&ExpenseRecord],
        months: &[String],
        categories: &[String],
        catalog: &Catalog,
    ) -> LineChartData {
        let mut labels = months.to_vec();
        labels.sort_by(|a, b| chronological(catalog, a, b));

        let mut sums: HashMap<(&str, &str), f64> = HashMap::new();
        for record in filtered {
            *sums
                .entry((record.category.as_str(), record.month.as_str()))
                .or_insert(0.0) += record.amount;
        }

        let series = categories
            .iter()
            .map(|category| NamedSeries {
                name: category.clone(),
                color: catalog.color_of(category),
                values: labels
                    .iter()
                    .map(|month| {
                        sums.get(&(category.as_str(), month.as_str()))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect(),
            })
            .collect();

        LineChartData { labels, series }
    }

    /// Sum per category, excluding `"Total"` rows.
    pub fn totals_by_category(filtered: &[&ExpenseRecord], order: TotalsOrder) -> Vec<LabeledValue> {
        Self::totals_by(filtered, order, |r| r.category.as_str())
    }

    /// Sum per subcategory, excluding `"Total"` rows.
    pub fn totals_by_subcategory(
        filtered: &[&ExpenseRecord],
        order: TotalsOrder,
    ) -> Vec<LabeledValue> {
        Self::totals_by(filtered, order, |r| r.subcategory.as_str())
    }

    /// Sum of every amount in `filtered`, `"Total"` rows included.
    pub fn sum_amounts(filtered: &[&ExpenseRecord]) -> f64 {
        filtered.iter().map(|r| r.amount).sum()
    }

    /// Chronological single-series trend with percent change per step.
    ///
    /// The feed order is not trusted: points are re-sorted by their month's
    /// position in `catalog`. Months unknown to the catalog go last, in
    /// lexicographic order.
    pub fn percent_change_trend(points: &[IndividualExpenseRecord], catalog: &Catalog) -> TrendSeries {
        let mut ordered: Vec<&IndividualExpenseRecord> = points.iter().collect();
        ordered.sort_by(|a, b| chronological(catalog, &a.month, &b.month));

        let values: Vec<f64> = ordered.iter().map(|p| p.amount).collect();
        let changes = values
            .windows(2)
            .map(|pair| percent_change(pair[0], pair[1]))
            .collect();

        TrendSeries {
            labels: ordered.iter().map(|p| p.month.clone()).collect(),
            values,
            changes,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn totals_by<'a>(
        filtered: &[&'a ExpenseRecord],
        order: TotalsOrder,
        key_fn: impl Fn(&'a ExpenseRecord) -> &'a str,
    ) -> Vec<LabeledValue> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut totals: Vec<LabeledValue> = Vec::new();

        for record in filtered.iter().copied().filter(|r| !r.is_total()) {
            let key = key_fn(record);
            let idx = *positions.entry(key).or_insert_with(|| {
                totals.push(LabeledValue {
                    label: key.to_string(),
                    value: 0.0,
                });
                totals.len() - 1
            });
            totals[idx].value += record.amount;
        }

        if order == TotalsOrder::Sorted {
            totals.sort_by(|a, b| a.label.cmp(&b.label));
        }
        totals
    }
}

/// Values of `facet` the views should span: the checked values in catalog
/// order, or the whole universe when nothing is checked.
pub fn axis_values(filter: &FilterState, facet: Facet) -> Vec<String> {
    let state = filter.facet(facet);
    let selected = state.selected_values();
    if selected.is_empty() {
        return state.values().to_vec();
    }
    state
        .values()
        .iter()
        .filter(|v| selected.contains(*v))
        .cloned()
        .collect()
}

/// Order months by catalog position; unknown months sort last, by string.
fn chronological(catalog: &Catalog, a: &str, b: &str) -> std::cmp::Ordering {
    let key = |m: &str| (catalog.month_position(m).unwrap_or(usize::MAX), m.to_string());
    key(a).cmp(&key(b))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
