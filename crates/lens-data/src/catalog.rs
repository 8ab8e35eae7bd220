//! Distinct month and category universes derived from a loaded dataset.

use std::collections::{BTreeSet, HashMap};

use lens_core::models::ExpenseRecord;
use lens_core::palette::color_at;
use serde::Serialize;

/// The derived universe of a dataset load.
///
/// Built once per load; colours are fixed at build time so they stay stable
/// for as long as the dataset is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    /// Distinct months, ascending.
    pub months: Vec<String>,
    /// Distinct non-`"Total"` categories, ascending.
    pub categories: Vec<String>,
    #[serde(skip)]
    colors: HashMap<String, &'static str>,
    #[serde(skip)]
    month_positions: HashMap<String, usize>,
}

impl Catalog {
    /// Derive the catalog from `records`. Pure and deterministic.
    pub fn build(records: &[ExpenseRecord]) -> Self {
        let months: Vec<String> = records
            .iter()
            .map(|r| r.month.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let categories: Vec<String> = records
            .iter()
            .filter(|r| !r.is_total())
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let colors = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), color_at(i)))
            .collect();

        let month_positions = months
            .iter()
            .enumerate()
            .map(|(i, m)| (m.clone(), i))
            .collect();

        tracing::debug!(
            months = months.len(),
            categories = categories.len(),
            "catalog built"
        );

        Self {
            months,
            categories,
            colors,
            month_positions,
        }
    }

    /// Display colour of `category`, or `None` for values outside the catalog.
    pub fn color_of(&self, category: &str) -> Option<&'static str> {
        self.colors.get(category).copied()
    }

    /// Chronological position of `month` in the catalog.
    pub fn month_position(&self, month: &str) -> Option<usize> {
        self.month_positions.get(month).copied()
    }

    /// `true` when the dataset contributed no months and no categories.
    pub fn is_empty(&self) -> bool {
        self.months.is_empty() && self.categories.is_empty()
    }

    /// The most recent month in the catalog.
    pub fn latest_month(&self) -> Option<&str> {
        self.months.last().map(String::as_str)
    }
}

/// Free-function form of [`Catalog::build`].
pub fn build_catalog(records: &[ExpenseRecord]) -> Catalog {
    Catalog::build(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
