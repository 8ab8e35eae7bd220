//! Multi-select filter state.
//!
//! Two independent facets (months, categories), each a set of checked values
//! over the catalog's universe. The "select all" indicator is derived from the
//! checked values on every read, so it can never disagree with them.

use std::collections::BTreeSet;
use std::fmt;

use lens_core::error::{LensError, Result};
use lens_core::formatting::summarize;
use serde::Serialize;

use crate::catalog::Catalog;

/// Value the UI uses for the "select all" pseudo-option of a facet.
pub const ALL_OPTION: &str = "all";

/// Number of most recent months checked by default.
pub const DEFAULT_RECENT_MONTHS: usize = 2;

// ── Facet ─────────────────────────────────────────────────────────────────────

/// One independently filterable dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Month,
    Category,
}

impl Facet {
    /// Noun used in the "<n> …" summary label.
    pub fn plural_noun(self) -> &'static str {
        match self {
            Facet::Month => "meses",
            Facet::Category => "categorías",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Month => write!(f, "month"),
            Facet::Category => write!(f, "category"),
        }
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// What a facet lets through when querying.
///
/// A facet with nothing checked does not filter at all; this type makes that
/// explicit instead of overloading the empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No filtering on this facet.
    AllOf,
    /// Only these values pass. Never empty.
    SubsetOf(BTreeSet<String>),
}

impl Selection {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::AllOf => true,
            Selection::SubsetOf(values) => values.contains(value),
        }
    }
}

// ── FacetState ────────────────────────────────────────────────────────────────

/// Checked values of one facet over its universe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetState {
    /// Universe in catalog order.
    values: Vec<String>,
    checked: BTreeSet<String>,
}

impl FacetState {
    /// A facet over `values` with nothing checked.
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            checked: BTreeSet::new(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Set every concrete value to `checked`.
    pub fn toggle_all(&mut self, checked: bool) {
        if checked {
            self.checked = self.values.iter().cloned().collect();
        } else {
            self.checked.clear();
        }
    }

    /// Set one value. [`ALL_OPTION`] is routed to [`FacetState::toggle_all`]
    /// unless the universe contains a concrete value of that name.
    pub fn toggle_value(&mut self, facet: Facet, value: &str, checked: bool) -> Result<()> {
        if !self.contains(value) {
            if value == ALL_OPTION {
                self.toggle_all(checked);
                return Ok(());
            }
            return Err(LensError::UnknownFacetValue {
                facet: facet.to_string(),
                value: value.to_string(),
            });
        }
        if checked {
            self.checked.insert(value.to_string());
        } else {
            self.checked.remove(value);
        }
        Ok(())
    }

    /// `true` iff every concrete value is checked.
    pub fn all_checked(&self) -> bool {
        self.values.iter().all(|v| self.checked.contains(v))
    }

    pub fn is_checked(&self, value: &str) -> bool {
        self.checked.contains(value)
    }

    /// The concrete checked values, never including [`ALL_OPTION`].
    pub fn selected_values(&self) -> &BTreeSet<String> {
        &self.checked
    }

    /// Query semantics of the current state.
    pub fn selection(&self) -> Selection {
        if self.checked.is_empty() {
            Selection::AllOf
        } else {
            Selection::SubsetOf(self.checked.clone())
        }
    }

    /// Button label for the facet. A single checked value is shown by name.
    pub fn summary(&self, facet: Facet) -> String {
        if self.checked.len() == 1 && self.values.len() > 1 {
            if let Some(only) = self.checked.iter().next() {
                return only.clone();
            }
        }
        summarize(self.checked.len(), self.values.len(), facet.plural_noun())
    }

    fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Swap in a new universe, dropping checked values it lacks. A facet that
    /// was fully checked stays fully checked. Returns how many were dropped.
    fn rebase(&mut self, values: Vec<String>) -> usize {
        let was_all = !self.values.is_empty() && self.all_checked();
        let before = self.checked.len();
        self.values = values;
        if was_all {
            self.toggle_all(true);
            return 0;
        }
        let values = &self.values;
        self.checked.retain(|v| values.contains(v));
        before - self.checked.len()
    }
}

// ── FilterState ───────────────────────────────────────────────────────────────

/// The user's current month and category selections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    months: FacetState,
    categories: FacetState,
}

impl FilterState {
    /// A state over `catalog` with nothing checked in either facet.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            months: FacetState::new(catalog.months.clone()),
            categories: FacetState::new(catalog.categories.clone()),
        }
    }

    /// Initial selection for a freshly loaded catalog: every category and the
    /// most recent [`DEFAULT_RECENT_MONTHS`] months.
    pub fn with_defaults(catalog: &Catalog) -> Self {
        let mut state = Self::new(catalog);
        state.apply_defaults(Facet::Month);
        state.apply_defaults(Facet::Category);
        state
    }

    /// Reset one facet to its default selection.
    pub fn apply_defaults(&mut self, facet: Facet) {
        match facet {
            Facet::Category => self.categories.toggle_all(true),
            Facet::Month => {
                let skip = self.months.values.len().saturating_sub(DEFAULT_RECENT_MONTHS);
                self.months.checked = self.months.values.iter().skip(skip).cloned().collect();
            }
        }
    }

    pub fn facet(&self, facet: Facet) -> &FacetState {
        match facet {
            Facet::Month => &self.months,
            Facet::Category => &self.categories,
        }
    }

    fn facet_mut(&mut self, facet: Facet) -> &mut FacetState {
        match facet {
            Facet::Month => &mut self.months,
            Facet::Category => &mut self.categories,
        }
    }

    pub fn toggle_all(&mut self, facet: Facet, checked: bool) {
        self.facet_mut(facet).toggle_all(checked);
    }

    pub fn toggle_value(&mut self, facet: Facet, value: &str, checked: bool) -> Result<()> {
        self.facet_mut(facet).toggle_value(facet, value, checked)
    }

    /// Derived "select all" indicator of `facet`.
    pub fn all_checked(&self, facet: Facet) -> bool {
        self.facet(facet).all_checked()
    }

    pub fn selected_values(&self, facet: Facet) -> &BTreeSet<String> {
        self.facet(facet).selected_values()
    }

    pub fn selection(&self, facet: Facet) -> Selection {
        self.facet(facet).selection()
    }

    pub fn summary(&self, facet: Facet) -> String {
        self.facet(facet).summary(facet)
    }

    /// Check exactly `values` in `facet`. Fails without touching the state if
    /// any value is outside the facet's universe.
    pub fn select_only(&mut self, facet: Facet, values: &[String]) -> Result<()> {
        let state = self.facet(facet);
        if let Some(unknown) = values.iter().find(|v| !state.contains(v)) {
            return Err(LensError::UnknownFacetValue {
                facet: facet.to_string(),
                value: unknown.clone(),
            });
        }
        let state = self.facet_mut(facet);
        state.checked = values.iter().cloned().collect();
        Ok(())
    }

    /// Check exactly the months `m` with `from <= m <= to`.
    pub fn select_month_range(&mut self, from: &str, to: &str) -> Result<()> {
        if from > to {
            return Err(LensError::InvalidRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.months.checked = self
            .months
            .values
            .iter()
            .filter(|m| m.as_str() >= from && m.as_str() <= to)
            .cloned()
            .collect();
        Ok(())
    }

    /// Carry the selections over to a reloaded catalog.
    ///
    /// Values the new catalog lacks are dropped silently. A facet whose
    /// previous universe was empty, or that is left with nothing checked after
    /// having had a selection, falls back to its default.
    pub fn reconcile(&mut self, catalog: &Catalog) {
        for facet in [Facet::Month, Facet::Category] {
            let values = match facet {
                Facet::Month => catalog.months.clone(),
                Facet::Category => catalog.categories.clone(),
            };
            let state = self.facet_mut(facet);
            let was_unloaded = state.values.is_empty();
            let had_selection = !state.checked.is_empty();
            let dropped = state.rebase(values);
            if dropped > 0 {
                tracing::debug!(%facet, dropped, "dropped selections absent from reloaded catalog");
            }
            if was_unloaded || (had_selection && state.checked.is_empty()) {
                self.apply_defaults(facet);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
