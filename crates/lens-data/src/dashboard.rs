//! One serialisable snapshot of every chart view for the current filter.

use std::fmt;
use std::str::FromStr;

use lens_core::error::{LensError, Result};
use lens_core::models::{ExpenseRecord, IndividualExpenseRecord, ParseWarning};
use serde::Serialize;

use crate::aggregator::{
    axis_values, ExpenseAggregator, LabeledValue, LineChartData, TotalsOrder, TrendSeries,
};
use crate::breakdown::{build_breakdown, Breakdown};
use crate::catalog::Catalog;
use crate::filter::{Facet, FilterState};
use crate::parser::{parse_expenses, parse_individual};
use crate::query::filtered_records;

/// Dataset label prefix of the category bar chart.
pub const BAR_LABEL: &str = "Gastos";
/// Dataset label prefix of the subcategory pie chart.
pub const PIE_LABEL: &str = "Proporción";

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Everything one load produced: parsed records plus their warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<ExpenseRecord>,
    /// Present only when a single-value series was loaded alongside.
    pub individual: Option<Vec<IndividualExpenseRecord>>,
    pub warnings: Vec<ParseWarning>,
    pub individual_warnings: Vec<ParseWarning>,
}

impl Dataset {
    /// Parse raw text into a dataset. Never fails; problems become warnings.
    pub fn from_text(expenses: &str, individual: Option<&str>, amount_column: &str) -> Self {
        let parsed = parse_expenses(expenses, amount_column);
        let (individual, individual_warnings) = match individual.map(parse_individual) {
            Some(outcome) => (Some(outcome.records), outcome.warnings),
            None => (None, Vec::new()),
        };
        Self {
            records: parsed.records,
            individual,
            warnings: parsed.warnings,
            individual_warnings,
        }
    }

    /// All warnings as display strings; single-series ones are prefixed.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings
            .iter()
            .map(ToString::to_string)
            .chain(
                self.individual_warnings
                    .iter()
                    .map(|w| format!("individual series: {w}")),
            )
            .collect()
    }
}

// ── ViewKind ──────────────────────────────────────────────────────────────────

/// Which part of the dashboard to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    All,
    Line,
    Bar,
    Pie,
    Breakdown,
    Trend,
}

impl ViewKind {
    fn includes(self, part: ViewKind) -> bool {
        self == ViewKind::All || self == part
    }
}

impl FromStr for ViewKind {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ViewKind::All),
            "line" => Ok(ViewKind::Line),
            "bar" => Ok(ViewKind::Bar),
            "pie" => Ok(ViewKind::Pie),
            "breakdown" => Ok(ViewKind::Breakdown),
            "trend" => Ok(ViewKind::Trend),
            other => Err(LensError::Config(format!("unknown view '{other}'"))),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewKind::All => "all",
            ViewKind::Line => "line",
            ViewKind::Bar => "bar",
            ViewKind::Pie => "pie",
            ViewKind::Breakdown => "breakdown",
            ViewKind::Trend => "trend",
        };
        f.write_str(name)
    }
}

// ── Output types ──────────────────────────────────────────────────────────────

/// Label→value pairs plus the dataset label a renderer shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledDataset {
    pub label: String,
    pub values: Vec<LabeledValue>,
}

/// Selection state of one facet as the widget layer needs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetSummary {
    pub selected: Vec<String>,
    /// Derived "select all" indicator.
    pub all: bool,
    pub summary: String,
}

impl FacetSummary {
    fn of(filter: &FilterState, facet: Facet) -> Self {
        Self {
            selected: filter.selected_values(facet).iter().cloned().collect(),
            all: filter.all_checked(facet),
            summary: filter.summary(facet),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub months: FacetSummary,
    pub categories: FacetSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub view: ViewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineChartData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar: Option<LabeledDataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pie: Option<LabeledDataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendSeries>,
    pub filters: FilterSummary,
    pub warnings: Vec<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Run the query once and derive every requested view from its result.
pub fn build_dashboard(
    dataset: &Dataset,
    catalog: &Catalog,
    filter: &FilterState,
    view: ViewKind,
) -> DashboardView {
    let filtered = filtered_records(&dataset.records, filter);
    let months = axis_values(filter, Facet::Month);

    let line = view.includes(ViewKind::Line).then(|| {
        let categories = axis_values(filter, Facet::Category);
        ExpenseAggregator::series_by_category(&filtered, &months, &categories, catalog)
    });

    let bar = view.includes(ViewKind::Bar).then(|| LabeledDataset {
        label: range_label(BAR_LABEL, &months),
        values: ExpenseAggregator::totals_by_category(&filtered, TotalsOrder::FirstSeen),
    });

    let pie = view.includes(ViewKind::Pie).then(|| LabeledDataset {
        label: range_label(PIE_LABEL, &months),
        values: ExpenseAggregator::totals_by_subcategory(&filtered, TotalsOrder::FirstSeen),
    });

    let breakdown = view
        .includes(ViewKind::Breakdown)
        .then(|| build_breakdown(&filtered, filter, catalog));

    let trend = match &dataset.individual {
        Some(points) if view.includes(ViewKind::Trend) => {
            Some(ExpenseAggregator::percent_change_trend(points, catalog))
        }
        _ => None,
    };

    tracing::debug!(%view, filtered = filtered.len(), "dashboard built");

    DashboardView {
        view,
        line,
        bar,
        pie,
        breakdown,
        trend,
        filters: FilterSummary {
            months: FacetSummary::of(filter, Facet::Month),
            categories: FacetSummary::of(filter, Facet::Category),
        },
        warnings: dataset.warning_messages(),
    }
}

/// `"<prefix> (<first> a <last>)"` over the months a view spans.
fn range_label(prefix: &str, months: &[String]) -> String {
    match (months.first(), months.last()) {
        (Some(first), Some(last)) => format!("{prefix} ({first} a {last})"),
        _ => prefix.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
