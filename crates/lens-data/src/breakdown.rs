//! Dominant-category drill-down.
//!
//! For the most recent selected month, the category with the largest spend
//! becomes the root of a two-level flow graph whose leaves are its
//! subcategories. Individual records under 1% of the root's total are merged
//! into a single `"Otros"` leaf so the graph stays legible without hiding
//! spend.

use std::collections::HashMap;

use lens_core::models::{ExpenseRecord, OTHER_SUBCATEGORY};
use lens_core::palette::{color_at, leaf_color_at, NEUTRAL_COLOR};
use serde::Serialize;
use tracing::debug;

use crate::aggregator::{ExpenseAggregator, TotalsOrder};
use crate::catalog::Catalog;
use crate::filter::{Facet, FilterState};

/// Share of the root total under which a record joins the long tail.
pub const LONG_TAIL_SHARE: f64 = 0.01;

/// Id of the root node.
pub const ROOT_NODE_ID: &str = "root";

// ── Output types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub color: &'static str,
}

/// Directed, weighted edge from the root to one leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLink {
    pub from: String,
    pub to: String,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownGraph {
    /// Month the graph describes.
    pub month: String,
    /// Dominant category; also the root node's name.
    pub category: String,
    /// Sum of every leaf, long tail included.
    pub total: f64,
    /// Root first, then leaves by descending amount.
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Why no graph could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// The month facet has nothing checked.
    NoMonthSelected,
    /// No category has a positive total in the latest selected month.
    NoCategorySpend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Breakdown {
    Graph(BreakdownGraph),
    NoData { reason: NoDataReason },
}

impl Breakdown {
    pub fn graph(&self) -> Option<&BreakdownGraph> {
        match self {
            Breakdown::Graph(g) => Some(g),
            Breakdown::NoData { .. } => None,
        }
    }
}

/// One leaf before node/link emission.
#[derive(Debug, Clone, PartialEq)]
struct Leaf {
    subcategory: String,
    amount: f64,
    long_tail: bool,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Build the drill-down graph from the filtered record set.
pub fn build_breakdown(
    filtered: &[&ExpenseRecord],
    filter: &FilterState,
    catalog: &Catalog,
) -> Breakdown {
    let Some(month) = latest_selected_month(filter, catalog) else {
        debug!("breakdown: no month selected");
        return Breakdown::NoData {
            reason: NoDataReason::NoMonthSelected,
        };
    };

    let in_month: Vec<&ExpenseRecord> = filtered
        .iter()
        .copied()
        .filter(|r| r.month == month)
        .collect();

    let Some(category) = dominant_category(&in_month) else {
        debug!(%month, "breakdown: no category with spend");
        return Breakdown::NoData {
            reason: NoDataReason::NoCategorySpend,
        };
    };

    let leaves = group_long_tail(
        in_month
            .iter()
            .copied()
            .filter(|r| r.category == category && r.amount > 0.0),
    );
    let total: f64 = leaves.iter().map(|l| l.amount).sum();

    debug!(%month, %category, leaves = leaves.len(), total, "breakdown built");

    Breakdown::Graph(emit_graph(month, category, total, &leaves))
}

/// The chronologically latest checked month, or `None` when none is checked.
pub fn latest_selected_month(filter: &FilterState, catalog: &Catalog) -> Option<String> {
    filter
        .selected_values(Facet::Month)
        .iter()
        .max_by(|a, b| {
            catalog
                .month_position(a)
                .cmp(&catalog.month_position(b))
                .then_with(|| a.cmp(b))
        })
        .cloned()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Category with the strictly largest positive sum; ties keep the first seen.
fn dominant_category(records: &[&ExpenseRecord]) -> Option<String> {
    let totals = ExpenseAggregator::totals_by_category(records, TotalsOrder::FirstSeen);
    let mut best: Option<(String, f64)> = None;
    for entry in totals {
        let beats = match &best {
            Some((_, value)) => entry.value > *value,
            None => true,
        };
        if beats {
            best = Some((entry.label, entry.value));
        }
    }
    best.filter(|(_, value)| *value > 0.0).map(|(label, _)| label)
}

/// Partition records against [`LONG_TAIL_SHARE`] of their total: records at
/// or above it become leaves (one per subcategory), the rest fold into a
/// single `"Otros"` leaf. Output is sorted by descending amount.
fn group_long_tail<'a>(records: impl Iterator<Item = &'a ExpenseRecord>) -> Vec<Leaf> {
    let records: Vec<&ExpenseRecord> = records.collect();
    let total: f64 = records.iter().map(|r| r.amount).sum();
    let threshold = total * LONG_TAIL_SHARE;

    let (main, tail): (Vec<&ExpenseRecord>, Vec<&ExpenseRecord>) =
        records.into_iter().partition(|r| r.amount >= threshold);

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut leaves: Vec<Leaf> = Vec::new();
    for record in main {
        let idx = *positions
            .entry(record.subcategory.as_str())
            .or_insert_with(|| {
                leaves.push(Leaf {
                    subcategory: record.subcategory.clone(),
                    amount: 0.0,
                    long_tail: false,
                });
                leaves.len() - 1
            });
        leaves[idx].amount += record.amount;
    }

    if !tail.is_empty() {
        leaves.push(Leaf {
            subcategory: OTHER_SUBCATEGORY.to_string(),
            amount: tail.iter().map(|r| r.amount).sum(),
            long_tail: true,
        });
    }
    leaves.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    leaves
}

fn emit_graph(month: String, category: String, total: f64, leaves: &[Leaf]) -> BreakdownGraph {
    let mut nodes = Vec::with_capacity(leaves.len() + 1);
    let mut links = Vec::with_capacity(leaves.len());

    nodes.push(GraphNode {
        id: ROOT_NODE_ID.to_string(),
        name: category.clone(),
        color: color_at(0),
    });

    for (i, leaf) in leaves.iter().enumerate() {
        let id = format!("leaf-{i}");
        let color = if leaf.long_tail {
            NEUTRAL_COLOR
        } else {
            leaf_color_at(i)
        };
        nodes.push(GraphNode {
            id: id.clone(),
            name: leaf.subcategory.clone(),
            color,
        });
        links.push(GraphLink {
            from: ROOT_NODE_ID.to_string(),
            to: id,
            value: leaf.amount,
            color,
        });
    }

    BreakdownGraph {
        month,
        category,
        total,
        nodes,
        links,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
