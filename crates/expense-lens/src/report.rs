//! Plain-text digest of a [`DashboardView`] for `--format text`.

use std::fmt::Write;

use lens_core::formatting::{format_amount, format_change};
use lens_data::aggregator::LineChartData;
use lens_data::breakdown::Breakdown;
use lens_data::dashboard::{DashboardView, LabeledDataset};

/// Width of the label column.
const LABEL_WIDTH: usize = 24;

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Meses: {}", view.filters.months.summary);
    let _ = writeln!(out, "Categorías: {}", view.filters.categories.summary);

    if let Some(line) = &view.line {
        render_line(&mut out, line);
    }
    if let Some(bar) = &view.bar {
        render_labeled(&mut out, bar);
    }
    if let Some(pie) = &view.pie {
        render_labeled(&mut out, pie);
    }
    if let Some(breakdown) = &view.breakdown {
        render_breakdown(&mut out, breakdown);
    }
    if let Some(trend) = &view.trend {
        let _ = writeln!(out, "\nTendencia");
        for (i, (label, value)) in trend.labels.iter().zip(&trend.values).enumerate() {
            let change = match i.checked_sub(1).and_then(|j| trend.changes.get(j)) {
                Some(c) => format_change(*c),
                None => String::new(),
            };
            let _ = writeln!(
                out,
                "  {label:<LABEL_WIDTH$}{:>16}  {change}",
                format_amount(*value)
            );
        }
    }

    if !view.warnings.is_empty() {
        let _ = writeln!(out, "\nAvisos");
        for warning in &view.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }

    out
}

fn render_line(out: &mut String, line: &LineChartData) {
    let _ = writeln!(out, "\nEvolución ({})", line.labels.join(", "));
    for series in &line.series {
        let values: Vec<String> = series.values.iter().map(|v| format_amount(*v)).collect();
        let _ = writeln!(out, "  {:<LABEL_WIDTH$}{}", series.name, values.join("  "));
    }
}

fn render_labeled(out: &mut String, dataset: &LabeledDataset) {
    let _ = writeln!(out, "\n{}", dataset.label);
    for entry in &dataset.values {
        let label = if entry.label.is_empty() {
            "-"
        } else {
            entry.label.as_str()
        };
        let _ = writeln!(out, "  {label:<LABEL_WIDTH$}{:>16}", format_amount(entry.value));
    }
}

fn render_breakdown(out: &mut String, breakdown: &Breakdown) {
    match breakdown {
        Breakdown::Graph(graph) => {
            let _ = writeln!(
                out,
                "\nDesglose {}: {} ({})",
                graph.month,
                graph.category,
                format_amount(graph.total)
            );
            for (node, link) in graph.nodes.iter().skip(1).zip(&graph.links) {
                let name = if node.name.is_empty() { "-" } else { node.name.as_str() };
                let _ = writeln!(out, "  {name:<LABEL_WIDTH$}{:>16}", format_amount(link.value));
            }
        }
        Breakdown::NoData { .. } => {
            let _ = writeln!(out, "\nDesglose: sin datos");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lens_data::catalog::Catalog;
    use lens_data::dashboard::{build_dashboard, Dataset, ViewKind};
    use lens_data::filter::FilterState;

    const EXPENSES: &str = "\
mes,categoria,subcategoria,monto
2024-01,Food,Market,100
2024-01,Food,Coffee,1
2024-02,Rent,,500
";

    fn view_for(individual: Option<&str>, kind: ViewKind) -> DashboardView {
        let dataset = Dataset::from_text(EXPENSES, individual, "monto");
        let catalog = Catalog::build(&dataset.records);
        let filter = FilterState::with_defaults(&catalog);
        build_dashboard(&dataset, &catalog, &filter, kind)
    }

    #[test]
    fn test_render_all_sections() {
        let text = render_text(&view_for(Some("mes,monto\n2024-01,1000\n2024-02,1100\n"), ViewKind::All));
        assert!(text.contains("Meses: Todos"));
        assert!(text.contains("Gastos (2024-01 a 2024-02)"));
        assert!(text.contains("Proporción (2024-01 a 2024-02)"));
        assert!(text.contains("Desglose 2024-02: Rent ($500.00)"));
        assert!(text.contains("+10.0%"));
        assert!(text.contains("$1,100.00"));
        assert!(!text.contains("Avisos"));
    }

    #[test]
    fn test_render_only_requested_view() {
        let text = render_text(&view_for(None, ViewKind::Breakdown));
        assert!(text.contains("Desglose"));
        assert!(!text.contains("Gastos"));
        assert!(!text.contains("Tendencia"));
    }

    #[test]
    fn test_render_lists_warnings() {
        let dataset = Dataset::from_text("mes,categoria,monto\n2024-01,Food,x\n", None, "monto");
        let catalog = Catalog::build(&dataset.records);
        let filter = FilterState::with_defaults(&catalog);
        let text = render_text(&build_dashboard(&dataset, &catalog, &filter, ViewKind::Bar));
        assert!(text.contains("Avisos"));
        assert!(text.contains("invalid amount 'x'"));
    }
}
