//! Delimited-text ingestion.
//!
//! Turns the raw expenses document into [`ExpenseRecord`]s (and the
//! single-value trend document into [`IndividualExpenseRecord`]s). Parsing
//! never fails: rows with the wrong field count are dropped, unreadable
//! amounts become `0`, and both leave a [`ParseWarning`] behind.

use std::collections::HashMap;
use std::sync::OnceLock;

use csv::StringRecord;
use lens_core::models::{
    ExpenseRecord, IndividualExpenseRecord, ParseOutcome, ParseWarning, CATEGORY_COLUMN,
    DEFAULT_AMOUNT_COLUMN, MISSING_MONTH, MONTH_COLUMN, SUBCATEGORY_COLUMN,
};
use regex::Regex;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse the expenses document.
///
/// The first non-empty line is the header; `mes`, `categoria` and
/// `amount_column` must be present, `subcategoria` is optional. Output keeps
/// input order with no deduplication.
pub fn parse_expenses(text: &str, amount_column: &str) -> ParseOutcome<ExpenseRecord> {
    struct Columns {
        month: usize,
        category: usize,
        subcategory: Option<usize>,
        amount: usize,
    }

    let outcome = scan(
        text,
        |header| {
            let month = header.require(MONTH_COLUMN);
            let category = header.require(CATEGORY_COLUMN);
            let amount = header.require(amount_column);
            Ok(Columns {
                month: month?,
                category: category?,
                subcategory: header.index_of(SUBCATEGORY_COLUMN),
                amount: amount?,
            })
        },
        |cols, row, warnings| {
            let category = row.field(cols.category);
            if category.is_empty() {
                let warning = row.malformed();
                warn!("{}", warning);
                warnings.push(warning);
                return None;
            }
            Some(ExpenseRecord {
                month: row.field(cols.month).to_string(),
                category: category.to_string(),
                subcategory: cols
                    .subcategory
                    .map(|i| row.field(i).to_string())
                    .unwrap_or_default(),
                amount: row.amount(cols.amount, warnings),
            })
        },
    );

    debug!(
        records = outcome.records.len(),
        warnings = outcome.warnings.len(),
        "parsed expenses document"
    );
    outcome
}

/// Parse the expenses document using the default `monto` amount column.
pub fn parse_expenses_default(text: &str) -> ParseOutcome<ExpenseRecord> {
    parse_expenses(text, DEFAULT_AMOUNT_COLUMN)
}

/// Parse the single-value monthly series (`mes`, `monto`).
///
/// The month column is optional; rows without one are filed under
/// [`MISSING_MONTH`].
pub fn parse_individual(text: &str) -> ParseOutcome<IndividualExpenseRecord> {
    struct Columns {
        month: Option<usize>,
        amount: usize,
    }

    let outcome = scan(
        text,
        |header| {
            Ok(Columns {
                month: header.index_of(MONTH_COLUMN),
                amount: header.require(DEFAULT_AMOUNT_COLUMN)?,
            })
        },
        |cols, row, warnings| {
            let month = cols
                .month
                .map(|i| row.field(i))
                .filter(|m| !m.is_empty())
                .unwrap_or(MISSING_MONTH);
            Some(IndividualExpenseRecord {
                month: month.to_string(),
                amount: row.amount(cols.amount, warnings),
            })
        },
    );

    debug!(
        records = outcome.records.len(),
        warnings = outcome.warnings.len(),
        "parsed individual series document"
    );
    outcome
}

/// Read a plain decimal amount: optional sign, digits, optional fraction.
///
/// Anything else (thousands separators, exponents, `NaN`, `inf`) is rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    static PLAIN_DECIMAL: OnceLock<Regex> = OnceLock::new();
    let re = PLAIN_DECIMAL
        .get_or_init(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("regex is valid"));
    if !re.is_match(raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Header fields mapped to their positions.
struct Header {
    index: HashMap<String, usize>,
}

impl Header {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn require(&self, name: &str) -> Result<usize, ParseWarning> {
        self.index_of(name).ok_or_else(|| ParseWarning::MissingColumn {
            column: name.to_string(),
        })
    }
}

/// One data row whose field count matches the header.
struct Row<'a> {
    line: u64,
    raw: &'a str,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn field(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn malformed(&self) -> ParseWarning {
        ParseWarning::MalformedRow {
            line: self.line,
            raw: self.raw.to_string(),
        }
    }

    /// Parse the amount at `index`, coercing failures to `0` with a warning.
    fn amount(&self, index: usize, warnings: &mut Vec<ParseWarning>) -> f64 {
        let raw = self.field(index);
        match parse_amount(raw) {
            Some(value) => value,
            None => {
                let warning = ParseWarning::InvalidAmount {
                    line: self.line,
                    raw: raw.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
                0.0
            }
        }
    }
}

/// Shared line-splitting driver.
///
/// `resolve` maps the header to the column positions a parser needs; a
/// missing column is recorded and no rows are read. `build` turns each
/// well-formed row into a record, or `None` to drop it.
fn scan<C, T>(
    text: &str,
    resolve: impl FnOnce(&Header) -> Result<C, ParseWarning>,
    mut build: impl FnMut(&C, &Row<'_>, &mut Vec<ParseWarning>) -> Option<T>,
) -> ParseOutcome<T> {
    let mut outcome = ParseOutcome::default();

    // Line numbers refer to the untrimmed input.
    let leading_lines = text[..text.len() - text.trim_start().len()]
        .matches('\n')
        .count() as u64;
    let source_lines: Vec<&str> = text.lines().collect();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let mut resolve = Some(resolve);
    let mut layout: Option<(usize, C)> = None;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line()) + leading_lines;
                let warning = ParseWarning::MalformedRow {
                    line,
                    raw: source_line(&source_lines, line).to_string(),
                };
                warn!("{}", warning);
                outcome.warnings.push(warning);
                continue;
            }
        };

        // Whitespace-only lines trim down to a single empty field.
        if record.len() == 1 && record.get(0).map_or(true, str::is_empty) {
            continue;
        }

        if layout.is_none() {
            let mut index = HashMap::new();
            for (i, name) in record.iter().enumerate() {
                index.entry(name.to_string()).or_insert(i);
            }
            let header = Header { index };
            let Some(resolve) = resolve.take() else {
                continue;
            };
            match resolve(&header) {
                Ok(columns) => layout = Some((record.len(), columns)),
                Err(missing) => {
                    warn!("{}", missing);
                    outcome.warnings.push(missing);
                    outcome.warnings.push(ParseWarning::EmptyDataset);
                    return outcome;
                }
            }
            continue;
        }
        let Some((width, columns)) = &layout else {
            continue;
        };

        let line = record.position().map_or(0, |p| p.line()) + leading_lines;
        let row = Row {
            line,
            raw: source_line(&source_lines, line),
            record: &record,
        };

        if record.len() != *width {
            let warning = row.malformed();
            warn!("{}", warning);
            outcome.warnings.push(warning);
            continue;
        }

        if let Some(parsed) = build(columns, &row, &mut outcome.warnings) {
            outcome.records.push(parsed);
        }
    }

    if outcome.records.is_empty() {
        warn!("{}", ParseWarning::EmptyDataset);
        outcome.warnings.push(ParseWarning::EmptyDataset);
    }

    outcome
}

/// The 1-based `line` of the original input, without its line terminator.
fn source_line<'t>(lines: &[&'t str], line: u64) -> &'t str {
    lines
        .get((line as usize).saturating_sub(1))
        .copied()
        .unwrap_or("")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "mes,categoria,subcategoria,monto\n\
                          2024-01,Comida,Mercado,100\n\
                          2024-01,Comida,Cafe,1\n\
                          2024-02,Renta,,500\n";

    // ── parse_expenses ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_basic_document() {
        let outcome = parse_expenses_default(SAMPLE);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(
            outcome.records[0],
            ExpenseRecord::new("2024-01", "Comida", "Mercado", 100.0)
        );
        assert_eq!(outcome.records[2].subcategory, "");
        assert_eq!(outcome.records[2].amount, 500.0);
    }

    #[test]
    fn test_parse_accepts_crlf_and_trims_fields() {
        let text = "mes , categoria,subcategoria, monto\r\n 2024-03 ,Ocio , Cine , 12.5 \r\n";
        let outcome = parse_expenses_default(text);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(
            outcome.records,
            vec![ExpenseRecord::new("2024-03", "Ocio", "Cine", 12.5)]
        );
    }

    #[test]
    fn test_parse_skips_empty_lines_silently() {
        let text = "\n\nmes,categoria,subcategoria,monto\n\n2024-01,Comida,Mercado,10\n   \n2024-02,Comida,Mercado,20\n\n";
        let outcome = parse_expenses_default(text);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn test_parse_drops_malformed_row_with_line_number() {
        let text = "mes,categoria,subcategoria,monto\n\
                    2024-01,Comida,Mercado,10\n\
                    2024-01,Comida,Mercado\n\
                    2024-02,Renta,Piso,500,extra\n\
                    2024-02,Renta,Piso,400\n";
        let outcome = parse_expenses_default(text);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.warnings,
            vec![
                ParseWarning::MalformedRow {
                    line: 3,
                    raw: "2024-01,Comida,Mercado".to_string()
                },
                ParseWarning::MalformedRow {
                    line: 4,
                    raw: "2024-02,Renta,Piso,500,extra".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_line_numbers_count_leading_blank_lines() {
        let text = "\n\nmes,categoria,subcategoria,monto\n2024-01,Comida\n";
        let outcome = parse_expenses_default(text);
        assert_eq!(
            outcome.warnings[0],
            ParseWarning::MalformedRow {
                line: 4,
                raw: "2024-01,Comida".to_string()
            }
        );
    }

    #[test]
    fn test_parse_invalid_amount_kept_as_zero() {
        let text = "mes,categoria,subcategoria,monto\n2024-01,Comida,Mercado,abc\n";
        let outcome = parse_expenses_default(text);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].amount, 0.0);
        assert_eq!(
            outcome.warnings,
            vec![ParseWarning::InvalidAmount {
                line: 2,
                raw: "abc".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_one_warning_per_affected_row() {
        let text = "mes,categoria,subcategoria,monto\n\
                    2024-01,Comida,Mercado,1e3\n\
                    2024-01,Comida\n\
                    2024-01,Comida,Cafe,\n\
                    2024-01,Comida,Pan,3\n";
        let outcome = parse_expenses_default(text);
        // Two coerced rows kept, one dropped.
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.warnings.len(), 3);
    }

    #[test]
    fn test_parse_custom_amount_column() {
        let text = "mes,categoria,importe\n2024-01,Comida,7.25\n";
        let outcome = parse_expenses(text, "importe");
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.records[0].amount, 7.25);
        assert_eq!(outcome.records[0].subcategory, "");
    }

    #[test]
    fn test_parse_amount_column_found_by_name_not_position() {
        let text = "monto,subcategoria,categoria,mes\n42,Cafe,Comida,2024-05\n";
        let outcome = parse_expenses_default(text);
        assert_eq!(
            outcome.records,
            vec![ExpenseRecord::new("2024-05", "Comida", "Cafe", 42.0)]
        );
    }

    #[test]
    fn test_parse_duplicate_header_uses_first_column() {
        let text = "mes,categoria,monto,monto\n2024-01,Comida,10,99\n";
        let outcome = parse_expenses_default(text);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.records[0].amount, 10.0);
    }

    #[test]
    fn test_parse_missing_column_reports_and_returns_empty() {
        let text = "mes,categoria,subcategoria\n2024-01,Comida,Mercado\n";
        let outcome = parse_expenses_default(text);
        assert!(outcome.records.is_empty());
        assert_eq!(
            outcome.warnings,
            vec![
                ParseWarning::MissingColumn {
                    column: "monto".to_string()
                },
                ParseWarning::EmptyDataset,
            ]
        );
    }

    #[test]
    fn test_parse_empty_category_dropped() {
        let text = "mes,categoria,subcategoria,monto\n2024-01, ,Mercado,5\n";
        let outcome = parse_expenses_default(text);
        assert!(outcome.records.is_empty());
        assert!(matches!(
            outcome.warnings[0],
            ParseWarning::MalformedRow { line: 2, .. }
        ));
    }

    #[test]
    fn test_parse_empty_document() {
        let outcome = parse_expenses_default("   \n\n");
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.warnings, vec![ParseWarning::EmptyDataset]);
    }

    #[test]
    fn test_parse_header_only() {
        let outcome = parse_expenses_default("mes,categoria,subcategoria,monto\n");
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.warnings, vec![ParseWarning::EmptyDataset]);
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let text = "mes,categoria,subcategoria,monto\n\
                    2024-02,B,x,1\n\
                    2024-01,A,y,2\n\
                    2024-02,B,x,1\n";
        let outcome = parse_expenses_default(text);
        let months: Vec<&str> = outcome.records.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2024-02", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_parse_keeps_total_rows() {
        let text = "mes,categoria,subcategoria,monto\n2024-01,Total,,900\n";
        let outcome = parse_expenses_default(text);
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.records[0].is_total());
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_amount_plain_decimals() {
        assert_eq!(parse_amount("10"), Some(10.0));
        assert_eq!(parse_amount("-3.5"), Some(-3.5));
        assert_eq!(parse_amount("+.5"), Some(0.5));
        assert_eq!(parse_amount("7."), Some(7.0));
    }

    #[test]
    fn test_parse_amount_rejects_other_formats() {
        for raw in ["", "abc", "1e3", "1,000", "NaN", "inf", "1.2.3", "$5"] {
            assert_eq!(parse_amount(raw), None, "{raw}");
        }
    }

    // ── parse_individual ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_individual_basic() {
        let text = "mes,monto\n2024-01,1000\n2024-02,1100\n";
        let outcome = parse_individual(text);
        assert!(outcome.warnings.is_empty());
        assert_eq!(
            outcome.records,
            vec![
                IndividualExpenseRecord::new("2024-01", 1000.0),
                IndividualExpenseRecord::new("2024-02", 1100.0),
            ]
        );
    }

    #[test]
    fn test_parse_individual_missing_month_column_uses_sentinel() {
        let outcome = parse_individual("monto\n250\n");
        assert_eq!(outcome.records[0].month, MISSING_MONTH);
    }

    #[test]
    fn test_parse_individual_blank_month_uses_sentinel() {
        let outcome = parse_individual("mes,monto\n,250\n");
        assert_eq!(outcome.records[0].month, MISSING_MONTH);
    }

    #[test]
    fn test_parse_individual_malformed_rows_dropped() {
        let text = "mes,monto\n2024-01,1,2\n2024-02,x\n";
        let outcome = parse_individual(text);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].amount, 0.0);
        assert_eq!(outcome.warnings.len(), 2);
    }
}
