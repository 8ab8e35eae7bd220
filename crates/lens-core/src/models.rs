use serde::{Deserialize, Serialize};
use std::fmt;

/// Header name of the month column.
pub const MONTH_COLUMN: &str = "mes";
/// Header name of the category column.
pub const CATEGORY_COLUMN: &str = "categoria";
/// Header name of the subcategory column. Optional in the input.
pub const SUBCATEGORY_COLUMN: &str = "subcategoria";
/// Default header name of the amount column.
pub const DEFAULT_AMOUNT_COLUMN: &str = "monto";

/// Category of the synthetic rollup rows that carry a precomputed total.
pub const TOTAL_CATEGORY: &str = "Total";
/// Month assigned to single-value rows that carry no month.
pub const MISSING_MONTH: &str = "Sin Mes";
/// Subcategory name of the aggregated long-tail leaf.
pub const OTHER_SUBCATEGORY: &str = "Otros";

/// One ledger line read from the expenses file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Sortable period key, e.g. `"2024-01"`.
    pub month: String,
    /// Top-level spending category.
    pub category: String,
    /// Finer-grained label inside `category`; may be empty.
    #[serde(default)]
    pub subcategory: String,
    /// Amount spent. Rows whose amount could not be parsed carry `0.0`.
    pub amount: f64,
}

impl ExpenseRecord {
    pub fn new(
        month: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            month: month.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            amount,
        }
    }

    /// `true` for the synthetic rollup rows excluded from category views.
    pub fn is_total(&self) -> bool {
        self.category == TOTAL_CATEGORY
    }
}

/// A single-value-per-month point used by the trend view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualExpenseRecord {
    pub month: String,
    pub amount: f64,
}

impl IndividualExpenseRecord {
    pub fn new(month: impl Into<String>, amount: f64) -> Self {
        Self {
            month: month.into(),
            amount,
        }
    }
}

/// A non-fatal condition met while parsing. Parsing never aborts on these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// The row's field count differs from the header's; the row was dropped.
    MalformedRow { line: u64, raw: String },
    /// The amount could not be read as a plain decimal; the row was kept with `0`.
    InvalidAmount { line: u64, raw: String },
    /// A required header column is absent; no rows could be read.
    MissingColumn { column: String },
    /// The document produced zero records.
    EmptyDataset,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MalformedRow { line, raw } => {
                write!(f, "line {line}: skipping malformed row: {raw}")
            }
            ParseWarning::InvalidAmount { line, raw } => {
                write!(f, "line {line}: invalid amount '{raw}', using 0")
            }
            ParseWarning::MissingColumn { column } => {
                write!(f, "missing required column '{column}'")
            }
            ParseWarning::EmptyDataset => write!(f, "dataset contains no records"),
        }
    }
}

/// Records read from one document plus every warning raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> ParseOutcome<T> {
    /// Warnings rendered as display strings, in the order they were raised.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
