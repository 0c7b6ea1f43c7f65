//! Result tables: the uniform output shape of every analysis.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// One typed value in a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Free text: entity paths, author names, statistic labels.
    Text(String),
    /// Counts and whole percentages.
    Int(i64),
    /// Ratios, already rounded.
    Float(f64),
    /// Calendar day, serialized as `YYYY-MM-DD`.
    Date(NaiveDate),
    /// Unknown value, e.g. line counts from a format without stats.
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{n}"),
            Cell::Float(x) => write!(f, "{x:.2}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Missing => f.write_str("-"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&String> for Cell {
    fn from(value: &String) -> Self {
        Cell::Text(value.clone())
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}

/// A typed analysis row with a fixed column layout.
pub trait TableRow {
    /// Column names, in cell order.
    const COLUMNS: &'static [&'static str];

    /// This row's values, one per column.
    fn cells(&self) -> Vec<Cell>;
}

/// An ordered sequence of fixed-arity rows, ready for rendering.
///
/// # Examples
///
/// ```
/// use coevo_history::table::{Cell, ResultTable, TableRow};
///
/// struct Count(&'static str, u32);
///
/// impl TableRow for Count {
///     const COLUMNS: &'static [&'static str] = &["entity", "n-revs"];
///     fn cells(&self) -> Vec<Cell> {
///         vec![self.0.into(), self.1.into()]
///     }
/// }
///
/// let mut table = ResultTable::from_rows("revisions", &[Count("a.rs", 3), Count("b.rs", 1)]);
/// assert_eq!(table.columns, vec!["entity", "n-revs"]);
/// table.truncate(1);
/// assert_eq!(table.rows, vec![vec![Cell::from("a.rs"), Cell::Int(3)]]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    /// Name of the analysis that produced the table.
    pub analysis: String,
    /// Column names.
    pub columns: Vec<String>,
    /// Rows; each has exactly `columns.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Build a table from typed rows.
    pub fn from_rows<R: TableRow>(analysis: impl Into<String>, rows: &[R]) -> Self {
        Self {
            analysis: analysis.into(),
            columns: R::COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            rows: rows.iter().map(R::cells).collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep at most `max_rows` leading rows.
    pub fn truncate(&mut self, max_rows: usize) {
        self.rows.truncate(max_rows);
    }

    /// Rows as JSON objects keyed by column name.
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| {
                        serde_json::to_value(cell).unwrap_or(serde_json::Value::Null)
                    }))
                    .collect()
            })
            .collect()
    }
}
