use std::fmt;

use serde::Serialize;

mod diagnostic;

pub use diagnostic::{Diagnostic, Diagnostics, Severity, Stage};

/// Name of the ticker key column.
pub const SYMBOL: &str = "SYMBOL";
/// Name of the canonical company-name key column.
pub const COMPANY: &str = "COMPANY";

/// A single cell of a loaded export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Verbatim text field.
    Text(String),
    /// Field that parsed as a finite number.
    Number(f64),
    /// Absent value, either empty in the source or filled in by an outer join.
    Missing,
}

impl Cell {
    /// Interprets a raw delimited field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// True for `Missing` and for blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(value) => value.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Join-key form of the cell. Empty cells never produce a key, so they
    /// never match each other.
    pub fn key(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => f.write_str(value),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Missing => Ok(()),
        }
    }
}

/// A named column and its cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates a column of `rows` missing cells.
    pub fn missing(name: impl Into<String>, rows: usize) -> Self {
        Self::new(name, vec![Cell::Missing; rows])
    }
}

/// Ordered set of equally long columns.
///
/// Tables are values: every transform in the crate takes a table by reference
/// and builds a new one, so a failed step can always fall back to its input.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Builds a table from columns. All columns must share one length.
    pub fn new(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns
                .windows(2)
                .all(|pair| pair[0].values.len() == pair[1].values.len()),
            "columns must have equal length"
        );
        Self { columns }
    }

    /// The table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from a header row and row-major cells. Short rows are
    /// padded with missing cells and long rows are truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or(Cell::Missing));
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// First column carrying `name`.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no columns at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cells of row `index` in column order.
    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns
            .iter()
            .map(|column| &column.values[index])
            .collect()
    }

    /// Value of `column` in row `index`, if both exist.
    pub fn cell(&self, column: &str, index: usize) -> Option<&Cell> {
        self.column(column)
            .and_then(|column| column.values.get(index))
    }

    /// Returns a copy with every column named `from` renamed to `to`.
    pub fn renamed(&self, from: &str, to: &str) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let name = if column.name == from {
                    to.to_string()
                } else {
                    column.name.clone()
                };
                Column::new(name, column.values.clone())
            })
            .collect();
        Table { columns }
    }

    /// Returns a copy with an extra column at the end.
    pub fn with_column(&self, column: Column) -> Table {
        let mut columns = self.columns.clone();
        columns.push(column);
        Table::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_numbers_text_and_blanks() {
        assert_eq!(Cell::parse("12.5"), Cell::Number(12.5));
        assert_eq!(Cell::parse("TCS"), Cell::Text("TCS".into()));
        assert_eq!(Cell::parse("   "), Cell::Missing);
        assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".into()));
    }

    #[test]
    fn integral_numbers_key_without_fraction() {
        assert_eq!(Cell::Number(500.0).key().as_deref(), Some("500"));
        assert_eq!(Cell::Number(2.25).key().as_deref(), Some("2.25"));
        assert_eq!(Cell::Missing.key(), None);
        assert_eq!(Cell::Text(" ".into()).key(), None);
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let table = Table::from_rows(
            vec!["A".into(), "B".into()],
            vec![vec![Cell::parse("1")], vec![Cell::parse("2"), Cell::parse("x")]],
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell("B", 0), Some(&Cell::Missing));
        assert_eq!(table.cell("B", 1), Some(&Cell::Text("x".into())));
    }

    #[test]
    fn renamed_leaves_the_source_untouched() {
        let table = Table::new(vec![Column::new("NAME", vec![Cell::Missing])]);
        let renamed = table.renamed("NAME", COMPANY);
        assert!(table.has_column("NAME"));
        assert!(renamed.has_column(COMPANY));
    }
}
