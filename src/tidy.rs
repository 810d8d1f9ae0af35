use std::cmp::Ordering;

use crate::error::{Result, ToolError};
use crate::model::{Cell, Column, Diagnostics, Stage, Table};

/// Columns to keep from a merged table, their display labels, and the label
/// to sort rows by.
#[derive(Debug, Clone, PartialEq)]
pub struct TidySpec {
    pub columns: Vec<(String, String)>,
    pub sort_by: String,
}

impl Default for TidySpec {
    fn default() -> Self {
        let columns = [
            ("SYMBOL", "Symbol"),
            ("FACE VALUE", "Face Value"),
            ("COMPANY", "Company"),
            ("VALUE OF SECURITY (ACQUIRED/DISPLOSED)", "Value of Security"),
            ("ACQUISITION/DISPOSAL TRANSACTION TYPE", "Transaction Type"),
            (
                "TOTAL AFTER ACQUISITION/SALE (SHARES/VOTING RIGHTS/WARRANTS/ CONVERTIBLE SECURITIES/ANY OTHER INSTRUMENT)",
                "Total After Acquisition",
            ),
            ("CLOSE_PRICE", "Close Price"),
            ("AVG_PRICE", "Average Price"),
            ("DELIV_PER", "Delivery Percentage"),
        ];
        Self {
            columns: columns
                .into_iter()
                .map(|(source, label)| (source.to_string(), label.to_string()))
                .collect(),
            sort_by: "Symbol".to_string(),
        }
    }
}

/// Reduces a merged table to a presentable subset.
///
/// Keeps the `spec` columns that exist, relabels them, sorts rows by the sort
/// label with empty values last (stable), and turns missing cells into empty
/// text.
pub fn tidy(table: &Table, spec: &TidySpec, diagnostics: &mut Diagnostics) -> Result<Table> {
    let kept: Vec<(&Column, &str)> = spec
        .columns
        .iter()
        .filter_map(|(source, label)| {
            table
                .column(source)
                .map(|column| (column, label.as_str()))
        })
        .collect();
    if kept.is_empty() {
        return Err(ToolError::NoColumnsRetained);
    }
    diagnostics.info(
        Stage::Tidy,
        format!(
            "keeping columns: {}",
            kept.iter()
                .map(|(column, _)| column.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );

    let mut order: Vec<usize> = (0..table.row_count()).collect();
    match kept.iter().find(|(_, label)| *label == spec.sort_by) {
        Some((column, _)) => order.sort_by(|&lhs, &rhs| {
            compare_blank_last(&column.values[lhs], &column.values[rhs])
        }),
        None => diagnostics.warning(
            Stage::Tidy,
            format!("sort column '{}' not present, rows left in merge order", spec.sort_by),
        ),
    }

    let columns = kept
        .into_iter()
        .map(|(column, label)| {
            let values = order
                .iter()
                .map(|&row| match &column.values[row] {
                    Cell::Missing => Cell::Text(String::new()),
                    other => other.clone(),
                })
                .collect();
            Column::new(label, values)
        })
        .collect();

    Ok(Table::new(columns))
}

fn compare_blank_last(lhs: &Cell, rhs: &Cell) -> Ordering {
    match (lhs.key(), rhs.key()) {
        (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
