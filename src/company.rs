//! Brings company-name columns to the single canonical `COMPANY` key.
//!
//! Exports spell the company column differently (`COMPANY`, `Company Name`,
//! `NAME OF COMPANY`, ...), and joins on another key leave suffixed copies such
//! as `COMPANY_x` / `COMPANY_y`. Source tables are reconciled before merging
//! and the accumulator after every join step.

use crate::config::CompanyRenamePolicy;
use crate::model::{COMPANY, Cell, Column, Diagnostics, Stage, Table};

/// Explicit spelling used by the pledge export.
pub const NAME_OF_COMPANY: &str = "NAME OF COMPANY";

#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyReconciler {
    policy: CompanyRenamePolicy,
}

impl CompanyReconciler {
    pub fn new(policy: CompanyRenamePolicy) -> Self {
        Self { policy }
    }

    /// Renames a company-like column of a source table to `COMPANY`.
    ///
    /// Substring detection (`COMP`, any case) runs first; the explicit
    /// `NAME OF COMPANY` spelling is only consulted when that leaves the table
    /// without a `COMPANY` column.
    pub fn reconcile_source(
        &self,
        table: &Table,
        label: &str,
        diagnostics: &mut Diagnostics,
    ) -> Table {
        let candidates: Vec<&str> = table
            .column_names()
            .into_iter()
            .filter(|name| is_company_like(name))
            .collect();

        let mut result = table.clone();
        if table.has_column(COMPANY) {
            if !candidates.is_empty() {
                diagnostics.warning(
                    Stage::Reconcile,
                    format!(
                        "{label}: {COMPANY} already present, left company-like columns untouched: {}",
                        quote_all(&candidates)
                    ),
                );
            }
            return result;
        }

        match (candidates.as_slice(), self.policy) {
            ([], _) => {}
            ([only], _) => {
                result = rename(&result, only, label, diagnostics);
            }
            ([first, rest @ ..], CompanyRenamePolicy::FirstMatch) => {
                result = rename(&result, first, label, diagnostics);
                diagnostics.warning(
                    Stage::Reconcile,
                    format!(
                        "{label}: several company-like columns, kept '{first}' and left {} untouched",
                        quote_all(rest)
                    ),
                );
            }
            (all, CompanyRenamePolicy::Strict) => {
                diagnostics.error(
                    Stage::Reconcile,
                    format!(
                        "{label}: ambiguous company-like columns {}, no substring rename",
                        quote_all(all)
                    ),
                );
            }
        }

        if !result.has_column(COMPANY) && result.has_column(NAME_OF_COMPANY) {
            result = rename(&result, NAME_OF_COMPANY, label, diagnostics);
        }
        result
    }

    /// Collapses suffixed `COMPANY` siblings left by a join back into one
    /// `COMPANY` column.
    ///
    /// Each row takes the first non-empty sibling value in column order. The
    /// merged column sits where the first sibling was. Dropped sibling names
    /// are always reported.
    pub fn reconcile_merged(
        &self,
        table: &Table,
        label: &str,
        diagnostics: &mut Diagnostics,
    ) -> Table {
        if table.has_column(COMPANY) {
            return table.clone();
        }

        let siblings: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, column)| is_company_sibling(&column.name))
            .map(|(index, _)| index)
            .collect();
        let Some(&anchor) = siblings.first() else {
            return table.clone();
        };

        let columns = table.columns();
        let mut conflicts = 0usize;
        let values: Vec<Cell> = (0..table.row_count())
            .map(|row| {
                let present: Vec<&Cell> = siblings
                    .iter()
                    .map(|&index| &columns[index].values[row])
                    .filter(|cell| !cell.is_empty())
                    .collect();
                if present.windows(2).any(|pair| pair[0].key() != pair[1].key()) {
                    conflicts += 1;
                }
                present.first().map_or(Cell::Missing, |cell| (*cell).clone())
            })
            .collect();

        let merged: Vec<Column> = columns
            .iter()
            .enumerate()
            .filter_map(|(index, column)| {
                if index == anchor {
                    Some(Column::new(COMPANY, values.clone()))
                } else if siblings.contains(&index) {
                    None
                } else {
                    Some(column.clone())
                }
            })
            .collect();

        let names: Vec<&str> = siblings
            .iter()
            .map(|&index| columns[index].name.as_str())
            .collect();
        if names.len() == 1 {
            diagnostics.info(
                Stage::Reconcile,
                format!("{label}: renamed '{}' to {COMPANY}", names[0]),
            );
        } else {
            diagnostics.warning(
                Stage::Reconcile,
                format!(
                    "{label}: collapsed {} into {COMPANY}, discarded duplicates {} ({conflicts} rows disagreed)",
                    quote_all(&names),
                    quote_all(&names[1..])
                ),
            );
        }

        Table::new(merged)
    }
}

fn is_company_like(name: &str) -> bool {
    name != COMPANY && name.to_uppercase().contains("COMP")
}

/// `COMPANY` followed by a join or load disambiguation suffix.
fn is_company_sibling(name: &str) -> bool {
    name.strip_prefix(COMPANY)
        .is_some_and(|suffix| suffix.starts_with('_') || suffix.starts_with('.'))
}

fn rename(table: &Table, from: &str, label: &str, diagnostics: &mut Diagnostics) -> Table {
    diagnostics.info(
        Stage::Reconcile,
        format!("{label}: renamed '{from}' to {COMPANY}"),
    );
    table.renamed(from, COMPANY)
}

fn quote_all(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
