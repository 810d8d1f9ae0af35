//! Staged outer-join engine.
//!
//! Every step is an outer join of the accumulator with one source table.
//! A step whose key columns are unavailable is skipped rather than failing the
//! run: the accumulator is returned as it was and the skip is recorded as an
//! error diagnostic naming the step.

use crate::company::CompanyReconciler;
use crate::config::JoinPlan;
use crate::model::{Diagnostics, Stage, Table};

mod join;

pub use join::{LEFT_SUFFIX, RIGHT_SUFFIX, outer_join};

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine {
    reconciler: CompanyReconciler,
}

impl MergeEngine {
    pub fn new(reconciler: CompanyReconciler) -> Self {
        Self { reconciler }
    }

    /// Outer join guarded by a key check.
    ///
    /// An operand without columns is neutral: the other operand is returned.
    /// When a key is missing from either operand the step is skipped, `left`
    /// is returned unchanged and exactly one error is recorded.
    pub fn join(
        &self,
        left: &Table,
        right: &Table,
        keys: &[String],
        label: &str,
        diagnostics: &mut Diagnostics,
    ) -> Table {
        if right.is_empty() {
            diagnostics.info(
                Stage::Merge,
                format!("{label}: incoming table has no columns, accumulator unchanged"),
            );
            return left.clone();
        }
        if left.is_empty() {
            diagnostics.info(
                Stage::Merge,
                format!("{label}: accumulator has no columns, taking incoming table as is"),
            );
            return right.clone();
        }

        if let Some((key, side)) = missing_key(left, right, keys) {
            diagnostics.error(
                Stage::Merge,
                format!("{label}: key '{key}' not found in {side}, step skipped"),
            );
            return left.clone();
        }

        let merged = outer_join(left, right, keys);
        diagnostics.info(
            Stage::Merge,
            format!(
                "{label}: merged on {}, rows -> {}",
                keys.join(" + "),
                merged.row_count()
            ),
        );
        merged
    }

    /// Runs one pipeline step: picks the keys from `plan`, joins, then
    /// collapses any duplicated company columns the join produced.
    pub fn step(
        &self,
        left: &Table,
        right: &Table,
        plan: &JoinPlan,
        label: &str,
        diagnostics: &mut Diagnostics,
    ) -> Table {
        let keys = match plan {
            JoinPlan::On { keys } => keys,
            JoinPlan::Composite { keys, fallback } => {
                let blocked = if left.is_empty() || right.is_empty() {
                    None
                } else {
                    missing_key(left, right, keys)
                };
                match blocked {
                    None => keys,
                    Some((key, side)) => {
                        diagnostics.warning(
                            Stage::Merge,
                            format!(
                                "{label}: composite key {} unavailable ('{key}' not found in {side}), falling back to {}",
                                keys.join(" + "),
                                fallback.join(" + ")
                            ),
                        );
                        fallback
                    }
                }
            }
        };

        let merged = self.join(left, right, keys, label, diagnostics);
        self.reconciler.reconcile_merged(&merged, label, diagnostics)
    }
}

/// First key absent from an operand, with a description of where it is
/// missing.
fn missing_key(left: &Table, right: &Table, keys: &[String]) -> Option<(String, String)> {
    keys.iter().find_map(|key| {
        let side = match (left.has_column(key), right.has_column(key)) {
            (true, true) => return None,
            (false, false) => "either table",
            (false, true) => "the accumulator",
            (true, false) => "the incoming table",
        };
        Some((key.clone(), side.to_string()))
    })
}
