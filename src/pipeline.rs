use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::company::CompanyReconciler;
use crate::config::{PipelineConfig, Slot, SlotSpec};
use crate::error::{Result, ToolError};
use crate::headers;
use crate::io::{csv_read, listing};
use crate::merge::MergeEngine;
use crate::model::{COMPANY, Column, Diagnostics, Stage, Table};
use crate::resolve::FileResolver;
use crate::select::select;

/// Number of cleaned headers echoed when a file is loaded.
const HEADER_PREVIEW: usize = 5;

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Every step ran or degraded; `table` is the best-effort merge.
    Completed {
        table: Table,
        diagnostics: Diagnostics,
    },
    /// At least one slot had no matching file. No table is produced.
    Aborted {
        unresolved: Vec<Slot>,
        diagnostics: Diagnostics,
    },
}

impl PipelineOutcome {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            PipelineOutcome::Completed { diagnostics, .. }
            | PipelineOutcome::Aborted { diagnostics, .. } => diagnostics,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed { .. })
    }

    /// Converts an aborted run into [`ToolError::UnresolvedSlots`].
    pub fn into_result(self) -> Result<(Table, Diagnostics)> {
        match self {
            PipelineOutcome::Completed { table, diagnostics } => Ok((table, diagnostics)),
            PipelineOutcome::Aborted { unresolved, .. } => {
                Err(ToolError::UnresolvedSlots(unresolved))
            }
        }
    }
}

/// Resolves, loads, cleans and merges the six source exports.
pub struct Pipeline {
    config: PipelineConfig,
    resolver: FileResolver,
    reconciler: CompanyReconciler,
    engine: MergeEngine,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let resolver = FileResolver::from_config(&config);
        let reconciler = CompanyReconciler::new(config.company_policy);
        Ok(Self {
            config,
            resolver,
            reconciler,
            engine: MergeEngine::new(reconciler),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the whole pipeline over the exports in `dir`.
    ///
    /// Only an unreadable folder is an `Err`. Unresolved slots produce
    /// [`PipelineOutcome::Aborted`]; every other problem is recorded in the
    /// outcome's diagnostics and the run continues.
    #[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
    pub fn run(&self, dir: &Path) -> Result<PipelineOutcome> {
        let files = listing::csv_files(dir)?;
        info!(file_count = files.len(), "listed source exports");
        let mut diagnostics = Diagnostics::new();

        let mut resolved: Vec<(&SlotSpec, String)> = Vec::with_capacity(Slot::ORDER.len());
        let mut unresolved = Vec::new();
        for slot in Slot::ORDER {
            let spec = self.spec(slot)?;
            match self.resolver.resolve(&spec.keyword, &files, &mut diagnostics) {
                Some(resolution) => resolved.push((spec, resolution.file)),
                None => unresolved.push(slot),
            }
        }

        if !unresolved.is_empty() {
            let names: Vec<&str> = unresolved.iter().map(Slot::as_str).collect();
            diagnostics.error(
                Stage::Resolve,
                format!("missing required files for: {}", names.join(", ")),
            );
            return Ok(PipelineOutcome::Aborted {
                unresolved,
                diagnostics,
            });
        }

        let prepared: Vec<(&SlotSpec, Table)> = resolved
            .into_iter()
            .map(|(spec, file)| {
                let table = self.prepare(spec, dir, &file, &mut diagnostics);
                (spec, table)
            })
            .collect();

        let mut steps = prepared.into_iter();
        let mut accumulator = steps.next().map(|(_, table)| table).unwrap_or_default();
        for (spec, table) in steps {
            let label = step_label(spec.slot);
            let Some(plan) = spec.join_plan() else {
                diagnostics.error(Stage::Merge, format!("{label}: no join plan, step skipped"));
                continue;
            };
            accumulator = self
                .engine
                .step(&accumulator, &table, &plan, label, &mut diagnostics);
        }

        let table = self.finalize(accumulator, &mut diagnostics);
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "pipeline completed"
        );
        Ok(PipelineOutcome::Completed { table, diagnostics })
    }

    fn spec(&self, slot: Slot) -> Result<&SlotSpec> {
        self.config
            .slot(slot)
            .ok_or_else(|| ToolError::InvalidConfig(format!("slot '{slot}' is not configured")))
    }

    /// Load, normalise, project and reconcile one slot. A file that cannot be
    /// read becomes the empty table.
    #[instrument(level = "debug", skip(self, spec, dir, diagnostics), fields(slot = %spec.slot))]
    fn prepare(
        &self,
        spec: &SlotSpec,
        dir: &Path,
        file: &str,
        diagnostics: &mut Diagnostics,
    ) -> Table {
        let slot = spec.slot.as_str();
        let raw = match csv_read::read_table(&dir.join(file)) {
            Ok(table) => {
                debug!(rows = table.row_count(), columns = table.column_count(), "loaded export");
                table
            }
            Err(error) => {
                diagnostics.error(Stage::Load, format!("{slot}: could not read {file}: {error}"));
                return Table::empty();
            }
        };

        let normalized = headers::normalize(&raw);
        let renames = raw
            .column_names()
            .into_iter()
            .zip(normalized.column_names());
        for (original, cleaned) in renames {
            if headers::clean_header(original) != cleaned {
                diagnostics.warning(
                    Stage::Normalize,
                    format!(
                        "{slot}: header {original:?} collides after cleanup, renamed to '{cleaned}'"
                    ),
                );
            }
        }
        let preview: Vec<&str> = normalized
            .column_names()
            .into_iter()
            .take(HEADER_PREVIEW)
            .collect();
        diagnostics.info(
            Stage::Normalize,
            format!(
                "{slot}: cleaned headers for {file} ({} rows): {:?} ...",
                normalized.row_count(),
                preview
            ),
        );

        let selected = select(&normalized, &spec.columns, slot, diagnostics);
        self.reconciler.reconcile_source(&selected, slot, diagnostics)
    }

    fn finalize(&self, table: Table, diagnostics: &mut Diagnostics) -> Table {
        if !self.config.ensure_company_column || table.has_column(COMPANY) {
            return table;
        }
        diagnostics.info(
            Stage::Finalize,
            format!("no {COMPANY} column after merging, added an empty one"),
        );
        table.with_column(Column::missing(COMPANY, table.row_count()))
    }
}

/// Runs the pipeline over `dir` with `config`.
pub fn run_pipeline(dir: &Path, config: PipelineConfig) -> Result<PipelineOutcome> {
    Pipeline::new(config)?.run(dir)
}

fn step_label(slot: Slot) -> &'static str {
    match slot {
        Slot::Equity => "Equity",
        Slot::Insider => "Equity + Insider",
        Slot::SastRegular => "Add SAST Regular",
        Slot::SastPledged => "Add SAST Pledged",
        Slot::ShareholdingPattern => "Add Shareholding Pattern",
        Slot::BhavData => "Add Bhav Data",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, SYMBOL, Severity};

    fn symbols_only() -> Table {
        Table::new(vec![Column::new(SYMBOL, vec![Cell::Text("TCS".into())])])
    }

    #[test]
    fn finalize_adds_an_empty_company_column() {
        let pipeline = Pipeline::new(PipelineConfig::default()).expect("pipeline built");
        let mut diagnostics = Diagnostics::new();

        let table = pipeline.finalize(symbols_only(), &mut diagnostics);

        assert_eq!(table.column_names(), vec![SYMBOL, COMPANY]);
        assert_eq!(table.cell(COMPANY, 0), Some(&Cell::Missing));
        assert_eq!(diagnostics.count(Severity::Info), 1);
    }

    #[test]
    fn finalize_can_be_switched_off() {
        let config = PipelineConfig {
            ensure_company_column: false,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(config).expect("pipeline built");
        let mut diagnostics = Diagnostics::new();

        let table = pipeline.finalize(symbols_only(), &mut diagnostics);

        assert_eq!(table, symbols_only());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn step_labels_follow_merge_order() {
        let labels: Vec<&str> = Slot::ORDER.into_iter().map(step_label).collect();
        assert_eq!(labels[1], "Equity + Insider");
        assert_eq!(labels[5], "Add Bhav Data");
    }
}
