use std::fmt;

use serde::Serialize;

/// How serious a recorded condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    Load,
    Normalize,
    Select,
    Reconcile,
    Merge,
    Finalize,
    Tidy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Select => "select",
            Stage::Reconcile => "reconcile",
            Stage::Merge => "merge",
            Stage::Finalize => "finalize",
            Stage::Tidy => "tidy",
        };
        f.write_str(name)
    }
}

/// One recorded event of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub severity: Severity,
    pub message: String,
}

/// Ordered list of diagnostics accumulated over a run.
///
/// Each recorded entry is also emitted as a `tracing` event so the binary's
/// subscriber shows the run as it happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, stage: Stage, message: impl Into<String>) {
        self.record(stage, Severity::Info, message.into());
    }

    pub fn warning(&mut self, stage: Stage, message: impl Into<String>) {
        self.record(stage, Severity::Warning, message.into());
    }

    pub fn error(&mut self, stage: Stage, message: impl Into<String>) {
        self.record(stage, Severity::Error, message.into());
    }

    fn record(&mut self, stage: Stage, severity: Severity, message: String) {
        match severity {
            Severity::Info => tracing::info!(%stage, "{message}"),
            Severity::Warning => tracing::warn!(%stage, "{message}"),
            Severity::Error => tracing::error!(%stage, "{message}"),
        }
        self.entries.push(Diagnostic {
            stage,
            severity,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of the given severity, in recording order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(move |entry| entry.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }
}
