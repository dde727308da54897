//! Diagnostic channel for advisory, non-fatal conditions
//!
//! Nothing reported here changes control flow or return values. Callers pick
//! a sink: `TracingSink` for the CLI, `CollectingSink` for tests.

use serde::Serialize;
use std::cell::Cell;
use std::fmt;
use std::sync::Mutex;

/// An advisory event raised while generating reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A remark had no entry in the response dictionary
    UnmatchedRemark { section: String, remark: String },
    /// An assignment folder was not processed
    FolderSkipped { folder: String, reason: String },
    /// A student record did not produce a report
    StudentSkipped {
        folder: String,
        name: String,
        reason: String,
    },
    /// links.json could not be parsed; default links were used
    MalformedLinks { folder: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedRemark { section, remark } => write!(
                f,
                "no feedback found for '{}' in section '{}'",
                remark, section
            ),
            Diagnostic::FolderSkipped { folder, reason } => {
                write!(f, "skipping {}: {}", folder, reason)
            }
            Diagnostic::StudentSkipped {
                folder,
                name,
                reason,
            } => write!(f, "skipping student {} in {}: {}", name, folder, reason),
            Diagnostic::MalformedLinks { folder, reason } => write!(
                f,
                "links.json in {} is not formatted correctly, using default links: {}",
                folder, reason
            ),
        }
    }
}

/// Receiver for diagnostics
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Emits each diagnostic as a `tracing` warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::UnmatchedRemark { section, remark } => {
                tracing::warn!(section = %section, remark = %remark, "{}", diagnostic);
            }
            Diagnostic::FolderSkipped { folder, .. } | Diagnostic::MalformedLinks { folder, .. } => {
                tracing::warn!(folder = %folder, "{}", diagnostic);
            }
            Diagnostic::StudentSkipped { folder, name, .. } => {
                tracing::warn!(folder = %folder, student = %name, "{}", diagnostic);
            }
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Keeps diagnostics in memory so they can be inspected afterwards
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far, in report order
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn unmatched_remarks(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .filter_map(|d| match d {
                Diagnostic::UnmatchedRemark { section, remark } => Some((section, remark)),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic.clone());
    }
}

/// Forwards to an inner sink while counting diagnostics by kind
pub(crate) struct Tally<'a> {
    inner: &'a dyn DiagnosticSink,
    unmatched: Cell<usize>,
}

impl<'a> Tally<'a> {
    pub(crate) fn new(inner: &'a dyn DiagnosticSink) -> Self {
        Tally {
            inner,
            unmatched: Cell::new(0),
        }
    }

    pub(crate) fn unmatched(&self) -> usize {
        self.unmatched.get()
    }
}

impl DiagnosticSink for Tally<'_> {
    fn report(&self, diagnostic: &Diagnostic) {
        if matches!(diagnostic, Diagnostic::UnmatchedRemark { .. }) {
            self.unmatched.set(self.unmatched.get() + 1);
        }
        self.inner.report(diagnostic);
    }
}
