//! Counting diagnostics on their way to another sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use isola_core::traits::DiagnosticSink;
use isola_core::types::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};

/// Diagnostic totals by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticCounts {
    /// Errors emitted.
    pub errors: usize,

    /// Warnings emitted.
    pub warnings: usize,

    /// Notes emitted.
    pub notes: usize,
}

impl DiagnosticCounts {
    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.notes
    }
}

/// Forwards diagnostics to an inner sink, counting them by severity.
pub struct CountingSink<'a> {
    inner: Arc<dyn DiagnosticSink + 'a>,
    errors: AtomicUsize,
    warnings: AtomicUsize,
    notes: AtomicUsize,
}

impl<'a> CountingSink<'a> {
    /// Wrap a sink.
    pub fn new(inner: Arc<dyn DiagnosticSink + 'a>) -> Self {
        Self {
            inner,
            errors: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
            notes: AtomicUsize::new(0),
        }
    }

    /// Totals emitted so far.
    pub fn counts(&self) -> DiagnosticCounts {
        DiagnosticCounts {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            notes: self.notes.load(Ordering::Relaxed),
        }
    }
}

impl DiagnosticSink for CountingSink<'_> {
    fn emit(&self, diagnostic: Diagnostic) {
        let counter = match diagnostic.severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
            Severity::Note => &self.notes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.inner.emit(diagnostic);
    }
}
