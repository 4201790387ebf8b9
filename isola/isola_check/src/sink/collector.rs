//! In-memory diagnostic collection.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use isola_core::traits::DiagnosticSink;
use isola_core::types::{Diagnostic, DiagnosticId, Severity};
use parking_lot::Mutex;

/// A sink that keeps the diagnostics it receives.
///
/// A note belongs to the last error or warning emitted on the same thread.
/// With a limit, only the first `limit` errors and warnings in location order
/// are reported, together with their notes; the rest are counted as dropped.
/// The limit is applied when reading, so the result does not depend on how
/// parallel checks interleave.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    inner: Mutex<Collected>,

    /// Number of diagnostics received per catalog entry.
    counts: DashMap<DiagnosticId, usize>,

    /// Maximum number of errors and warnings to report.
    limit: Option<usize>,
}

#[derive(Debug, Default)]
struct Collected {
    /// Diagnostics grouped with their notes, in emission order of the first
    /// member.
    groups: Vec<Vec<Diagnostic>>,

    /// The group the next note on each thread joins.
    open: HashMap<ThreadId, usize>,
}

/// Orders groups by their first diagnostic.
fn compare_groups(a: &[Diagnostic], b: &[Diagnostic]) -> Ordering {
    match (a.first(), b.first()) {
        (Some(a), Some(b)) => a
            .loc
            .cmp(&b.loc)
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.message.cmp(&b.message)),
        _ => Ordering::Equal,
    }
}

impl Collected {
    /// Which groups are reported under `limit`.
    fn kept(&self, limit: Option<usize>) -> Vec<bool> {
        let Some(limit) = limit else {
            return vec![true; self.groups.len()];
        };
        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        order.sort_by(|&a, &b| compare_groups(&self.groups[a], &self.groups[b]));

        let mut kept = vec![false; self.groups.len()];
        let mut primaries = 0;
        for index in order {
            let is_note = self.groups[index]
                .first()
                .is_some_and(|d| d.severity == Severity::Note);
            if is_note {
                kept[index] = true;
            } else if primaries < limit {
                kept[index] = true;
                primaries += 1;
            }
        }
        kept
    }
}

impl DiagnosticCollector {
    /// Create a collector without a limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector reporting at most `limit` errors and warnings.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// The reported diagnostics, each followed by its notes, in emission
    /// order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let inner = self.inner.lock();
        let kept = inner.kept(self.limit);
        inner
            .groups
            .iter()
            .zip(kept)
            .filter(|(_, keep)| *keep)
            .flat_map(|(group, _)| group.iter().cloned())
            .collect()
    }

    /// The reported diagnostics ordered by location, each followed by its
    /// notes.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let inner = self.inner.lock();
        let kept = inner.kept(self.limit);
        let mut groups: Vec<&Vec<Diagnostic>> = inner
            .groups
            .iter()
            .zip(kept)
            .filter(|(_, keep)| *keep)
            .map(|(group, _)| group)
            .collect();
        groups.sort_by(|a, b| compare_groups(a, b));
        groups.into_iter().flatten().cloned().collect()
    }

    /// Number of reported diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics().len()
    }

    /// Whether nothing is reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of reported errors.
    pub fn error_count(&self) -> usize {
        self.count_severity(Severity::Error)
    }

    /// Number of reported warnings.
    pub fn warning_count(&self) -> usize {
        self.count_severity(Severity::Warning)
    }

    /// Number of reported notes.
    pub fn note_count(&self) -> usize {
        self.count_severity(Severity::Note)
    }

    /// Whether any error is reported.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of diagnostics received for a catalog entry, reported or not.
    pub fn count_of(&self, id: DiagnosticId) -> usize {
        self.counts.get(&id).map(|c| *c).unwrap_or(0)
    }

    /// Number of diagnostics held back by the limit.
    pub fn dropped(&self) -> usize {
        let inner = self.inner.lock();
        let kept = inner.kept(self.limit);
        inner
            .groups
            .iter()
            .zip(kept)
            .filter(|(_, keep)| !*keep)
            .map(|(group, _)| group.len())
            .sum()
    }

    /// Forget everything collected so far.
    pub fn clear(&self) {
        *self.inner.lock() = Collected::default();
        self.counts.clear();
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.diagnostics()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&self, diagnostic: Diagnostic) {
        *self.counts.entry(diagnostic.id).or_insert(0) += 1;

        let thread = thread::current().id();
        let mut inner = self.inner.lock();
        if diagnostic.severity == Severity::Note {
            if let Some(&index) = inner.open.get(&thread) {
                inner.groups[index].push(diagnostic);
                return;
            }
            inner.groups.push(vec![diagnostic]);
            return;
        }

        let index = inner.groups.len();
        inner.groups.push(vec![diagnostic]);
        inner.open.insert(thread, index);
    }
}
