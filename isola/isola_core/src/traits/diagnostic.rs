//! Diagnostic emission.

use std::sync::Arc;

use crate::types::Diagnostic;

/// Receives diagnostics.
///
/// The sink is the one shared mutable resource of a check run. It is
/// append-only from the checker's side and must tolerate emission from
/// several threads when the driver checks declarations in parallel.
///
/// # Examples
///
/// ```
/// use std::sync::Mutex;
/// use isola_core::traits::DiagnosticSink;
/// use isola_core::types::{Diagnostic, DiagnosticId, SourceLoc};
///
/// #[derive(Default)]
/// struct VecSink(Mutex<Vec<Diagnostic>>);
///
/// impl DiagnosticSink for VecSink {
///     fn emit(&self, diagnostic: Diagnostic) {
///         self.0.lock().unwrap().push(diagnostic);
///     }
/// }
///
/// let sink = VecSink::default();
/// sink.emit(Diagnostic::note(DiagnosticId::AddAsyncNote, SourceLoc::new(1, 1), "add 'async'"));
/// assert_eq!(sink.0.lock().unwrap().len(), 1);
/// ```
pub trait DiagnosticSink: Send + Sync {
    /// Append a diagnostic.
    fn emit(&self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}
