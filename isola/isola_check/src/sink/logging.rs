//! Forwarding diagnostics to the log.

use isola_core::log_event;
use isola_core::traits::DiagnosticSink;
use isola_core::types::Diagnostic;
use isola_core::utils::LogLevel;

/// Logs every diagnostic before passing it on.
///
/// Notes are logged at info level; errors and warnings at their own level.
#[derive(Debug, Clone)]
pub struct LoggingSink<S> {
    inner: S,
}

impl<S: DiagnosticSink> LoggingSink<S> {
    /// Wrap a sink.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The wrapped sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for LoggingSink<S> {
    fn emit(&self, diagnostic: Diagnostic) {
        log_event!(
            LogLevel::for_severity(diagnostic.severity),
            &diagnostic.message,
            id => diagnostic.id,
            loc => diagnostic.loc,
        );
        self.inner.emit(diagnostic);
    }
}
