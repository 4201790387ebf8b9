//! Diagnostics reported against user code.
//!
//! A [`Diagnostic`] is a value, not an error: checks emit any number of them
//! into a [`crate::traits::DiagnosticSink`] and keep going.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::SourceLoc;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Supplementary information attached to a preceding diagnostic.
    Note,

    /// A problem tolerated for compatibility.
    Warning,

    /// A violation.
    Error,
}

impl Severity {
    /// Get the name of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The catalog of diagnostics the checker can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticId {
    /// An actor-isolated declaration referenced from outside its actor.
    ActorIsolatedReference,

    /// A reference to storage that is unsafe from any concurrent context.
    UnsafeGlobalReference,

    /// A non-transferable parameter type crosses a domain boundary.
    NonTransferableParam,

    /// A non-transferable result type crosses a domain boundary.
    NonTransferableResult,

    /// A non-transferable property type crosses a domain boundary.
    NonTransferableProperty,

    /// A captured variable of non-transferable type is used concurrently.
    NonTransferableCapture,

    /// A mutable variable is captured by concurrently executing code.
    MutableCapture,

    /// An override's isolation is incompatible with the overridden declaration.
    OverrideIsolationMismatch,

    /// Points at the overridden declaration.
    OverriddenDeclHere,

    /// A stored property of a transferable type is not transferable.
    NonTransferableStoredProperty,

    /// An associated value of a transferable enum is not transferable.
    NonTransferableAssociatedValue,

    /// A class claiming transferability is not final.
    NonFinalTransferableClass,

    /// A class claiming transferability has mutable stored properties.
    MutableTransferableClassProperty,

    /// Suggests marking a function `async`.
    AddAsyncNote,

    /// Suggests marking a function `@asyncHandler`.
    AddAsyncHandlerNote,
}

impl DiagnosticId {
    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActorIsolatedReference => "actor_isolated_reference",
            Self::UnsafeGlobalReference => "unsafe_global_reference",
            Self::NonTransferableParam => "non_transferable_param",
            Self::NonTransferableResult => "non_transferable_result",
            Self::NonTransferableProperty => "non_transferable_property",
            Self::NonTransferableCapture => "non_transferable_capture",
            Self::MutableCapture => "mutable_capture",
            Self::OverrideIsolationMismatch => "override_isolation_mismatch",
            Self::OverriddenDeclHere => "overridden_decl_here",
            Self::NonTransferableStoredProperty => "non_transferable_stored_property",
            Self::NonTransferableAssociatedValue => "non_transferable_associated_value",
            Self::NonFinalTransferableClass => "non_final_transferable_class",
            Self::MutableTransferableClassProperty => "mutable_transferable_class_property",
            Self::AddAsyncNote => "add_async_note",
            Self::AddAsyncHandlerNote => "add_async_handler_note",
        }
    }

    /// Whether this diagnostic is a note rather than a primary diagnostic.
    pub fn is_note(&self) -> bool {
        matches!(
            self,
            Self::OverriddenDeclHere | Self::AddAsyncNote | Self::AddAsyncHandlerNote
        )
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A diagnostic attributed to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Catalog entry.
    pub id: DiagnosticId,

    /// Severity.
    pub severity: Severity,

    /// Where the problem is.
    pub loc: SourceLoc,

    /// Rendered message.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    pub fn new(
        id: DiagnosticId,
        severity: Severity,
        loc: SourceLoc,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            severity,
            loc,
            message: message.into(),
        }
    }

    /// An error-level diagnostic.
    pub fn error(id: DiagnosticId, loc: SourceLoc, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Error, loc, message)
    }

    /// A warning-level diagnostic.
    pub fn warning(id: DiagnosticId, loc: SourceLoc, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Warning, loc, message)
    }

    /// A note.
    pub fn note(id: DiagnosticId, loc: SourceLoc, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Note, loc, message)
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} [{}]",
            self.loc, self.severity, self.message, self.id
        )
    }
}
