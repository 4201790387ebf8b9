//! Error types for the Isola checker.
//!
//! Isolation violations found in user code are *not* errors in this sense:
//! they are diagnostics, reported through a [`crate::traits::DiagnosticSink`]
//! and never propagated as `Err`. The types here cover infrastructure
//! failures only: loading and validating a serialized program, loading
//! configuration, and I/O.
//!
//! The root error type, `Error`, can wrap any of the subsystem-specific
//! errors, allowing for uniform error handling at the top level.

use crate::id::{ClosureId, ConformanceId, DeclId, InitializerId};
use crate::types::DeclContext;
use thiserror::Error;

/// Root error type for Isola.
#[derive(Debug, Error)]
pub enum Error {
    /// Declaration graph errors
    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors related to the structure of a declaration graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    /// A declaration id does not point into the arena
    #[error("Declaration not found: {0}")]
    DeclNotFound(DeclId),

    /// A closure id does not point into the arena
    #[error("Closure not found: {0}")]
    ClosureNotFound(ClosureId),

    /// An initializer id does not point into the arena
    #[error("Initializer context not found: {0}")]
    InitializerNotFound(InitializerId),

    /// A conformance id does not point into the arena
    #[error("Conformance not found: {0}")]
    ConformanceNotFound(ConformanceId),

    /// A declaration has the wrong kind for the position it is used in
    #[error("Declaration {decl} is not a {expected}")]
    UnexpectedKind {
        /// The offending declaration
        decl: DeclId,

        /// What the position required
        expected: &'static str,
    },

    /// A global-actor attribute does not name a nominal type
    #[error("Global actor attribute on {0} does not name a nominal type")]
    InvalidGlobalActor(DeclId),

    /// Following parents from a context leads back to that context
    #[error("Context {0:?} is its own ancestor")]
    ContextCycle(DeclContext),

    /// The graph does not declare the transferable capability protocol
    #[error("No transferable capability protocol declared")]
    MissingTransferableProtocol,
}

/// Errors related to checker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse a configuration file
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Configuration parsed but violates a constraint
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type used throughout Isola.
pub type Result<T> = std::result::Result<T, Error>;
