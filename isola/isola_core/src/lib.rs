//! # Isola Core
//!
//! `isola_core` provides the shared building blocks of the Isola actor-isolation
//! checker: the declaration/type graph the checker reads, the isolation
//! domains code can run in, diagnostics, the collaborator traits the engine is
//! written against, and the error hierarchy for infrastructure failures.
//!
//! ## Model
//!
//! 1. **Arena graph**: every declaration, closure, initializer context and
//!    conformance lives in a [`types::Program`]. Everything else refers to
//!    them through copyable typed indices ([`id::DeclId`] and friends), so
//!    checker results never own or outlive graph entities.
//!
//! 2. **Isolation domains**: code runs in an actor instance, a global actor,
//!    explicitly in no domain, or (legacy code) in an unspecified domain. See
//!    [`types::ActorIsolation`].
//!
//! 3. **Diagnostics are values**: violations in user code are reported as
//!    [`types::Diagnostic`]s through a [`traits::DiagnosticSink`] passed in
//!    by the caller. Only infrastructure failures are [`Error`]s.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for loading programs and configuration
//! - **id**: Strongly-typed arena indices
//! - **traits**: Collaborator interfaces of the engine
//! - **types**: The declaration graph, isolation domains and diagnostics
//! - **utils**: Logging levels and checker configuration
//! - **macros**: The `log_event!` logging macro

pub mod error;
pub mod id;
pub mod macros;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{ConfigError, Error, ProgramError, Result};
pub use id::{ClosureId, ConformanceId, DeclId, InitializerId};
pub use traits::{ConformanceLookup, DiagnosticSink, IsolationResolver, TransferableConformance};
pub use types::{
    ActorIsolation, ConcreteDeclRef, ConcurrentValueCheck, Decl, DeclContext, DeclFlags, DeclKind,
    Diagnostic, DiagnosticId, Expr, Program, Severity, SourceLoc, SubstitutionMap, Type,
};
pub use utils::{CheckerConfig, ConfigOverrides, LogLevel};
