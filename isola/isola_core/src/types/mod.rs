//! Core data types for the Isola checker.
//!
//! This module defines the declaration/type graph the checker reads, the
//! isolation domains of code, and the diagnostics it reports.

pub mod conformance;
pub mod context;
pub mod decl;
pub mod diagnostic;
pub mod expr;
pub mod isolation;
pub mod program;
pub mod ty;

pub use conformance::{ConcurrentValueCheck, Conformance};
pub use context::{Closure, DeclContext, Initializer, InitializerKind};
pub use decl::{
    ConcreteDeclRef, Decl, DeclFlags, DeclKind, GlobalActorAttr, Param, PropertyWrapper,
    VarStorage,
};
pub use diagnostic::{Diagnostic, DiagnosticId, Severity};
pub use expr::{Expr, SourceLoc};
pub use isolation::ActorIsolation;
pub use program::{Program, TRANSFERABLE_PROTOCOL_NAME};
pub use ty::{BuiltinType, GenericParamType, SubstitutionMap, Type};
