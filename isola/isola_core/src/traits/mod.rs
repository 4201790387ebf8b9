//! Collaborator interfaces of the checker.
//!
//! The checking engine never reaches into global state. Everything it needs
//! from the surrounding compiler is asked through these traits:
//!
//! - `IsolationResolver`: which isolation domain a declaration or context is in
//! - `ConformanceLookup`: whether a nominal type declares transferability
//! - `DiagnosticSink`: where diagnostics go

pub mod conformance;
pub mod diagnostic;
pub mod isolation;

pub use conformance::{ConformanceLookup, TransferableConformance};
pub use diagnostic::DiagnosticSink;
pub use isolation::IsolationResolver;
