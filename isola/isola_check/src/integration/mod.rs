//! Program-backed collaborators.
//!
//! The engine is written against the traits in `isola_core::traits`. This
//! module answers those questions from a [`isola_core::types::Program`].

pub mod conformance;
pub mod resolver;

pub use conformance::ProgramConformanceLookup;
pub use resolver::ProgramIsolationResolver;
