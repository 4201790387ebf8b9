//! # Isola Check
//!
//! `isola_check` decides whether code respects actor isolation. Every piece
//! of code runs in an isolation domain; references into another domain must
//! be legal, and values crossing a boundary must be transferable.
//!
//! Key concepts:
//!
//! 1. **Restriction**: How a declaration may be referenced, derived from its
//!    attributes and its owner. See [`ActorIsolationRestriction`].
//!
//! 2. **Crossing**: Comparing a restriction with the domain of the code
//!    making a reference, and diagnosing illegal crossings.
//!
//! 3. **Transferability**: Whether values of a type may cross domains, and
//!    whether a type's claim to be transferable holds.
//!
//! 4. **Driver**: [`IsolationChecker`] runs every check over a whole
//!    [`isola_core::types::Program`], optionally on several threads.

pub mod checker;
pub mod engine;
pub mod integration;
pub mod model;
pub mod sink;

// Re-export key types for convenience
pub use checker::{CheckSummary, IsolationChecker};
pub use engine::{CheckScope, CrossingDecision, TransferabilityChecker};
pub use integration::{ProgramConformanceLookup, ProgramIsolationResolver};
pub use model::{ActorIsolationRestriction, ConcurrentReferenceKind, RestrictionKind};
pub use sink::{CountingSink, DiagnosticCollector, DiagnosticCounts, LoggingSink};
