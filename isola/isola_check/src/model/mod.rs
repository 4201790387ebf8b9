//! Restriction and reference models.
//!
//! This module defines how a declaration may be referenced and why a given
//! reference is being treated as crossing isolation domains.

pub mod reference;
pub mod restriction;

pub use reference::ConcurrentReferenceKind;
pub use restriction::{ActorIsolationRestriction, RestrictionKind};
