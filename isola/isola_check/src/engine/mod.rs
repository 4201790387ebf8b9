//! Isolation checking engine.
//!
//! This module provides classification of declarations, the cross-domain
//! reference checks built on it, and the declaration-site, override and
//! conformance checkers.

mod classifier;
mod conformance;
mod crossing;
mod notes;
mod overrides;
mod sites;
mod transferable;

pub use conformance::ConformanceChecker;
pub use crossing::{CrossingChecker, CrossingDecision};
pub use notes::add_async_notes;
pub use overrides::{check_override, is_compatible_override};
pub use sites::{CheckScope, SiteWalker};
pub use transferable::TransferabilityChecker;
