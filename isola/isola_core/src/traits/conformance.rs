//! Conformance lookup.

use crate::id::{ConformanceId, DeclId};
use crate::types::ConcurrentValueCheck;

/// A transferability conformance found for a nominal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferableConformance {
    /// The conformance.
    pub conformance: ConformanceId,

    /// Why the type is obliged to be transferable.
    pub origin: ConcurrentValueCheck,
}

/// Looks up declared transferability of nominal types.
///
/// Only declared conformances are reported: written directly
/// ([`ConcurrentValueCheck::Explicit`]) or implied by another protocol
/// ([`ConcurrentValueCheck::ImpliedByStandardProtocol`]). Implicit
/// transferability of structs and enums is derived structurally by the
/// engine, not looked up.
pub trait ConformanceLookup: Send + Sync {
    /// Find the transferability conformance of `nominal`, if it declares one.
    fn lookup_transferable(&self, nominal: DeclId) -> Option<TransferableConformance>;
}
