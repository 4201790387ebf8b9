//! Conformance lookup over a declaration graph.

use isola_core::id::DeclId;
use isola_core::traits::{ConformanceLookup, TransferableConformance};
use isola_core::types::{ConcurrentValueCheck, DeclKind, Program};

/// Finds transferability conformances declared in a [`Program`].
///
/// A conformance to the graph's transferable protocol is explicit. A
/// conformance to a protocol that implies transferability is implied. When a
/// type has both, the explicit one wins.
#[derive(Debug, Clone, Copy)]
pub struct ProgramConformanceLookup<'a> {
    program: &'a Program,
}

impl<'a> ProgramConformanceLookup<'a> {
    /// Create a lookup over the given graph.
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// The origin of a conformance to `protocol`, if it obliges transferability.
    pub fn origin_of(&self, protocol: DeclId) -> Option<ConcurrentValueCheck> {
        if self.program.transferable_protocol().ok() == Some(protocol) {
            return Some(ConcurrentValueCheck::Explicit);
        }
        match self.program.decl(protocol).kind {
            DeclKind::Protocol {
                implies_transferable: true,
            } => Some(ConcurrentValueCheck::ImpliedByStandardProtocol),
            _ => None,
        }
    }
}

impl ConformanceLookup for ProgramConformanceLookup<'_> {
    fn lookup_transferable(&self, nominal: DeclId) -> Option<TransferableConformance> {
        let mut found: Option<TransferableConformance> = None;
        for (id, conformance) in self.program.conformances_of(nominal) {
            let Some(origin) = self.origin_of(conformance.protocol) else {
                continue;
            };
            let candidate = TransferableConformance {
                conformance: id,
                origin,
            };
            match origin {
                ConcurrentValueCheck::Explicit => return Some(candidate),
                _ => found = found.or(Some(candidate)),
            }
        }
        found
    }
}
