//! Transferability conformance checking.
//!
//! Validates a type's claim to be transferable by checking its storage. The
//! definition is checked once, with the generic parameters named by the
//! conformance's conditional requirements assumed transferable; concrete
//! instantiations are answered by [`TransferabilityChecker`].

use isola_core::id::ConformanceId;
use isola_core::traits::DiagnosticSink;
use isola_core::types::{
    ConcurrentValueCheck, DeclFlags, DeclKind, Diagnostic, DiagnosticId, Program, Severity,
};
use tracing::debug;

use crate::engine::transferable::TransferabilityChecker;

/// Checks transferability conformances.
#[derive(Clone, Copy)]
pub struct ConformanceChecker<'a> {
    program: &'a Program,
    transferability: TransferabilityChecker<'a>,
    sink: &'a dyn DiagnosticSink,
    relaxed_legacy_conformances: bool,
}

impl<'a> ConformanceChecker<'a> {
    /// Create a checker.
    ///
    /// When `relaxed_legacy_conformances` is off, implied and implicit
    /// conformances are held to the same standard as explicit ones.
    pub fn new(
        program: &'a Program,
        transferability: TransferabilityChecker<'a>,
        sink: &'a dyn DiagnosticSink,
        relaxed_legacy_conformances: bool,
    ) -> Self {
        Self {
            program,
            transferability,
            sink,
            relaxed_legacy_conformances,
        }
    }

    /// Check a conformance.
    ///
    /// Problems are errors for explicit conformances and warnings for
    /// relaxed origins. Unchecked conformances are trusted.
    ///
    /// # Returns
    ///
    /// `true` if an error was reported; warnings alone return `false`.
    pub fn check_concurrent_value_conformance(
        &self,
        id: ConformanceId,
        check: ConcurrentValueCheck,
    ) -> bool {
        let conformance = self.program.conformance(id);
        let nominal = conformance.conforming;
        let decl = self.program.decl(nominal);

        if conformance.unchecked || decl.has(DeclFlags::UNCHECKED) {
            debug!("Skipping unchecked conformance {} of {}", id, decl.name);
            return false;
        }

        let severity = if check.is_relaxed() && self.relaxed_legacy_conformances {
            Severity::Warning
        } else {
            Severity::Error
        };

        let mut assumed = conformance.conditional_requirements.clone();
        assumed.extend(
            decl.generic_params
                .iter()
                .filter(|p| p.requires_transferable)
                .map(|p| p.name.clone()),
        );

        let mut problems = 0;
        let mut report = |id: DiagnosticId, loc, message: String| {
            self.sink.emit(Diagnostic::new(id, severity, loc, message));
            problems += 1;
        };

        match &decl.kind {
            DeclKind::Struct => {
                for prop in self.program.stored_properties(nominal) {
                    let prop_decl = self.program.decl(prop);
                    let Some(ty) = self.program.value_type(prop) else {
                        continue;
                    };
                    if !self.transferability.is_transferable_assuming(ty, &assumed) {
                        report(
                            DiagnosticId::NonTransferableStoredProperty,
                            prop_decl.loc,
                            format!(
                                "stored property '{}' of transferable struct '{}' has non-transferable type '{}'",
                                prop_decl.name,
                                decl.name,
                                self.program.type_name(ty)
                            ),
                        );
                    }
                }
            }
            DeclKind::Enum => {
                for element in self.program.enum_elements(nominal) {
                    let element_decl = self.program.decl(element);
                    let DeclKind::EnumElement { payload, .. } = &element_decl.kind else {
                        continue;
                    };
                    for ty in payload {
                        if !self.transferability.is_transferable_assuming(ty, &assumed) {
                            report(
                                DiagnosticId::NonTransferableAssociatedValue,
                                element_decl.loc,
                                format!(
                                    "associated value of case '{}' of transferable enum '{}' has non-transferable type '{}'",
                                    element_decl.name,
                                    decl.name,
                                    self.program.type_name(ty)
                                ),
                            );
                        }
                    }
                }
            }
            DeclKind::Class { is_actor: true, .. } => {}
            DeclKind::Class { .. } => {
                if !decl.has(DeclFlags::FINAL) {
                    report(
                        DiagnosticId::NonFinalTransferableClass,
                        conformance.loc,
                        format!("non-final class '{}' cannot conform to 'Transferable'", decl.name),
                    );
                }
                for prop in self.program.stored_properties(nominal) {
                    let prop_decl = self.program.decl(prop);
                    if prop_decl.has(DeclFlags::MUTABLE) {
                        report(
                            DiagnosticId::MutableTransferableClassProperty,
                            prop_decl.loc,
                            format!(
                                "stored property '{}' of transferable class '{}' is mutable",
                                prop_decl.name, decl.name
                            ),
                        );
                        continue;
                    }
                    let Some(ty) = self.program.value_type(prop) else {
                        continue;
                    };
                    if !self.transferability.is_transferable_assuming(ty, &assumed) {
                        report(
                            DiagnosticId::NonTransferableStoredProperty,
                            prop_decl.loc,
                            format!(
                                "stored property '{}' of transferable class '{}' has non-transferable type '{}'",
                                prop_decl.name,
                                decl.name,
                                self.program.type_name(ty)
                            ),
                        );
                    }
                }
            }
            _ => {}
        }

        debug!(
            "Checked {} conformance of {}: {} problem(s)",
            check, decl.name, problems
        );
        problems > 0 && severity == Severity::Error
    }
}
