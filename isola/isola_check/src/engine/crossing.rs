//! Cross-domain reference checking.
//!
//! Given a reference and the isolation of the code making it, decide whether
//! the reference crosses a domain boundary and whether that crossing is legal.
//! Every `true` result has emitted at least one diagnostic.

use isola_core::id::DeclId;
use isola_core::traits::{DiagnosticSink, IsolationResolver};
use isola_core::types::{
    ActorIsolation, ConcreteDeclRef, DeclContext, DeclFlags, DeclKind, Diagnostic, DiagnosticId,
    Program, SourceLoc, Type,
};
use tracing::{debug, trace};

use crate::engine::transferable::TransferabilityChecker;
use crate::model::{ActorIsolationRestriction, ConcurrentReferenceKind};

/// Outcome of comparing a restriction with the referencing code's isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDecision {
    /// No boundary is involved.
    NoCrossing,

    /// The reference is unsafe from any context.
    Unsafe,

    /// The reference leaves the declaration's actor and is not allowed to.
    Forbidden,

    /// The reference crosses; values flowing across must be transferable.
    RequiresTransfer,

    /// The reference crosses from legacy code into a lenient global actor.
    Tolerated,
}

impl CrossingDecision {
    /// Whether the reference crosses a domain boundary at all.
    pub fn is_crossing(&self) -> bool {
        !matches!(self, Self::NoCrossing)
    }
}

/// Checks references against the isolation of the code making them.
#[derive(Clone, Copy)]
pub struct CrossingChecker<'a> {
    program: &'a Program,
    resolver: &'a dyn IsolationResolver,
    transferability: TransferabilityChecker<'a>,
    sink: &'a dyn DiagnosticSink,
    global_actor_unsafe_leniency: bool,
}

impl<'a> CrossingChecker<'a> {
    /// Create a checker.
    pub fn new(
        program: &'a Program,
        resolver: &'a dyn IsolationResolver,
        transferability: TransferabilityChecker<'a>,
        sink: &'a dyn DiagnosticSink,
        global_actor_unsafe_leniency: bool,
    ) -> Self {
        Self {
            program,
            resolver,
            transferability,
            sink,
            global_actor_unsafe_leniency,
        }
    }

    /// Check a reference made from code in `caller`.
    ///
    /// # Returns
    ///
    /// `true` if a problem was found and reported.
    pub fn diagnose_non_concurrent_types_in_reference(
        &self,
        decl_ref: &ConcreteDeclRef,
        caller: DeclContext,
        loc: SourceLoc,
        kind: ConcurrentReferenceKind,
    ) -> bool {
        let isolation = self.resolver.isolation_of_context(caller);
        self.diagnose_reference(decl_ref, &isolation, false, loc, kind)
    }

    /// Compare a restriction with the referencing code's isolation.
    ///
    /// `through_foreign_base` marks a member reference made through a value
    /// other than `self`, which reaches another instance of the actor even
    /// from inside the actor.
    pub fn decide(
        &self,
        restriction: &ActorIsolationRestriction,
        caller: &ActorIsolation,
        through_foreign_base: bool,
    ) -> CrossingDecision {
        match restriction {
            ActorIsolationRestriction::Unrestricted => CrossingDecision::NoCrossing,
            ActorIsolationRestriction::Unsafe => CrossingDecision::Unsafe,
            ActorIsolationRestriction::ActorSelf { actor }
            | ActorIsolationRestriction::CrossActorSelf { actor } => {
                let same = caller.actor_class() == Some(*actor) && !through_foreign_base;
                if same {
                    CrossingDecision::NoCrossing
                } else if restriction.is_cross_actor() {
                    CrossingDecision::RequiresTransfer
                } else {
                    CrossingDecision::Forbidden
                }
            }
            ActorIsolationRestriction::GlobalActor { actor } => {
                if caller.global_actor() == Some(actor) {
                    CrossingDecision::NoCrossing
                } else {
                    CrossingDecision::RequiresTransfer
                }
            }
            ActorIsolationRestriction::GlobalActorUnsafe { actor } => {
                if caller.global_actor() == Some(actor) {
                    CrossingDecision::NoCrossing
                } else if caller.is_unspecified() && self.global_actor_unsafe_leniency {
                    CrossingDecision::Tolerated
                } else {
                    CrossingDecision::RequiresTransfer
                }
            }
        }
    }

    /// Check a reference made from code with the given isolation.
    ///
    /// # Returns
    ///
    /// `true` if a problem was found and reported.
    pub fn diagnose_reference(
        &self,
        decl_ref: &ConcreteDeclRef,
        caller: &ActorIsolation,
        through_foreign_base: bool,
        loc: SourceLoc,
        kind: ConcurrentReferenceKind,
    ) -> bool {
        let restriction = ActorIsolationRestriction::for_declaration(decl_ref, self.program);
        let decision = self.decide(&restriction, caller, through_foreign_base);
        trace!(
            "Reference to {} with restriction {} from {}: {:?}",
            decl_ref.decl,
            restriction,
            caller,
            decision
        );

        match decision {
            CrossingDecision::NoCrossing | CrossingDecision::Tolerated => false,
            CrossingDecision::Unsafe => {
                let decl = self.program.decl(decl_ref.decl);
                self.emit(Diagnostic::error(
                    DiagnosticId::UnsafeGlobalReference,
                    loc,
                    format!(
                        "{} '{}' is not concurrency-safe and cannot be {} from concurrent code",
                        describe_decl(self.program, decl_ref.decl),
                        decl.name,
                        kind.usage()
                    ),
                ));
                true
            }
            CrossingDecision::Forbidden => {
                let decl = self.program.decl(decl_ref.decl);
                let actor = restriction
                    .actor_class()
                    .map(|a| self.program.decl(a).name.as_str())
                    .unwrap_or("<unknown>");
                self.emit(Diagnostic::error(
                    DiagnosticId::ActorIsolatedReference,
                    loc,
                    format!(
                        "actor-isolated {} '{}' cannot be {} from outside of actor '{}'",
                        describe_decl(self.program, decl_ref.decl),
                        decl.name,
                        kind.usage(),
                        actor
                    ),
                ));
                true
            }
            CrossingDecision::RequiresTransfer => self.diagnose_value_types(decl_ref, loc, kind),
        }
    }

    /// Require every type flowing across the boundary of a reference to be
    /// transferable: parameter and result types of a function, the type of a
    /// property. Each distinct offending type is reported once.
    ///
    /// # Returns
    ///
    /// `true` if any type was reported.
    pub fn diagnose_value_types(
        &self,
        decl_ref: &ConcreteDeclRef,
        loc: SourceLoc,
        kind: ConcurrentReferenceKind,
    ) -> bool {
        let decl = self.program.decl(decl_ref.decl);
        let mut reported: Vec<Type> = Vec::new();

        for (id, ty) in crossing_types(self.program, decl_ref) {
            if reported.contains(&ty) || self.transferability.is_transferable(&ty) {
                continue;
            }
            let what = match id {
                DiagnosticId::NonTransferableParam => "parameter",
                DiagnosticId::NonTransferableResult => "result",
                _ => "property",
            };
            self.emit(Diagnostic::error(
                id,
                loc,
                format!(
                    "non-transferable {} type '{}' of {} '{}' cannot cross isolation domains {}",
                    what,
                    self.program.type_name(&ty),
                    describe_decl(self.program, decl_ref.decl),
                    decl.name,
                    kind.rationale()
                ),
            ));
            reported.push(ty);
        }

        if !reported.is_empty() {
            debug!(
                "Reported {} non-transferable type(s) for {}",
                reported.len(),
                decl_ref.decl
            );
        }
        !reported.is_empty()
    }

    /// Check a local variable captured by concurrently executing code.
    ///
    /// Mutable captures are always rejected; immutable captures must have a
    /// transferable type.
    ///
    /// # Returns
    ///
    /// `true` if a problem was found and reported.
    pub fn diagnose_capture(&self, var: DeclId, loc: SourceLoc) -> bool {
        let decl = self.program.decl(var);
        let kind = ConcurrentReferenceKind::LocalCapture;

        if decl.has(DeclFlags::MUTABLE) {
            self.emit(Diagnostic::error(
                DiagnosticId::MutableCapture,
                loc,
                format!(
                    "mutable variable '{}' cannot be {} {}",
                    decl.name,
                    kind.usage(),
                    kind.rationale()
                ),
            ));
            return true;
        }

        let Some(ty) = self.program.value_type(var) else {
            return false;
        };
        if self.transferability.is_transferable(ty) {
            return false;
        }
        self.emit(Diagnostic::error(
            DiagnosticId::NonTransferableCapture,
            loc,
            format!(
                "variable '{}' of non-transferable type '{}' cannot be {} {}",
                decl.name,
                self.program.type_name(ty),
                kind.usage(),
                kind.rationale()
            ),
        ));
        true
    }

    fn emit(&self, diagnostic: Diagnostic) {
        self.sink.emit(diagnostic);
    }
}

/// The types that flow across the boundary when `decl_ref` is referenced,
/// with the diagnostic used when each is not transferable.
fn crossing_types(program: &Program, decl_ref: &ConcreteDeclRef) -> Vec<(DiagnosticId, Type)> {
    let subs = &decl_ref.substitutions;
    match &program.decl(decl_ref.decl).kind {
        DeclKind::Func { params, result, .. } => params
            .iter()
            .map(|p| (DiagnosticId::NonTransferableParam, p.ty.subst(subs)))
            .chain(std::iter::once((
                DiagnosticId::NonTransferableResult,
                result.subst(subs),
            )))
            .collect(),
        DeclKind::Var { ty, .. } => vec![(DiagnosticId::NonTransferableProperty, ty.subst(subs))],
        _ => Vec::new(),
    }
}

/// The kind of a declaration as spelled in diagnostics.
pub(crate) fn describe_decl(program: &Program, decl: DeclId) -> &'static str {
    let d = program.decl(decl);
    match d.kind {
        DeclKind::Func { .. } if program.parent_nominal(decl).is_some() => "method",
        DeclKind::Func { .. } => "function",
        _ => d.kind.describe(),
    }
}
