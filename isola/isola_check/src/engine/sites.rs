//! Declaration-site checking.
//!
//! Every place code can appear (top-level code, function bodies, initializer
//! expressions, enum case default arguments, property-wrapper bindings) is
//! checked by the same walker. A [`CheckScope`] supplies the isolation the
//! code starts in and the expression to walk.

use isola_core::id::{DeclId, InitializerId};
use isola_core::traits::{DiagnosticSink, IsolationResolver};
use isola_core::types::{
    ActorIsolation, ConcreteDeclRef, DeclContext, DeclFlags, DeclKind, Expr, Program, SourceLoc,
};
use tracing::{debug, trace};

use crate::engine::crossing::{CrossingChecker, CrossingDecision};
use crate::engine::notes::add_async_notes;
use crate::model::{ActorIsolationRestriction, ConcurrentReferenceKind};

/// A place where code appears, with the expression to check.
#[derive(Debug, Clone, Copy)]
pub enum CheckScope<'e> {
    /// A top-level code declaration.
    TopLevel(DeclId),

    /// The body of a function.
    Function(DeclId),

    /// An initializer expression: a property's initial value or a default
    /// argument.
    Initializer(InitializerId, &'e Expr),

    /// A default argument of an enum case's associated value.
    EnumElement(DeclId, &'e Expr),

    /// The initialization of a variable's property wrapper.
    PropertyWrapper(DeclId, &'e Expr),
}

impl<'e> CheckScope<'e> {
    /// The context the scope's code executes in.
    pub fn context(&self, program: &Program) -> DeclContext {
        match *self {
            Self::TopLevel(decl) | Self::Function(decl) | Self::PropertyWrapper(decl, _) => {
                DeclContext::of_decl(decl)
            }
            Self::Initializer(init, _) => DeclContext::of_initializer(init),
            Self::EnumElement(element, _) => program.decl(element).context,
        }
    }

    /// The isolation the scope's code starts in.
    pub fn isolation(&self, program: &Program, resolver: &dyn IsolationResolver) -> ActorIsolation {
        match *self {
            Self::TopLevel(_) => ActorIsolation::Unspecified,
            Self::Function(decl) | Self::EnumElement(decl, _) | Self::PropertyWrapper(decl, _) => {
                resolver.isolation_of_decl(decl)
            }
            Self::Initializer(..) => resolver.isolation_of_context(self.context(program)),
        }
    }

    /// The code to check, if the scope has any.
    pub fn body<'p>(&self, program: &'p Program) -> Option<&'p Expr>
    where
        'e: 'p,
    {
        match *self {
            Self::TopLevel(decl) | Self::Function(decl) => match &program.decl(decl).kind {
                DeclKind::TopLevelCode { body } => Some(body),
                DeclKind::Func { body, .. } => body.as_ref(),
                _ => None,
            },
            Self::Initializer(_, expr)
            | Self::EnumElement(_, expr)
            | Self::PropertyWrapper(_, expr) => Some(expr),
        }
    }

    /// The function whose body this scope is, if any.
    fn function(&self) -> Option<DeclId> {
        match *self {
            Self::Function(decl) => Some(decl),
            _ => None,
        }
    }
}

/// Walks code in a scope and checks every reference it makes.
#[derive(Clone, Copy)]
pub struct SiteWalker<'a> {
    program: &'a Program,
    resolver: &'a dyn IsolationResolver,
    crossing: CrossingChecker<'a>,
    sink: &'a dyn DiagnosticSink,
    suggest_async_notes: bool,
}

struct Frame {
    context: DeclContext,
    isolation: ActorIsolation,
}

struct WalkState {
    frames: Vec<Frame>,
    function: Option<DeclId>,
    noted: bool,
    diagnosed: bool,
}

impl WalkState {
    fn current(&self) -> &Frame {
        // The scope's own frame is never popped.
        &self.frames[self.frames.len() - 1]
    }
}

impl<'a> SiteWalker<'a> {
    /// Create a walker.
    pub fn new(
        program: &'a Program,
        resolver: &'a dyn IsolationResolver,
        crossing: CrossingChecker<'a>,
        sink: &'a dyn DiagnosticSink,
        suggest_async_notes: bool,
    ) -> Self {
        Self {
            program,
            resolver,
            crossing,
            sink,
            suggest_async_notes,
        }
    }

    /// Check all references made by the code in `scope`.
    ///
    /// # Returns
    ///
    /// `true` if any problem was reported.
    pub fn check(&self, scope: CheckScope<'_>) -> bool {
        let Some(body) = scope.body(self.program) else {
            return false;
        };

        let frame = Frame {
            context: scope.context(self.program),
            isolation: scope.isolation(self.program, self.resolver),
        };
        trace!("Checking {:?} in {}", scope, frame.isolation);

        let mut state = WalkState {
            frames: vec![frame],
            function: scope.function(),
            noted: false,
            diagnosed: false,
        };
        self.walk(body, &mut state);

        if state.diagnosed {
            debug!("Problems found in {:?}", scope);
        }
        state.diagnosed
    }

    fn walk(&self, expr: &Expr, state: &mut WalkState) {
        match expr {
            Expr::DeclRef { target, loc } => self.reference(target, false, false, *loc, state),
            Expr::MemberRef { base, target, loc } => {
                self.walk(base, state);
                self.reference(target, is_foreign(base), false, *loc, state);
            }
            Expr::Call { callee, args, .. } => {
                match callee.as_ref() {
                    Expr::DeclRef { target, loc } => {
                        self.reference(target, false, true, *loc, state)
                    }
                    Expr::MemberRef { base, target, loc } => {
                        self.walk(base, state);
                        self.reference(target, is_foreign(base), true, *loc, state);
                    }
                    other => self.walk(other, state),
                }
                for arg in args {
                    self.walk(arg, state);
                }
            }
            Expr::Closure { closure, body, .. } => {
                let info = self.program.closure(*closure);
                let isolation = match &info.global_actor {
                    Some(actor) => ActorIsolation::GlobalActor {
                        actor: actor.clone(),
                    },
                    None if info.concurrent => ActorIsolation::Independent,
                    None => state.current().isolation.clone(),
                };
                state.frames.push(Frame {
                    context: DeclContext::of_closure(*closure),
                    isolation,
                });
                self.walk(body, state);
                state.frames.pop();
            }
            Expr::Assign { dest, source, .. } => {
                self.walk(dest, state);
                self.walk(source, state);
            }
            Expr::Sequence { exprs } => {
                for e in exprs {
                    self.walk(e, state);
                }
            }
            Expr::SelfRef { .. } | Expr::Literal { .. } => {}
        }
    }

    fn reference(
        &self,
        target: &ConcreteDeclRef,
        foreign: bool,
        is_call: bool,
        loc: SourceLoc,
        state: &mut WalkState,
    ) {
        let decl = self.program.decl(target.decl);
        let frame = state.current();

        if matches!(decl.kind, DeclKind::Var { .. }) && self.program.is_local(target.decl) {
            if self
                .program
                .crosses_concurrent_closure(frame.context, decl.context)
                && self.crossing.diagnose_capture(target.decl, loc)
            {
                state.diagnosed = true;
            }
            return;
        }

        let restriction = ActorIsolationRestriction::for_declaration(target, self.program);
        let decision = self.crossing.decide(&restriction, &frame.isolation, foreign);
        let kind = if is_call && decl.has(DeclFlags::CONCURRENT) {
            ConcurrentReferenceKind::ConcurrentFunction
        } else if is_call && decl.is_func() && !decl.is_async() && decision.is_crossing() {
            ConcurrentReferenceKind::SynchronousAsAsyncCall
        } else {
            ConcurrentReferenceKind::CrossActor
        };

        let mut found =
            self.crossing
                .diagnose_reference(target, &frame.isolation, foreign, loc, kind);
        if !found
            && kind == ConcurrentReferenceKind::ConcurrentFunction
            && decision == CrossingDecision::NoCrossing
        {
            found = self.crossing.diagnose_value_types(target, loc, kind);
        }
        if !found {
            return;
        }
        state.diagnosed = true;

        if kind == ConcurrentReferenceKind::SynchronousAsAsyncCall
            && self.suggest_async_notes
            && !state.noted
            && state.frames.len() == 1
        {
            if let Some(func) = state.function {
                add_async_notes(self.program, self.sink, func);
                state.noted = true;
            }
        }
    }
}

/// Whether a member is reached through a value other than `self`.
fn is_foreign(base: &Expr) -> bool {
    !matches!(base, Expr::SelfRef { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::transferable::TransferabilityChecker;
    use crate::integration::{ProgramConformanceLookup, ProgramIsolationResolver};
    use crate::sink::DiagnosticCollector;
    use isola_core::types::{BuiltinType, Closure, Decl, DiagnosticId, Param, Type};

    fn walk(program: &Program, scope: CheckScope<'_>) -> (bool, DiagnosticCollector) {
        let sink = DiagnosticCollector::new();
        let resolver = ProgramIsolationResolver::new(program);
        let lookup = ProgramConformanceLookup::new(program);
        let transferability = TransferabilityChecker::new(program, &lookup, true);
        let crossing = CrossingChecker::new(program, &resolver, transferability, &sink, true);
        let walker = SiteWalker::new(program, &resolver, crossing, &sink, true);
        let result = walker.check(scope);
        (result, sink)
    }

    fn at(line: u32) -> SourceLoc {
        SourceLoc::new(line, 1)
    }

    #[test]
    fn test_sync_call_into_actor_gets_notes() {
        let mut program = Program::new();
        let counter = program.add_decl(Decl::new("Counter", DeclKind::actor()));
        let increment = program.add_decl(
            Decl::new("increment", DeclKind::func(vec![], Type::void()))
                .in_context(DeclContext::of_decl(counter)),
        );
        let param = Param::new("c", Type::nominal(counter));
        let body = Expr::call(
            Expr::member(
                Expr::decl_ref(ConcreteDeclRef::new(counter), at(2)),
                ConcreteDeclRef::new(increment),
                at(2),
            ),
            vec![],
            at(2),
        );
        let caller = program.add_decl(
            Decl::new("poke", DeclKind::func_with_body(vec![param], Type::void(), body)).at(at(1)),
        );

        let (result, sink) = walk(&program, CheckScope::Function(caller));
        assert!(result);
        let ids: Vec<DiagnosticId> = sink.diagnostics().iter().map(|d| d.id).collect();
        assert_eq!(
            ids,
            vec![
                DiagnosticId::ActorIsolatedReference,
                DiagnosticId::AddAsyncHandlerNote,
                DiagnosticId::AddAsyncNote
            ]
        );
        assert!(sink.diagnostics()[0].message.contains("called synchronously"));
    }

    #[test]
    fn test_self_access_inside_actor_is_legal() {
        let mut program = Program::new();
        let counter = program.add_decl(Decl::new("Counter", DeclKind::actor()));
        let value = program.add_decl(
            Decl::new("value", DeclKind::var(Type::builtin(BuiltinType::Int)))
                .in_context(DeclContext::of_decl(counter))
                .with_flags(DeclFlags::MUTABLE),
        );
        let body = Expr::assign(
            Expr::member(Expr::self_ref(at(2)), ConcreteDeclRef::new(value), at(2)),
            Expr::literal(at(2)),
            at(2),
        );
        let reset = program.add_decl(
            Decl::new("reset", DeclKind::func_with_body(vec![], Type::void(), body))
                .in_context(DeclContext::of_decl(counter)),
        );

        let (result, sink) = walk(&program, CheckScope::Function(reset));
        assert!(!result);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_concurrent_closure_leaves_actor() {
        let mut program = Program::new();
        let counter = program.add_decl(Decl::new("Counter", DeclKind::actor()));
        let value = program.add_decl(
            Decl::new("value", DeclKind::var(Type::builtin(BuiltinType::Int)))
                .in_context(DeclContext::of_decl(counter))
                .with_flags(DeclFlags::MUTABLE),
        );
        let reset = program.add_decl(
            Decl::new("reset", DeclKind::func(vec![], Type::void()))
                .in_context(DeclContext::of_decl(counter)),
        );
        let closure = program.add_closure(Closure::concurrent(DeclContext::of_decl(reset)));
        let body = Expr::closure(
            closure,
            Expr::member(Expr::self_ref(at(3)), ConcreteDeclRef::new(value), at(3)),
            at(2),
        );
        if let DeclKind::Func { body: slot, .. } = &mut program.decl_mut(reset).kind {
            *slot = Some(body);
        }

        let (result, sink) = walk(&program, CheckScope::Function(reset));
        assert!(result);
        assert_eq!(sink.diagnostics()[0].id, DiagnosticId::ActorIsolatedReference);
        assert_eq!(sink.diagnostics()[0].loc, at(3));
    }

    #[test]
    fn test_mutable_capture_in_concurrent_closure() {
        let mut program = Program::new();
        let run = program.add_decl(Decl::new("run", DeclKind::func(vec![], Type::void())));
        let count = program.add_decl(
            Decl::new("count", DeclKind::var(Type::builtin(BuiltinType::Int)))
                .in_context(DeclContext::of_decl(run))
                .with_flags(DeclFlags::MUTABLE),
        );
        let total = program.add_decl(
            Decl::new("total", DeclKind::var(Type::builtin(BuiltinType::Int)))
                .in_context(DeclContext::of_decl(run)),
        );
        let closure = program.add_closure(Closure::concurrent(DeclContext::of_decl(run)));
        let plain = program.add_closure(Closure::new(DeclContext::of_decl(run)));
        let body = Expr::sequence(vec![
            Expr::closure(
                closure,
                Expr::sequence(vec![
                    Expr::decl_ref(ConcreteDeclRef::new(count), at(3)),
                    Expr::decl_ref(ConcreteDeclRef::new(total), at(4)),
                ]),
                at(2),
            ),
            Expr::closure(plain, Expr::decl_ref(ConcreteDeclRef::new(count), at(6)), at(5)),
        ]);
        if let DeclKind::Func { body: slot, .. } = &mut program.decl_mut(run).kind {
            *slot = Some(body);
        }

        let (result, sink) = walk(&program, CheckScope::Function(run));
        assert!(result);
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::MutableCapture);
        assert_eq!(diagnostics[0].loc, at(3));
    }

    #[test]
    fn test_top_level_is_unspecified() {
        let mut program = Program::new();
        let main_actor = program.add_decl(Decl::new("MainActor", DeclKind::actor()));
        let handle = program.add_decl(Decl::new("Handle", DeclKind::class()));
        let lenient = program.add_decl(
            Decl::new("legacy", DeclKind::func(vec![], Type::nominal(handle)))
                .with_global_actor(Type::nominal(main_actor), true),
        );
        let top = program.add_decl(Decl::new(
            "main",
            DeclKind::TopLevelCode {
                body: Expr::call(
                    Expr::decl_ref(ConcreteDeclRef::new(lenient), at(1)),
                    vec![],
                    at(1),
                ),
            },
        ));

        let (result, sink) = walk(&program, CheckScope::TopLevel(top));
        assert!(!result);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_concurrent_function_arguments() {
        let mut program = Program::new();
        let handle = program.add_decl(Decl::new("Handle", DeclKind::class()));
        let spawn = program.add_decl(
            Decl::new(
                "spawn",
                DeclKind::func(vec![Param::new("h", Type::nominal(handle))], Type::void()),
            )
            .with_flags(DeclFlags::CONCURRENT),
        );
        let body = Expr::call(
            Expr::decl_ref(ConcreteDeclRef::new(spawn), at(2)),
            vec![Expr::literal(at(2))],
            at(2),
        );
        let run = program.add_decl(Decl::new(
            "run",
            DeclKind::func_with_body(vec![], Type::void(), body),
        ));

        let (result, sink) = walk(&program, CheckScope::Function(run));
        assert!(result);
        assert_eq!(sink.diagnostics()[0].id, DiagnosticId::NonTransferableParam);
        assert!(sink.diagnostics()[0]
            .message
            .contains("concurrently-executing function"));
    }
}
