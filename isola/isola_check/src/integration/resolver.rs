//! Isolation resolution over a declaration graph.

use isola_core::id::DeclId;
use isola_core::traits::IsolationResolver;
use isola_core::types::{
    ActorIsolation, DeclContext, DeclFlags, DeclKind, GlobalActorAttr, InitializerKind, Program,
};
use tracing::trace;

/// Resolves isolation from declaration attributes and their nesting.
///
/// A declaration is isolated by, in order: an explicit `nonisolated`, its own
/// global-actor attribute, membership in an actor, or a global-actor attribute
/// on its owning type. Local declarations take the isolation of the code they
/// are written in. Everything else is unspecified.
#[derive(Debug, Clone, Copy)]
pub struct ProgramIsolationResolver<'a> {
    program: &'a Program,
}

impl<'a> ProgramIsolationResolver<'a> {
    /// Create a resolver over the given graph.
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    fn from_attr(attr: &GlobalActorAttr) -> ActorIsolation {
        if attr.is_unsafe {
            ActorIsolation::GlobalActorUnsafe {
                actor: attr.actor.clone(),
            }
        } else {
            ActorIsolation::GlobalActor {
                actor: attr.actor.clone(),
            }
        }
    }

    fn resolve_decl(&self, id: DeclId) -> ActorIsolation {
        let decl = self.program.decl(id);

        match &decl.kind {
            DeclKind::TopLevelCode { .. } => return ActorIsolation::Unspecified,
            // Default arguments of a case are evaluated in the enum's domain.
            DeclKind::EnumElement { .. } => {
                return match self.program.parent_nominal(id) {
                    Some(owner) => self.resolve_decl(owner),
                    None => ActorIsolation::Unspecified,
                };
            }
            DeclKind::Class { is_actor: true, .. } => {
                return match &decl.global_actor {
                    Some(attr) => Self::from_attr(attr),
                    None => ActorIsolation::ActorInstance { actor: id },
                };
            }
            _ => {}
        }

        if decl.has(DeclFlags::NONISOLATED) {
            return ActorIsolation::Independent;
        }
        if let Some(attr) = &decl.global_actor {
            return Self::from_attr(attr);
        }
        if self.program.is_local(id) {
            return self.isolation_of_context(decl.context);
        }
        if let Some(owner) = self.program.parent_nominal(id) {
            if self.program.is_actor_class(owner) {
                return ActorIsolation::ActorInstance { actor: owner };
            }
            if let Some(attr) = &self.program.decl(owner).global_actor {
                return Self::from_attr(attr);
            }
        }
        ActorIsolation::Unspecified
    }
}

impl IsolationResolver for ProgramIsolationResolver<'_> {
    fn isolation_of_decl(&self, decl: DeclId) -> ActorIsolation {
        let isolation = self.resolve_decl(decl);
        trace!("Isolation of {} is {}", decl, isolation);
        isolation
    }

    fn isolation_of_context(&self, context: DeclContext) -> ActorIsolation {
        match context {
            DeclContext::Module => ActorIsolation::Unspecified,
            DeclContext::Decl { decl } => self.isolation_of_decl(decl),
            DeclContext::Closure { closure } => {
                let closure = self.program.closure(closure);
                if let Some(actor) = &closure.global_actor {
                    ActorIsolation::GlobalActor {
                        actor: actor.clone(),
                    }
                } else if closure.concurrent {
                    ActorIsolation::Independent
                } else {
                    self.isolation_of_context(closure.parent)
                }
            }
            DeclContext::Initializer { init } => match self.program.initializer(init).kind {
                InitializerKind::Property { var } => {
                    if self.program.is_global_storage(var) {
                        self.isolation_of_decl(var)
                    } else {
                        match self.program.parent_nominal(var) {
                            Some(owner) => self.isolation_of_decl(owner),
                            None => self.isolation_of_decl(var),
                        }
                    }
                }
                InitializerKind::DefaultArgument { func, .. } => self.isolation_of_decl(func),
            },
        }
    }
}
