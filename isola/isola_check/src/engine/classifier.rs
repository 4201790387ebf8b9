//! Declaration classification.
//!
//! Classification is a pure query over the graph: it looks at the referenced
//! declaration and its immediate owner and never emits diagnostics.

use isola_core::types::{ConcreteDeclRef, DeclFlags, DeclKind, GlobalActorAttr, Program};
use tracing::trace;

use crate::model::ActorIsolationRestriction;

impl ActorIsolationRestriction {
    /// Classify a reference to a declaration.
    ///
    /// Rules, first match wins:
    ///
    /// 1. Types, enum cases, top-level code and local variables are unrestricted.
    /// 2. `nonisolated` declarations are unrestricted.
    /// 3. A global-actor attribute on the declaration restricts it to that
    ///    global actor, concretized with the reference's substitutions.
    /// 4. Members of an actor are restricted to the actor. They may be used
    ///    across actors when marked cross-actor, when they are `async`
    ///    functions, or when they are immutable stored properties.
    /// 5. Members of a global-actor type inherit the type's global actor.
    /// 6. Mutable global or static storage, and declarations marked unsafe
    ///    for concurrent use, are unsafe.
    /// 7. Everything else is unrestricted.
    ///
    /// # Panics
    ///
    /// Panics if the reference does not point into `program`.
    pub fn for_declaration(decl_ref: &ConcreteDeclRef, program: &Program) -> Self {
        let restriction = classify(decl_ref, program);
        trace!("Classified {} as {}", decl_ref.decl, restriction);
        restriction
    }
}

fn concretize(attr: &GlobalActorAttr, decl_ref: &ConcreteDeclRef) -> ActorIsolationRestriction {
    ActorIsolationRestriction::for_global_actor(
        attr.actor.subst(&decl_ref.substitutions),
        attr.is_unsafe,
    )
}

fn classify(decl_ref: &ConcreteDeclRef, program: &Program) -> ActorIsolationRestriction {
    let id = decl_ref.decl;
    let decl = program.decl(id);

    match decl.kind {
        DeclKind::Class { .. }
        | DeclKind::Struct
        | DeclKind::Enum
        | DeclKind::Protocol { .. }
        | DeclKind::EnumElement { .. }
        | DeclKind::TopLevelCode { .. } => return ActorIsolationRestriction::for_unrestricted(),
        DeclKind::Var { .. } if program.is_local(id) => {
            return ActorIsolationRestriction::for_unrestricted()
        }
        _ => {}
    }

    if decl.has(DeclFlags::NONISOLATED) {
        return ActorIsolationRestriction::for_unrestricted();
    }

    if let Some(attr) = &decl.global_actor {
        return concretize(attr, decl_ref);
    }

    if let Some(owner) = program.parent_nominal(id) {
        if program.is_actor_class(owner) {
            let is_cross_actor =
                decl.has(DeclFlags::CROSS_ACTOR) || decl.is_async() || decl.is_let();
            return ActorIsolationRestriction::for_actor_self(owner, is_cross_actor);
        }
        if let Some(attr) = &program.decl(owner).global_actor {
            return concretize(attr, decl_ref);
        }
    }

    let mutable_shared = program.is_global_storage(id) && decl.has(DeclFlags::MUTABLE);
    if mutable_shared || decl.has(DeclFlags::UNSAFE_CONCURRENT) {
        return ActorIsolationRestriction::for_unsafe();
    }

    ActorIsolationRestriction::for_unrestricted()
}
