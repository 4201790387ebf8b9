//! Override isolation compatibility.
//!
//! Callers that only see the overridden declaration assume its isolation. An
//! override may keep that isolation or widen it in a safe direction, but must
//! not move the code into a domain those callers do not expect.

use isola_core::id::DeclId;
use isola_core::traits::{DiagnosticSink, IsolationResolver};
use isola_core::types::{ActorIsolation, Diagnostic, DiagnosticId, Program};
use tracing::debug;

/// Whether an override isolated to `overriding` may replace a declaration
/// isolated to `base`.
pub fn is_compatible_override(base: &ActorIsolation, overriding: &ActorIsolation) -> bool {
    use ActorIsolation::*;

    if base == overriding {
        return true;
    }
    match (base, overriding) {
        (Unspecified | Independent, Unspecified | Independent | GlobalActorUnsafe { .. }) => true,
        (Unspecified | Independent, _) => false,

        (ActorInstance { .. }, ActorInstance { .. } | Independent) => true,
        (ActorInstance { .. }, _) => false,

        (GlobalActor { actor: b }, GlobalActor { actor: o } | GlobalActorUnsafe { actor: o }) => {
            b == o
        }
        (GlobalActor { .. }, Independent) => true,
        (GlobalActor { .. }, _) => false,

        (GlobalActorUnsafe { .. }, Unspecified | Independent) => true,
        (
            GlobalActorUnsafe { actor: b },
            GlobalActor { actor: o } | GlobalActorUnsafe { actor: o },
        ) => b == o,
        (GlobalActorUnsafe { .. }, ActorInstance { .. }) => false,
    }
}

/// Check that `decl` is isolated compatibly with the declaration it overrides.
///
/// A mismatch is reported at the override with a note at the overridden
/// declaration.
///
/// # Returns
///
/// `true` if a mismatch was reported.
pub fn check_override(
    program: &Program,
    resolver: &dyn IsolationResolver,
    sink: &dyn DiagnosticSink,
    decl: DeclId,
) -> bool {
    let overriding = program.decl(decl);
    let Some(base) = overriding.overridden else {
        return false;
    };

    let base_isolation = resolver.isolation_of_decl(base);
    let isolation = resolver.isolation_of_decl(decl);
    if is_compatible_override(&base_isolation, &isolation) {
        return false;
    }

    debug!(
        "Override {} ({}) incompatible with {} ({})",
        decl, isolation, base, base_isolation
    );
    let base_decl = program.decl(base);
    sink.emit(Diagnostic::error(
        DiagnosticId::OverrideIsolationMismatch,
        overriding.loc,
        format!(
            "{} {} '{}' has different actor isolation from {} overridden declaration",
            isolation.describe(),
            overriding.kind.describe(),
            overriding.name,
            base_isolation.describe()
        ),
    ));
    sink.emit(Diagnostic::note(
        DiagnosticId::OverriddenDeclHere,
        base_decl.loc,
        format!("overridden declaration '{}' is here", base_decl.name),
    ));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use isola_core::types::Type;

    fn global(index: u32) -> ActorIsolation {
        ActorIsolation::GlobalActor {
            actor: Type::nominal(DeclId::from_index(index)),
        }
    }

    fn global_unsafe(index: u32) -> ActorIsolation {
        ActorIsolation::GlobalActorUnsafe {
            actor: Type::nominal(DeclId::from_index(index)),
        }
    }

    fn instance(index: u32) -> ActorIsolation {
        ActorIsolation::ActorInstance {
            actor: DeclId::from_index(index),
        }
    }

    #[test]
    fn test_unspecified_and_independent_bases() {
        for base in [ActorIsolation::Unspecified, ActorIsolation::Independent] {
            assert!(is_compatible_override(&base, &ActorIsolation::Unspecified));
            assert!(is_compatible_override(&base, &ActorIsolation::Independent));
            assert!(is_compatible_override(&base, &global_unsafe(1)));
            assert!(!is_compatible_override(&base, &global(1)));
            assert!(!is_compatible_override(&base, &instance(2)));
        }
    }

    #[test]
    fn test_actor_instance_base() {
        assert!(is_compatible_override(&instance(2), &instance(3)));
        assert!(is_compatible_override(&instance(2), &ActorIsolation::Independent));
        assert!(!is_compatible_override(&instance(2), &ActorIsolation::Unspecified));
        assert!(!is_compatible_override(&instance(2), &global(1)));
    }

    #[test]
    fn test_global_actor_base() {
        assert!(is_compatible_override(&global(1), &global(1)));
        assert!(is_compatible_override(&global(1), &global_unsafe(1)));
        assert!(is_compatible_override(&global(1), &ActorIsolation::Independent));
        assert!(!is_compatible_override(&global(1), &ActorIsolation::Unspecified));
        assert!(!is_compatible_override(&global(1), &global(4)));
        assert!(!is_compatible_override(&global(1), &instance(2)));
    }

    #[test]
    fn test_global_actor_unsafe_base() {
        assert!(is_compatible_override(&global_unsafe(1), &ActorIsolation::Unspecified));
        assert!(is_compatible_override(&global_unsafe(1), &ActorIsolation::Independent));
        assert!(is_compatible_override(&global_unsafe(1), &global(1)));
        assert!(!is_compatible_override(&global_unsafe(1), &global_unsafe(4)));
        assert!(!is_compatible_override(&global_unsafe(1), &instance(2)));
    }
}
