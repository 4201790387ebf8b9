//! Isolation domains of code.
//!
//! [`ActorIsolation`] answers "which domain does this piece of code run in?"
//! for a declaration or a context. It is the caller-side half of every
//! crossing decision; the callee-side half is the restriction computed by
//! the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::DeclId;
use crate::types::Type;

/// The isolation domain of a declaration or context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorIsolation {
    /// No isolation was specified; legacy code.
    Unspecified,

    /// Explicitly not isolated to any actor.
    Independent,

    /// Isolated to the instance of the given actor class.
    ActorInstance {
        /// The actor class.
        actor: DeclId,
    },

    /// Isolated to the given global actor.
    GlobalActor {
        /// The global actor type.
        actor: Type,
    },

    /// Isolated to the given global actor, but only as a lenient annotation
    /// on code that predates strict checking.
    GlobalActorUnsafe {
        /// The global actor type.
        actor: Type,
    },
}

impl ActorIsolation {
    /// Whether no isolation was specified.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    /// The global actor of this isolation, for either global-actor form.
    pub fn global_actor(&self) -> Option<&Type> {
        match self {
            Self::GlobalActor { actor } | Self::GlobalActorUnsafe { actor } => Some(actor),
            _ => None,
        }
    }

    /// The actor class of an actor-instance isolation.
    pub fn actor_class(&self) -> Option<DeclId> {
        match self {
            Self::ActorInstance { actor } => Some(*actor),
            _ => None,
        }
    }

    /// Whether code with this isolation runs in an actor-owned domain.
    pub fn is_actor_isolated(&self) -> bool {
        matches!(
            self,
            Self::ActorInstance { .. } | Self::GlobalActor { .. } | Self::GlobalActorUnsafe { .. }
        )
    }

    /// Short human-readable description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Independent => "nonisolated",
            Self::ActorInstance { .. } => "actor-isolated",
            Self::GlobalActor { .. } | Self::GlobalActorUnsafe { .. } => "global actor-isolated",
        }
    }
}

impl fmt::Display for ActorIsolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Independent => write!(f, "nonisolated"),
            Self::ActorInstance { actor } => write!(f, "actor-instance({})", actor),
            Self::GlobalActor { actor } => write!(f, "global-actor({})", actor),
            Self::GlobalActorUnsafe { actor } => write!(f, "global-actor-unsafe({})", actor),
        }
    }
}
