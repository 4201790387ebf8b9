//! Isolation restrictions.
//!
//! An [`ActorIsolationRestriction`] describes from where a declaration may be
//! referenced. It is computed per reference by the classifier
//! ([`ActorIsolationRestriction::for_declaration`]) and never outlives the
//! check that asked for it.

use isola_core::id::DeclId;
use isola_core::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a declaration may be referenced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorIsolationRestriction {
    /// No isolation constraint.
    Unrestricted,

    /// Unsafe from any concurrent context; every reference is flagged.
    Unsafe,

    /// Only reachable from within the actor's own isolation domain.
    ActorSelf {
        /// The actor class.
        actor: DeclId,
    },

    /// Reachable from anywhere; references from outside the actor cross
    /// domains.
    CrossActorSelf {
        /// The actor class.
        actor: DeclId,
    },

    /// Isolated to a global actor; references from other domains cross.
    GlobalActor {
        /// The global actor type.
        actor: Type,
    },

    /// Like [`ActorIsolationRestriction::GlobalActor`], except that
    /// references from code with unspecified isolation are tolerated.
    GlobalActorUnsafe {
        /// The global actor type.
        actor: Type,
    },
}

/// The case of an [`ActorIsolationRestriction`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    /// See [`ActorIsolationRestriction::Unrestricted`].
    Unrestricted,
    /// See [`ActorIsolationRestriction::Unsafe`].
    Unsafe,
    /// See [`ActorIsolationRestriction::ActorSelf`].
    ActorSelf,
    /// See [`ActorIsolationRestriction::CrossActorSelf`].
    CrossActorSelf,
    /// See [`ActorIsolationRestriction::GlobalActor`].
    GlobalActor,
    /// See [`ActorIsolationRestriction::GlobalActorUnsafe`].
    GlobalActorUnsafe,
}

impl RestrictionKind {
    /// Stable name of the case.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::Unsafe => "unsafe",
            Self::ActorSelf => "actor_self",
            Self::CrossActorSelf => "cross_actor_self",
            Self::GlobalActor => "global_actor",
            Self::GlobalActorUnsafe => "global_actor_unsafe",
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ActorIsolationRestriction {
    /// A restriction that places no constraint on references.
    pub fn for_unrestricted() -> Self {
        Self::Unrestricted
    }

    /// A restriction flagging every reference as unsafe.
    pub fn for_unsafe() -> Self {
        Self::Unsafe
    }

    /// A restriction to the given actor's domain.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor class owning the declaration.
    /// * `is_cross_actor` - Whether the declaration may be used from other
    ///   domains.
    pub fn for_actor_self(actor: DeclId, is_cross_actor: bool) -> Self {
        if is_cross_actor {
            Self::CrossActorSelf { actor }
        } else {
            Self::ActorSelf { actor }
        }
    }

    /// A restriction to the given global actor.
    ///
    /// # Arguments
    ///
    /// * `actor` - The global actor type, already concretized for the reference.
    /// * `is_unsafe` - Whether this is the lenient `(unsafe)` form.
    pub fn for_global_actor(actor: Type, is_unsafe: bool) -> Self {
        if is_unsafe {
            Self::GlobalActorUnsafe { actor }
        } else {
            Self::GlobalActor { actor }
        }
    }

    /// The case of this restriction.
    pub fn kind(&self) -> RestrictionKind {
        match self {
            Self::Unrestricted => RestrictionKind::Unrestricted,
            Self::Unsafe => RestrictionKind::Unsafe,
            Self::ActorSelf { .. } => RestrictionKind::ActorSelf,
            Self::CrossActorSelf { .. } => RestrictionKind::CrossActorSelf,
            Self::GlobalActor { .. } => RestrictionKind::GlobalActor,
            Self::GlobalActorUnsafe { .. } => RestrictionKind::GlobalActorUnsafe,
        }
    }

    /// Whether references from outside the declaration's domain are
    /// permitted as cross-domain accesses.
    pub fn is_cross_actor(&self) -> bool {
        matches!(
            self,
            Self::CrossActorSelf { .. } | Self::GlobalActor { .. } | Self::GlobalActorUnsafe { .. }
        )
    }

    /// The owning actor class, for the actor cases.
    pub fn actor_class(&self) -> Option<DeclId> {
        match self {
            Self::ActorSelf { actor } | Self::CrossActorSelf { actor } => Some(*actor),
            _ => None,
        }
    }

    /// The global actor type, for the global-actor cases.
    pub fn global_actor(&self) -> Option<&Type> {
        match self {
            Self::GlobalActor { actor } | Self::GlobalActorUnsafe { actor } => Some(actor),
            _ => None,
        }
    }
}

impl fmt::Display for ActorIsolationRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActorSelf { actor } | Self::CrossActorSelf { actor } => {
                write!(f, "{}({})", self.kind(), actor)
            }
            Self::GlobalActor { actor } | Self::GlobalActorUnsafe { actor } => {
                write!(f, "{}({})", self.kind(), actor)
            }
            _ => write!(f, "{}", self.kind()),
        }
    }
}
