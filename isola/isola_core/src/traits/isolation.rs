//! Isolation resolution.

use crate::id::DeclId;
use crate::types::{ActorIsolation, DeclContext};

/// Resolves the isolation domain code runs in.
///
/// This is the caller-side question of every crossing check: the engine
/// classifies the referenced declaration itself and asks the resolver which
/// domain the referencing code is in.
///
/// # Examples
///
/// ```
/// use isola_core::id::DeclId;
/// use isola_core::traits::IsolationResolver;
/// use isola_core::types::{ActorIsolation, DeclContext};
///
/// /// Treats all code as legacy code.
/// struct LegacyResolver;
///
/// impl IsolationResolver for LegacyResolver {
///     fn isolation_of_decl(&self, _decl: DeclId) -> ActorIsolation {
///         ActorIsolation::Unspecified
///     }
///
///     fn isolation_of_context(&self, _context: DeclContext) -> ActorIsolation {
///         ActorIsolation::Unspecified
///     }
/// }
///
/// let resolver = LegacyResolver;
/// assert!(resolver.isolation_of_context(DeclContext::Module).is_unspecified());
/// ```
pub trait IsolationResolver: Send + Sync {
    /// The isolation of a declaration, as seen by code running inside it.
    fn isolation_of_decl(&self, decl: DeclId) -> ActorIsolation;

    /// The isolation of code executing in `context`.
    fn isolation_of_context(&self, context: DeclContext) -> ActorIsolation;
}
