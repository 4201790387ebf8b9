//! Strongly-typed identifiers for the declaration graph.
//!
//! Every entity the checker inspects (declarations, closures, initializer
//! contexts, conformances) lives in an arena owned by [`crate::types::Program`].
//! The identifiers defined here are thin, copyable indices into those arenas.
//! They never own the entity they refer to, so restriction and diagnostic
//! values can carry them freely without extending any lifetime.
//!
//! # Examples
//!
//! ```
//! use isola_core::id::{DeclId, ClosureId};
//!
//! let decl = DeclId::from_index(3);
//! let closure = ClosureId::from_index(3);
//!
//! // Same index, different arenas: the types keep them apart.
//! assert_eq!(decl.index(), closure.index());
//! assert_eq!(decl.to_string(), "decl#3");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::{Ord, PartialOrd};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

/// Marker trait naming the arena an identifier points into.
pub trait IdKind {
    /// Short prefix used when displaying identifiers of this kind.
    const PREFIX: &'static str;
}

/// A type-safe arena index.
///
/// The phantom parameter `T` ensures that identifiers for different arenas
/// cannot be mixed up, even though they share the same `u32` representation.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T> {
    index: u32,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create an identifier from a raw arena index.
    pub const fn from_index(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Get the raw arena index.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The index as a `usize`, for slice access.
    pub fn as_usize(&self) -> usize {
        self.index as usize
    }
}

// Manual impls so that `T` itself does not need to implement these traits.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T: IdKind> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::PREFIX, self.index)
    }
}

impl<T: IdKind> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::PREFIX, self.index)
    }
}

/// Error returned when parsing an identifier from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0}")]
pub struct ParseIdError(String);

impl<T: IdKind> FromStr for Id<T> {
    type Err = ParseIdError;

    /// Accepts either a bare index (`"3"`) or the display form (`"decl#3"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = match s.split_once('#') {
            Some((prefix, rest)) if prefix == T::PREFIX => rest,
            Some(_) => return Err(ParseIdError(s.to_string())),
            None => s,
        };
        digits
            .parse::<u32>()
            .map(Self::from_index)
            .map_err(|_| ParseIdError(s.to_string()))
    }
}

/// Marker type for declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclMarker;
impl IdKind for DeclMarker {
    const PREFIX: &'static str = "decl";
}
/// Identifier for a declaration.
pub type DeclId = Id<DeclMarker>;

/// Marker type for closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosureMarker;
impl IdKind for ClosureMarker {
    const PREFIX: &'static str = "closure";
}
/// Identifier for a closure expression's context.
pub type ClosureId = Id<ClosureMarker>;

/// Marker type for initializer contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitializerMarker;
impl IdKind for InitializerMarker {
    const PREFIX: &'static str = "init";
}
/// Identifier for an initializer context (property initializer, default argument).
pub type InitializerId = Id<InitializerMarker>;

/// Marker type for conformances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConformanceMarker;
impl IdKind for ConformanceMarker {
    const PREFIX: &'static str = "conformance";
}
/// Identifier for a protocol conformance.
pub type ConformanceId = Id<ConformanceMarker>;
