//! Protocol conformances and the origins of transferability obligations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::DeclId;
use crate::types::SourceLoc;

/// How a transferability conformance should be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentValueCheck {
    /// The conformance was written by the author and is fully checked.
    Explicit,

    /// The conformance is implied by another protocol that gained
    /// transferability after the fact.
    ImpliedByStandardProtocol,

    /// The conformance is synthesized for a struct or enum.
    Implicit,
}

impl ConcurrentValueCheck {
    /// Whether problems found under this origin are relaxed for legacy code.
    pub fn is_relaxed(&self) -> bool {
        !matches!(self, Self::Explicit)
    }
}

impl fmt::Display for ConcurrentValueCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::ImpliedByStandardProtocol => write!(f, "implied"),
            Self::Implicit => write!(f, "implicit"),
        }
    }
}

/// A conformance of a nominal type to a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conformance {
    /// The conforming nominal type.
    pub conforming: DeclId,

    /// The protocol.
    pub protocol: DeclId,

    /// Generic parameters of the conforming type that must themselves be
    /// transferable for the conformance to apply.
    #[serde(default)]
    pub conditional_requirements: Vec<String>,

    /// Whether the conformance opts out of checking.
    #[serde(default)]
    pub unchecked: bool,

    /// Where the conformance is declared.
    #[serde(default)]
    pub loc: SourceLoc,
}

impl Conformance {
    /// An unconditional conformance.
    pub fn new(conforming: DeclId, protocol: DeclId) -> Self {
        Self {
            conforming,
            protocol,
            conditional_requirements: Vec::new(),
            unchecked: false,
            loc: SourceLoc::default(),
        }
    }

    /// Require the named generic parameters to be transferable.
    pub fn conditional_on<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditional_requirements = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the source location.
    pub fn at(mut self, loc: SourceLoc) -> Self {
        self.loc = loc;
        self
    }

    /// Whether the given generic parameter is assumed transferable while
    /// checking this conformance.
    pub fn assumes_transferable(&self, param: &str) -> bool {
        self.conditional_requirements.iter().any(|p| p == param)
    }
}
