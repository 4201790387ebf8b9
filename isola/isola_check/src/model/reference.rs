//! Reasons a reference is treated as crossing isolation domains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a reference is being checked as a cross-domain reference.
///
/// The kind only selects the wording of diagnostics; it never changes whether
/// a reference is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentReferenceKind {
    /// A synchronous call treated as asynchronous because the callee is
    /// outside the caller's domain.
    SynchronousAsAsyncCall,

    /// A property or method accessed across actors.
    CrossActor,

    /// A local variable captured by code running in a different domain.
    LocalCapture,

    /// A call to a function that runs concurrently with its caller.
    ConcurrentFunction,
}

impl ConcurrentReferenceKind {
    /// How the referenced declaration is used, for diagnostics.
    pub fn usage(&self) -> &'static str {
        match self {
            Self::SynchronousAsAsyncCall => "called synchronously",
            Self::CrossActor => "referenced",
            Self::LocalCapture => "captured",
            Self::ConcurrentFunction => "passed to concurrently-executing code",
        }
    }

    /// Why values crossing the boundary must be transferable, for diagnostics.
    pub fn rationale(&self) -> &'static str {
        match self {
            Self::SynchronousAsAsyncCall => "in an implicitly asynchronous call",
            Self::CrossActor => "in a cross-actor reference",
            Self::LocalCapture => "in concurrently-executing code",
            Self::ConcurrentFunction => "in a call to a concurrently-executing function",
        }
    }
}

impl fmt::Display for ConcurrentReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SynchronousAsAsyncCall => "synchronous_as_async_call",
            Self::CrossActor => "cross_actor",
            Self::LocalCapture => "local_capture",
            Self::ConcurrentFunction => "concurrent_function",
        };
        write!(f, "{}", name)
    }
}
