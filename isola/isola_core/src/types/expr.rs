//! Expression fragments walked by the declaration-site checkers.
//!
//! Only the shapes that carry references are modeled. Anything else the
//! frontend produces is lowered to [`Expr::Literal`] or flattened into an
//! [`Expr::Sequence`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::ClosureId;
use crate::types::ConcreteDeclRef;

/// A location in source, used to attribute diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLoc {
    /// 1-based line, 0 when unknown.
    pub line: u32,

    /// 1-based column, 0 when unknown.
    pub column: u32,
}

impl SourceLoc {
    /// Create a location.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Whether this location is unknown.
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    /// A direct reference to a declaration (`foo`, `counter`).
    DeclRef {
        /// The referenced declaration and its substitutions.
        target: ConcreteDeclRef,

        /// Where the reference occurs.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// A member reference through a base expression (`base.member`).
    MemberRef {
        /// The base expression.
        base: Box<Expr>,

        /// The referenced member and its substitutions.
        target: ConcreteDeclRef,

        /// Where the reference occurs.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// An application of a callee to arguments.
    Call {
        /// The callee.
        callee: Box<Expr>,

        /// The arguments.
        #[serde(default)]
        args: Vec<Expr>,

        /// Where the call occurs.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// A closure expression; its body runs in the closure's context.
    Closure {
        /// The closure's context.
        closure: ClosureId,

        /// The closure body.
        body: Box<Expr>,

        /// Where the closure begins.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// The `self` value of the enclosing type context.
    SelfRef {
        /// Where `self` occurs.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// A literal or any other leaf without references.
    Literal {
        /// Where the literal occurs.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// An assignment.
    Assign {
        /// The destination.
        dest: Box<Expr>,

        /// The assigned value.
        source: Box<Expr>,

        /// Where the assignment occurs.
        #[serde(default)]
        loc: SourceLoc,
    },

    /// A sequence of expressions evaluated in order (a body).
    Sequence {
        /// The expressions.
        #[serde(default)]
        exprs: Vec<Expr>,
    },
}

impl Expr {
    /// A reference to a non-generic declaration.
    pub fn decl_ref(target: ConcreteDeclRef, loc: SourceLoc) -> Self {
        Self::DeclRef { target, loc }
    }

    /// A member reference.
    pub fn member(base: Expr, target: ConcreteDeclRef, loc: SourceLoc) -> Self {
        Self::MemberRef {
            base: Box::new(base),
            target,
            loc,
        }
    }

    /// A call.
    pub fn call(callee: Expr, args: Vec<Expr>, loc: SourceLoc) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
            loc,
        }
    }

    /// A closure.
    pub fn closure(closure: ClosureId, body: Expr, loc: SourceLoc) -> Self {
        Self::Closure {
            closure,
            body: Box::new(body),
            loc,
        }
    }

    /// `self`.
    pub fn self_ref(loc: SourceLoc) -> Self {
        Self::SelfRef { loc }
    }

    /// A literal.
    pub fn literal(loc: SourceLoc) -> Self {
        Self::Literal { loc }
    }

    /// An assignment.
    pub fn assign(dest: Expr, source: Expr, loc: SourceLoc) -> Self {
        Self::Assign {
            dest: Box::new(dest),
            source: Box::new(source),
            loc,
        }
    }

    /// A sequence.
    pub fn sequence(exprs: Vec<Expr>) -> Self {
        Self::Sequence { exprs }
    }

    /// The location of this expression; a sequence reports its first element.
    pub fn loc(&self) -> SourceLoc {
        match self {
            Self::DeclRef { loc, .. }
            | Self::MemberRef { loc, .. }
            | Self::Call { loc, .. }
            | Self::Closure { loc, .. }
            | Self::SelfRef { loc }
            | Self::Literal { loc }
            | Self::Assign { loc, .. } => *loc,
            Self::Sequence { exprs } => exprs.first().map(Expr::loc).unwrap_or_default(),
        }
    }

    /// The declaration directly referenced by this expression, if any.
    pub fn referenced_decl(&self) -> Option<&ConcreteDeclRef> {
        match self {
            Self::DeclRef { target, .. } | Self::MemberRef { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Count the reference expressions in this tree, including nested closures.
    pub fn reference_count(&self) -> usize {
        match self {
            Self::DeclRef { .. } => 1,
            Self::MemberRef { base, .. } => 1 + base.reference_count(),
            Self::Call { callee, args, .. } => {
                callee.reference_count() + args.iter().map(Expr::reference_count).sum::<usize>()
            }
            Self::Closure { body, .. } => body.reference_count(),
            Self::SelfRef { .. } | Self::Literal { .. } => 0,
            Self::Assign { dest, source, .. } => dest.reference_count() + source.reference_count(),
            Self::Sequence { exprs } => exprs.iter().map(Expr::reference_count).sum(),
        }
    }
}
