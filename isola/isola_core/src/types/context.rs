//! Declaration contexts.
//!
//! Code always executes inside some context: the module, a declaration
//! (function body, type), a closure, or an initializer expression. Contexts
//! form a tree through their parents; the isolation of a context is derived
//! from that tree.

use serde::{Deserialize, Serialize};

use crate::id::{ClosureId, DeclId, InitializerId};
use crate::types::{Expr, SourceLoc, Type};

/// A context in which declarations live and code executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclContext {
    /// Module scope.
    #[default]
    Module,

    /// Inside a declaration.
    Decl {
        /// The declaration.
        decl: DeclId,
    },

    /// Inside a closure.
    Closure {
        /// The closure.
        closure: ClosureId,
    },

    /// Inside an initializer expression.
    Initializer {
        /// The initializer context.
        init: InitializerId,
    },
}

impl DeclContext {
    /// The context of a declaration's body or members.
    pub fn of_decl(decl: DeclId) -> Self {
        Self::Decl { decl }
    }

    /// The context of a closure's body.
    pub fn of_closure(closure: ClosureId) -> Self {
        Self::Closure { closure }
    }

    /// The context of an initializer expression.
    pub fn of_initializer(init: InitializerId) -> Self {
        Self::Initializer { init }
    }

    /// The declaration of a declaration context.
    pub fn as_decl(&self) -> Option<DeclId> {
        match self {
            Self::Decl { decl } => Some(*decl),
            _ => None,
        }
    }
}

/// A closure's context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    /// The context the closure is written in.
    pub parent: DeclContext,

    /// Whether the closure may run concurrently with its parent.
    #[serde(default)]
    pub concurrent: bool,

    /// Global-actor attribute on the closure, if any.
    #[serde(default)]
    pub global_actor: Option<Type>,

    /// Where the closure begins.
    #[serde(default)]
    pub loc: SourceLoc,
}

impl Closure {
    /// A non-concurrent closure without attributes.
    pub fn new(parent: DeclContext) -> Self {
        Self {
            parent,
            concurrent: false,
            global_actor: None,
            loc: SourceLoc::default(),
        }
    }

    /// A concurrent closure.
    pub fn concurrent(parent: DeclContext) -> Self {
        Self {
            concurrent: true,
            ..Self::new(parent)
        }
    }
}

/// What an initializer context initializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitializerKind {
    /// The initial value of a stored property or variable.
    Property {
        /// The variable.
        var: DeclId,
    },

    /// A default argument of a function parameter.
    DefaultArgument {
        /// The function.
        func: DeclId,

        /// Parameter index.
        index: u32,
    },
}

/// An initializer expression context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initializer {
    /// What is initialized.
    #[serde(flatten)]
    pub kind: InitializerKind,

    /// The initializer expression.
    pub expr: Expr,
}

impl Initializer {
    /// The initial value of a property.
    pub fn property(var: DeclId, expr: Expr) -> Self {
        Self {
            kind: InitializerKind::Property { var },
            expr,
        }
    }

    /// A default argument.
    pub fn default_argument(func: DeclId, index: u32, expr: Expr) -> Self {
        Self {
            kind: InitializerKind::DefaultArgument { func, index },
            expr,
        }
    }

    /// The declaration owning this initializer.
    pub fn owner(&self) -> DeclId {
        match self.kind {
            InitializerKind::Property { var } => var,
            InitializerKind::DefaultArgument { func, .. } => func,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_serde() {
        let ctx = DeclContext::of_decl(DeclId::from_index(2));
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"kind":"decl","decl":2}"#);
        let parsed: DeclContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ctx);
        assert_eq!(parsed.as_decl(), Some(DeclId::from_index(2)));
    }

    #[test]
    fn test_initializer_owner() {
        let init = Initializer::default_argument(
            DeclId::from_index(8),
            1,
            Expr::literal(SourceLoc::default()),
        );
        assert_eq!(init.owner(), DeclId::from_index(8));
    }
}
