//! Declarations.
//!
//! A [`Decl`] records what the checker needs to know about one declaration:
//! its kind and signature, the context it lives in, its attributes and the
//! declaration it overrides. Source spelling of attributes is resolved by the
//! frontend; the flags here are their meaning.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::id::{DeclId, InitializerId};
use crate::types::{DeclContext, Expr, GenericParamType, SourceLoc, SubstitutionMap, Type};

bitflags! {
    /// Attribute and modifier bits of a declaration.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DeclFlags: u32 {
        /// The function is `async`.
        const ASYNC = 1 << 0;
        /// The function `throws`.
        const THROWS = 1 << 1;
        /// The variable is mutable (`var` rather than `let`).
        const MUTABLE = 1 << 2;
        /// The member is `static`.
        const STATIC = 1 << 3;
        /// The class is `final`.
        const FINAL = 1 << 4;
        /// The member is explicitly `nonisolated`.
        const NONISOLATED = 1 << 5;
        /// The function runs concurrently with its caller.
        const CONCURRENT = 1 << 6;
        /// The actor member is explicitly usable across actors.
        const CROSS_ACTOR = 1 << 7;
        /// The declaration is explicitly unsafe in any concurrent context.
        const UNSAFE_CONCURRENT = 1 << 8;
        /// The transferable conformance of this type is not checked.
        const UNCHECKED = 1 << 9;
    }
}

impl Default for DeclFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A global-actor attribute, e.g. `@MainActor` or `@MainActor(unsafe)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalActorAttr {
    /// The global actor type. May mention the declaration's generic parameters.
    pub actor: Type,

    /// Whether this is the lenient `(unsafe)` form.
    #[serde(default, rename = "unsafe")]
    pub is_unsafe: bool,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,

    /// Parameter type.
    pub ty: Type,

    /// Whether the parameter is `inout`.
    #[serde(default)]
    pub inout: bool,

    /// Default argument initializer context, if the parameter has one.
    #[serde(default)]
    pub default_value: Option<InitializerId>,
}

impl Param {
    /// A plain by-value parameter.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            inout: false,
            default_value: None,
        }
    }
}

/// Storage of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarStorage {
    /// The variable has storage.
    #[default]
    Stored,

    /// The variable is computed by accessors.
    Computed,
}

/// A property wrapper applied to a variable (`@Wrapper(args) var x`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyWrapper {
    /// The wrapper type.
    pub wrapper_type: Type,

    /// The wrapper's initialization expression.
    pub init: Expr,
}

/// The kind of a declaration, with its kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclKind {
    /// A class, possibly an actor.
    Class {
        /// Whether the class is an actor.
        #[serde(default)]
        is_actor: bool,

        /// The superclass, if any.
        #[serde(default)]
        superclass: Option<Type>,
    },

    /// A structure.
    Struct,

    /// An enumeration.
    Enum,

    /// A case of an enumeration.
    EnumElement {
        /// Associated value types.
        #[serde(default)]
        payload: Vec<Type>,

        /// Default argument expressions of the associated values.
        #[serde(default)]
        default_args: Vec<Expr>,
    },

    /// A protocol.
    Protocol {
        /// Whether conforming to this protocol implies transferability.
        #[serde(default)]
        implies_transferable: bool,
    },

    /// A function, method, initializer or accessor.
    Func {
        /// Parameters.
        #[serde(default)]
        params: Vec<Param>,

        /// Result type.
        result: Type,

        /// Body, if the function is defined here.
        #[serde(default)]
        body: Option<Expr>,

        /// Whether this is an accessor of a property.
        #[serde(default)]
        is_accessor: bool,
    },

    /// A variable or property.
    Var {
        /// The variable's type.
        ty: Type,

        /// Stored or computed.
        #[serde(default)]
        storage: VarStorage,

        /// Initializer context, if the variable has an initial value.
        #[serde(default)]
        initializer: Option<InitializerId>,

        /// Property wrapper, if any.
        #[serde(default)]
        wrapper: Option<PropertyWrapper>,
    },

    /// A top-level code block.
    TopLevelCode {
        /// The statements.
        body: Expr,
    },
}

impl DeclKind {
    /// A function kind without a body.
    pub fn func(params: Vec<Param>, result: Type) -> Self {
        Self::Func {
            params,
            result,
            body: None,
            is_accessor: false,
        }
    }

    /// A function kind with a body.
    pub fn func_with_body(params: Vec<Param>, result: Type, body: Expr) -> Self {
        Self::Func {
            params,
            result,
            body: Some(body),
            is_accessor: false,
        }
    }

    /// A stored variable kind.
    pub fn var(ty: Type) -> Self {
        Self::Var {
            ty,
            storage: VarStorage::Stored,
            initializer: None,
            wrapper: None,
        }
    }

    /// A class kind.
    pub fn class() -> Self {
        Self::Class {
            is_actor: false,
            superclass: None,
        }
    }

    /// An actor class kind.
    pub fn actor() -> Self {
        Self::Class {
            is_actor: true,
            superclass: None,
        }
    }

    /// A short description used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Class { is_actor: true, .. } => "actor",
            Self::Class { .. } => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::EnumElement { .. } => "enum case",
            Self::Protocol { .. } => "protocol",
            Self::Func {
                is_accessor: true, ..
            } => "accessor",
            Self::Func { .. } => "function",
            Self::Var { .. } => "property",
            Self::TopLevelCode { .. } => "top-level code",
        }
    }

    /// Whether this kind declares a nominal type.
    pub fn is_nominal(&self) -> bool {
        matches!(
            self,
            Self::Class { .. } | Self::Struct | Self::Enum | Self::Protocol { .. }
        )
    }
}

/// A declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    /// The declared name.
    pub name: String,

    /// Kind and kind-specific payload.
    #[serde(flatten)]
    pub kind: DeclKind,

    /// The context the declaration lives in.
    #[serde(default)]
    pub context: DeclContext,

    /// Attribute and modifier bits.
    #[serde(default)]
    pub flags: DeclFlags,

    /// Global-actor attribute, if any.
    #[serde(default)]
    pub global_actor: Option<GlobalActorAttr>,

    /// Generic parameters introduced by this declaration.
    #[serde(default)]
    pub generic_params: Vec<GenericParamType>,

    /// The declaration this one overrides, if any.
    #[serde(default)]
    pub overridden: Option<DeclId>,

    /// Where the declaration is written.
    #[serde(default)]
    pub loc: SourceLoc,
}

impl Decl {
    /// Create a declaration at module scope with no attributes.
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            context: DeclContext::Module,
            flags: DeclFlags::empty(),
            global_actor: None,
            generic_params: Vec::new(),
            overridden: None,
            loc: SourceLoc::default(),
        }
    }

    /// Place the declaration in a context.
    pub fn in_context(mut self, context: DeclContext) -> Self {
        self.context = context;
        self
    }

    /// Add attribute bits.
    pub fn with_flags(mut self, flags: DeclFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Attach a global-actor attribute.
    pub fn with_global_actor(mut self, actor: Type, is_unsafe: bool) -> Self {
        self.global_actor = Some(GlobalActorAttr { actor, is_unsafe });
        self
    }

    /// Declare generic parameters.
    pub fn with_generic_params(mut self, params: Vec<GenericParamType>) -> Self {
        self.generic_params = params;
        self
    }

    /// Mark the declaration as overriding another.
    pub fn overriding(mut self, base: DeclId) -> Self {
        self.overridden = Some(base);
        self
    }

    /// Set the source location.
    pub fn at(mut self, loc: SourceLoc) -> Self {
        self.loc = loc;
        self
    }

    /// Whether a flag is set.
    pub fn has(&self, flag: DeclFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Whether this declaration is a function.
    pub fn is_func(&self) -> bool {
        matches!(self.kind, DeclKind::Func { .. })
    }

    /// Whether this declaration is a stored variable.
    pub fn is_stored_var(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Var {
                storage: VarStorage::Stored,
                ..
            }
        )
    }

    /// Whether this is an immutable stored variable (`let`).
    pub fn is_let(&self) -> bool {
        self.is_stored_var() && !self.has(DeclFlags::MUTABLE)
    }

    /// Whether this function is `async`.
    pub fn is_async(&self) -> bool {
        self.is_func() && self.has(DeclFlags::ASYNC)
    }

    /// The substitution map binding this declaration's generic parameters to
    /// the given arguments, in order.
    pub fn substitutions_for(&self, args: &[Type]) -> SubstitutionMap {
        SubstitutionMap::from_pairs(
            self.generic_params
                .iter()
                .zip(args.iter())
                .map(|(param, arg)| (param.name.clone(), arg.clone())),
        )
    }
}

/// A reference to a specific specialization of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConcreteDeclRef {
    /// The referenced declaration.
    pub decl: DeclId,

    /// Replacements for the declaration's (and its context's) generic parameters.
    #[serde(default)]
    pub substitutions: SubstitutionMap,
}

impl ConcreteDeclRef {
    /// A reference without substitutions.
    pub fn new(decl: DeclId) -> Self {
        Self {
            decl,
            substitutions: SubstitutionMap::new(),
        }
    }

    /// A reference with substitutions.
    pub fn with_substitutions(decl: DeclId, substitutions: SubstitutionMap) -> Self {
        Self {
            decl,
            substitutions,
        }
    }
}

impl From<DeclId> for ConcreteDeclRef {
    fn from(decl: DeclId) -> Self {
        Self::new(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuiltinType;

    #[test]
    fn test_decl_builder() {
        let decl = Decl::new("count", DeclKind::var(Type::builtin(BuiltinType::Int)))
            .in_context(DeclContext::Decl {
                decl: DeclId::from_index(0),
            })
            .with_flags(DeclFlags::MUTABLE)
            .at(SourceLoc::new(3, 5));

        assert!(decl.is_stored_var());
        assert!(!decl.is_let());
        assert_eq!(decl.kind.describe(), "property");
        assert_eq!(decl.loc, SourceLoc::new(3, 5));
    }

    #[test]
    fn test_substitutions_for() {
        let decl = Decl::new("Box", DeclKind::Struct)
            .with_generic_params(vec![GenericParamType::new("T")]);
        let subs = decl.substitutions_for(&[Type::builtin(BuiltinType::Int)]);
        assert_eq!(subs.lookup("T"), Some(&Type::builtin(BuiltinType::Int)));
    }

    #[test]
    fn test_decl_flags_serde() {
        let flags = DeclFlags::ASYNC | DeclFlags::THROWS;
        let json = serde_json::to_string(&flags).unwrap();
        let parsed: DeclFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flags);
    }

    #[test]
    fn test_decl_json_flattened_kind() {
        let json = r#"{"name": "Counter", "kind": "class", "is_actor": true}"#;
        let decl: Decl = serde_json::from_str(json).unwrap();
        assert_eq!(decl.kind, DeclKind::actor());
        assert_eq!(decl.context, DeclContext::Module);
    }
}
