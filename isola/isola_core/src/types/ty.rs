//! Types as seen by the isolation checker.
//!
//! Only the structure that matters for transferability is modeled: nominal
//! types with their generic arguments, generic parameters with their
//! transferable requirement, function types, tuples and a handful of
//! builtins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::id::DeclId;

/// Builtin types known to the checker without consulting the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinType {
    /// The empty tuple / no value.
    Void,

    /// Boolean.
    Bool,

    /// Signed machine integer.
    Int,

    /// Double-precision float.
    Double,

    /// Immutable string value.
    String,

    /// Untyped raw pointer. Never safe to transfer.
    RawPointer,
}

impl BuiltinType {
    /// Whether values of this type may cross isolation domains.
    pub fn is_transferable(&self) -> bool {
        !matches!(self, Self::RawPointer)
    }

    /// The spelling of this type in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Void => "Void",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Double => "Double",
            Self::String => "String",
            Self::RawPointer => "RawPointer",
        }
    }
}

/// A generic parameter, carrying the requirements relevant to the checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenericParamType {
    /// Parameter name, unique within its generic signature.
    pub name: String,

    /// Whether the signature requires this parameter to be transferable.
    #[serde(default)]
    pub requires_transferable: bool,
}

impl GenericParamType {
    /// An unconstrained parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires_transferable: false,
        }
    }

    /// A parameter constrained to be transferable.
    pub fn transferable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires_transferable: true,
        }
    }
}

/// A type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// A builtin type.
    Builtin {
        /// Which builtin.
        builtin: BuiltinType,
    },

    /// A class, struct, enum or protocol type with generic arguments.
    Nominal {
        /// The nominal declaration.
        decl: DeclId,

        /// Generic arguments, in declaration order.
        #[serde(default)]
        args: Vec<Type>,
    },

    /// A generic parameter.
    Param {
        /// The parameter.
        param: GenericParamType,
    },

    /// A function type.
    Function {
        /// Parameter types.
        #[serde(default)]
        params: Vec<Type>,

        /// Result type.
        result: Box<Type>,

        /// Whether the function type is marked concurrent.
        #[serde(default)]
        concurrent: bool,
    },

    /// A tuple type.
    Tuple {
        /// Element types.
        elements: Vec<Type>,
    },
}

impl Type {
    /// The `Void` type.
    pub fn void() -> Self {
        Self::builtin(BuiltinType::Void)
    }

    /// A builtin type.
    pub fn builtin(builtin: BuiltinType) -> Self {
        Self::Builtin { builtin }
    }

    /// A non-generic nominal type.
    pub fn nominal(decl: DeclId) -> Self {
        Self::Nominal {
            decl,
            args: Vec::new(),
        }
    }

    /// A generic nominal type applied to arguments.
    pub fn generic(decl: DeclId, args: Vec<Type>) -> Self {
        Self::Nominal { decl, args }
    }

    /// A generic parameter type.
    pub fn param(param: GenericParamType) -> Self {
        Self::Param { param }
    }

    /// A function type.
    pub fn function(params: Vec<Type>, result: Type, concurrent: bool) -> Self {
        Self::Function {
            params,
            result: Box::new(result),
            concurrent,
        }
    }

    /// Whether this is the `Void` type (or the empty tuple).
    pub fn is_void(&self) -> bool {
        match self {
            Self::Builtin { builtin } => *builtin == BuiltinType::Void,
            Self::Tuple { elements } => elements.is_empty(),
            _ => false,
        }
    }

    /// The nominal declaration at the head of this type, if any.
    pub fn nominal_decl(&self) -> Option<DeclId> {
        match self {
            Self::Nominal { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// Whether this type mentions any generic parameter.
    pub fn has_type_params(&self) -> bool {
        match self {
            Self::Builtin { .. } => false,
            Self::Param { .. } => true,
            Self::Nominal { args, .. } => args.iter().any(Type::has_type_params),
            Self::Function { params, result, .. } => {
                params.iter().any(Type::has_type_params) || result.has_type_params()
            }
            Self::Tuple { elements } => elements.iter().any(Type::has_type_params),
        }
    }

    /// Apply a substitution map, replacing every mapped generic parameter.
    ///
    /// Parameters without a replacement are left in place.
    pub fn subst(&self, subs: &SubstitutionMap) -> Type {
        if subs.is_empty() {
            return self.clone();
        }
        match self {
            Self::Builtin { .. } => self.clone(),
            Self::Param { param } => subs
                .lookup(&param.name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Self::Nominal { decl, args } => Self::Nominal {
                decl: *decl,
                args: args.iter().map(|arg| arg.subst(subs)).collect(),
            },
            Self::Function {
                params,
                result,
                concurrent,
            } => Self::Function {
                params: params.iter().map(|p| p.subst(subs)).collect(),
                result: Box::new(result.subst(subs)),
                concurrent: *concurrent,
            },
            Self::Tuple { elements } => Self::Tuple {
                elements: elements.iter().map(|e| e.subst(subs)).collect(),
            },
        }
    }
}

impl fmt::Display for Type {
    /// Displays the type structurally; nominal heads print as their id.
    ///
    /// Use [`crate::types::Program::type_name`] for user-facing spellings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin { builtin } => write!(f, "{}", builtin.as_str()),
            Self::Param { param } => write!(f, "{}", param.name),
            Self::Nominal { decl, args } => {
                write!(f, "{}", decl)?;
                write_list(f, "<", args, ">")
            }
            Self::Function {
                params,
                result,
                concurrent,
            } => {
                if *concurrent {
                    write!(f, "@concurrent ")?;
                }
                write_list(f, "(", params, ")")?;
                write!(f, " -> {}", result)
            }
            Self::Tuple { elements } => write_list(f, "(", elements, ")"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Type], close: &str) -> fmt::Result {
    if items.is_empty() && open == "<" {
        return Ok(());
    }
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

/// A mapping from generic parameter names to replacement types.
///
/// Ordered so that diagnostics and serialized output are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionMap {
    replacements: BTreeMap<String, Type>,
}

impl SubstitutionMap {
    /// The empty substitution map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map by zipping parameter names with argument types.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Self {
            replacements: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Add or replace one substitution.
    pub fn insert(&mut self, name: impl Into<String>, ty: Type) {
        self.replacements.insert(name.into(), ty);
    }

    /// Look up the replacement for a parameter.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.replacements.get(name)
    }

    /// Whether the map has no substitutions.
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Number of substitutions.
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Iterate over the substitutions in parameter-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.replacements.iter().map(|(k, v)| (k.as_str(), v))
    }
}
