//! The declaration/type graph.
//!
//! A [`Program`] owns every declaration, closure context, initializer context
//! and conformance the checker may inspect. Everything else refers to them by
//! index. The graph is built by the frontend (or deserialized from JSON),
//! validated once, and then only read while checking.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ProgramError, Result};
use crate::id::{ClosureId, ConformanceId, DeclId, InitializerId};
use crate::types::{
    Closure, Conformance, Decl, DeclContext, DeclFlags, DeclKind, Expr, Initializer, Type,
    VarStorage,
};

/// Name given to the capability protocol created by [`Program::new`].
pub const TRANSFERABLE_PROTOCOL_NAME: &str = "Transferable";

/// A declaration graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Declarations, indexed by [`DeclId`].
    #[serde(default)]
    decls: Vec<Decl>,

    /// Closure contexts, indexed by [`ClosureId`].
    #[serde(default)]
    closures: Vec<Closure>,

    /// Initializer contexts, indexed by [`InitializerId`].
    #[serde(default)]
    initializers: Vec<Initializer>,

    /// Conformances, indexed by [`ConformanceId`].
    #[serde(default)]
    conformances: Vec<Conformance>,

    /// The protocol expressing the transferable capability.
    #[serde(default)]
    transferable_protocol: Option<DeclId>,
}

impl Program {
    /// Create a graph that already declares the transferable capability protocol.
    pub fn new() -> Self {
        let mut program = Self::default();
        let protocol = program.add_decl(Decl::new(
            TRANSFERABLE_PROTOCOL_NAME,
            DeclKind::Protocol {
                implies_transferable: false,
            },
        ));
        program.transferable_protocol = Some(protocol);
        program
    }

    /// Parse and validate a graph from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let program: Program = serde_json::from_str(json)?;
        program.validate()?;
        debug!(
            "Loaded program with {} declarations, {} closures, {} conformances",
            program.decls.len(),
            program.closures.len(),
            program.conformances.len()
        );
        Ok(program)
    }

    /// Read, parse and validate a graph from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize the graph to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ---- construction ----

    /// Add a declaration.
    pub fn add_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl);
        DeclId::from_index((self.decls.len() - 1) as u32)
    }

    /// Add a closure context.
    pub fn add_closure(&mut self, closure: Closure) -> ClosureId {
        self.closures.push(closure);
        ClosureId::from_index((self.closures.len() - 1) as u32)
    }

    /// Add an initializer context.
    pub fn add_initializer(&mut self, initializer: Initializer) -> InitializerId {
        self.initializers.push(initializer);
        InitializerId::from_index((self.initializers.len() - 1) as u32)
    }

    /// Add a conformance.
    pub fn add_conformance(&mut self, conformance: Conformance) -> ConformanceId {
        self.conformances.push(conformance);
        ConformanceId::from_index((self.conformances.len() - 1) as u32)
    }

    /// Mutable access to a declaration, for frontends filling in bodies
    /// after the declarations they reference exist.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.as_usize()]
    }

    /// Designate the transferable capability protocol.
    pub fn set_transferable_protocol(&mut self, protocol: DeclId) {
        self.transferable_protocol = Some(protocol);
    }

    // ---- lookup ----

    /// Get a declaration.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph. Ids are only produced by
    /// this graph, and deserialized graphs are validated, so a dangling id is
    /// a defect in the caller.
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.as_usize()]
    }

    /// Get a declaration, reporting a dangling id as an error.
    pub fn try_decl(&self, id: DeclId) -> std::result::Result<&Decl, ProgramError> {
        self.decls
            .get(id.as_usize())
            .ok_or(ProgramError::DeclNotFound(id))
    }

    /// Get a closure context. Panics on a dangling id, like [`Program::decl`].
    pub fn closure(&self, id: ClosureId) -> &Closure {
        &self.closures[id.as_usize()]
    }

    /// Get an initializer context. Panics on a dangling id, like [`Program::decl`].
    pub fn initializer(&self, id: InitializerId) -> &Initializer {
        &self.initializers[id.as_usize()]
    }

    /// Get a conformance. Panics on a dangling id, like [`Program::decl`].
    pub fn conformance(&self, id: ConformanceId) -> &Conformance {
        &self.conformances[id.as_usize()]
    }

    /// The transferable capability protocol.
    pub fn transferable_protocol(&self) -> std::result::Result<DeclId, ProgramError> {
        self.transferable_protocol
            .ok_or(ProgramError::MissingTransferableProtocol)
    }

    /// All declarations with their ids.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId::from_index(i as u32), d))
    }

    /// All initializer contexts with their ids.
    pub fn initializers(&self) -> impl Iterator<Item = (InitializerId, &Initializer)> {
        self.initializers
            .iter()
            .enumerate()
            .map(|(i, init)| (InitializerId::from_index(i as u32), init))
    }

    /// All conformances with their ids.
    pub fn conformances(&self) -> impl Iterator<Item = (ConformanceId, &Conformance)> {
        self.conformances
            .iter()
            .enumerate()
            .map(|(i, c)| (ConformanceId::from_index(i as u32), c))
    }

    /// Number of declarations.
    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    /// Find a declaration by name. Returns the first match.
    pub fn find_decl(&self, name: &str) -> Option<DeclId> {
        self.decls().find(|(_, d)| d.name == name).map(|(id, _)| id)
    }

    // ---- structural queries ----

    /// The nominal type declaring `decl` as a member, if any.
    pub fn parent_nominal(&self, decl: DeclId) -> Option<DeclId> {
        let parent = self.decl(decl).context.as_decl()?;
        self.decl(parent).kind.is_nominal().then_some(parent)
    }

    /// Whether `decl` is an actor class.
    pub fn is_actor_class(&self, decl: DeclId) -> bool {
        matches!(self.decl(decl).kind, DeclKind::Class { is_actor: true, .. })
    }

    /// Whether `decl` is declared inside a function or closure body.
    pub fn is_local(&self, decl: DeclId) -> bool {
        match self.decl(decl).context {
            DeclContext::Closure { .. } => true,
            DeclContext::Decl { decl: parent } => self.decl(parent).is_func(),
            DeclContext::Module | DeclContext::Initializer { .. } => false,
        }
    }

    /// Whether `decl` is global or static storage, shared by all code.
    pub fn is_global_storage(&self, decl: DeclId) -> bool {
        let d = self.decl(decl);
        if !d.is_stored_var() {
            return false;
        }
        match d.context {
            DeclContext::Module => true,
            DeclContext::Decl { decl: parent } => {
                let parent = self.decl(parent);
                (parent.kind.is_nominal() && d.has(DeclFlags::STATIC))
                    || matches!(parent.kind, DeclKind::TopLevelCode { .. })
            }
            DeclContext::Closure { .. } | DeclContext::Initializer { .. } => false,
        }
    }

    /// Members declared directly inside `nominal`.
    pub fn members(&self, nominal: DeclId) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls()
            .filter(move |(_, d)| d.context.as_decl() == Some(nominal))
    }

    /// Stored instance properties of `nominal`, in declaration order.
    pub fn stored_properties(&self, nominal: DeclId) -> Vec<DeclId> {
        self.members(nominal)
            .filter(|(_, d)| {
                matches!(
                    d.kind,
                    DeclKind::Var {
                        storage: VarStorage::Stored,
                        ..
                    }
                ) && !d.has(DeclFlags::STATIC)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Cases of the enum `nominal`, in declaration order.
    pub fn enum_elements(&self, nominal: DeclId) -> Vec<DeclId> {
        self.members(nominal)
            .filter(|(_, d)| matches!(d.kind, DeclKind::EnumElement { .. }))
            .map(|(id, _)| id)
            .collect()
    }

    /// The conformances of `nominal`.
    pub fn conformances_of(&self, nominal: DeclId) -> impl Iterator<Item = (ConformanceId, &Conformance)> {
        self.conformances()
            .filter(move |(_, c)| c.conforming == nominal)
    }

    /// The function whose body (possibly through closures) contains `context`.
    pub fn enclosing_func(&self, context: DeclContext) -> Option<DeclId> {
        let mut current = context;
        loop {
            match current {
                DeclContext::Module => return None,
                DeclContext::Decl { decl } => {
                    if self.decl(decl).is_func() {
                        return Some(decl);
                    }
                    current = self.decl(decl).context;
                }
                DeclContext::Closure { closure } => current = self.closure(closure).parent,
                DeclContext::Initializer { .. } => return None,
            }
        }
    }

    /// The context enclosing `context`, or `None` at module scope.
    ///
    /// An initializer's parent is the context of the declaration it belongs to.
    pub fn parent_context(&self, context: DeclContext) -> Option<DeclContext> {
        match context {
            DeclContext::Module => None,
            DeclContext::Decl { decl } => Some(self.decl(decl).context),
            DeclContext::Closure { closure } => Some(self.closure(closure).parent),
            DeclContext::Initializer { init } => {
                Some(self.decl(self.initializer(init).owner()).context)
            }
        }
    }

    /// Whether getting from `inner` out to `outer` leaves a concurrent closure.
    ///
    /// Returns `false` when `outer` does not enclose `inner`.
    pub fn crosses_concurrent_closure(&self, inner: DeclContext, outer: DeclContext) -> bool {
        let mut crossed = false;
        let mut current = inner;
        loop {
            if current == outer {
                return crossed;
            }
            if let DeclContext::Closure { closure } = current {
                crossed |= self.closure(closure).concurrent;
            }
            match self.parent_context(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// The declared type of a variable, or the result of a function.
    pub fn value_type(&self, decl: DeclId) -> Option<&Type> {
        match &self.decl(decl).kind {
            DeclKind::Var { ty, .. } => Some(ty),
            DeclKind::Func { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The user-facing spelling of a type.
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Builtin { builtin } => builtin.as_str().to_string(),
            Type::Param { param } => param.name.clone(),
            Type::Nominal { decl, args } => {
                let name = self
                    .try_decl(*decl)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|_| decl.to_string());
                if args.is_empty() {
                    name
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.type_name(a)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
            Type::Function {
                params,
                result,
                concurrent,
            } => {
                let params: Vec<String> = params.iter().map(|p| self.type_name(p)).collect();
                format!(
                    "{}({}) -> {}",
                    if *concurrent { "@concurrent " } else { "" },
                    params.join(", "),
                    self.type_name(result)
                )
            }
            Type::Tuple { elements } => {
                let elements: Vec<String> = elements.iter().map(|e| self.type_name(e)).collect();
                format!("({})", elements.join(", "))
            }
        }
    }

    // ---- validation ----

    /// Check that every id in the graph points into it and that attributes
    /// are well formed.
    pub fn validate(&self) -> std::result::Result<(), ProgramError> {
        let protocol = self.transferable_protocol()?;
        self.expect_kind(protocol, "protocol", |k| matches!(k, DeclKind::Protocol { .. }))?;

        for (id, decl) in self.decls() {
            self.validate_context(decl.context)?;
            if let Some(base) = decl.overridden {
                self.try_decl(base)?;
            }
            if let Some(attr) = &decl.global_actor {
                match attr.actor.nominal_decl() {
                    Some(actor) => {
                        self.try_decl(actor)?;
                    }
                    None => return Err(ProgramError::InvalidGlobalActor(id)),
                }
            }
            match &decl.kind {
                DeclKind::Func { params, body, .. } => {
                    for param in params {
                        self.validate_type(&param.ty)?;
                        if let Some(init) = param.default_value {
                            self.validate_initializer(init)?;
                        }
                    }
                    if let Some(body) = body {
                        self.validate_expr(body)?;
                    }
                }
                DeclKind::Var {
                    ty,
                    initializer,
                    wrapper,
                    ..
                } => {
                    self.validate_type(ty)?;
                    if let Some(init) = initializer {
                        self.validate_initializer(*init)?;
                    }
                    if let Some(wrapper) = wrapper {
                        self.validate_type(&wrapper.wrapper_type)?;
                        self.validate_expr(&wrapper.init)?;
                    }
                }
                DeclKind::EnumElement {
                    payload,
                    default_args,
                } => {
                    for ty in payload {
                        self.validate_type(ty)?;
                    }
                    for expr in default_args {
                        self.validate_expr(expr)?;
                    }
                }
                DeclKind::TopLevelCode { body } => self.validate_expr(body)?,
                DeclKind::Class {
                    superclass: Some(ty),
                    ..
                } => self.validate_type(ty)?,
                _ => {}
            }
        }

        for closure in &self.closures {
            self.validate_context(closure.parent)?;
        }
        for init in &self.initializers {
            self.try_decl(init.owner())?;
            self.validate_expr(&init.expr)?;
        }
        self.validate_acyclic()?;

        for (_, conformance) in self.conformances() {
            self.expect_kind(conformance.conforming, "nominal type", DeclKind::is_nominal)?;
            self.expect_kind(conformance.protocol, "protocol", |k| {
                matches!(k, DeclKind::Protocol { .. })
            })?;
        }
        Ok(())
    }

    fn expect_kind(
        &self,
        id: DeclId,
        expected: &'static str,
        check: impl Fn(&DeclKind) -> bool,
    ) -> std::result::Result<(), ProgramError> {
        let decl = self.try_decl(id)?;
        if check(&decl.kind) {
            Ok(())
        } else {
            Err(ProgramError::UnexpectedKind { decl: id, expected })
        }
    }

    fn validate_context(&self, context: DeclContext) -> std::result::Result<(), ProgramError> {
        match context {
            DeclContext::Module => Ok(()),
            DeclContext::Decl { decl } => self.try_decl(decl).map(|_| ()),
            DeclContext::Closure { closure } => self
                .closures
                .get(closure.as_usize())
                .map(|_| ())
                .ok_or(ProgramError::ClosureNotFound(closure)),
            DeclContext::Initializer { init } => self.validate_initializer(init),
        }
    }

    /// Check that every declaration, closure and initializer reaches module
    /// scope through its parents. Requires all context ids to be valid.
    fn validate_acyclic(&self) -> std::result::Result<(), ProgramError> {
        let starts = self
            .decls()
            .map(|(id, _)| DeclContext::of_decl(id))
            .chain((0..self.closures.len()).map(|i| DeclContext::of_closure(ClosureId::from_index(i as u32))))
            .chain(self.initializers().map(|(id, _)| DeclContext::of_initializer(id)));

        let mut reaches_module: HashSet<DeclContext> = HashSet::new();
        for start in starts {
            let mut path = Vec::new();
            let mut current = start;
            while !reaches_module.contains(&current) {
                if path.contains(&current) {
                    return Err(ProgramError::ContextCycle(current));
                }
                path.push(current);
                match self.parent_context(current) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
            reaches_module.extend(path);
        }
        Ok(())
    }

    fn validate_initializer(&self, init: InitializerId) -> std::result::Result<(), ProgramError> {
        self.initializers
            .get(init.as_usize())
            .map(|_| ())
            .ok_or(ProgramError::InitializerNotFound(init))
    }

    fn validate_type(&self, ty: &Type) -> std::result::Result<(), ProgramError> {
        match ty {
            Type::Builtin { .. } | Type::Param { .. } => Ok(()),
            Type::Nominal { decl, args } => {
                self.expect_kind(*decl, "nominal type", DeclKind::is_nominal)?;
                args.iter().try_for_each(|a| self.validate_type(a))
            }
            Type::Function { params, result, .. } => {
                params.iter().try_for_each(|p| self.validate_type(p))?;
                self.validate_type(result)
            }
            Type::Tuple { elements } => elements.iter().try_for_each(|e| self.validate_type(e)),
        }
    }

    fn validate_expr(&self, expr: &Expr) -> std::result::Result<(), ProgramError> {
        match expr {
            Expr::DeclRef { target, .. } => self.try_decl(target.decl).map(|_| ()),
            Expr::MemberRef { base, target, .. } => {
                self.try_decl(target.decl)?;
                self.validate_expr(base)
            }
            Expr::Call { callee, args, .. } => {
                self.validate_expr(callee)?;
                args.iter().try_for_each(|a| self.validate_expr(a))
            }
            Expr::Closure { closure, body, .. } => {
                self.validate_context(DeclContext::of_closure(*closure))?;
                self.validate_expr(body)
            }
            Expr::SelfRef { .. } | Expr::Literal { .. } => Ok(()),
            Expr::Assign { dest, source, .. } => {
                self.validate_expr(dest)?;
                self.validate_expr(source)
            }
            Expr::Sequence { exprs } => exprs.iter().try_for_each(|e| self.validate_expr(e)),
        }
    }
}
