//! Transferability of types.
//!
//! A type is transferable when its values can be handed from one isolation
//! domain to another without risk of concurrent mutation.

use std::collections::HashSet;

use isola_core::id::DeclId;
use isola_core::traits::ConformanceLookup;
use isola_core::types::{DeclKind, Program, SubstitutionMap, Type};
use tracing::trace;

/// Answers whether types are transferable.
///
/// Generic types are answered per instantiation: the arguments of a nominal
/// type are substituted into its members (or checked against the conditional
/// requirements of its conformance) every time the question is asked.
#[derive(Clone, Copy)]
pub struct TransferabilityChecker<'a> {
    program: &'a Program,
    conformances: &'a dyn ConformanceLookup,
    implicit_value_conformance: bool,
}

impl<'a> TransferabilityChecker<'a> {
    /// Create a checker.
    ///
    /// # Arguments
    ///
    /// * `program` - The declaration graph.
    /// * `conformances` - Lookup of declared transferability conformances.
    /// * `implicit_value_conformance` - Whether structs and enums without a
    ///   declared conformance are transferable when all their members are.
    pub fn new(
        program: &'a Program,
        conformances: &'a dyn ConformanceLookup,
        implicit_value_conformance: bool,
    ) -> Self {
        Self {
            program,
            conformances,
            implicit_value_conformance,
        }
    }

    /// Whether `ty` is transferable.
    pub fn is_transferable(&self, ty: &Type) -> bool {
        self.is_transferable_assuming(ty, &[])
    }

    /// Whether `ty` is transferable when the named generic parameters are
    /// assumed to be.
    pub fn is_transferable_assuming(&self, ty: &Type, assumed: &[String]) -> bool {
        let result = self.check(ty, assumed, &mut HashSet::new());
        trace!("{} transferable: {}", ty, result);
        result
    }

    fn check(&self, ty: &Type, assumed: &[String], visiting: &mut HashSet<Type>) -> bool {
        match ty {
            Type::Builtin { builtin } => builtin.is_transferable(),
            Type::Tuple { elements } => elements.iter().all(|e| self.check(e, assumed, visiting)),
            Type::Function { concurrent, .. } => *concurrent,
            Type::Param { param } => {
                param.requires_transferable || assumed.iter().any(|name| *name == param.name)
            }
            Type::Nominal { decl, args } => {
                // A cycle through the type's own storage does not make it unsafe.
                if !visiting.insert(ty.clone()) {
                    return true;
                }
                let result = self.check_nominal(*decl, args, assumed, visiting);
                visiting.remove(ty);
                result
            }
        }
    }

    fn check_nominal(
        &self,
        id: DeclId,
        args: &[Type],
        assumed: &[String],
        visiting: &mut HashSet<Type>,
    ) -> bool {
        let decl = self.program.decl(id);
        let subs = decl.substitutions_for(args);

        match decl.kind {
            DeclKind::Class { is_actor: true, .. } => return true,
            DeclKind::Protocol {
                implies_transferable,
            } => {
                return implies_transferable
                    || self.program.transferable_protocol().ok() == Some(id);
            }
            _ => {}
        }

        if let Some(found) = self.conformances.lookup_transferable(id) {
            let conformance = self.program.conformance(found.conformance);
            if conformance.unchecked {
                return true;
            }
            return conformance.conditional_requirements.iter().all(|name| {
                match subs.lookup(name) {
                    Some(arg) => self.check(arg, assumed, visiting),
                    None => assumed.iter().any(|a| a == name),
                }
            });
        }

        if !self.implicit_value_conformance {
            return false;
        }

        match decl.kind {
            DeclKind::Struct => self
                .program
                .stored_properties(id)
                .into_iter()
                .filter_map(|prop| self.program.value_type(prop))
                .all(|member| self.check_member(member, &subs, assumed, visiting)),
            DeclKind::Enum => self.program.enum_elements(id).into_iter().all(|element| {
                match &self.program.decl(element).kind {
                    DeclKind::EnumElement { payload, .. } => payload
                        .iter()
                        .all(|member| self.check_member(member, &subs, assumed, visiting)),
                    _ => true,
                }
            }),
            _ => false,
        }
    }

    fn check_member(
        &self,
        member: &Type,
        subs: &SubstitutionMap,
        assumed: &[String],
        visiting: &mut HashSet<Type>,
    ) -> bool {
        self.check(&member.subst(subs), assumed, visiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::ProgramConformanceLookup;
    use isola_core::types::{
        BuiltinType, Conformance, Decl, DeclContext, DeclFlags, GenericParamType,
    };

    fn int() -> Type {
        Type::builtin(BuiltinType::Int)
    }

    fn pointer() -> Type {
        Type::builtin(BuiltinType::RawPointer)
    }

    fn add_field(program: &mut Program, owner: DeclId, name: &str, ty: Type) -> DeclId {
        program.add_decl(Decl::new(name, DeclKind::var(ty)).in_context(DeclContext::of_decl(owner)))
    }

    #[test]
    fn test_structural_rules() {
        let program = Program::new();
        let lookup = ProgramConformanceLookup::new(&program);
        let checker = TransferabilityChecker::new(&program, &lookup, true);

        assert!(checker.is_transferable(&int()));
        assert!(!checker.is_transferable(&pointer()));
        assert!(checker.is_transferable(&Type::Tuple {
            elements: vec![int(), Type::builtin(BuiltinType::String)]
        }));
        assert!(!checker.is_transferable(&Type::Tuple {
            elements: vec![int(), pointer()]
        }));
        assert!(checker.is_transferable(&Type::function(vec![], int(), true)));
        assert!(!checker.is_transferable(&Type::function(vec![], int(), false)));
        assert!(checker.is_transferable(&Type::param(GenericParamType::transferable("T"))));
        assert!(!checker.is_transferable(&Type::param(GenericParamType::new("T"))));
        assert!(checker.is_transferable_assuming(
            &Type::param(GenericParamType::new("T")),
            &["T".to_string()]
        ));
    }

    #[test]
    fn test_classes() {
        let mut program = Program::new();
        let transferable = program.transferable_protocol().unwrap();
        let actor = program.add_decl(Decl::new("Store", DeclKind::actor()));
        let class = program.add_decl(Decl::new("Handle", DeclKind::class()));
        let token = program.add_decl(
            Decl::new("Token", DeclKind::class()).with_flags(DeclFlags::FINAL),
        );
        program.add_conformance(Conformance::new(token, transferable));

        let lookup = ProgramConformanceLookup::new(&program);
        let checker = TransferabilityChecker::new(&program, &lookup, true);
        assert!(checker.is_transferable(&Type::nominal(actor)));
        assert!(!checker.is_transferable(&Type::nominal(class)));
        assert!(checker.is_transferable(&Type::nominal(token)));
    }

    #[test]
    fn test_implicit_struct_and_enum() {
        let mut program = Program::new();
        let point = program.add_decl(Decl::new("Point", DeclKind::Struct));
        add_field(&mut program, point, "x", int());
        add_field(&mut program, point, "y", int());

        let buffer = program.add_decl(Decl::new("Buffer", DeclKind::Struct));
        add_field(&mut program, buffer, "base", pointer());

        let shape = program.add_decl(Decl::new("Shape", DeclKind::Enum));
        program.add_decl(
            Decl::new(
                "dot",
                DeclKind::EnumElement {
                    payload: vec![Type::nominal(point)],
                    default_args: vec![],
                },
            )
            .in_context(DeclContext::of_decl(shape)),
        );

        let lookup = ProgramConformanceLookup::new(&program);
        let checker = TransferabilityChecker::new(&program, &lookup, true);
        assert!(checker.is_transferable(&Type::nominal(point)));
        assert!(!checker.is_transferable(&Type::nominal(buffer)));
        assert!(checker.is_transferable(&Type::nominal(shape)));

        let strict = TransferabilityChecker::new(&program, &lookup, false);
        assert!(!strict.is_transferable(&Type::nominal(point)));
    }

    #[test]
    fn test_generic_instantiation() {
        let mut program = Program::new();
        let transferable = program.transferable_protocol().unwrap();
        let t = GenericParamType::new("T");

        // Conditional conformance: Box<T>: Transferable where T: Transferable.
        let boxed = program.add_decl(
            Decl::new("Box", DeclKind::Struct).with_generic_params(vec![t.clone()]),
        );
        add_field(&mut program, boxed, "value", Type::param(t.clone()));
        program.add_conformance(Conformance::new(boxed, transferable).conditional_on(["T"]));

        // No declared conformance: Pair<T> is implicitly transferable per instantiation.
        let pair = program.add_decl(
            Decl::new("Pair", DeclKind::Struct).with_generic_params(vec![t.clone()]),
        );
        add_field(&mut program, pair, "first", Type::param(t.clone()));
        add_field(&mut program, pair, "second", Type::param(t));

        let lookup = ProgramConformanceLookup::new(&program);
        let checker = TransferabilityChecker::new(&program, &lookup, true);
        assert!(checker.is_transferable(&Type::generic(boxed, vec![int()])));
        assert!(!checker.is_transferable(&Type::generic(boxed, vec![pointer()])));
        assert!(checker.is_transferable(&Type::generic(pair, vec![int()])));
        assert!(!checker.is_transferable(&Type::generic(pair, vec![pointer()])));
        assert!(checker.is_transferable(&Type::generic(
            boxed,
            vec![Type::generic(pair, vec![int()])]
        )));
    }

    #[test]
    fn test_recursive_type_terminates() {
        let mut program = Program::new();
        let list = program.add_decl(Decl::new("List", DeclKind::Enum));
        program.add_decl(
            Decl::new(
                "cons",
                DeclKind::EnumElement {
                    payload: vec![int(), Type::nominal(list)],
                    default_args: vec![],
                },
            )
            .in_context(DeclContext::of_decl(list)),
        );

        let lookup = ProgramConformanceLookup::new(&program);
        let checker = TransferabilityChecker::new(&program, &lookup, true);
        assert!(checker.is_transferable(&Type::nominal(list)));
    }

    #[test]
    fn test_unchecked_conformance_is_trusted() {
        let mut program = Program::new();
        let transferable = program.transferable_protocol().unwrap();
        let raw = program.add_decl(Decl::new("Raw", DeclKind::Struct));
        add_field(&mut program, raw, "ptr", pointer());
        let mut conformance = Conformance::new(raw, transferable);
        conformance.unchecked = true;
        program.add_conformance(conformance);

        let lookup = ProgramConformanceLookup::new(&program);
        let checker = TransferabilityChecker::new(&program, &lookup, true);
        assert!(checker.is_transferable(&Type::nominal(raw)));
    }
}
