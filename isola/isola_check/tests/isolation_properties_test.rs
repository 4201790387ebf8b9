use std::sync::Arc;

use isola_check::{
    ActorIsolationRestriction, CheckScope, ConcurrentReferenceKind, DiagnosticCollector,
    IsolationChecker, RestrictionKind,
};
use isola_core::id::DeclId;
use isola_core::types::{
    BuiltinType, ConcreteDeclRef, ConcurrentValueCheck, Conformance, Decl, DeclContext, DeclFlags,
    DeclKind, DiagnosticId, Expr, GenericParamType, Initializer, Param, Program, SourceLoc, Type,
};
use isola_core::utils::CheckerConfig;

fn loc(line: u32) -> SourceLoc {
    SourceLoc::new(line, 1)
}

fn int() -> Type {
    Type::builtin(BuiltinType::Int)
}

fn member(program: &mut Program, owner: DeclId, decl: Decl) -> DeclId {
    program.add_decl(decl.in_context(DeclContext::of_decl(owner)))
}

fn new_checker(program: &Program) -> (IsolationChecker<'_>, Arc<DiagnosticCollector>) {
    let collector = Arc::new(DiagnosticCollector::new());
    let checker = IsolationChecker::new(program, collector.clone(), CheckerConfig::default());
    (checker, collector)
}

/// Actor `Counter` with a synchronous `increment()`, a non-transferable class
/// `Handle` and a free function `main`.
struct Fixture {
    program: Program,
    counter: DeclId,
    increment: DeclId,
    handle: DeclId,
    main: DeclId,
}

fn fixture() -> Fixture {
    let mut program = Program::new();
    let counter = program.add_decl(Decl::new("Counter", DeclKind::actor()).at(loc(1)));
    let increment = member(
        &mut program,
        counter,
        Decl::new("increment", DeclKind::func(vec![], Type::void())).at(loc(2)),
    );
    let handle = program.add_decl(Decl::new("Handle", DeclKind::class()).at(loc(5)));
    let main = program.add_decl(Decl::new("main", DeclKind::func(vec![], Type::void())).at(loc(8)));
    Fixture {
        program,
        counter,
        increment,
        handle,
        main,
    }
}

#[test]
fn test_actor_self_from_outside_is_diagnosed() {
    let f = fixture();
    let (checker, collector) = new_checker(&f.program);
    let increment = ConcreteDeclRef::new(f.increment);

    assert_eq!(
        checker.classify(&increment),
        ActorIsolationRestriction::ActorSelf { actor: f.counter }
    );

    for caller in [DeclContext::Module, DeclContext::of_decl(f.main)] {
        assert!(checker.diagnose_non_concurrent_types_in_reference(
            &increment,
            caller,
            loc(9),
            ConcurrentReferenceKind::CrossActor,
        ));
    }
    assert_eq!(collector.count_of(DiagnosticId::ActorIsolatedReference), 2);

    // From inside the actor the reference is legal.
    collector.clear();
    assert!(!checker.diagnose_non_concurrent_types_in_reference(
        &increment,
        DeclContext::of_decl(f.counter),
        loc(3),
        ConcurrentReferenceKind::CrossActor,
    ));
    assert!(collector.is_empty());
}

#[test]
fn test_counter_increment_scenario() {
    let mut f = fixture();
    let body = Expr::call(
        Expr::member(
            Expr::decl_ref(ConcreteDeclRef::new(f.counter), loc(9)),
            ConcreteDeclRef::new(f.increment),
            loc(9),
        ),
        vec![],
        loc(9),
    );
    if let DeclKind::Func { body: slot, .. } = &mut f.program.decl_mut(f.main).kind {
        *slot = Some(body);
    }
    let (checker, collector) = new_checker(&f.program);

    assert!(checker.check_function_actor_isolation(f.main));
    let diagnostics = collector.diagnostics();
    assert_eq!(diagnostics[0].id, DiagnosticId::ActorIsolatedReference);
    assert_eq!(diagnostics[0].loc, loc(9));
    assert!(diagnostics[0].message.contains("'increment'"));
    assert!(diagnostics[0].message.contains("'Counter'"));
    assert_eq!(collector.count_of(DiagnosticId::AddAsyncNote), 1);
}

#[test]
fn test_cross_actor_self_requires_transferable_types() {
    let mut f = fixture();
    let count = member(
        &mut f.program,
        f.counter,
        Decl::new("count", DeclKind::var(int())),
    );
    let owner = member(
        &mut f.program,
        f.counter,
        Decl::new("owner", DeclKind::var(Type::nominal(f.handle))),
    );
    let pointer = Type::builtin(BuiltinType::RawPointer);
    let exchange = member(
        &mut f.program,
        f.counter,
        Decl::new(
            "exchange",
            DeclKind::func(
                vec![
                    Param::new("a", Type::nominal(f.handle)),
                    Param::new("b", pointer.clone()),
                    Param::new("c", Type::nominal(f.handle)),
                ],
                pointer,
            ),
        )
        .with_flags(DeclFlags::ASYNC),
    );
    let (checker, collector) = new_checker(&f.program);
    let outside = DeclContext::of_decl(f.main);

    assert_eq!(
        checker.classify(&ConcreteDeclRef::new(count)).kind(),
        RestrictionKind::CrossActorSelf
    );
    assert!(!checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(count),
        outside,
        loc(10),
        ConcurrentReferenceKind::CrossActor,
    ));
    assert!(collector.is_empty());

    assert!(checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(owner),
        outside,
        loc(11),
        ConcurrentReferenceKind::CrossActor,
    ));
    assert_eq!(collector.len(), 1);
    assert_eq!(collector.diagnostics()[0].id, DiagnosticId::NonTransferableProperty);

    // Handle appears twice and RawPointer twice: one diagnostic per type.
    collector.clear();
    assert!(checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(exchange),
        outside,
        loc(12),
        ConcurrentReferenceKind::CrossActor,
    ));
    assert_eq!(collector.len(), 2);
}

#[test]
fn test_is_cross_actor_for_every_construction() {
    let actor = DeclId::from_index(7);
    let global = Type::nominal(DeclId::from_index(9));
    let restrictions = vec![
        ActorIsolationRestriction::for_unrestricted(),
        ActorIsolationRestriction::for_unsafe(),
        ActorIsolationRestriction::for_actor_self(actor, false),
        ActorIsolationRestriction::for_actor_self(actor, true),
        ActorIsolationRestriction::for_global_actor(global.clone(), false),
        ActorIsolationRestriction::for_global_actor(global, true),
    ];

    for restriction in restrictions {
        let expected = matches!(
            restriction.kind(),
            RestrictionKind::CrossActorSelf
                | RestrictionKind::GlobalActor
                | RestrictionKind::GlobalActorUnsafe
        );
        assert_eq!(restriction.is_cross_actor(), expected);

        let copy = restriction.clone();
        assert_eq!(copy.is_cross_actor(), expected);

        let json = serde_json::to_string(&restriction).unwrap();
        let parsed: ActorIsolationRestriction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.is_cross_actor(), expected);
    }
}

#[test]
fn test_global_actor_unsafe_leniency_is_specific() {
    let mut f = fixture();
    let main_actor = f.program.add_decl(Decl::new("MainActor", DeclKind::actor()));
    let returns_handle = DeclKind::func(vec![], Type::nominal(f.handle));
    let lenient = f.program.add_decl(
        Decl::new("legacy", returns_handle.clone())
            .with_global_actor(Type::nominal(main_actor), true),
    );
    let strict = f.program.add_decl(
        Decl::new("modern", returns_handle).with_global_actor(Type::nominal(main_actor), false),
    );
    let detached = f.program.add_decl(
        Decl::new("detached", DeclKind::func(vec![], Type::void()))
            .with_flags(DeclFlags::NONISOLATED),
    );
    let (checker, collector) = new_checker(&f.program);
    let unspecified = DeclContext::of_decl(f.main);
    let kind = ConcurrentReferenceKind::CrossActor;

    assert!(!checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(lenient),
        unspecified,
        loc(1),
        kind,
    ));
    assert!(collector.is_empty());

    assert!(checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(strict),
        unspecified,
        loc(2),
        kind,
    ));

    // Leniency covers only unspecified callers.
    assert!(checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(lenient),
        DeclContext::of_decl(detached),
        loc(3),
        kind,
    ));
    assert_eq!(collector.count_of(DiagnosticId::NonTransferableResult), 2);

    // And it can be switched off.
    let config = CheckerConfig {
        global_actor_unsafe_leniency: false,
        ..CheckerConfig::default()
    };
    let strict_collector = Arc::new(DiagnosticCollector::new());
    let strict_checker = IsolationChecker::new(&f.program, strict_collector.clone(), config);
    assert!(strict_checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(lenient),
        unspecified,
        loc(4),
        kind,
    ));
}

#[test]
fn test_conformance_is_compositional() {
    let mut program = Program::new();
    let transferable = program.transferable_protocol().unwrap();
    let custom = program.add_decl(Decl::new("CustomSafeType", DeclKind::class()).with_flags(DeclFlags::FINAL));
    let custom_conformance = program.add_conformance(Conformance::new(custom, transferable));

    let record = program.add_decl(Decl::new("Record", DeclKind::Struct));
    member(&mut program, record, Decl::new("id", DeclKind::var(int())));
    member(
        &mut program,
        record,
        Decl::new("name", DeclKind::var(Type::builtin(BuiltinType::String))),
    );
    member(&mut program, record, Decl::new("extra", DeclKind::var(Type::nominal(custom))));
    let record_conformance = program.add_conformance(Conformance::new(record, transferable));

    {
        let (checker, collector) = new_checker(&program);
        assert!(!checker.check_concurrent_value_conformance(custom_conformance, ConcurrentValueCheck::Explicit));
        assert!(!checker.check_concurrent_value_conformance(record_conformance, ConcurrentValueCheck::Explicit));
        assert!(collector.is_empty());
        assert!(checker.is_transferable(&Type::nominal(record)));
    }

    // Without its conformance the custom type is not transferable, and the
    // record fails with it.
    let mut without = Program::new();
    let transferable = without.transferable_protocol().unwrap();
    let custom = without.add_decl(Decl::new("CustomSafeType", DeclKind::class()));
    let record = without.add_decl(Decl::new("Record", DeclKind::Struct));
    member(&mut without, record, Decl::new("id", DeclKind::var(int())));
    member(&mut without, record, Decl::new("extra", DeclKind::var(Type::nominal(custom))));
    let record_conformance = without.add_conformance(Conformance::new(record, transferable));

    let (checker, collector) = new_checker(&without);
    assert!(checker.check_concurrent_value_conformance(record_conformance, ConcurrentValueCheck::Explicit));
    assert_eq!(collector.count_of(DiagnosticId::NonTransferableStoredProperty), 1);
}

#[test]
fn test_adding_unsafe_field_flips_conformance() {
    let mut program = Program::new();
    let transferable = program.transferable_protocol().unwrap();
    let record = program.add_decl(Decl::new("Record", DeclKind::Struct));
    member(&mut program, record, Decl::new("id", DeclKind::var(int())));
    let conformance = program.add_conformance(Conformance::new(record, transferable));

    {
        let (checker, _) = new_checker(&program);
        assert!(!checker.check_concurrent_value_conformance(conformance, ConcurrentValueCheck::Explicit));
    }

    member(
        &mut program,
        record,
        Decl::new("raw", DeclKind::var(Type::builtin(BuiltinType::RawPointer))),
    );
    let (checker, collector) = new_checker(&program);
    assert!(checker.check_concurrent_value_conformance(conformance, ConcurrentValueCheck::Explicit));
    assert!(collector.has_errors());
}

#[test]
fn test_generic_container_per_instantiation() {
    let mut program = Program::new();
    let transferable = program.transferable_protocol().unwrap();
    let t = GenericParamType::new("T");
    let container = program.add_decl(
        Decl::new("Container", DeclKind::Struct).with_generic_params(vec![t.clone()]),
    );
    member(&mut program, container, Decl::new("item", DeclKind::var(Type::param(t))));
    let conformance =
        program.add_conformance(Conformance::new(container, transferable).conditional_on(["T"]));
    let handle = program.add_decl(Decl::new("Handle", DeclKind::class()));

    let (checker, collector) = new_checker(&program);
    // The definition is checked once, assuming T is transferable.
    assert!(!checker.check_concurrent_value_conformance(conformance, ConcurrentValueCheck::Explicit));
    assert!(collector.is_empty());

    assert!(checker.is_transferable(&Type::generic(container, vec![int()])));
    assert!(!checker.is_transferable(&Type::generic(container, vec![Type::nominal(handle)])));
}

#[test]
fn test_global_actor_function_returning_box_scenario() {
    fn build(conforming: bool) -> (Program, DeclId, DeclId) {
        let mut program = Program::new();
        let transferable = program.transferable_protocol().unwrap();
        let main_actor = program.add_decl(Decl::new("MainActor", DeclKind::actor()));
        let boxed = program.add_decl(Decl::new("Box", DeclKind::class()).with_flags(DeclFlags::FINAL));
        if conforming {
            program.add_conformance(Conformance::new(boxed, transferable));
        }
        let f = program.add_decl(
            Decl::new("f", DeclKind::func(vec![], Type::nominal(boxed)))
                .with_global_actor(Type::nominal(main_actor), false),
        );
        let worker = program.add_decl(Decl::new("Worker", DeclKind::actor()));
        let run = member(
            &mut program,
            worker,
            Decl::new("run", DeclKind::func(vec![], Type::void())),
        );
        (program, f, run)
    }

    let (program, f, run) = build(false);
    let (checker, collector) = new_checker(&program);
    assert!(checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(f),
        DeclContext::of_decl(run),
        loc(1),
        ConcurrentReferenceKind::CrossActor,
    ));
    assert!(collector.diagnostics()[0].message.contains("'Box'"));

    let (program, f, run) = build(true);
    let (checker, collector) = new_checker(&program);
    assert!(!checker.diagnose_non_concurrent_types_in_reference(
        &ConcreteDeclRef::new(f),
        DeclContext::of_decl(run),
        loc(1),
        ConcurrentReferenceKind::CrossActor,
    ));
    assert!(collector.is_empty());
}

#[test]
fn test_unannotated_override_of_global_actor_method() {
    let mut program = Program::new();
    let main_actor = program.add_decl(Decl::new("MainActor", DeclKind::actor()));
    let view = program.add_decl(Decl::new("View", DeclKind::class()));
    let render = member(
        &mut program,
        view,
        Decl::new("render", DeclKind::func(vec![], Type::void()))
            .with_global_actor(Type::nominal(main_actor), false)
            .at(loc(3)),
    );
    let custom = program.add_decl(Decl::new(
        "CustomView",
        DeclKind::Class {
            is_actor: false,
            superclass: Some(Type::nominal(view)),
        },
    ));
    let render_override = member(
        &mut program,
        custom,
        Decl::new("render", DeclKind::func(vec![], Type::void()))
            .overriding(render)
            .at(loc(9)),
    );

    let (checker, collector) = new_checker(&program);
    assert!(checker.check_override_actor_isolation(render_override));
    let diagnostics = collector.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].id, DiagnosticId::OverrideIsolationMismatch);
    assert_eq!(diagnostics[0].loc, loc(9));
    assert_eq!(diagnostics[1].id, DiagnosticId::OverriddenDeclHere);
    assert_eq!(diagnostics[1].loc, loc(3));

    assert!(!checker.check_override_actor_isolation(render));
}

#[test]
fn test_property_wrapper_scopes() {
    let mut program = Program::new();
    let main_actor = program.add_decl(Decl::new("MainActor", DeclKind::actor()));
    let shared = program.add_decl(
        Decl::new("shared", DeclKind::var(int())).with_flags(DeclFlags::MUTABLE),
    );
    let theme = program.add_decl(
        Decl::new("theme", DeclKind::var(int())).with_global_actor(Type::nominal(main_actor), false),
    );
    let reads_shared = Expr::decl_ref(ConcreteDeclRef::new(shared), loc(4));
    let reads_theme = Expr::decl_ref(ConcreteDeclRef::new(theme), loc(5));

    let (checker, collector) = new_checker(&program);
    assert!(checker.check_property_wrapper_actor_isolation(theme, &reads_shared));
    assert_eq!(collector.count_of(DiagnosticId::UnsafeGlobalReference), 1);

    // An Int-typed global-actor variable crosses without a diagnostic.
    assert!(!checker.check_property_wrapper_actor_isolation(shared, &reads_theme));
    assert_eq!(collector.len(), 1);

    let walker_scope = CheckScope::PropertyWrapper(theme, &reads_theme);
    assert_eq!(walker_scope.body(&program), Some(&reads_theme));
}

#[test]
fn test_property_initializer_takes_owner_isolation() {
    let mut f = fixture();
    let value = member(
        &mut f.program,
        f.counter,
        Decl::new("value", DeclKind::var(int())).with_flags(DeclFlags::MUTABLE),
    );
    let doubled = member(&mut f.program, f.counter, Decl::new("doubled", DeclKind::var(int())));
    let reads_value = Expr::member(Expr::self_ref(loc(4)), ConcreteDeclRef::new(value), loc(4));
    let init = f
        .program
        .add_initializer(Initializer::property(doubled, reads_value.clone()));
    if let DeclKind::Var { initializer, .. } = &mut f.program.decl_mut(doubled).kind {
        *initializer = Some(init);
    }
    let (checker, collector) = new_checker(&f.program);

    assert!(!checker.check_initializer_actor_isolation(init, &reads_value));
    assert!(collector.is_empty());

    let summary = checker.check_program();
    assert_eq!(summary.decls_visited, 1);
    assert!(!summary.has_errors());
}

#[test]
fn test_default_argument_of_global_actor_function() {
    let mut f = fixture();
    let main_actor = f.program.add_decl(Decl::new("MainActor", DeclKind::actor()));
    let calls_increment = Expr::call(
        Expr::decl_ref(ConcreteDeclRef::new(f.increment), loc(6)),
        vec![],
        loc(6),
    );
    let render = f.program.add_decl(
        Decl::new("render", DeclKind::func(vec![], Type::void()))
            .with_global_actor(Type::nominal(main_actor), false),
    );
    let init = f.program.add_initializer(Initializer::default_argument(
        render,
        0,
        calls_increment.clone(),
    ));
    let mut count = Param::new("count", int());
    count.default_value = Some(init);
    if let DeclKind::Func { params, .. } = &mut f.program.decl_mut(render).kind {
        params.push(count);
    }
    let (checker, collector) = new_checker(&f.program);

    assert!(checker.check_initializer_actor_isolation(init, &calls_increment));
    let diagnostics = collector.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].id, DiagnosticId::ActorIsolatedReference);
    assert_eq!(diagnostics[0].loc, loc(6));
}

#[test]
fn test_enum_case_default_argument() {
    let mut f = fixture();
    let calls_increment = Expr::call(
        Expr::decl_ref(ConcreteDeclRef::new(f.increment), loc(12)),
        vec![],
        loc(12),
    );
    let mode = f.program.add_decl(Decl::new("Mode", DeclKind::Enum));
    let reset = member(
        &mut f.program,
        mode,
        Decl::new(
            "reset",
            DeclKind::EnumElement {
                payload: vec![int()],
                default_args: vec![calls_increment.clone()],
            },
        ),
    );
    let (checker, collector) = new_checker(&f.program);

    assert!(checker.check_enum_element_actor_isolation(reset, &calls_increment));
    assert_eq!(collector.count_of(DiagnosticId::ActorIsolatedReference), 1);
    assert_eq!(collector.diagnostics()[0].loc, loc(12));

    // The driver visits the default argument too.
    collector.clear();
    let summary = checker.check_program();
    assert_eq!(summary.decls_visited, 1);
    assert_eq!(summary.errors, 1);
}

#[test]
fn test_check_program_from_json() {
    let json = r#"{
        "decls": [
            {"name": "Transferable", "kind": "protocol"},
            {"name": "Counter", "kind": "class", "is_actor": true, "loc": {"line": 1, "column": 1}},
            {"name": "value", "kind": "var", "ty": {"kind": "builtin", "builtin": "int"},
             "context": {"kind": "decl", "decl": 1}, "flags": "MUTABLE", "loc": {"line": 2, "column": 5}},
            {"name": "main", "kind": "top_level_code", "body":
                {"expr": "member_ref",
                 "base": {"expr": "decl_ref", "target": {"decl": 1}},
                 "target": {"decl": 2},
                 "loc": {"line": 5, "column": 9}}}
        ],
        "transferable_protocol": 0
    }"#;
    let program = Program::from_json(json).unwrap();
    let (checker, collector) = new_checker(&program);

    let summary = checker.check_program();
    assert_eq!(summary.decls_visited, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(collector.diagnostics()[0].loc, SourceLoc::new(5, 9));
}
