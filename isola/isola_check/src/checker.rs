//! Isolation checker.
//!
//! This module provides [`IsolationChecker`], the entry point bundling the
//! declaration graph, its collaborators, the diagnostic sink and the
//! configuration of a check run.

use std::sync::Arc;
use std::time::Instant;

use isola_core::id::{ConformanceId, DeclId, InitializerId};
use isola_core::log_event;
use isola_core::traits::{ConformanceLookup, DiagnosticSink, IsolationResolver};
use isola_core::types::{
    ConcreteDeclRef, ConcurrentValueCheck, DeclContext, DeclKind, Expr, Program, SourceLoc, Type,
};
use isola_core::utils::{CheckerConfig, LogLevel};
use serde::{Deserialize, Serialize};

use crate::engine::{
    self, CheckScope, ConformanceChecker, CrossingChecker, SiteWalker, TransferabilityChecker,
};
use crate::integration::{ProgramConformanceLookup, ProgramIsolationResolver};
use crate::model::{ActorIsolationRestriction, ConcurrentReferenceKind};
use crate::sink::{CountingSink, DiagnosticCounts};

/// Outcome of a whole-program check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Errors emitted.
    pub errors: usize,

    /// Warnings emitted.
    pub warnings: usize,

    /// Notes emitted.
    pub notes: usize,

    /// Declarations and initializers visited.
    pub decls_visited: usize,

    /// Transferability conformances checked.
    pub conformances_checked: usize,
}

impl CheckSummary {
    /// Whether the program has errors.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    fn with_counts(mut self, counts: DiagnosticCounts) -> Self {
        self.errors = counts.errors;
        self.warnings = counts.warnings;
        self.notes = counts.notes;
        self
    }
}

/// One unit of whole-program work.
#[derive(Debug, Clone, Copy)]
enum WorkItem {
    Decl(DeclId),
    Initializer(InitializerId),
    Conformance(ConformanceId, ConcurrentValueCheck),
}

/// Checks actor isolation in a declaration graph.
///
/// Every check reports problems to the sink given at construction and
/// returns whether it found any.
pub struct IsolationChecker<'a> {
    /// The declaration graph.
    program: &'a Program,

    /// Resolves the isolation of declarations and contexts.
    resolver: Arc<dyn IsolationResolver + 'a>,

    /// Finds declared transferability conformances.
    conformances: Arc<dyn ConformanceLookup + 'a>,

    /// Receives diagnostics.
    sink: CountingSink<'a>,

    /// The configuration.
    config: CheckerConfig,
}

impl<'a> IsolationChecker<'a> {
    /// Create a checker answering isolation and conformance questions from
    /// the graph itself.
    ///
    /// # Arguments
    ///
    /// * `program` - The declaration graph.
    /// * `sink` - Where diagnostics go.
    /// * `config` - The configuration.
    ///
    /// # Returns
    ///
    /// A new isolation checker.
    pub fn new(
        program: &'a Program,
        sink: Arc<dyn DiagnosticSink + 'a>,
        config: CheckerConfig,
    ) -> Self {
        Self::with_collaborators(
            program,
            Arc::new(ProgramIsolationResolver::new(program)),
            Arc::new(ProgramConformanceLookup::new(program)),
            sink,
            config,
        )
    }

    /// Create a checker with explicit collaborators.
    pub fn with_collaborators(
        program: &'a Program,
        resolver: Arc<dyn IsolationResolver + 'a>,
        conformances: Arc<dyn ConformanceLookup + 'a>,
        sink: Arc<dyn DiagnosticSink + 'a>,
        config: CheckerConfig,
    ) -> Self {
        Self {
            program,
            resolver,
            conformances,
            sink: CountingSink::new(sink),
            config,
        }
    }

    /// The declaration graph.
    pub fn program(&self) -> &'a Program {
        self.program
    }

    /// The configuration.
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Diagnostics emitted through this checker so far.
    pub fn counts(&self) -> DiagnosticCounts {
        self.sink.counts()
    }

    /// Classify a reference to a declaration.
    pub fn classify(&self, decl_ref: &ConcreteDeclRef) -> ActorIsolationRestriction {
        ActorIsolationRestriction::for_declaration(decl_ref, self.program)
    }

    /// Whether `ty` is transferable.
    pub fn is_transferable(&self, ty: &Type) -> bool {
        self.transferability().is_transferable(ty)
    }

    /// Suggest making `func` asynchronous.
    ///
    /// # Returns
    ///
    /// The number of notes emitted.
    pub fn add_async_notes(&self, func: DeclId) -> usize {
        engine::add_async_notes(self.program, &self.sink, func)
    }

    /// Check a reference made from code in `caller`.
    ///
    /// # Returns
    ///
    /// `true` if a problem was found and reported.
    pub fn diagnose_non_concurrent_types_in_reference(
        &self,
        decl_ref: &ConcreteDeclRef,
        caller: DeclContext,
        loc: SourceLoc,
        kind: ConcurrentReferenceKind,
    ) -> bool {
        self.crossing()
            .diagnose_non_concurrent_types_in_reference(decl_ref, caller, loc, kind)
    }

    /// Check the references made by a top-level code declaration.
    pub fn check_top_level_actor_isolation(&self, decl: DeclId) -> bool {
        self.walker().check(CheckScope::TopLevel(decl))
    }

    /// Check the references made by a function body.
    pub fn check_function_actor_isolation(&self, decl: DeclId) -> bool {
        self.walker().check(CheckScope::Function(decl))
    }

    /// Check the references made by an initializer expression.
    pub fn check_initializer_actor_isolation(&self, init: InitializerId, expr: &Expr) -> bool {
        self.walker().check(CheckScope::Initializer(init, expr))
    }

    /// Check the references made by a default argument of an enum case.
    pub fn check_enum_element_actor_isolation(&self, element: DeclId, expr: &Expr) -> bool {
        self.walker().check(CheckScope::EnumElement(element, expr))
    }

    /// Check the references made by a property-wrapper binding.
    pub fn check_property_wrapper_actor_isolation(&self, binding: DeclId, expr: &Expr) -> bool {
        self.walker().check(CheckScope::PropertyWrapper(binding, expr))
    }

    /// Check that an override is isolated compatibly with its base.
    pub fn check_override_actor_isolation(&self, decl: DeclId) -> bool {
        engine::check_override(self.program, self.resolver.as_ref(), &self.sink, decl)
    }

    /// Check a transferability conformance.
    ///
    /// # Returns
    ///
    /// `true` if an error was reported.
    pub fn check_concurrent_value_conformance(
        &self,
        conformance: ConformanceId,
        check: ConcurrentValueCheck,
    ) -> bool {
        ConformanceChecker::new(
            self.program,
            self.transferability(),
            &self.sink,
            self.config.relaxed_legacy_conformances,
        )
        .check_concurrent_value_conformance(conformance, check)
    }

    /// Check the whole program.
    ///
    /// Visits every top-level code declaration, function body, initializer
    /// expression, enum case default argument, property-wrapper binding and
    /// override, then every declared transferability conformance. Uses
    /// `config.jobs` worker threads.
    pub fn check_program(&self) -> CheckSummary {
        self.check_program_parallel(self.config.jobs)
    }

    /// Check the whole program on `jobs` worker threads.
    ///
    /// The work is split into contiguous chunks; diagnostics are the same as
    /// for a sequential run up to emission order.
    pub fn check_program_parallel(&self, jobs: usize) -> CheckSummary {
        let started = Instant::now();
        let before = self.counts();
        let items = self.work_items();
        let jobs = jobs.clamp(1, items.len().max(1));

        log_event!(LogLevel::Info, "Checking program",
            decls => self.program.decl_count(),
            items => items.len(),
            jobs => jobs,
        );

        if jobs == 1 {
            for item in &items {
                self.run(*item);
            }
        } else {
            let chunk = items.len().div_ceil(jobs);
            std::thread::scope(|scope| {
                for part in items.chunks(chunk) {
                    scope.spawn(move || {
                        for item in part {
                            self.run(*item);
                        }
                    });
                }
            });
        }

        let after = self.counts();
        let summary = CheckSummary {
            decls_visited: items
                .iter()
                .filter(|i| !matches!(i, WorkItem::Conformance(..)))
                .count(),
            conformances_checked: items
                .iter()
                .filter(|i| matches!(i, WorkItem::Conformance(..)))
                .count(),
            ..CheckSummary::default()
        }
        .with_counts(DiagnosticCounts {
            errors: after.errors - before.errors,
            warnings: after.warnings - before.warnings,
            notes: after.notes - before.notes,
        });

        log_event!(LogLevel::Info, "Program checked",
            errors => summary.errors,
            warnings => summary.warnings,
            notes => summary.notes,
            elapsed_ms => started.elapsed().as_millis(),
        );
        summary
    }

    fn work_items(&self) -> Vec<WorkItem> {
        let mut items = Vec::new();
        for (id, decl) in self.program.decls() {
            let checked = match &decl.kind {
                DeclKind::TopLevelCode { .. } => true,
                DeclKind::Func { body, .. } => body.is_some() || decl.overridden.is_some(),
                DeclKind::Var { wrapper, .. } => wrapper.is_some() || decl.overridden.is_some(),
                DeclKind::EnumElement { default_args, .. } => !default_args.is_empty(),
                _ => false,
            };
            if checked {
                items.push(WorkItem::Decl(id));
            }
        }
        items.extend(
            self.program
                .initializers()
                .map(|(id, _)| WorkItem::Initializer(id)),
        );
        for (id, decl) in self.program.decls() {
            if !decl.kind.is_nominal() {
                continue;
            }
            if let Some(found) = self.conformances.lookup_transferable(id) {
                items.push(WorkItem::Conformance(found.conformance, found.origin));
            }
        }
        items
    }

    fn run(&self, item: WorkItem) {
        match item {
            WorkItem::Decl(id) => self.check_decl(id),
            WorkItem::Initializer(id) => {
                let init = self.program.initializer(id);
                self.check_initializer_actor_isolation(id, &init.expr);
            }
            WorkItem::Conformance(id, check) => {
                self.check_concurrent_value_conformance(id, check);
            }
        }
    }

    fn check_decl(&self, id: DeclId) {
        let decl = self.program.decl(id);
        match &decl.kind {
            DeclKind::TopLevelCode { .. } => {
                self.check_top_level_actor_isolation(id);
            }
            DeclKind::Func { body: Some(_), .. } => {
                self.check_function_actor_isolation(id);
            }
            DeclKind::Var {
                wrapper: Some(wrapper),
                ..
            } => {
                self.check_property_wrapper_actor_isolation(id, &wrapper.init);
            }
            DeclKind::EnumElement { default_args, .. } => {
                for arg in default_args {
                    self.check_enum_element_actor_isolation(id, arg);
                }
            }
            _ => {}
        }
        if decl.overridden.is_some() {
            self.check_override_actor_isolation(id);
        }
    }

    fn transferability(&self) -> TransferabilityChecker<'_> {
        TransferabilityChecker::new(
            self.program,
            self.conformances.as_ref(),
            self.config.implicit_value_conformance,
        )
    }

    fn crossing(&self) -> CrossingChecker<'_> {
        CrossingChecker::new(
            self.program,
            self.resolver.as_ref(),
            self.transferability(),
            &self.sink,
            self.config.global_actor_unsafe_leniency,
        )
    }

    fn walker(&self) -> SiteWalker<'_> {
        SiteWalker::new(
            self.program,
            self.resolver.as_ref(),
            self.crossing(),
            &self.sink,
            self.config.suggest_async_notes,
        )
    }
}
