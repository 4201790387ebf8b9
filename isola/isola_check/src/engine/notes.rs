//! Fix-it notes for functions making implicitly asynchronous calls.

use isola_core::id::DeclId;
use isola_core::traits::DiagnosticSink;
use isola_core::types::{DeclFlags, DeclKind, Diagnostic, DiagnosticId, Program};

/// Suggest making `func` asynchronous.
///
/// Nothing is emitted for declarations that are not functions or are already
/// `async`. Accessors cannot be made asynchronous, so they get no notes.
///
/// # Returns
///
/// The number of notes emitted.
pub fn add_async_notes(program: &Program, sink: &dyn DiagnosticSink, func: DeclId) -> usize {
    let decl = program.decl(func);
    let DeclKind::Func {
        result,
        is_accessor,
        ..
    } = &decl.kind
    else {
        return 0;
    };
    if decl.is_async() || *is_accessor {
        return 0;
    }

    let mut emitted = 0;
    if result.is_void() && !decl.has(DeclFlags::THROWS) {
        sink.emit(Diagnostic::note(
            DiagnosticId::AddAsyncHandlerNote,
            decl.loc,
            format!(
                "add '@asyncHandler' to function '{}' to create an implicit asynchronous context",
                decl.name
            ),
        ));
        emitted += 1;
    }

    sink.emit(Diagnostic::note(
        DiagnosticId::AddAsyncNote,
        decl.loc,
        format!("add 'async' to function '{}' to make it asynchronous", decl.name),
    ));
    emitted + 1
}
