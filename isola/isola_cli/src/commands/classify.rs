//! The classify command
//!
//! Shows how references to a declaration are restricted and which isolation
//! domain the declaration itself runs in.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use isola_check::{ActorIsolationRestriction, ProgramIsolationResolver};
use isola_core::id::DeclId;
use isola_core::traits::IsolationResolver;
use isola_core::types::{ActorIsolation, ConcreteDeclRef, Program};
use serde_json::json;

/// Arguments for the classify command
#[derive(Args)]
pub struct ClassifyArgs {
    /// Path to the program JSON file
    pub program: PathBuf,

    /// Declaration name, or index such as `3` or `decl#3`
    pub decl: String,

    /// Print the classification as JSON
    #[clap(long)]
    pub json: bool,
}

/// Find a declaration by index or by name.
fn resolve_decl(program: &Program, name: &str) -> Result<DeclId> {
    if let Ok(id) = name.parse::<DeclId>() {
        program.try_decl(id)?;
        return Ok(id);
    }
    program
        .find_decl(name)
        .ok_or_else(|| anyhow!("No declaration named '{}'", name))
}

/// Spell a restriction with declaration names instead of indices.
fn describe_restriction(program: &Program, restriction: &ActorIsolationRestriction) -> String {
    match restriction {
        ActorIsolationRestriction::ActorSelf { actor }
        | ActorIsolationRestriction::CrossActorSelf { actor } => {
            format!("{}({})", restriction.kind(), program.decl(*actor).name)
        }
        ActorIsolationRestriction::GlobalActor { actor }
        | ActorIsolationRestriction::GlobalActorUnsafe { actor } => {
            format!("{}({})", restriction.kind(), program.type_name(actor))
        }
        _ => restriction.kind().to_string(),
    }
}

/// Spell an isolation with declaration names instead of indices.
fn describe_isolation(program: &Program, isolation: &ActorIsolation) -> String {
    match isolation {
        ActorIsolation::ActorInstance { actor } => {
            format!("actor-instance({})", program.decl(*actor).name)
        }
        ActorIsolation::GlobalActor { actor } => {
            format!("global-actor({})", program.type_name(actor))
        }
        ActorIsolation::GlobalActorUnsafe { actor } => {
            format!("global-actor-unsafe({})", program.type_name(actor))
        }
        other => other.to_string(),
    }
}

/// Implementation of the classify command
pub fn execute_classify(args: &ClassifyArgs) -> Result<()> {
    let program = Program::load(&args.program)
        .with_context(|| format!("Failed to load program {}", args.program.display()))?;
    let id = resolve_decl(&program, &args.decl)?;
    let decl = program.decl(id);

    let restriction = ActorIsolationRestriction::for_declaration(&ConcreteDeclRef::new(id), &program);
    let isolation = ProgramIsolationResolver::new(&program).isolation_of_decl(id);

    if args.json {
        let output = json!({
            "decl": id.index(),
            "name": decl.name,
            "kind": decl.kind.describe(),
            "restriction": restriction,
            "cross_actor": restriction.is_cross_actor(),
            "isolation": isolation,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} '{}' ({})", decl.kind.describe(), decl.name, id);
        println!("  restriction: {}", describe_restriction(&program, &restriction));
        println!("  cross-actor: {}", restriction.is_cross_actor());
        println!("  isolation:   {}", describe_isolation(&program, &isolation));
    }
    Ok(())
}
