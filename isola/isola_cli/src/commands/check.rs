//! The check command
//!
//! Loads a program and its configuration, runs every isola check over it and
//! reports the diagnostics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use isola_check::{CheckSummary, DiagnosticCollector, IsolationChecker, LoggingSink};
use isola_core::types::{Diagnostic, Program};
use isola_core::utils::{CheckerConfig, ConfigOverrides};
use serde::Serialize;
use tracing::info;

/// Output format of the check command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per diagnostic followed by a summary line
    Text,

    /// A single JSON report
    Json,
}

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Path to the program JSON file
    pub program: PathBuf,

    /// Path to a TOML configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Number of worker threads; overrides the configuration
    #[clap(long)]
    pub jobs: Option<usize>,

    /// Maximum number of diagnostics to report; overrides the configuration
    #[clap(long)]
    pub max_diagnostics: Option<usize>,

    /// Report implied and implicit conformance problems as errors and
    /// diagnose lenient global-actor references from legacy code
    #[clap(long)]
    pub strict: bool,
}

/// The JSON report of a check run
#[derive(Serialize)]
struct Report<'a> {
    program: String,
    checked_at: String,
    summary: CheckSummary,
    dropped: usize,
    diagnostics: &'a [Diagnostic],
}

/// Build the configuration from the file and the command-line overrides.
fn resolve_config(args: &CheckArgs) -> Result<CheckerConfig> {
    let mut config = CheckerConfig::load(args.config.as_deref())
        .with_context(|| "Failed to load configuration")?;

    let strict = args.strict.then_some(false);
    config.merge(ConfigOverrides {
        global_actor_unsafe_leniency: strict,
        relaxed_legacy_conformances: strict,
        max_diagnostics: args.max_diagnostics,
        jobs: args.jobs,
        ..ConfigOverrides::default()
    });

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Implementation of the check command
///
/// Returns `true` when the program has no errors.
pub fn execute_check(args: &CheckArgs) -> Result<bool> {
    let config = resolve_config(args)?;
    let program = Program::load(&args.program)
        .with_context(|| format!("Failed to load program {}", args.program.display()))?;
    info!(
        "Loaded {} with {} declarations",
        args.program.display(),
        program.decl_count()
    );

    let collector = Arc::new(DiagnosticCollector::with_limit(config.max_diagnostics));
    let sink = Arc::new(LoggingSink::new(collector.clone()));
    let checker = IsolationChecker::new(&program, sink, config);
    let summary = checker.check_program();
    let diagnostics = collector.sorted();

    match args.format {
        OutputFormat::Text => {
            for diagnostic in &diagnostics {
                println!("{}: {}", args.program.display(), diagnostic);
            }
            if collector.dropped() > 0 {
                println!("... {} more diagnostic(s) not shown", collector.dropped());
            }
            println!(
                "{} error(s), {} warning(s), {} note(s) in {} declaration(s) and {} conformance(s)",
                summary.errors,
                summary.warnings,
                summary.notes,
                summary.decls_visited,
                summary.conformances_checked
            );
        }
        OutputFormat::Json => {
            let report = Report {
                program: args.program.display().to_string(),
                checked_at: Utc::now().to_rfc3339(),
                summary,
                dropped: collector.dropped(),
                diagnostics: &diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(!summary.has_errors())
}
