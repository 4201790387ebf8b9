//! Diagnostic sinks.
//!
//! This module provides the sinks used by the driver, the CLI and tests:
//! an in-memory collector, a counting wrapper and a logging forwarder.

mod collector;
mod counting;
mod logging;

pub use collector::DiagnosticCollector;
pub use counting::{CountingSink, DiagnosticCounts};
pub use logging::LoggingSink;
