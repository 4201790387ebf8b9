//! Utility types.
//!
//! Log levels for the `log_event!` macro and checker configuration.

pub mod config;
pub mod logging;

pub use config::{CheckerConfig, ConfigOverrides};
pub use logging::LogLevel;
