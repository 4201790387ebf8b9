//! Log levels for checker events.
//!
//! [`crate::log_event!`] takes a [`LogLevel`]; diagnostics are logged at the
//! level their severity maps to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Severity;

/// Level of a checker event, ordered by increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-reference decisions.
    Trace,

    /// Per-declaration progress.
    Debug,

    /// Driver progress and notes.
    Info,

    /// Warnings.
    Warning,

    /// Errors.
    Error,
}

impl LogLevel {
    /// The `log` crate level to emit at.
    pub fn to_log_level(self) -> log::Level {
        match self {
            Self::Trace => log::Level::Trace,
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }

    /// The level a diagnostic of the given severity is logged at.
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Error,
            Severity::Warning => Self::Warning,
            Severity::Note => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_log_level())
    }
}
