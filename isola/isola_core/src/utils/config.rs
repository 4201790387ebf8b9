//! Checker configuration.
//!
//! Handles loading and validating [`CheckerConfig`] and applying
//! [`ConfigOverrides`] on top of it. Configuration
//! files are TOML; every field has a default, so an empty file is valid.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};

/// Configuration of a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Whether references to lenient global-actor declarations from code with
    /// unspecified isolation go undiagnosed.
    #[serde(default = "default_true")]
    pub global_actor_unsafe_leniency: bool,

    /// Whether structs and enums without a declared conformance may be
    /// transferable when all their members are.
    #[serde(default = "default_true")]
    pub implicit_value_conformance: bool,

    /// Whether implied and implicit conformance problems are warnings rather
    /// than errors.
    #[serde(default = "default_true")]
    pub relaxed_legacy_conformances: bool,

    /// Whether to suggest `async` / `@asyncHandler` after a synchronous call
    /// is treated as asynchronous.
    #[serde(default = "default_true")]
    pub suggest_async_notes: bool,

    /// Maximum number of diagnostics to keep; further diagnostics are counted
    /// but dropped.
    #[serde(default)]
    pub max_diagnostics: Option<usize>,

    /// Number of worker threads used by the whole-program driver.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_true() -> bool {
    true
}

fn default_jobs() -> usize {
    1
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            global_actor_unsafe_leniency: default_true(),
            implicit_value_conformance: default_true(),
            relaxed_legacy_conformances: default_true(),
            suggest_async_notes: default_true(),
            max_diagnostics: None,
            jobs: default_jobs(),
        }
    }
}

impl CheckerConfig {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CheckerConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or the defaults when no path is given.
    ///
    /// A path that does not exist is reported and the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No configuration file specified, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Configuration file not found: {}", path.display());
            return Ok(Self::default());
        }

        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::Invalid("jobs cannot be zero".to_string()));
        }

        if self.max_diagnostics == Some(0) {
            return Err(ConfigError::Invalid(
                "max_diagnostics cannot be zero".to_string(),
            ));
        }

        if !self.global_actor_unsafe_leniency {
            info!("Lenient global actor references from unspecified code will be diagnosed");
        }

        Ok(())
    }

    /// Apply overrides on top of this configuration.
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        if let Some(leniency) = overrides.global_actor_unsafe_leniency {
            self.global_actor_unsafe_leniency = leniency;
        }
        if let Some(implicit) = overrides.implicit_value_conformance {
            self.implicit_value_conformance = implicit;
        }
        if let Some(relaxed) = overrides.relaxed_legacy_conformances {
            self.relaxed_legacy_conformances = relaxed;
        }
        if let Some(notes) = overrides.suggest_async_notes {
            self.suggest_async_notes = notes;
        }
        if overrides.max_diagnostics.is_some() {
            self.max_diagnostics = overrides.max_diagnostics;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
    }
}

/// Settings that replace those of a loaded [`CheckerConfig`]; `None` keeps
/// the loaded value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    /// See [`CheckerConfig::global_actor_unsafe_leniency`].
    pub global_actor_unsafe_leniency: Option<bool>,

    /// See [`CheckerConfig::implicit_value_conformance`].
    pub implicit_value_conformance: Option<bool>,

    /// See [`CheckerConfig::relaxed_legacy_conformances`].
    pub relaxed_legacy_conformances: Option<bool>,

    /// See [`CheckerConfig::suggest_async_notes`].
    pub suggest_async_notes: Option<bool>,

    /// See [`CheckerConfig::max_diagnostics`].
    pub max_diagnostics: Option<usize>,

    /// See [`CheckerConfig::jobs`].
    pub jobs: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = CheckerConfig::load(None).unwrap();
        assert!(config.global_actor_unsafe_leniency);
        assert!(config.relaxed_legacy_conformances);
        assert_eq!(config.jobs, 1);
        assert_eq!(config.max_diagnostics, None);
    }

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "global_actor_unsafe_leniency = false\nmax_diagnostics = 50\njobs = 4"
        )
        .unwrap();

        let config = CheckerConfig::load(Some(file.path())).unwrap();
        assert!(!config.global_actor_unsafe_leniency);
        assert!(config.suggest_async_notes);
        assert_eq!(config.max_diagnostics, Some(50));
        assert_eq!(config.jobs, 4);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = CheckerConfig::load(Some(Path::new("/nonexistent/isola.toml"))).unwrap();
        assert_eq!(config, CheckerConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let result = CheckerConfig::from_toml_str("jobs = 0");
        assert!(matches!(
            result,
            Err(crate::Error::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_parse_error() {
        let result = CheckerConfig::from_toml_str("jobs = \"many\"");
        assert!(matches!(
            result,
            Err(crate::Error::Config(ConfigError::ParseFailed(_)))
        ));
    }

    #[test]
    fn test_merge() {
        let mut config = CheckerConfig::from_toml_str("suggest_async_notes = false\njobs = 2\n").unwrap();
        config.merge(ConfigOverrides {
            relaxed_legacy_conformances: Some(false),
            max_diagnostics: Some(10),
            ..ConfigOverrides::default()
        });

        // Values without an override survive.
        assert!(!config.suggest_async_notes);
        assert_eq!(config.jobs, 2);
        assert!(!config.relaxed_legacy_conformances);
        assert_eq!(config.max_diagnostics, Some(10));

        config.merge(ConfigOverrides {
            jobs: Some(0),
            ..ConfigOverrides::default()
        });
        assert!(config.validate().is_err());
    }
}
