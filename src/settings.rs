//! Linter settings file.
//!
//! An optional `.configlint.yaml` at the repository root tunes rule
//! thresholds and disables rules:
//!
//! ```yaml
//! overshadow_threshold: 0.75
//! patch_usage_threshold: 0.25
//! disabled_rules:
//!   - unused-include
//! max_messages: 50
//! ```
//!
//! Command line flags take precedence over the file, and the file over the
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigLintError, Result};

/// Default settings file name, relative to the repository root.
pub const SETTINGS_FILE: &str = ".configlint.yaml";

/// Share of installations overriding a base path that makes it over-broad.
pub const DEFAULT_OVERSHADOW_THRESHOLD: f64 = 0.75;
/// Share of an installation's apps at or below which an override is under-used.
pub const DEFAULT_PATCH_USAGE_THRESHOLD: f64 = 0.25;
pub const DEFAULT_MAX_MESSAGES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub overshadow_threshold: f64,
    pub patch_usage_threshold: f64,
    /// Rule ids that never run.
    pub disabled_rules: Vec<String>,
    /// Maximum number of printed messages; 0 prints everything.
    pub max_messages: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overshadow_threshold: DEFAULT_OVERSHADOW_THRESHOLD,
            patch_usage_threshold: DEFAULT_PATCH_USAGE_THRESHOLD,
            disabled_rules: Vec::new(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigLintError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// Load the explicit settings file if given, else `<root>/.configlint.yaml`
    /// when present, else the defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = root.join(SETTINGS_FILE);
                if !default.exists() {
                    debug!("No settings file at {}, using defaults", default.display());
                    return Ok(Self::default());
                }
                default
            }
        };
        debug!("Loading settings from {}", path.display());
        Self::load(&path)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        let settings: Settings = if content.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigLintError::Settings {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };
        settings.validate(path)?;
        Ok(settings)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (name, value) in [
            ("overshadow_threshold", self.overshadow_threshold),
            ("patch_usage_threshold", self.patch_usage_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigLintError::Settings {
                    path: path.to_path_buf(),
                    message: format!("{} must be between 0 and 1, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_thresholds() {
        let settings = Settings::default();
        assert_eq!(settings.overshadow_threshold, 0.75);
        assert_eq!(settings.patch_usage_threshold, 0.25);
        assert_eq!(settings.max_messages, 50);
        assert!(settings.disabled_rules.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings =
            Settings::parse(Path::new("s.yaml"), "disabled_rules: [unused-include]\n").unwrap();
        assert_eq!(settings.disabled_rules, vec!["unused-include".to_string()]);
        assert_eq!(settings.overshadow_threshold, 0.75);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Settings::parse(Path::new("s.yaml"), "overshadow: 0.5\n").unwrap_err();
        assert!(matches!(err, ConfigLintError::Settings { .. }));
    }

    #[test]
    fn thresholds_must_be_ratios() {
        let err = Settings::parse(Path::new("s.yaml"), "overshadow_threshold: 2\n").unwrap_err();
        assert!(err.to_string().contains("between 0 and 1"));
    }

    #[test]
    fn empty_file_is_default() {
        let settings = Settings::parse(Path::new("s.yaml"), "\n").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::discover(temp.path(), None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn discover_reads_root_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "max_messages: 5\n").unwrap();
        let settings = Settings::discover(temp.path(), None).unwrap();
        assert_eq!(settings.max_messages, 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        assert!(Settings::discover(temp.path(), Some(&missing)).is_err());
    }
}
