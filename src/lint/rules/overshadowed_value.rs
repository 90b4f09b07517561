//! Over-broad base value detection.
//!
//! A base value that most installations override is not really a default.

use tracing::debug;

use crate::discovery::Discovery;
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};
use crate::settings::DEFAULT_OVERSHADOW_THRESHOLD;

/// Detects base values overridden by (nearly) every installation.
pub struct OvershadowedConfigValueRule {
    threshold: f64,
}

impl OvershadowedConfigValueRule {
    /// Suggest at or above `threshold` (share of installations overriding).
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for OvershadowedConfigValueRule {
    fn default() -> Self {
        Self::new(DEFAULT_OVERSHADOW_THRESHOLD)
    }
}

impl LintRule for OvershadowedConfigValueRule {
    fn id(&self) -> RuleId {
        RuleId::new("overshadowed-config-value")
    }

    fn name(&self) -> &str {
        "Overshadowed Config Value"
    }

    fn description(&self) -> &str {
        "Detects base config values overridden by most installations"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        let installations = discovery.installations().len();
        if installations < 2 {
            debug!("Skipping overshadow check: {} installation(s)", installations);
            return Vec::new();
        }

        let config = discovery.config();
        let mut diagnostics = Vec::new();

        for (path, value) in &config.paths {
            let overshadowed = value.overshadowed_by.len();
            let severity = if overshadowed == installations {
                Severity::Error
            } else if overshadowed as f64 / installations as f64 >= self.threshold {
                Severity::Suggestion
            } else {
                continue;
            };

            diagnostics.push(
                LintDiagnostic::new(
                    self.id(),
                    severity,
                    &config.filepath,
                    path,
                    format!(
                        "is overshadowed by {}/{} installations",
                        overshadowed, installations
                    ),
                )
                .with_description(format!(
                    "Consider removing it from {} and setting it in the installations that need it.",
                    config.filepath
                )),
            );
        }

        diagnostics
    }
}
