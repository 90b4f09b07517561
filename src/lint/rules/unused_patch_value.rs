//! Unused installation override detection.

use tracing::debug;

use crate::discovery::Discovery;
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};
use crate::settings::DEFAULT_PATCH_USAGE_THRESHOLD;

/// Detects override values no template of the installation reads, or that
/// only a small share of the installation's apps read.
pub struct UnusedConfigPatchValueRule {
    threshold: f64,
}

impl UnusedConfigPatchValueRule {
    /// Suggest when consuming apps / active apps is at or below `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for UnusedConfigPatchValueRule {
    fn default() -> Self {
        Self::new(DEFAULT_PATCH_USAGE_THRESHOLD)
    }
}

impl LintRule for UnusedConfigPatchValueRule {
    fn id(&self) -> RuleId {
        RuleId::new("unused-config-patch-value")
    }

    fn name(&self) -> &str {
        "Unused Config Patch Value"
    }

    fn description(&self) -> &str {
        "Detects installation override values that no app, or very few apps, consume"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        let mut diagnostics = Vec::new();

        for patch in discovery.config_patches() {
            let Some(installation) = patch.installation.as_deref() else {
                continue;
            };
            let active = discovery.apps_for(installation).len();
            if active == 0 {
                debug!("Skipping {}: no apps in {}", patch.filepath, installation);
                continue;
            }

            for (path, value) in &patch.paths {
                let consumers = discovery.consumer_apps(&value.used_by).len();
                if consumers == 0 {
                    diagnostics.push(
                        LintDiagnostic::new(
                            self.id(),
                            Severity::Error,
                            &patch.filepath,
                            path,
                            "is unused",
                        )
                        .with_description(format!(
                            "No template of {} reads it; consider removing it.",
                            installation
                        )),
                    );
                } else if consumers as f64 / active as f64 <= self.threshold {
                    diagnostics.push(
                        LintDiagnostic::new(
                            self.id(),
                            Severity::Suggestion,
                            &patch.filepath,
                            path,
                            format!("is used by {}/{} apps", consumers, active),
                        )
                        .with_description(
                            "Consider moving it into the template patches of the apps that use it.",
                        ),
                    );
                }
            }
        }

        diagnostics
    }
}
