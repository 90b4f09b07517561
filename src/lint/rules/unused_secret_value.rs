//! Unused secret value detection.

use crate::discovery::Discovery;
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};

/// Detects secret values no secret template of the installation reads.
pub struct UnusedSecretValueRule;

impl LintRule for UnusedSecretValueRule {
    fn id(&self) -> RuleId {
        RuleId::new("unused-secret-value")
    }

    fn name(&self) -> &str {
        "Unused Secret Value"
    }

    fn description(&self) -> &str {
        "Detects installation secret values that no secret template consumes"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        if discovery.apps().is_empty() {
            return Vec::new();
        }

        discovery
            .secrets()
            .flat_map(|secret| {
                secret
                    .paths
                    .iter()
                    .filter(|(_, value)| value.used_by.is_empty())
                    .map(move |(path, _)| {
                        LintDiagnostic::new(
                            self.id(),
                            Severity::Error,
                            &secret.filepath,
                            path,
                            "is unused",
                        )
                        .with_description("No secret template reads it; consider removing it.")
                    })
            })
            .collect()
    }
}
