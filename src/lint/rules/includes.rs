//! Include graph checks: dangling `include` calls and orphaned fragments.

use std::collections::BTreeSet;

use crate::discovery::Discovery;
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};

/// Detects `include` calls naming a fragment that does not exist.
pub struct MissingIncludeRule;

impl LintRule for MissingIncludeRule {
    fn id(&self) -> RuleId {
        RuleId::new("missing-include")
    }

    fn name(&self) -> &str {
        "Missing Include"
    }

    fn description(&self) -> &str {
        "Detects templates that include a non-existent include file"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        let mut diagnostics = Vec::new();
        for (_, template) in discovery.templates() {
            for include in &template.includes {
                if discovery.include(include).is_none() {
                    diagnostics.push(
                        LintDiagnostic::file_level(
                            self.id(),
                            Severity::Error,
                            &template.filepath,
                            format!("includes missing file {}", include),
                        )
                        .with_description(format!(
                            "Create {} or remove the include call.",
                            include
                        )),
                    );
                }
            }
        }
        diagnostics
    }
}

/// Detects include fragments no template or other include pulls in.
pub struct UnusedIncludeRule;

impl LintRule for UnusedIncludeRule {
    fn id(&self) -> RuleId {
        RuleId::new("unused-include")
    }

    fn name(&self) -> &str {
        "Unused Include"
    }

    fn description(&self) -> &str {
        "Detects include files never referenced by a template or another include"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        // A fragment including itself does not make it reachable.
        let referenced: BTreeSet<&str> = discovery
            .templates()
            .flat_map(|(_, template)| {
                template
                    .includes
                    .iter()
                    .filter(move |include| **include != template.filepath)
                    .map(String::as_str)
            })
            .collect();

        discovery
            .includes()
            .filter(|(filepath, _)| !referenced.contains(filepath))
            .map(|(filepath, _)| {
                LintDiagnostic::file_level(
                    self.id(),
                    Severity::Error,
                    filepath,
                    "is never included",
                )
                .with_description("Remove the file or include it from a template.")
            })
            .collect()
    }
}
