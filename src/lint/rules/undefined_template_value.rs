//! Dangling template reference detection.

use crate::discovery::{Discovery, TemplateKind};
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};

/// Detects template references that some installation cannot supply.
///
/// Emits one diagnostic per (template, path), listing every installation
/// that has no layer defining the path. Values referenced from an include
/// are reported on the include file itself.
pub struct UndefinedTemplateValueRule;

impl LintRule for UndefinedTemplateValueRule {
    fn id(&self) -> RuleId {
        RuleId::new("undefined-template-value")
    }

    fn name(&self) -> &str {
        "Undefined Template Value"
    }

    fn description(&self) -> &str {
        "Detects template values that are not defined for every installation"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        let mut diagnostics = Vec::new();

        for (_, template) in discovery.templates() {
            for (path, value) in &template.values {
                if !value.may_be_missing() {
                    continue;
                }
                let installations: Vec<&str> =
                    value.missing_in.iter().map(String::as_str).collect();

                diagnostics.push(
                    LintDiagnostic::new(
                        self.id(),
                        Severity::Error,
                        &template.filepath,
                        path,
                        format!(
                            "is undefined for installation(s): {}",
                            installations.join(", ")
                        ),
                    )
                    .with_description(remediation(template.kind)),
                );
            }
        }

        diagnostics
    }
}

fn remediation(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::ConfigMap | TemplateKind::ConfigMapPatch => {
            "Define it in default/config.yaml or in each listed installation's config.yaml.patch."
        }
        TemplateKind::Secret | TemplateKind::SecretPatch => {
            "Define it in each listed installation's secret.yaml."
        }
        TemplateKind::Include => {
            "Define it for every template that includes this file, or stop referencing it."
        }
    }
}
