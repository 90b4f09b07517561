//! Duplicate base value detection.
//!
//! An installation override that sets a path to exactly the value the base
//! config already has changes nothing and only adds noise.

use crate::discovery::Discovery;
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};

/// Detects override values equal to the base value they redefine.
pub struct DuplicateConfigValueRule;

impl LintRule for DuplicateConfigValueRule {
    fn id(&self) -> RuleId {
        RuleId::new("duplicate-config-value")
    }

    fn name(&self) -> &str {
        "Duplicate Config Value"
    }

    fn description(&self) -> &str {
        "Detects installation overrides that repeat the base config value"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        let config = discovery.config();
        let mut diagnostics = Vec::new();

        for (path, base) in &config.paths {
            for id in &base.overshadowed_by {
                let patch = discovery.value_file(*id);
                let Some(patched) = patch.paths.get(path) else {
                    continue;
                };
                if patched.value == base.value {
                    diagnostics.push(
                        LintDiagnostic::new(
                            self.id(),
                            Severity::Error,
                            &patch.filepath,
                            path,
                            format!("is a duplicate of the same path in {}", config.filepath),
                        )
                        .with_description(
                            "Remove it from the override; the base value already applies.",
                        ),
                    );
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::rules::fixtures::{discover, repo, with_installation};

    #[test]
    fn detects_equal_override() {
        let fs = with_installation(repo("a: 1\nb: 2\n"), "gauss", "a: 1\nb: 99\n", "");
        let diagnostics = DuplicateConfigValueRule.check(&discover(&fs));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].source_file, "installations/gauss/config.yaml.patch");
        assert_eq!(diagnostics[0].path, "a");
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn removing_the_override_removes_the_diagnostic() {
        let fs = with_installation(repo("a: 1\n"), "gauss", "{}\n", "");
        assert!(DuplicateConfigValueRule.check(&discover(&fs)).is_empty());
    }

    #[test]
    fn reports_once_per_installation() {
        let fs = with_installation(repo("a: 1\n"), "gauss", "a: 1\n", "");
        let fs = with_installation(fs, "kvm", "a: 1\n", "");
        let diagnostics = DuplicateConfigValueRule.check(&discover(&fs));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn compares_structurally() {
        let fs = with_installation(
            repo("a: []\nb: 1\nc: \"1\"\n"),
            "gauss",
            "a: []\nb: 1.0\nc: 1\n",
            "",
        );
        let diagnostics = DuplicateConfigValueRule.check(&discover(&fs));
        let paths: Vec<&str> = diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["a"]);
    }

    #[test]
    fn nan_override_is_a_duplicate() {
        let fs = with_installation(repo("x: .nan\n"), "gauss", "x: .nan\n", "");
        let diagnostics = DuplicateConfigValueRule.check(&discover(&fs));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "x");
    }
}
