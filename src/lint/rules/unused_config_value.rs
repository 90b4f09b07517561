//! Under-used base value detection.

use std::collections::BTreeSet;

use tracing::debug;

use crate::discovery::Discovery;
use crate::layout;
use crate::lint::{LintDiagnostic, LintRule, RuleId, Severity};

/// Detects base values no app consumes, or only one app consumes.
///
/// A value overridden by an installation is still "used" when the
/// installation's templates read the override, so consumers are counted
/// across the base path and every override that redefines it.
pub struct UnusedConfigValueRule;

impl LintRule for UnusedConfigValueRule {
    fn id(&self) -> RuleId {
        RuleId::new("unused-config-value")
    }

    fn name(&self) -> &str {
        "Unused Config Value"
    }

    fn description(&self) -> &str {
        "Detects base config values consumed by no app or by a single app"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        if discovery.installations().is_empty() || discovery.apps().is_empty() {
            debug!("Skipping config usage check: no installations or apps");
            return Vec::new();
        }

        let config = discovery.config();
        let mut diagnostics = Vec::new();

        for (path, base) in &config.paths {
            let mut consumers: BTreeSet<&str> = discovery.consumer_apps(&base.used_by);
            for id in &base.overshadowed_by {
                if let Some(patched) = discovery.value_file(*id).paths.get(path) {
                    consumers.extend(discovery.consumer_apps(&patched.used_by));
                }
            }

            let mut apps = consumers.into_iter();
            match (apps.next(), apps.next()) {
                (None, _) => diagnostics.push(
                    LintDiagnostic::new(self.id(), Severity::Error, &config.filepath, path, "is unused")
                        .with_description("No app template reads it; consider removing it."),
                ),
                (Some(app), None) => diagnostics.push(
                    LintDiagnostic::new(
                        self.id(),
                        Severity::Suggestion,
                        &config.filepath,
                        path,
                        format!("is used by just one app: {}", app),
                    )
                    .with_description(format!(
                        "Consider moving it into {}.",
                        layout::app_template_path(app)
                    )),
                ),
                _ => {}
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::rules::fixtures::{discover, repo, with_app, with_installation};

    #[test]
    fn unused_base_value_is_an_error() {
        let fs = with_installation(repo("a: 1\nb: 2\n"), "gauss", "{}\n", "");
        let fs = with_app(fs, "foo", "a: {{ .a }}\n");
        let fs = with_app(fs, "bar", "a: {{ .a }}\n");
        let diagnostics = UnusedConfigValueRule.check(&discover(&fs));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "b");
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn single_consumer_is_a_suggestion() {
        let fs = with_installation(repo("a: 1\n"), "gauss", "{}\n", "");
        let fs = with_app(fs, "foo", "a: {{ .a }}\n");
        let fs = with_app(fs, "bar", "b: 1\n");
        let diagnostics = UnusedConfigValueRule.check(&discover(&fs));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Suggestion);
        assert_eq!(diagnostics[0].message, "is used by just one app: foo");
        assert_eq!(
            diagnostics[0].description.as_deref(),
            Some("Consider moving it into default/apps/foo/configmap-values.yaml.template.")
        );
    }

    #[test]
    fn override_consumers_count_for_the_base_value() {
        // gauss overrides `a`, so its templates resolve to the override;
        // kvm still reads the base value.
        let fs = with_installation(repo("a: 1\n"), "gauss", "a: 2\n", "");
        let fs = with_installation(fs, "kvm", "{}\n", "");
        let fs = with_app(fs, "foo", "a: {{ .a }}\n");
        let fs = with_app(fs, "bar", "a: {{ .a }}\n");
        assert!(UnusedConfigValueRule.check(&discover(&fs)).is_empty());
    }

    #[test]
    fn fully_overridden_value_is_still_consumed() {
        let fs = with_installation(repo("a: 1\n"), "gauss", "a: 2\n", "");
        let fs = with_app(fs, "foo", "a: {{ .a }}\n");
        let diagnostics = UnusedConfigValueRule.check(&discover(&fs));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Suggestion);
    }

    #[test]
    fn no_apps_means_no_diagnostics() {
        let fs = with_installation(repo("a: 1\n"), "gauss", "{}\n", "");
        assert!(UnusedConfigValueRule.check(&discover(&fs)).is_empty());
    }
}
