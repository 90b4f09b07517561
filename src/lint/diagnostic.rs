//! Lint diagnostic messages.
//!
//! A [`LintDiagnostic`] names the file and dotted path it is about, so the
//! report can be ordered and read without any source spans.

use std::cmp::Ordering;

use super::rule::{RuleId, Severity};

/// Path used by diagnostics about a whole file.
pub const FILE_LEVEL_PATH: &str = "*";

/// A diagnostic message produced by a lint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    /// The rule that produced this diagnostic.
    pub rule_id: RuleId,
    pub severity: Severity,
    /// Logical path of the file the diagnostic is about.
    pub source_file: String,
    /// Dotted value path, or [`FILE_LEVEL_PATH`].
    pub path: String,
    /// Short message following the path.
    pub message: String,
    /// Optional remediation hint.
    pub description: Option<String>,
}

impl LintDiagnostic {
    /// Create a new diagnostic.
    pub fn new(
        rule_id: RuleId,
        severity: Severity,
        source_file: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id,
            severity,
            source_file: source_file.into(),
            path: path.into(),
            message: message.into(),
            description: None,
        }
    }

    /// Create a diagnostic about a whole file.
    pub fn file_level(
        rule_id: RuleId,
        severity: Severity,
        source_file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(rule_id, severity, source_file, FILE_LEVEL_PATH, message)
    }

    /// Add a remediation hint.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Report order: errors first, then by file, then by path.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.source_file.cmp(&other.source_file))
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.message.cmp(&other.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(severity: Severity, file: &str, path: &str) -> LintDiagnostic {
        LintDiagnostic::new(RuleId::new("test-rule"), severity, file, path, "msg")
    }

    #[test]
    fn diagnostic_creation() {
        let diag = LintDiagnostic::new(
            RuleId::new("test-rule"),
            Severity::Error,
            "default/config.yaml",
            "a.b",
            "is unused",
        );

        assert_eq!(diag.rule_id, RuleId::new("test-rule"));
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.source_file, "default/config.yaml");
        assert_eq!(diag.path, "a.b");
        assert!(diag.description.is_none());
        assert!(diag.is_error());
    }

    #[test]
    fn diagnostic_with_description() {
        let diag = diag(Severity::Suggestion, "f", "p").with_description("Move it");
        assert_eq!(diag.description.as_deref(), Some("Move it"));
        assert!(!diag.is_error());
    }

    #[test]
    fn file_level_uses_wildcard_path() {
        let diag = LintDiagnostic::file_level(
            RuleId::new("unused-include"),
            Severity::Error,
            "include/x.yaml.template",
            "is never included",
        );
        assert_eq!(diag.path, FILE_LEVEL_PATH);
    }

    #[test]
    fn errors_sort_before_suggestions() {
        let mut diags = vec![
            diag(Severity::Suggestion, "a", "a"),
            diag(Severity::Error, "z", "z"),
        ];
        diags.sort_by(LintDiagnostic::report_order);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn equal_severity_sorts_by_file_then_path() {
        let mut diags = vec![
            diag(Severity::Error, "b", "a"),
            diag(Severity::Error, "a", "z"),
            diag(Severity::Error, "a", "b"),
        ];
        diags.sort_by(LintDiagnostic::report_order);
        let keys: Vec<(&str, &str)> = diags
            .iter()
            .map(|d| (d.source_file.as_str(), d.path.as_str()))
            .collect();
        assert_eq!(keys, vec![("a", "b"), ("a", "z"), ("b", "a")]);
    }
}
