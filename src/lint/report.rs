//! Aggregate report over every rule's diagnostics.

use super::diagnostic::LintDiagnostic;
use super::rule::Severity;

/// How a [`Report`] selects and truncates diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Drop suggestions entirely.
    pub only_errors: bool,
    /// Maximum number of diagnostics shown; 0 shows everything.
    pub max_messages: usize,
    /// Suggestions fail the run too.
    pub strict: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            only_errors: false,
            max_messages: crate::settings::DEFAULT_MAX_MESSAGES,
            strict: false,
        }
    }
}

/// Sorted, filtered diagnostics plus the counts the summary needs.
#[derive(Debug, Clone)]
pub struct Report {
    diagnostics: Vec<LintDiagnostic>,
    shown: usize,
    strict: bool,
}

impl Report {
    pub fn new(mut diagnostics: Vec<LintDiagnostic>, options: &ReportOptions) -> Self {
        if options.only_errors {
            diagnostics.retain(LintDiagnostic::is_error);
        }
        diagnostics.sort_by(LintDiagnostic::report_order);

        let shown = match options.max_messages {
            0 => diagnostics.len(),
            max => max.min(diagnostics.len()),
        };

        Self {
            diagnostics,
            shown,
            strict: options.strict,
        }
    }

    /// Diagnostics to print, after truncation.
    pub fn shown(&self) -> &[LintDiagnostic] {
        &self.diagnostics[..self.shown]
    }

    /// Every selected diagnostic, ignoring truncation.
    pub fn diagnostics(&self) -> &[LintDiagnostic] {
        &self.diagnostics
    }

    /// Number of diagnostics cut by `max_messages`.
    pub fn hidden(&self) -> usize {
        self.diagnostics.len() - self.shown
    }

    pub fn total(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn suggestions(&self) -> usize {
        self.count(Severity::Suggestion)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Whether the run should fail.
    pub fn fails(&self) -> bool {
        self.errors() > 0 || (self.strict && self.suggestions() > 0)
    }

    /// 0 on success, 1 when issues fail the run.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.fails())
    }
}
