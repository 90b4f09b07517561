//! Human-readable output formatter.
//!
//! Formats lint diagnostics for terminal display with optional color support.

use std::io::Write;

use super::LintFormatter;
use crate::lint::{LintDiagnostic, Report, Severity, FILE_LEVEL_PATH};
use crate::ui::Theme;

/// Formats lint output for human consumption.
pub struct HumanFormatter {
    /// Print the remediation hint under each diagnostic.
    pub show_descriptions: bool,
    /// Append ` [rule-id]` to each diagnostic.
    pub show_rule_names: bool,
    theme: Theme,
}

impl HumanFormatter {
    /// Create a new human formatter.
    pub fn new(use_color: bool) -> Self {
        Self {
            show_descriptions: true,
            show_rule_names: true,
            theme: if use_color { Theme::new() } else { Theme::plain() },
        }
    }

    pub fn with_descriptions(mut self, show: bool) -> Self {
        self.show_descriptions = show;
        self
    }

    pub fn with_rule_names(mut self, show: bool) -> Self {
        self.show_rule_names = show;
        self
    }

    fn write_diagnostic<W: Write>(
        &self,
        diag: &LintDiagnostic,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let style = match diag.severity {
            Severity::Error => &self.theme.error,
            Severity::Suggestion => &self.theme.suggestion,
        };
        let path = if diag.path == FILE_LEVEL_PATH {
            FILE_LEVEL_PATH.to_string()
        } else {
            format!(".{}", diag.path)
        };

        write!(
            writer,
            "{} {}",
            style.apply_to(format!("{}: {}", diag.source_file, path)),
            diag.message
        )?;
        if self.show_rule_names {
            write!(writer, " {}", self.theme.dim.apply_to(format!("[{}]", diag.rule_id)))?;
        }
        writeln!(writer)?;

        if self.show_descriptions {
            if let Some(ref description) = diag.description {
                writeln!(writer, "    {}", self.theme.dim.apply_to(description))?;
            }
        }
        Ok(())
    }
}

impl LintFormatter for HumanFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        for diag in report.shown() {
            self.write_diagnostic(diag, writer)?;
        }

        if report.hidden() > 0 {
            writeln!(writer)?;
            writeln!(
                writer,
                "{} more message(s) not shown; use --max-messages 0 to see all of them",
                report.hidden()
            )?;
        }

        if report.total() > 0 {
            writeln!(writer)?;
            writeln!(
                writer,
                "Found {} issue(s): {} error(s), {} suggestion(s)",
                report.total(),
                report.errors(),
                report.suggestions()
            )?;
        }

        Ok(())
    }
}
