//! JSON output formatter.
//!
//! Formats lint diagnostics as machine-readable JSON for tooling integration.

use std::io::Write;

use serde::Serialize;

use super::LintFormatter;
use crate::lint::{Report, Severity};

/// Formats lint output as JSON.
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    rule_id: &'a str,
    severity: Severity,
    file: &'a str,
    path: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    errors: usize,
    suggestions: usize,
    #[serde(skip_serializing_if = "is_zero")]
    hidden: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl JsonFormatter {
    /// Create a new JSON formatter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl LintFormatter for JsonFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        let diagnostics = report
            .shown()
            .iter()
            .map(|d| JsonDiagnostic {
                rule_id: d.rule_id.as_str(),
                severity: d.severity,
                file: &d.source_file,
                path: &d.path,
                message: &d.message,
                description: d.description.as_deref(),
            })
            .collect();

        let output = JsonOutput {
            diagnostics,
            summary: JsonSummary {
                total: report.total(),
                errors: report.errors(),
                suggestions: report.suggestions(),
                hidden: report.hidden(),
            },
        };

        serde_json::to_writer_pretty(&mut *writer, &output).map_err(std::io::Error::other)?;
        writeln!(writer)?;

        Ok(())
    }
}
