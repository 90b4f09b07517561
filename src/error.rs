//! Error types for configlint operations.
//!
//! This module defines [`ConfigLintError`], the error type returned by
//! discovery construction and the CLI glue, and a [`Result`] type alias.
//!
//! # Error Handling Strategy
//!
//! - Construction of the discovery model is all-or-nothing: any missing
//!   file, malformed YAML or malformed template aborts the run
//! - Lint rules never fail; degenerate input yields no diagnostics
//! - Use `anyhow::Error` (via `ConfigLintError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for configlint operations.
#[derive(Debug, Error)]
pub enum ConfigLintError {
    /// An expected file or directory is missing.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// A value file (or rendered template skeleton) is not valid YAML.
    #[error("Failed to parse {path}{}: {message}", line_suffix(.line))]
    Parse {
        path: String,
        line: Option<usize>,
        message: String,
    },

    /// A template has malformed syntax.
    #[error("Failed to parse template {path}{}: {message}", line_suffix(.line))]
    TemplateParse {
        path: String,
        line: Option<usize>,
        message: String,
    },

    /// Rendering a template with zero values did not produce valid YAML.
    #[error("Failed to render template {path}{}: {message}{}", line_suffix(.line), context_suffix(.context))]
    TemplateRender {
        path: String,
        line: Option<usize>,
        /// Offending line with one line of context on each side.
        context: Vec<String>,
        message: String,
    },

    /// A file does not carry the suffix its location requires.
    #[error("Given file is not a {expected}: {path}")]
    InvalidFile { path: String, expected: String },

    /// The settings file could not be read or parsed.
    #[error("Invalid settings in {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },

    /// A rule filter is not a valid regular expression.
    #[error("Invalid rule filter '{pattern}': {message}")]
    InvalidFilter { pattern: String, message: String },

    /// IO error annotated with the path that triggered it.
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

fn context_suffix(context: &[String]) -> String {
    if context.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for line in context {
        out.push_str("\n> ");
        out.push_str(line);
    }
    out
}

/// Result type alias for configlint operations.
pub type Result<T> = std::result::Result<T, ConfigLintError>;
