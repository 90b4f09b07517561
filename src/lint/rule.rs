//! Lint rule definitions.
//!
//! This module provides the core traits and types for defining lint rules:
//!
//! - [`LintRule`] - The trait that all lint rules must implement
//! - [`RuleId`] - Stable identifier used for filtering and disabling
//! - [`Severity`] - Severity level for diagnostics (Suggestion, Error)

use serde::Serialize;

use super::diagnostic::LintDiagnostic;
use crate::discovery::Discovery;

/// Unique identifier for a lint rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub String);

impl RuleId {
    /// Create a new rule ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity level for lint diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The layout works but could be simpler.
    Suggestion,
    /// Dead, redundant or dangling configuration.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Suggestion => write!(f, "suggestion"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A consistency check over a finished [`Discovery`].
///
/// Rules are pure: they read the model and return diagnostics, never fail,
/// and never depend on each other. Degenerate input (no installations, no
/// apps) yields an empty result.
pub trait LintRule: Send + Sync {
    /// Unique identifier for this rule.
    fn id(&self) -> RuleId;

    /// Human-readable name of the rule.
    fn name(&self) -> &str;

    /// Description of what this rule checks.
    fn description(&self) -> &str;

    /// Most severe level this rule reports.
    fn default_severity(&self) -> Severity;

    /// Inspect the model and return any diagnostics.
    fn check(&self, discovery: &Discovery) -> Vec<LintDiagnostic>;
}
