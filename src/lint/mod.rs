//! Cross-reference linting over a discovered configuration repository.
//!
//! This module provides the rule-based checks that run on a finished
//! [`Discovery`](crate::discovery::Discovery).
//!
//! # Overview
//!
//! The lint system consists of:
//!
//! - **Rules** - Individual consistency checks ([`LintRule`] trait)
//! - **Registry** - Collection of all available rules ([`RuleRegistry`])
//! - **Diagnostics** - Issue reports with severity and remediation hints ([`LintDiagnostic`])
//! - **Report** - Sorting, filtering and truncation for output ([`Report`])
//!
//! # Example
//!
//! ```
//! use configlint::lint::{RuleRegistry, RuleId, Severity};
//!
//! let registry = RuleRegistry::with_builtins();
//! assert!(registry.get(&RuleId::new("duplicate-config-value")).is_some());
//! assert!(registry.get(&RuleId::new("nonexistent")).is_none());
//!
//! // Errors rank above suggestions
//! assert!(Severity::Suggestion < Severity::Error);
//! ```

pub mod diagnostic;
pub mod output;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rules;

pub use diagnostic::{LintDiagnostic, FILE_LEVEL_PATH};
pub use output::{HumanFormatter, JsonFormatter, LintFormatter, OutputFormat};
pub use registry::RuleRegistry;
pub use report::{Report, ReportOptions};
pub use rule::{LintRule, RuleId, Severity};
pub use rules::{
    DuplicateConfigValueRule, MissingIncludeRule, OvershadowedConfigValueRule,
    UndefinedTemplateValueRule, UnusedConfigPatchValueRule, UnusedConfigValueRule,
    UnusedIncludeRule, UnusedSecretValueRule,
};
