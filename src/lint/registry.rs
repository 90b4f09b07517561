//! Rule registry for managing lint rules.
//!
//! The [`RuleRegistry`] stores all available lint rules keyed by id and
//! provides methods for registering, selecting, and running them.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, info};

use super::diagnostic::LintDiagnostic;
use super::rule::{LintRule, RuleId};
use super::rules::{
    DuplicateConfigValueRule, MissingIncludeRule, OvershadowedConfigValueRule,
    UndefinedTemplateValueRule, UnusedConfigPatchValueRule, UnusedConfigValueRule,
    UnusedIncludeRule, UnusedSecretValueRule,
};
use crate::discovery::Discovery;
use crate::error::{ConfigLintError, Result};
use crate::settings::Settings;

/// Registry of all available lint rules.
pub struct RuleRegistry {
    rules: BTreeMap<RuleId, Box<dyn LintRule>>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Create a registry with all built-in rules at their default thresholds.
    pub fn with_builtins() -> Self {
        Self::from_settings(&Settings::default())
    }

    /// Create a registry with all built-in rules, tuned and trimmed by
    /// `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DuplicateConfigValueRule));
        registry.register(Box::new(OvershadowedConfigValueRule::new(
            settings.overshadow_threshold,
        )));
        registry.register(Box::new(UnusedConfigPatchValueRule::new(
            settings.patch_usage_threshold,
        )));
        registry.register(Box::new(UnusedConfigValueRule));
        registry.register(Box::new(UnusedSecretValueRule));
        registry.register(Box::new(UndefinedTemplateValueRule));
        registry.register(Box::new(MissingIncludeRule));
        registry.register(Box::new(UnusedIncludeRule));

        for id in &settings.disabled_rules {
            if !registry.disable(&RuleId::new(id.as_str())) {
                debug!("Ignoring unknown disabled rule '{}'", id);
            }
        }
        registry
    }

    /// Register a lint rule.
    pub fn register(&mut self, rule: Box<dyn LintRule>) {
        self.rules.insert(rule.id(), rule);
    }

    /// Remove a rule. Returns whether it was registered.
    pub fn disable(&mut self, id: &RuleId) -> bool {
        self.rules.remove(id).is_some()
    }

    /// Keep only the rules whose id matches `pattern`.
    pub fn filter(&mut self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|e| ConfigLintError::InvalidFilter {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.rules.retain(|id, _| regex.is_match(id.as_str()));
        debug!("Filter '{}' selected {} rule(s)", pattern, self.rules.len());
        Ok(())
    }

    /// Get a rule by ID.
    pub fn get(&self, id: &RuleId) -> Option<&dyn LintRule> {
        self.rules.get(id).map(|r| r.as_ref())
    }

    /// Iterate over all rules in id order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn LintRule> {
        self.rules.values().map(|r| r.as_ref())
    }

    /// Get the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and return the diagnostics in report order.
    pub fn run(&self, discovery: &Discovery) -> Vec<LintDiagnostic> {
        let mut diagnostics = Vec::new();
        for rule in self.iter() {
            let found = rule.check(discovery);
            debug!("{}: {} diagnostic(s)", rule.id(), found.len());
            diagnostics.extend(found);
        }
        diagnostics.sort_by(LintDiagnostic::report_order);
        info!(
            "Ran {} rule(s), {} diagnostic(s)",
            self.len(),
            diagnostics.len()
        );
        diagnostics
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
