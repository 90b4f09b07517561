//! The `configlint rules` command lists the built-in lint rules.

use crate::error::Result;
use crate::lint::RuleRegistry;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The rules command implementation.
pub struct RulesCommand;

impl RulesCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RulesCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for RulesCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let registry = RuleRegistry::with_builtins();
        let width = registry
            .iter()
            .map(|rule| rule.id().as_str().len())
            .max()
            .unwrap_or(0);

        for rule in registry.iter() {
            ui.message(&format!(
                "{:<width$}  {:<10}  {}",
                rule.id().as_str(),
                rule.default_severity().to_string(),
                rule.description(),
                width = width
            ));
        }
        Ok(CommandResult::success())
    }
}
