//! Lint command implementation.
//!
//! The `configlint lint` command builds the discovery model for a repository
//! checkout and runs the lint rules over it.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::args::LintArgs;
use crate::discovery::Discovery;
use crate::error::Result;
use crate::fs::DiskFilesystem;
use crate::lint::{
    HumanFormatter, JsonFormatter, LintFormatter, OutputFormat, Report, ReportOptions,
    RuleRegistry,
};
use crate::settings::Settings;
use crate::template::FunctionRegistry;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The lint command implementation.
pub struct LintCommand {
    root: PathBuf,
    args: LintArgs,
}

impl LintCommand {
    /// Create a new lint command.
    pub fn new(root: &Path, args: LintArgs) -> Self {
        Self {
            root: root.to_path_buf(),
            args,
        }
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &LintArgs {
        &self.args
    }

    /// CLI flags win over the settings file.
    fn report_options(&self, settings: &Settings) -> ReportOptions {
        ReportOptions {
            only_errors: self.args.only_errors,
            max_messages: self.args.max_messages.unwrap_or(settings.max_messages),
            strict: self.args.strict,
        }
    }

    /// Format the report using the appropriate formatter.
    fn format_output(&self, report: &Report, use_color: bool) -> String {
        let mut output = Vec::new();

        match self.args.format {
            OutputFormat::Json => {
                JsonFormatter::new().format(report, &mut output).ok();
            }
            OutputFormat::Human => {
                let formatter = HumanFormatter::new(use_color)
                    .with_descriptions(!self.args.no_descriptions)
                    .with_rule_names(!self.args.no_rule_names);
                formatter.format(report, &mut output).ok();
            }
        }

        String::from_utf8(output).unwrap_or_default()
    }
}

impl Command for LintCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = Settings::discover(&self.root, self.args.settings.as_deref())?;

        let mut registry = RuleRegistry::from_settings(&settings);
        if let Some(ref pattern) = self.args.filter {
            registry.filter(pattern)?;
        }
        if registry.is_empty() {
            ui.warning("No lint rules selected");
        }

        info!("Linting {}", self.root.display());
        let fs = DiskFilesystem::new(&self.root);
        let functions = FunctionRegistry::standard();
        let discovery = match Discovery::new(&fs, &functions) {
            Ok(discovery) => discovery,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(2));
            }
        };

        let report = Report::new(registry.run(&discovery), &self.report_options(&settings));

        if report.total() == 0 && self.args.format == OutputFormat::Human {
            ui.success("No issues found");
        } else {
            let output = self.format_output(&report, ui.use_colors());
            ui.message(output.trim_end());
        }

        match report.exit_code() {
            0 => Ok(CommandResult::success()),
            code => Ok(CommandResult::failure(code)),
        }
    }
}
