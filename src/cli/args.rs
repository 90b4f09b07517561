//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::lint::OutputFormat;

/// configlint - Cross-reference linter for layered configuration repositories.
#[derive(Debug, Parser)]
#[command(name = "configlint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration repository checkout to lint
    #[arg(short, long, global = true, env = "CONFIGLINT_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lint the repository (default if no command specified)
    Lint(LintArgs),

    /// List the available lint rules
    Rules,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `lint` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LintArgs {
    /// Only run rules whose id matches this regular expression
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Only report errors
    #[arg(long)]
    pub only_errors: bool,

    /// Maximum number of messages to print (0 = unlimited)
    #[arg(long, value_name = "N")]
    pub max_messages: Option<usize>,

    /// Do not print remediation hints
    #[arg(long)]
    pub no_descriptions: bool,

    /// Do not print rule ids
    #[arg(long)]
    pub no_rule_names: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Treat suggestions as errors
    #[arg(long)]
    pub strict: bool,

    /// Settings file (default: <root>/.configlint.yaml)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["configlint"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn parses_lint_flags() {
        let cli = Cli::try_parse_from([
            "configlint",
            "--root",
            "/repo",
            "lint",
            "--filter",
            "^unused-",
            "--only-errors",
            "--max-messages",
            "0",
            "--no-descriptions",
            "--no-rule-names",
            "--format",
            "json",
            "--strict",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("/repo"));
        let Some(Commands::Lint(args)) = cli.command else {
            panic!("expected lint");
        };
        assert_eq!(args.filter.as_deref(), Some("^unused-"));
        assert!(args.only_errors);
        assert_eq!(args.max_messages, Some(0));
        assert!(args.no_descriptions);
        assert!(args.no_rule_names);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.strict);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["configlint", "lint", "--no-color", "--debug"]).unwrap();
        assert!(cli.no_color);
        assert!(cli.debug);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["configlint", "lint", "--format", "sarif"]).is_err());
    }

    #[test]
    fn parses_completions() {
        let cli = Cli::try_parse_from(["configlint", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions(CompletionsArgs { shell: Shell::Bash }))
        ));
    }
}
