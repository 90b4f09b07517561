//! configlint - Cross-reference linter for layered configuration repositories.
//!
//! A configuration repository holds a base config, per-installation
//! overrides and secrets, per-app value templates, per-installation template
//! patches, and shared include fragments. configlint loads all of them,
//! works out which layer supplies every value a template reads, and reports
//! dead, redundant, over-broad and dangling configuration.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`discovery`] - The cross-reference model and usage resolution
//! - [`error`] - Error types and result aliases
//! - [`fs`] - Filesystem abstraction over the repository checkout
//! - [`layout`] - The fixed directory convention
//! - [`lint`] - Lint rules, registry and report formatting
//! - [`settings`] - The optional `.configlint.yaml` settings file
//! - [`template`] - Template parsing and zero-value analysis
//! - [`ui`] - Terminal output
//! - [`values`] - YAML value flattening and dotted paths
//!
//! # Example
//!
//! ```
//! use configlint::discovery::Discovery;
//! use configlint::fs::MemoryFilesystem;
//! use configlint::lint::RuleRegistry;
//! use configlint::template::FunctionRegistry;
//!
//! let fs = MemoryFilesystem::new()
//!     .with_file("default/config.yaml", "a: 1\nb: 2\n")
//!     .with_file("default/apps/foo/configmap-values.yaml.template", "a: {{ .a }}\nb: {{ .b }}\n")
//!     .with_file("installations/gauss/config.yaml.patch", "a: 1\nb: 99\n")
//!     .with_file("installations/gauss/secret.yaml", "");
//!
//! let discovery = Discovery::new(&fs, &FunctionRegistry::standard()).unwrap();
//! let diagnostics = RuleRegistry::with_builtins().run(&discovery);
//!
//! let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].path, "a");
//! ```

pub mod cli;
pub mod discovery;
pub mod error;
pub mod fs;
pub mod layout;
pub mod lint;
pub mod settings;
pub mod template;
pub mod ui;
pub mod values;

pub use error::{ConfigLintError, Result};
