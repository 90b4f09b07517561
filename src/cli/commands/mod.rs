//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations (`configlint lint`,
//! `configlint rules`, `configlint completions`).

pub mod completions;
pub mod dispatcher;
pub mod lint;
pub mod rules;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
