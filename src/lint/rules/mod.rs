//! Built-in lint rules.
//!
//! Every rule is a pure function of the discovery model. See
//! [`RuleRegistry::with_builtins`](super::RuleRegistry::with_builtins) for
//! the registered set.

pub mod duplicate_value;
pub mod includes;
pub mod overshadowed_value;
pub mod undefined_template_value;
pub mod unused_config_value;
pub mod unused_patch_value;
pub mod unused_secret_value;

pub use duplicate_value::DuplicateConfigValueRule;
pub use includes::{MissingIncludeRule, UnusedIncludeRule};
pub use overshadowed_value::OvershadowedConfigValueRule;
pub use undefined_template_value::UndefinedTemplateValueRule;
pub use unused_config_value::UnusedConfigValueRule;
pub use unused_patch_value::UnusedConfigPatchValueRule;
pub use unused_secret_value::UnusedSecretValueRule;
