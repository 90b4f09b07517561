//! Value files and template files held by the discovery arena.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::error::{ConfigLintError, Result};
use crate::layout;
use crate::template::{analyze_template, FunctionRegistry};
use crate::values::{extract_paths, is_descendant, Value};

/// Stable handle of a [`ValueFile`] inside a `Discovery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueFileId(pub(crate) usize);

/// Stable handle of a [`TemplateFile`] inside a `Discovery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(pub(crate) usize);

/// Role of a value file in the layering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFileKind {
    /// `default/config.yaml`
    Config,
    /// `installations/<i>/config.yaml.patch`
    ConfigPatch,
    /// `installations/<i>/secret.yaml`
    Secret,
}

impl fmt::Display for ValueFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueFileKind::Config => write!(f, "config"),
            ValueFileKind::ConfigPatch => write!(f, "config patch"),
            ValueFileKind::Secret => write!(f, "secret"),
        }
    }
}

/// One leaf value and its cross references.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePath {
    pub value: Value,
    /// Templates that consume this path.
    pub used_by: BTreeSet<TemplateId>,
    /// Override files redefining this path. Only set on the base config.
    pub overshadowed_by: BTreeSet<ValueFileId>,
}

impl ValuePath {
    fn new(value: Value) -> Self {
        Self {
            value,
            used_by: BTreeSet::new(),
            overshadowed_by: BTreeSet::new(),
        }
    }
}

/// A parsed YAML value file.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFile {
    pub filepath: String,
    pub installation: Option<String>,
    pub kind: ValueFileKind,
    pub paths: BTreeMap<String, ValuePath>,
}

impl ValueFile {
    pub fn new(filepath: &str, kind: ValueFileKind, body: &[u8]) -> Result<Self> {
        if !layout::is_value_file(filepath) {
            return Err(ConfigLintError::InvalidFile {
                path: filepath.to_string(),
                expected: "value file".to_string(),
            });
        }

        let paths = extract_paths(body).map_err(|e| ConfigLintError::Parse {
            path: filepath.to_string(),
            line: e.line,
            message: e.message,
        })?;
        debug!("Loaded {} ({} paths)", filepath, paths.len());

        Ok(Self {
            filepath: filepath.to_string(),
            installation: layout::identify(filepath).installation,
            kind,
            paths: paths
                .into_iter()
                .map(|(path, value)| (path, ValuePath::new(value)))
                .collect(),
        })
    }

    /// Leaf paths addressed by a reference: the path itself, or every leaf
    /// below it when the reference names an aggregate.
    pub fn resolve(&self, path: &str) -> Vec<String> {
        if self.paths.contains_key(path) {
            return vec![path.to_string()];
        }
        self.paths
            .range::<str, _>((std::ops::Bound::Excluded(path), std::ops::Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(path))
            .filter(|key| is_descendant(key, path))
            .cloned()
            .collect()
    }
}

/// Role of a template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// `default/apps/<a>/configmap-values.yaml.template`
    ConfigMap,
    /// `default/apps/<a>/secret-values.yaml.template`
    Secret,
    /// `installations/<i>/apps/<a>/configmap-values.yaml.patch`
    ConfigMapPatch,
    /// `installations/<i>/apps/<a>/secret-values.yaml.patch`
    SecretPatch,
    /// `include/<name>.yaml.template`
    Include,
}

impl TemplateKind {
    pub fn is_patch(self) -> bool {
        matches!(self, TemplateKind::ConfigMapPatch | TemplateKind::SecretPatch)
    }

    pub fn is_secret(self) -> bool {
        matches!(self, TemplateKind::Secret | TemplateKind::SecretPatch)
    }
}

/// One value path referenced by a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateValue {
    /// Number of textual references.
    pub occurrence_count: usize,
    /// Installations for which no layer supplies the path.
    pub missing_in: BTreeSet<String>,
}

impl TemplateValue {
    pub fn may_be_missing(&self) -> bool {
        !self.missing_in.is_empty()
    }
}

/// A parsed template file.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFile {
    pub filepath: String,
    pub installation: Option<String>,
    pub app: Option<String>,
    pub kind: TemplateKind,
    pub values: BTreeMap<String, TemplateValue>,
    /// Paths the zero-value skeleton defines outright.
    pub paths: BTreeSet<String>,
    pub includes: Vec<String>,
}

impl TemplateFile {
    pub fn new(
        filepath: &str,
        kind: TemplateKind,
        body: &[u8],
        functions: &FunctionRegistry,
    ) -> Result<Self> {
        if !layout::is_template_file(filepath) {
            return Err(ConfigLintError::InvalidFile {
                path: filepath.to_string(),
                expected: "template".to_string(),
            });
        }

        let analysis = analyze_template(filepath, body, functions)?;
        let identity = layout::identify(filepath);

        Ok(Self {
            filepath: filepath.to_string(),
            installation: identity.installation,
            app: identity.app,
            kind,
            values: analysis
                .values
                .into_iter()
                .map(|(path, count)| {
                    let value = TemplateValue {
                        occurrence_count: count,
                        missing_in: BTreeSet::new(),
                    };
                    (path, value)
                })
                .collect(),
            paths: analysis.paths,
            includes: analysis.includes,
        })
    }

    /// Whether the skeleton defines `path` (or leaves below it) outright.
    ///
    /// A key filled from a reference to the same path, as in
    /// `x: {{ .x }}`, is not a definition.
    pub fn supplies(&self, path: &str) -> bool {
        if self.values.contains_key(path) {
            return false;
        }
        self.paths.contains(path) || self.paths.iter().any(|p| is_descendant(p, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_file_records_installation() {
        let file = ValueFile::new(
            "installations/gauss/config.yaml.patch",
            ValueFileKind::ConfigPatch,
            b"a: 1\n",
        )
        .unwrap();
        assert_eq!(file.installation.as_deref(), Some("gauss"));
        assert_eq!(file.paths["a"].value, Value::Integer(1));
        assert!(file.paths["a"].used_by.is_empty());
    }

    #[test]
    fn value_file_rejects_wrong_suffix() {
        let err = ValueFile::new("default/config.json", ValueFileKind::Config, b"a: 1\n").unwrap_err();
        assert!(matches!(err, ConfigLintError::InvalidFile { .. }));
    }

    #[test]
    fn value_file_parse_error_names_file() {
        let err =
            ValueFile::new("default/config.yaml", ValueFileKind::Config, b"a: 1\nb: c: d\n")
                .unwrap_err();
        match err {
            ConfigLintError::Parse { path, .. } => assert_eq!(path, "default/config.yaml"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resolve_matches_leaf_or_descendants() {
        let file = ValueFile::new(
            "default/config.yaml",
            ValueFileKind::Config,
            b"registry:\n  domain: a\n  mirror: b\nregistryExtra: c\n",
        )
        .unwrap();
        assert_eq!(file.resolve("registry.domain"), vec!["registry.domain"]);
        assert_eq!(
            file.resolve("registry"),
            vec!["registry.domain", "registry.mirror"]
        );
        assert!(file.resolve("registr").is_empty());
        assert!(file.resolve("missing").is_empty());
    }

    #[test]
    fn template_file_records_identity_and_values() {
        let file = TemplateFile::new(
            "installations/gauss/apps/foo/configmap-values.yaml.patch",
            TemplateKind::ConfigMapPatch,
            b"a: {{ .a }}\nfixed: 1\n",
            &FunctionRegistry::standard(),
        )
        .unwrap();
        assert_eq!(file.installation.as_deref(), Some("gauss"));
        assert_eq!(file.app.as_deref(), Some("foo"));
        assert_eq!(file.values["a"].occurrence_count, 1);
        assert!(!file.values["a"].may_be_missing());
        assert!(file.supplies("fixed"));
        assert!(!file.supplies("other"));
    }

    #[test]
    fn template_file_rejects_wrong_suffix() {
        let err = TemplateFile::new(
            "installations/gauss/config.yaml.patch",
            TemplateKind::ConfigMapPatch,
            b"a: 1\n",
            &FunctionRegistry::standard(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigLintError::InvalidFile { .. }));
    }

    #[test]
    fn supplies_covers_aggregates() {
        let file = TemplateFile::new(
            "include/labels.yaml.template",
            TemplateKind::Include,
            b"labels:\n  team: x\n",
            &FunctionRegistry::standard(),
        )
        .unwrap();
        assert!(file.supplies("labels"));
        assert!(file.supplies("labels.team"));
    }

    #[test]
    fn supplies_ignores_keys_read_from_the_same_path() {
        let file = TemplateFile::new(
            "installations/gauss/apps/foo/configmap-values.yaml.patch",
            TemplateKind::ConfigMapPatch,
            b"special: {{ .special }}\nliteral: here\n",
            &FunctionRegistry::standard(),
        )
        .unwrap();
        assert!(!file.supplies("special"));
        assert!(file.supplies("literal"));
    }
}
