//! YAML path extraction.
//!
//! Flattens a YAML document into dotted paths (`registry.domain`,
//! `ingress.hosts.0`) mapped to the leaf [`Value`] found at each path.
//! Only leaves are recorded: scalars and empty collections.
//!
//! # Example
//!
//! ```
//! use configlint::values::{extract_paths, normalize_path, Value};
//!
//! let paths = extract_paths(b"a:\n  b: 1\n  c: [x, y]\n").unwrap();
//! assert_eq!(paths.get("a.b"), Some(&Value::Integer(1)));
//! assert_eq!(paths.get("a.c.1"), Some(&Value::String("y".into())));
//! assert_eq!(normalize_path(".a.b"), normalize_path("a.b"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value as YamlValue;

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A parsed YAML value, compared structurally.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    /// Mapping entries in document order.
    Mapping(Vec<(String, Value)>),
}

// Floats compare bitwise so `.nan` equals itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<&YamlValue> for Value {
    fn from(value: &YamlValue) -> Self {
        match value {
            YamlValue::Null => Value::Null,
            YamlValue::Bool(b) => Value::Bool(*b),
            YamlValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            YamlValue::String(s) => Value::String(s.clone()),
            YamlValue::Sequence(items) => Value::Sequence(items.iter().map(Value::from).collect()),
            YamlValue::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (key_segment(k), Value::from(v)))
                    .collect(),
            ),
            YamlValue::Tagged(tagged) => Value::from(&tagged.value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Failure to parse a YAML document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct YamlError {
    /// 1-based line reported by the parser, when available.
    pub line: Option<usize>,
    pub message: String,
}

/// Strip exactly one leading separator.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix(SEPARATOR).unwrap_or(path)
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(SEPARATOR)
}

/// Parse YAML bytes and flatten them into `path -> leaf value`.
///
/// An empty document yields no paths. A document whose root is a scalar
/// has no addressable paths either.
pub fn extract_paths(bytes: &[u8]) -> std::result::Result<BTreeMap<String, Value>, YamlError> {
    if is_blank_document(bytes) {
        return Ok(BTreeMap::new());
    }

    let root: YamlValue = serde_yaml::from_slice(bytes).map_err(|e| YamlError {
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })?;

    let mut paths = BTreeMap::new();
    match &root {
        YamlValue::Mapping(_) | YamlValue::Sequence(_) | YamlValue::Tagged(_) => {
            flatten("", &root, &mut paths);
        }
        _ => {}
    }
    Ok(paths)
}

fn is_blank_document(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

fn flatten(prefix: &str, value: &YamlValue, out: &mut BTreeMap<String, Value>) {
    match value {
        YamlValue::Mapping(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten(&join(prefix, &key_segment(key)), child, out);
            }
        }
        YamlValue::Sequence(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten(&join(prefix, &index.to_string()), child, out);
            }
        }
        YamlValue::Tagged(tagged) => flatten(prefix, &tagged.value, out),
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), Value::from(leaf));
            }
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, segment)
    }
}

fn key_segment(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => Value::from(other).to_string(),
    }
}
