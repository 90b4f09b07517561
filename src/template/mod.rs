//! Template Analyzer.
//!
//! Parses a configuration template with a fixed [`FunctionRegistry`] and
//! reports:
//! - every dotted value path it reads, with reference counts
//! - every path its zero-value skeleton defines outright
//! - every include fragment it pulls in
//!
//! # Example
//!
//! ```
//! use configlint::template::{analyze_template, FunctionRegistry};
//!
//! let functions = FunctionRegistry::standard();
//! let body = b"replicas: 2\nimage: {{ .registry.domain }}/app\n{{ include \"labels\" . }}\n";
//! let analysis = analyze_template("default/apps/foo/configmap-values.yaml.template", body, &functions).unwrap();
//!
//! assert_eq!(analysis.values.get("registry.domain"), Some(&1));
//! assert!(analysis.paths.contains("replicas"));
//! assert_eq!(analysis.includes, vec!["include/labels.yaml.template".to_string()]);
//! ```

mod functions;
mod lexer;
mod parser;
mod render;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{ConfigLintError, Result};
use crate::layout;
use crate::values::{extract_paths, YamlError, SEPARATOR};

pub use functions::{Function, FunctionRegistry, INCLUDE};
pub use render::Data;

use parser::{Node, Operand, Pipeline};

/// What a template reads, defines and includes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateAnalysis {
    /// Referenced value paths and how often each is referenced.
    pub values: BTreeMap<String, usize>,
    /// Paths present in the zero-value rendered skeleton.
    pub paths: BTreeSet<String>,
    /// Include file paths, deduplicated in source order.
    pub includes: Vec<String>,
    /// The zero-value rendered output.
    pub rendered: String,
}

/// Analyze one template body.
pub fn analyze_template(
    filepath: &str,
    body: &[u8],
    functions: &FunctionRegistry,
) -> Result<TemplateAnalysis> {
    let source = String::from_utf8_lossy(body);

    let items = lexer::lex(&source).map_err(|e| ConfigLintError::TemplateParse {
        path: filepath.to_string(),
        line: Some(e.line),
        message: e.message,
    })?;
    let nodes = parser::parse(items, functions).map_err(|e| ConfigLintError::TemplateParse {
        path: filepath.to_string(),
        line: Some(e.line),
        message: e.message,
    })?;

    let mut collector = Collector::default();
    collector.walk_list(&nodes, &Dot::Root);

    let rendered =
        render::render(&nodes, functions).map_err(|e| ConfigLintError::TemplateRender {
            path: filepath.to_string(),
            line: Some(e.line),
            context: Vec::new(),
            message: e.message,
        })?;

    let paths = extract_paths(rendered.as_bytes())
        .map_err(|e| render_error(filepath, &rendered, e))?
        .into_keys()
        .collect();

    debug!(
        "Analyzed {}: {} value(s), {} include(s)",
        filepath,
        collector.values.len(),
        collector.includes.len()
    );

    Ok(TemplateAnalysis {
        values: collector.values,
        paths,
        includes: collector.includes,
        rendered,
    })
}

/// Annotate a skeleton parse failure with the offending line and its neighbours.
fn render_error(filepath: &str, rendered: &str, err: YamlError) -> ConfigLintError {
    let context = err
        .line
        .map(|line| {
            let lines: Vec<&str> = rendered.lines().collect();
            let start = line.saturating_sub(2);
            let end = (line + 1).min(lines.len());
            lines
                .get(start..end)
                .unwrap_or_default()
                .iter()
                .map(|l| l.to_string())
                .collect()
        })
        .unwrap_or_default();

    ConfigLintError::TemplateRender {
        path: filepath.to_string(),
        line: err.line,
        context,
        message: err.message,
    }
}

/// What dot refers to while walking the tree.
#[derive(Debug, Clone)]
enum Dot {
    /// The value root.
    Root,
    /// A known path below the root, set by `with .path`.
    Path(String),
    /// Something untrackable, such as a range element.
    Opaque,
}

impl Dot {
    fn resolve(&self, fields: &[String]) -> Option<String> {
        if fields.is_empty() {
            return None;
        }
        let joined = fields.join(&SEPARATOR.to_string());
        match self {
            Dot::Root => Some(joined),
            Dot::Path(prefix) => Some(format!("{}{}{}", prefix, SEPARATOR, joined)),
            Dot::Opaque => None,
        }
    }
}

#[derive(Default)]
struct Collector {
    values: BTreeMap<String, usize>,
    includes: Vec<String>,
}

impl Collector {
    fn walk_list(&mut self, nodes: &[Node], dot: &Dot) {
        for node in nodes {
            self.walk(node, dot);
        }
    }

    fn walk(&mut self, node: &Node, dot: &Dot) {
        match node {
            Node::Text(_) | Node::Break { .. } | Node::Continue { .. } => {}
            Node::Action { pipe, .. } => self.pipeline(pipe, dot),
            Node::If(branch) => {
                self.pipeline(&branch.pipe, dot);
                self.walk_list(&branch.list, dot);
                self.walk_list(&branch.else_list, dot);
            }
            Node::With(branch) => {
                self.pipeline(&branch.pipe, dot);
                let inner = match single_field(&branch.pipe) {
                    Some(Operand::Field(fields)) => {
                        dot.resolve(fields).map(Dot::Path).unwrap_or(Dot::Opaque)
                    }
                    Some(Operand::Variable { name, fields }) if name == "$" => {
                        Dot::Root.resolve(fields).map(Dot::Path).unwrap_or(Dot::Root)
                    }
                    _ => Dot::Opaque,
                };
                self.walk_list(&branch.list, &inner);
                self.walk_list(&branch.else_list, dot);
            }
            Node::Range(branch) => {
                self.pipeline(&branch.pipe, dot);
                self.walk_list(&branch.list, &Dot::Opaque);
                self.walk_list(&branch.else_list, dot);
            }
        }
    }

    fn pipeline(&mut self, pipe: &Pipeline, dot: &Dot) {
        for cmd in &pipe.cmds {
            if let [Operand::Function(name), Operand::String(include), ..] = cmd.args.as_slice() {
                if name == INCLUDE {
                    let path = layout::include_path(include);
                    if !self.includes.contains(&path) {
                        self.includes.push(path);
                    }
                }
            }
            for operand in &cmd.args {
                self.operand(operand, dot);
            }
        }
    }

    fn operand(&mut self, operand: &Operand, dot: &Dot) {
        let path = match operand {
            Operand::Field(fields) => dot.resolve(fields),
            Operand::Variable { name, fields } if name == "$" => Dot::Root.resolve(fields),
            Operand::Pipeline { pipe, .. } => {
                self.pipeline(pipe, dot);
                None
            }
            _ => None,
        };
        if let Some(path) = path {
            *self.values.entry(path).or_insert(0) += 1;
        }
    }
}

/// The operand of a pipeline made of exactly one bare operand.
fn single_field(pipe: &Pipeline) -> Option<&Operand> {
    match pipe.cmds.as_slice() {
        [cmd] => match cmd.args.as_slice() {
            [operand @ (Operand::Field(_) | Operand::Variable { .. })] => Some(operand),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "default/apps/foo/configmap-values.yaml.template";

    fn analyze(body: &str) -> Result<TemplateAnalysis> {
        analyze_template(PATH, body.as_bytes(), &FunctionRegistry::standard())
    }

    #[test]
    fn counts_value_references() {
        let analysis = analyze("a: {{ .a }}\nb: v{{ .a }}-{{ .b.c }}\n").unwrap();
        assert_eq!(analysis.values.get("a"), Some(&2));
        assert_eq!(analysis.values.get("b.c"), Some(&1));
        assert_eq!(analysis.values.len(), 2);
    }

    #[test]
    fn skeleton_paths_are_extracted() {
        let analysis = analyze("a: {{ .a }}\nnested:\n  key: fixed\n").unwrap();
        assert!(analysis.paths.contains("a"));
        assert!(analysis.paths.contains("nested.key"));
    }

    #[test]
    fn references_inside_control_structures_count() {
        let analysis = analyze(
            "{{ if .enabled }}x: {{ .x | default \"d\" }}{{ else }}y: {{ $.y }}{{ end }}\n",
        )
        .unwrap();
        assert!(analysis.values.contains_key("enabled"));
        assert!(analysis.values.contains_key("x"));
        assert!(analysis.values.contains_key("y"));
    }

    #[test]
    fn with_scopes_fields_under_its_path() {
        let analysis = analyze("{{ with .registry }}domain: {{ .domain }}{{ end }}\n").unwrap();
        assert!(analysis.values.contains_key("registry"));
        assert!(analysis.values.contains_key("registry.domain"));
        assert!(!analysis.values.contains_key("domain"));
    }

    #[test]
    fn range_element_fields_are_not_root_paths() {
        let analysis =
            analyze("hosts:\n{{ range .hosts }}- {{ .name }}: {{ $.suffix }}\n{{ end }}").unwrap();
        assert!(analysis.values.contains_key("hosts"));
        assert!(analysis.values.contains_key("suffix"));
        assert!(!analysis.values.contains_key("name"));
    }

    #[test]
    fn parenthesised_pipelines_are_walked() {
        let analysis = analyze("a: {{ (default .fallback .primary) | quote }}\n").unwrap();
        assert!(analysis.values.contains_key("fallback"));
        assert!(analysis.values.contains_key("primary"));
    }

    #[test]
    fn includes_are_collected_once_in_order() {
        let analysis = analyze(
            "{{ include \"b\" . }}\n{{ if .x }}{{ include \"a\" . }}{{ end }}\n{{ include \"b\" . }}\n",
        )
        .unwrap();
        assert_eq!(
            analysis.includes,
            vec![
                "include/b.yaml.template".to_string(),
                "include/a.yaml.template".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_syntax_is_a_parse_error() {
        let err = analyze("a: {{ .a \n").unwrap_err();
        assert!(matches!(err, ConfigLintError::TemplateParse { .. }));
    }

    #[test]
    fn unknown_function_is_a_parse_error() {
        let err = analyze("a: {{ nope .a }}\n").unwrap_err();
        match err {
            ConfigLintError::TemplateParse { line, message, .. } => {
                assert_eq!(line, Some(1));
                assert!(message.contains("nope"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn invalid_skeleton_is_a_render_error_with_context() {
        let err = analyze("a: 1\nb: {{ .b }}: c: d\nc: 3\n").unwrap_err();
        match err {
            ConfigLintError::TemplateRender { line, context, .. } => {
                assert!(line.is_some());
                assert!(!context.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn registry_is_passed_explicitly() {
        let mut functions = FunctionRegistry::standard();
        functions.stub("lookupSecret");
        let body = b"a: {{ lookupSecret .a }}\n";
        assert!(analyze_template(PATH, body, &functions).is_ok());
        assert!(analyze_template(PATH, body, &FunctionRegistry::standard()).is_err());
    }
}
