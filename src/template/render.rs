//! Zero-value renderer.
//!
//! Executes a parsed template against an empty context: every field access
//! yields nil, which prints as nothing and is falsy. `if` and `with` therefore
//! take their else branch and `range` never iterates, leaving the literal
//! YAML skeleton the template defines outright.

use std::fmt;

use super::functions::FunctionRegistry;
use super::parser::{Branch, Command, Node, Operand, Pipeline};

/// Runtime value seen by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Data {
    pub fn truthy(&self) -> bool {
        match self {
            Data::Nil => false,
            Data::Bool(b) => *b,
            Data::Int(i) => *i != 0,
            Data::Float(f) => *f != 0.0,
            Data::Str(s) => !s.is_empty(),
        }
    }

    /// Text written to the output when the value is printed.
    pub fn printed(&self) -> String {
        self.to_string()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Data::Nil => "nil",
            Data::Bool(_) => "bool",
            Data::Int(_) => "int",
            Data::Float(_) => "float64",
            Data::Str(_) => "string",
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Nil => Ok(()),
            Data::Bool(b) => write!(f, "{}", b),
            Data::Int(i) => write!(f, "{}", i),
            Data::Float(x) => write!(f, "{}", x),
            Data::Str(s) => f.write_str(s),
        }
    }
}

/// Rendering failure with the 1-based template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub line: usize,
    pub message: String,
}

/// Render nodes with every field resolving to nil.
pub fn render(nodes: &[Node], functions: &FunctionRegistry) -> Result<String, RenderError> {
    let mut renderer = Renderer {
        functions,
        vars: vec![("$".to_string(), Data::Nil)],
        dot: Data::Nil,
        out: String::new(),
    };
    renderer.walk_list(nodes)?;
    Ok(renderer.out)
}

struct Renderer<'f> {
    functions: &'f FunctionRegistry,
    vars: Vec<(String, Data)>,
    dot: Data,
    out: String,
}

impl Renderer<'_> {
    fn walk_list(&mut self, nodes: &[Node]) -> Result<(), RenderError> {
        for node in nodes {
            self.walk(node)?;
        }
        Ok(())
    }

    fn walk(&mut self, node: &Node) -> Result<(), RenderError> {
        match node {
            Node::Text(text) => self.out.push_str(text),
            Node::Action { pipe, .. } => {
                let value = self.eval_pipeline(pipe)?;
                if pipe.decl.is_empty() {
                    self.out.push_str(&value.printed());
                }
            }
            Node::If(branch) => {
                self.scoped(|r| {
                    let value = r.eval_pipeline(&branch.pipe)?;
                    r.walk_list(if value.truthy() {
                        &branch.list
                    } else {
                        &branch.else_list
                    })
                })?;
            }
            Node::With(branch) => {
                self.scoped(|r| {
                    let value = r.eval_pipeline(&branch.pipe)?;
                    if value.truthy() {
                        let outer = std::mem::replace(&mut r.dot, value);
                        let result = r.walk_list(&branch.list);
                        r.dot = outer;
                        result
                    } else {
                        r.walk_list(&branch.else_list)
                    }
                })?;
            }
            Node::Range(branch) => self.walk_range(branch)?,
            // Only reachable inside a range body, which never iterates.
            Node::Break { .. } | Node::Continue { .. } => {}
        }
        Ok(())
    }

    fn walk_range(&mut self, branch: &Branch) -> Result<(), RenderError> {
        self.scoped(|r| {
            r.eval_pipeline(&branch.pipe)?;
            r.walk_list(&branch.else_list)
        })
    }

    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        let mark = self.vars.len();
        let result = f(self);
        self.vars.truncate(mark);
        result
    }

    fn eval_pipeline(&mut self, pipe: &Pipeline) -> Result<Data, RenderError> {
        let mut value: Option<Data> = None;
        for cmd in &pipe.cmds {
            value = Some(self.eval_command(cmd, value.take(), pipe.line)?);
        }
        let value = value.unwrap_or(Data::Nil);

        if pipe.is_assign {
            for name in &pipe.decl {
                if let Some(slot) = self.vars.iter_mut().rev().find(|(n, _)| n == name) {
                    slot.1 = value.clone();
                }
            }
        } else {
            for name in &pipe.decl {
                self.vars.push((name.clone(), value.clone()));
            }
        }

        Ok(value)
    }

    fn eval_command(
        &mut self,
        cmd: &Command,
        piped: Option<Data>,
        line: usize,
    ) -> Result<Data, RenderError> {
        let Some((first, rest)) = cmd.args.split_first() else {
            return Err(RenderError {
                line,
                message: "empty command".to_string(),
            });
        };

        if let Operand::Function(name) = first {
            let mut args = Vec::with_capacity(rest.len() + 1);
            for operand in rest {
                args.push(self.eval_operand(operand, line)?);
            }
            args.extend(piped);
            return self
                .functions
                .call(name, args)
                .map_err(|message| RenderError {
                    line,
                    message: format!("error calling {}: {}", name, message),
                });
        }

        if !rest.is_empty() || piped.is_some() {
            return Err(RenderError {
                line,
                message: "can't give argument to non-function".to_string(),
            });
        }
        self.eval_operand(first, line)
    }

    fn eval_operand(&mut self, operand: &Operand, line: usize) -> Result<Data, RenderError> {
        Ok(match operand {
            Operand::Field(fields) if fields.is_empty() => self.dot.clone(),
            // Zero context: every field is nil.
            Operand::Field(_) => Data::Nil,
            Operand::Variable { name, fields } => {
                if !fields.is_empty() {
                    return Ok(Data::Nil);
                }
                self.vars
                    .iter()
                    .rev()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Data::Nil)
            }
            Operand::Function(name) => {
                self.functions
                    .call(name, Vec::new())
                    .map_err(|message| RenderError {
                        line,
                        message: format!("error calling {}: {}", name, message),
                    })?
            }
            Operand::Pipeline { pipe, fields } => {
                let value = self.eval_pipeline(pipe)?;
                if fields.is_empty() {
                    value
                } else {
                    Data::Nil
                }
            }
            Operand::String(s) => Data::Str(s.clone()),
            Operand::Number(n) => parse_number(n).ok_or_else(|| RenderError {
                line,
                message: format!("bad number syntax: {:?}", n),
            })?,
            Operand::Char(c) => Data::Int(i64::from(u32::from(*c))),
            Operand::Bool(b) => Data::Bool(*b),
            Operand::Nil => Data::Nil,
        })
    }
}

fn parse_number(raw: &str) -> Option<Data> {
    let cleaned = raw.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .iter()
        .find_map(|(prefix, radix)| digits.strip_prefix(prefix).map(|d| (d, *radix)));
    if let Some((body, radix)) = radix {
        let value = i64::from_str_radix(body, radix).ok()?;
        return Some(Data::Int(if negative { -value } else { value }));
    }

    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(Data::Int(value));
    }
    cleaned.parse::<f64>().ok().map(Data::Float)
}
