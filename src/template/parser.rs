//! Template parser.
//!
//! Turns lexed items into a syntax tree of text, actions and control
//! structures. Function names are checked against the [`FunctionRegistry`]
//! and variables against the enclosing scopes, so an analysis fails early on
//! templates the real renderer would reject.

use super::functions::FunctionRegistry;
use super::lexer::{Item, Token, TokenKind};

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Action { pipe: Pipeline, line: usize },
    If(Branch),
    Range(Branch),
    With(Branch),
    Break { line: usize },
    Continue { line: usize },
}

/// Body of an `if`, `range` or `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipe: Pipeline,
    pub list: Vec<Node>,
    pub else_list: Vec<Node>,
    pub line: usize,
}

/// Commands joined by `|`, optionally declaring or assigning variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub decl: Vec<String>,
    pub is_assign: bool,
    pub cmds: Vec<Command>,
    pub line: usize,
}

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Operand>,
}

/// An argument of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Field chain relative to dot; empty for dot itself.
    Field(Vec<String>),
    Variable {
        name: String,
        fields: Vec<String>,
    },
    Function(String),
    /// Parenthesised pipeline, optionally followed by a field chain.
    Pipeline {
        pipe: Box<Pipeline>,
        fields: Vec<String>,
    },
    String(String),
    Number(String),
    Char(char),
    Bool(bool),
    Nil,
}

/// Parse failure with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parse lexed items into a syntax tree.
pub fn parse(items: Vec<Item>, functions: &FunctionRegistry) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser {
        items: items.into_iter(),
        functions,
        vars: vec!["$".to_string()],
        range_depth: 0,
    };

    let (nodes, terminator) = parser.parse_list()?;
    match terminator {
        Terminator::Eof => Ok(nodes),
        Terminator::End { line } => Err(ParseError {
            line,
            message: "unexpected {{end}}".to_string(),
        }),
        Terminator::Else { line, .. } => Err(ParseError {
            line,
            message: "unexpected {{else}}".to_string(),
        }),
    }
}

enum Terminator {
    Eof,
    End { line: usize },
    Else { tokens: Vec<Token>, line: usize },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Control {
    If,
    Range,
    With,
}

impl Control {
    fn keyword(self) -> &'static str {
        match self {
            Control::If => "if",
            Control::Range => "range",
            Control::With => "with",
        }
    }
}

struct Parser<'f> {
    items: std::vec::IntoIter<Item>,
    functions: &'f FunctionRegistry,
    vars: Vec<String>,
    range_depth: usize,
}

fn error(line: usize, message: impl Into<String>) -> ParseError {
    ParseError {
        line,
        message: message.into(),
    }
}

fn keyword_of(tokens: &[Token]) -> Option<&str> {
    match tokens.first().map(|t| &t.kind) {
        Some(TokenKind::Identifier(name)) => Some(name.as_str()),
        _ => None,
    }
}

impl Parser<'_> {
    fn parse_list(&mut self) -> Result<(Vec<Node>, Terminator), ParseError> {
        let mut nodes = Vec::new();

        while let Some(item) = self.items.next() {
            let (tokens, line) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { tokens, line } => (tokens, line),
            };
            match keyword_of(&tokens) {
                Some("if") => nodes.push(self.parse_control(Control::If, &tokens[1..], line)?),
                Some("range") => {
                    nodes.push(self.parse_control(Control::Range, &tokens[1..], line)?)
                }
                Some("with") => nodes.push(self.parse_control(Control::With, &tokens[1..], line)?),
                Some("end") => {
                    self.expect_bare("end", &tokens, line)?;
                    return Ok((nodes, Terminator::End { line }));
                }
                Some("else") => {
                    return Ok((
                        nodes,
                        Terminator::Else {
                            tokens: tokens[1..].to_vec(),
                            line,
                        },
                    ));
                }
                Some(keyword @ ("break" | "continue")) => {
                    self.expect_bare(keyword, &tokens, line)?;
                    if self.range_depth == 0 {
                        return Err(error(line, format!("{{{{{}}}}} outside {{{{range}}}}", keyword)));
                    }
                    nodes.push(if keyword == "break" {
                        Node::Break { line }
                    } else {
                        Node::Continue { line }
                    });
                }
                Some(keyword @ ("define" | "template" | "block")) => {
                    return Err(error(
                        line,
                        format!("{{{{{}}}}} is not supported in configuration templates", keyword),
                    ));
                }
                _ => {
                    let pipe = self.parse_pipeline(&tokens, line, 1)?;
                    nodes.push(Node::Action { pipe, line });
                }
            }
        }

        Ok((nodes, Terminator::Eof))
    }

    fn expect_bare(&self, keyword: &str, tokens: &[Token], line: usize) -> Result<(), ParseError> {
        if tokens.len() == 1 {
            Ok(())
        } else {
            Err(error(line, format!("unexpected arguments after {}", keyword)))
        }
    }

    fn parse_control(
        &mut self,
        control: Control,
        tokens: &[Token],
        line: usize,
    ) -> Result<Node, ParseError> {
        let scope = self.vars.len();
        let max_decl = if control == Control::Range { 2 } else { 1 };
        let pipe = self.parse_pipeline(tokens, line, max_decl)?;
        // Pipeline declarations reach `end`; body declarations stop at `else`.
        let branch_scope = self.vars.len();

        if control == Control::Range {
            self.range_depth += 1;
        }
        let body = self.parse_list();
        if control == Control::Range {
            self.range_depth -= 1;
        }
        let (list, terminator) = body?;
        self.vars.truncate(branch_scope);

        let else_list = match terminator {
            Terminator::End { .. } => Vec::new(),
            Terminator::Else {
                tokens: else_tokens,
                line: else_line,
            } => {
                if else_tokens.is_empty() {
                    let (else_list, terminator) = self.parse_list()?;
                    match terminator {
                        Terminator::End { .. } => else_list,
                        Terminator::Else { line, .. } => {
                            return Err(error(line, "expected end; found {{else}}"))
                        }
                        Terminator::Eof => {
                            return Err(error(
                                line,
                                format!("unexpected EOF in {{{{{}}}}}", control.keyword()),
                            ))
                        }
                    }
                } else if control != Control::Range
                    && keyword_of(&else_tokens) == Some(control.keyword())
                {
                    // `else if` / `else with` chains share the outer `end`.
                    vec![self.parse_control(control, &else_tokens[1..], else_line)?]
                } else {
                    return Err(error(
                        else_line,
                        format!("unexpected arguments after else in {{{{{}}}}}", control.keyword()),
                    ));
                }
            }
            Terminator::Eof => {
                return Err(error(
                    line,
                    format!("unexpected EOF in {{{{{}}}}}", control.keyword()),
                ))
            }
        };

        self.vars.truncate(scope);

        let branch = Branch {
            pipe,
            list,
            else_list,
            line,
        };
        Ok(match control {
            Control::If => Node::If(branch),
            Control::Range => Node::Range(branch),
            Control::With => Node::With(branch),
        })
    }

    /// Parse a pipeline, accepting up to `max_decl` declared variables.
    fn parse_pipeline(
        &mut self,
        tokens: &[Token],
        line: usize,
        max_decl: usize,
    ) -> Result<Pipeline, ParseError> {
        let (decl, is_assign, rest) = self.parse_declarations(tokens, line, max_decl)?;

        if rest.is_empty() {
            return Err(error(line, "missing value for command"));
        }

        let mut cmds = Vec::new();
        for (stage, segment) in split_top_level(rest, line)?.into_iter().enumerate() {
            let command = self.parse_command(segment, line)?;
            if stage > 0 {
                if let Some(first) = command.args.first() {
                    if !matches!(
                        first,
                        Operand::Function(_)
                            | Operand::Field(_)
                            | Operand::Variable { .. }
                            | Operand::Pipeline { .. }
                    ) {
                        return Err(error(
                            line,
                            format!("non executable command in pipeline stage {}", stage + 1),
                        ));
                    }
                }
            }
            cmds.push(command);
        }

        if !is_assign {
            self.vars.extend(decl.iter().cloned());
        }

        Ok(Pipeline {
            decl,
            is_assign,
            cmds,
            line,
        })
    }

    fn parse_declarations<'t>(
        &self,
        tokens: &'t [Token],
        line: usize,
        max_decl: usize,
    ) -> Result<(Vec<String>, bool, &'t [Token]), ParseError> {
        let variable = |i: usize| match tokens.get(i).map(|t| &t.kind) {
            Some(TokenKind::Variable(name, fields)) if fields.is_empty() => Some(name.clone()),
            _ => None,
        };
        let kind = |i: usize| tokens.get(i).map(|t| &t.kind);

        let (decl, op_index) = match (variable(0), kind(1)) {
            (Some(name), Some(TokenKind::Declare | TokenKind::Assign)) => (vec![name], 1),
            (Some(first), Some(TokenKind::Comma)) => match (variable(2), kind(3)) {
                (Some(second), Some(TokenKind::Declare | TokenKind::Assign)) if max_decl >= 2 => {
                    (vec![first, second], 3)
                }
                _ => return Err(error(line, "too many declarations")),
            },
            _ => return Ok((Vec::new(), false, tokens)),
        };

        if decl.len() > max_decl {
            return Err(error(line, "too many declarations"));
        }

        let is_assign = kind(op_index) == Some(&TokenKind::Assign);
        if is_assign {
            for name in &decl {
                if !self.vars.contains(name) {
                    return Err(error(line, format!("undefined variable {:?}", name)));
                }
            }
        }

        Ok((decl, is_assign, &tokens[op_index + 1..]))
    }

    fn parse_command(&mut self, tokens: &[Token], line: usize) -> Result<Command, ParseError> {
        if tokens.is_empty() {
            return Err(error(line, "missing value for command"));
        }

        let mut args = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            let operand = match &token.kind {
                TokenKind::LeftParen => {
                    let close = matching_paren(tokens, i, line)?;
                    let inner = self.parse_pipeline(&tokens[i + 1..close], line, 0)?;
                    i = close;
                    let mut fields = Vec::new();
                    while let Some(Token {
                        kind: TokenKind::Field(chain),
                        spaced: false,
                    }) = tokens.get(i + 1)
                    {
                        fields.extend(chain.iter().cloned());
                        i += 1;
                    }
                    Operand::Pipeline {
                        pipe: Box::new(inner),
                        fields,
                    }
                }
                TokenKind::RightParen => return Err(error(line, "unexpected right paren")),
                TokenKind::Field(fields) => Operand::Field(fields.clone()),
                TokenKind::Variable(name, fields) => {
                    if !self.vars.contains(name) {
                        return Err(error(line, format!("undefined variable {:?}", name)));
                    }
                    Operand::Variable {
                        name: name.clone(),
                        fields: fields.clone(),
                    }
                }
                TokenKind::Identifier(name) => {
                    if !self.functions.contains(name) {
                        return Err(error(line, format!("function {:?} not defined", name)));
                    }
                    Operand::Function(name.clone())
                }
                TokenKind::String(s) => Operand::String(s.clone()),
                TokenKind::Number(n) => Operand::Number(n.clone()),
                TokenKind::Char(c) => Operand::Char(*c),
                TokenKind::Bool(b) => Operand::Bool(*b),
                TokenKind::Nil => Operand::Nil,
                TokenKind::Pipe => return Err(error(line, "missing value for command")),
                TokenKind::Declare | TokenKind::Assign => {
                    return Err(error(line, "unexpected assignment in operand"))
                }
                TokenKind::Comma => return Err(error(line, "unexpected \",\" in operand")),
            };
            args.push(operand);
            i += 1;
        }

        if args == [Operand::Nil] {
            return Err(error(line, "nil is not a command"));
        }

        Ok(Command { args })
    }
}

fn matching_paren(tokens: &[Token], open: usize, line: usize) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(error(line, "unclosed left paren"))
}

/// Split tokens on `|` outside parentheses.
fn split_top_level(tokens: &[Token], line: usize) -> Result<Vec<&[Token]>, ParseError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| error(line, "unexpected right paren"))?;
            }
            TokenKind::Pipe if depth == 0 => {
                segments.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&tokens[start..]);

    Ok(segments)
}
