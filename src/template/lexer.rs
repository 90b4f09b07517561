//! Template lexer.
//!
//! Splits a template into literal text and `{{ ... }}` actions, and
//! tokenizes the inside of each action. Comments (`{{/* ... */}}`) are
//! dropped. Trim markers (`{{- ` and ` -}}`) remove the whitespace on the
//! adjacent side of the action, as in Go's `text/template`.

pub const LEFT_DELIM: &str = "{{";
pub const RIGHT_DELIM: &str = "}}";

/// Kind of a token inside an action.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Field chain such as `.a.b`; `.` alone is an empty chain.
    Field(Vec<String>),
    /// Variable with optional field chain: `$`, `$x`, `$x.a.b`.
    Variable(String, Vec<String>),
    Identifier(String),
    String(String),
    Number(String),
    Char(char),
    Bool(bool),
    Nil,
    LeftParen,
    RightParen,
    Pipe,
    Declare,
    Assign,
    Comma,
}

/// A token and whether whitespace preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub spaced: bool,
}

/// Lexed template item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Text(String),
    Action { tokens: Vec<Token>, line: usize },
}

/// Lexing failure with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Lex a whole template.
pub fn lex(source: &str) -> Result<Vec<Item>, LexError> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        line: 1,
        items: Vec::new(),
        trim_next: false,
    };
    lexer.run()?;
    Ok(lexer.items)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    items: Vec<Item>,
    trim_next: bool,
}

fn is_trim_marker(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance(&mut self, bytes: usize) {
        let end = self.pos + bytes;
        self.line += self.src[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            line: self.line,
            message: message.into(),
        }
    }

    fn run(&mut self) -> Result<(), LexError> {
        loop {
            let rest = self.rest();
            let Some(idx) = rest.find(LEFT_DELIM) else {
                self.push_text(rest);
                self.advance(rest.len());
                return Ok(());
            };

            let trim_left = is_trim_marker(&rest[idx + LEFT_DELIM.len()..]);
            let text = &rest[..idx];
            self.push_text(if trim_left { text.trim_end() } else { text });
            self.advance(idx + LEFT_DELIM.len());
            if trim_left {
                self.advance(1);
            }
            self.lex_action()?;
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = if std::mem::take(&mut self.trim_next) {
            text.trim_start()
        } else {
            text
        };
        if !text.is_empty() {
            self.items.push(Item::Text(text.to_string()));
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
            skipped = true;
        }
        skipped
    }

    /// Consume `}}` or ` -}}` if the action ends here.
    fn close_action(&mut self, spaced: bool) -> bool {
        let rest = self.rest();
        if rest.starts_with(RIGHT_DELIM) {
            self.advance(RIGHT_DELIM.len());
            return true;
        }
        if spaced && rest.starts_with("-}}") {
            self.advance(3);
            self.trim_next = true;
            return true;
        }
        false
    }

    fn lex_action(&mut self) -> Result<(), LexError> {
        let line = self.line;
        self.skip_whitespace();
        let mut spaced = true;

        if self.rest().starts_with("/*") {
            return self.lex_comment();
        }

        let mut tokens = Vec::new();
        loop {
            if self.close_action(spaced) {
                break;
            }
            let Some(c) = self.peek() else {
                return Err(LexError {
                    line,
                    message: "unclosed action".to_string(),
                });
            };
            if c.is_whitespace() {
                self.skip_whitespace();
                spaced = true;
                continue;
            }

            let kind = self.lex_token(c)?;
            tokens.push(Token { kind, spaced });
            spaced = false;
        }

        self.items.push(Item::Action { tokens, line });
        Ok(())
    }

    fn lex_comment(&mut self) -> Result<(), LexError> {
        let Some(end) = self.rest().find("*/") else {
            return Err(self.error("unclosed comment"));
        };
        self.advance(end + 2);
        let spaced = self.skip_whitespace();
        if self.close_action(spaced) {
            Ok(())
        } else {
            Err(self.error("comment ends before closing delimiter"))
        }
    }

    fn lex_token(&mut self, c: char) -> Result<TokenKind, LexError> {
        let kind = match c {
            '|' => {
                self.bump();
                TokenKind::Pipe
            }
            '(' => {
                self.bump();
                TokenKind::LeftParen
            }
            ')' => {
                self.bump();
                TokenKind::RightParen
            }
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            '=' => {
                self.bump();
                TokenKind::Assign
            }
            ':' => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.error("expected :="));
                }
                TokenKind::Declare
            }
            '"' => TokenKind::String(self.lex_quoted()?),
            '`' => TokenKind::String(self.lex_raw()?),
            '\'' => TokenKind::Char(self.lex_char()?),
            '.' => match self.peek_second() {
                Some(d) if d.is_ascii_digit() => TokenKind::Number(self.lex_number()),
                _ => TokenKind::Field(self.lex_fields()),
            },
            '$' => {
                self.bump();
                let mut name = String::from("$");
                while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
                    name.push(c);
                    self.bump();
                }
                TokenKind::Variable(name, self.lex_fields())
            }
            '+' | '-' if self.peek_second().is_some_and(|d| d.is_ascii_digit() || d == '.') => {
                TokenKind::Number(self.lex_number())
            }
            c if c.is_ascii_digit() => TokenKind::Number(self.lex_number()),
            c if is_ident_start(c) => {
                let mut ident = String::new();
                while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
                    ident.push(c);
                    self.bump();
                }
                match ident.as_str() {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    "nil" => TokenKind::Nil,
                    _ => TokenKind::Identifier(ident),
                }
            }
            other => return Err(self.error(format!("unexpected {:?} in action", other))),
        };
        Ok(kind)
    }

    /// Lex a chain of `.ident` segments. A lone `.` yields an empty chain.
    fn lex_fields(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        while self.peek() == Some('.') {
            if !self.peek_second().is_some_and(is_ident_start) {
                if fields.is_empty() && !self.peek_second().is_some_and(|c| c == '.') {
                    self.bump();
                }
                break;
            }
            self.bump();
            let mut segment = String::new();
            while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
                segment.push(c);
                self.bump();
            }
            fields.push(segment);
        }
        fields
    }

    fn lex_number(&mut self) -> String {
        let mut number = String::new();
        if let Some(sign) = self.peek().filter(|c| *c == '+' || *c == '-') {
            number.push(sign);
            self.bump();
        }
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && number.ends_with(['e', 'E', 'p', 'P'])
                && !number.starts_with("0x");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                number.push(c);
                self.bump();
            } else {
                break;
            }
        }
        number
    }

    fn lex_quoted(&mut self) -> Result<String, LexError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated quoted string")),
                Some('"') => return Ok(value),
                Some('\\') => value.push(self.lex_escape()?),
                Some(c) => value.push(c),
            }
        }
    }

    fn lex_raw(&mut self) -> Result<String, LexError> {
        self.bump();
        let Some(end) = self.rest().find('`') else {
            return Err(self.error("unterminated raw quoted string"));
        };
        let value = self.rest()[..end].to_string();
        self.advance(end + 1);
        Ok(value)
    }

    fn lex_char(&mut self) -> Result<char, LexError> {
        self.bump();
        let c = match self.bump() {
            Some('\\') => self.lex_escape()?,
            Some(c) if c != '\'' && c != '\n' => c,
            _ => return Err(self.error("malformed character constant")),
        };
        if self.bump() != Some('\'') {
            return Err(self.error("unterminated character constant"));
        }
        Ok(c)
    }

    fn lex_escape(&mut self) -> Result<char, LexError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(c @ ('\\' | '"' | '\'')) => Ok(c),
            Some(other) => Err(self.error(format!("unknown escape sequence \\{}", other))),
            None => Err(self.error("unterminated escape sequence")),
        }
    }
}
