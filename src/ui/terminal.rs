//! Terminal UI.

use std::io::Write;

use console::Term;

use super::{should_use_colors, Theme, UserInterface};

/// Terminal UI implementation. Errors and warnings go to stderr, everything
/// else to stdout.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: Theme,
    colored: bool,
}

impl TerminalUI {
    /// Create a terminal UI, colored unless `no_color` is set or the
    /// environment disables colors.
    pub fn new(no_color: bool) -> Self {
        let colored = !no_color && should_use_colors();
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: if colored { Theme::new() } else { Theme::plain() },
            colored,
        }
    }
}

impl UserInterface for TerminalUI {
    fn message(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn use_colors(&self) -> bool {
        self.colored
    }
}
