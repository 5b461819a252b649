//! Colored terminal output utilities.

use console::{Style, Term};
use flowdoc_model::{Diagnostic, Severity};

const WIDTH: usize = 70;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    pub(crate) fn separator(&self) {
        let _ = self.term.write_line(&"=".repeat(WIDTH));
    }

    /// Print a diagnostic tree framed by a banner.
    pub(crate) fn diagnostic(&self, title: &str, diagnostic: &Diagnostic) {
        let style = if diagnostic.is_error() {
            &self.red
        } else {
            &self.yellow
        };
        for line in banner(title, diagnostic).lines() {
            let _ = self.term.write_line(&style.apply_to(line).to_string());
        }
    }
}

fn banner(title: &str, diagnostic: &Diagnostic) -> String {
    let stars = "*".repeat(WIDTH);
    let mut text = format!("{stars}\n{title:^WIDTH$}\n{stars}\n");
    let _ = diagnostic.dump(&mut text, 1, Severity::Warning);
    text
}
