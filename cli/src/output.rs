//! Styled terminal output.

use console::{Term, style};
use std::fmt::Display;

/// Writes styled lines to stdout. Write failures are ignored.
pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    fn line(&self, line: &str) {
        drop(self.term.write_line(line));
    }

    pub fn success(&self, message: impl Display) {
        self.line(&format!("{} {}", style("✓").green().bold(), message));
    }

    pub fn error(&self, message: impl Display) {
        self.line(&format!("{} {}", style("✗").red().bold(), message));
    }

    pub fn warning(&self, message: impl Display) {
        self.line(&format!("{} {}", style("⚠").yellow().bold(), message));
    }

    pub fn info(&self, message: impl Display) {
        self.line(&format!("{} {}", style("ℹ").blue().bold(), message));
    }

    pub fn print(&self, message: impl Display) {
        self.line(&message.to_string());
    }

    pub fn newline(&self) {
        self.line("");
    }

    pub fn header(&self, message: impl Display) {
        self.line(&style(message).bold().cyan().to_string());
    }

    /// A field-level problem, indented under a header.
    pub fn field_error(&self, field: impl Display, message: impl Display) {
        self.line(&format!(
            "  {} {}: {}",
            style("•").red(),
            style(field).bold(),
            message
        ));
    }

    pub fn dim(&self, message: impl Display) {
        self.line(&style(message).dim().to_string());
    }

    /// Print a total summary line.
    pub fn total(&self, label: impl Display, count: usize, noun: &str) {
        self.line(&format!(
            "\n{}: {}",
            style(label).bold(),
            style(format!("{count} {noun}(s)")).cyan()
        ));
    }
}
