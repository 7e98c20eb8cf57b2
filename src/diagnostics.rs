//! Compile diagnostics and the combined error report.

use crate::assembler::WrappedSource;
use crate::lexer::Position;
use std::fmt;

/// One compile-time problem, positioned in the wrapped source.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Two lines before through two lines after `line`, with line numbers
    pub context: Vec<(usize, String)>,
}

impl Diagnostic {
    pub fn new(source: &WrappedSource, pos: Position, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            line: pos.line,
            column: pos.column,
            context: source.context_window(pos.line),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        writeln!(f)?;
        writeln!(f, "<<<")?;
        let width = self
            .context
            .last()
            .map(|(n, _)| n.to_string().len())
            .unwrap_or(1);
        for (n, text) in &self.context {
            let marker = if *n == self.line { '>' } else { ' ' };
            writeln!(f, "{} {:>width$} | {}", marker, n, text, width = width)?;
        }
        write!(f, ">>>")
    }
}

/// Compilation failed; carries every diagnostic found, in source order.
///
/// Unknown names are only diagnosed when lexing and parsing were clean, so a
/// syntax error anywhere in the unit can hide them until it is fixed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", self.report())]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        CompileError { diagnostics }
    }

    /// All diagnostics concatenated into one human-readable report.
    pub fn report(&self) -> String {
        let mut report = String::from("Compiler Errors:\n");
        for diagnostic in &self.diagnostics {
            report.push_str(&diagnostic.to_string());
            report.push('\n');
        }
        report
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    #[test]
    fn report_marks_offending_line() {
        let source = assemble("lines.(", None);
        let diagnostic = Diagnostic::new(&source, Position::new(3, 22), "expected member name");
        let report = CompileError::new(vec![diagnostic]).report();

        assert!(report.starts_with("Compiler Errors:\n"));
        assert!(report.contains("line 3, column 22: expected member name"));
        assert!(report.contains("> 3 |         return lines.(;"));
        assert!(report.contains("  1 | unit LineQuery {"));
        assert!(report.contains("<<<"));
        assert!(report.contains(">>>"));
    }
}
