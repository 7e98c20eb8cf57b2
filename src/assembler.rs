//! Wraps the operator's query and helper code into one compilable unit.
//!
//! The query becomes the whole body of the `execute` entry point and the
//! helpers are appended verbatim as further members of the same unit, so the
//! query can call helper functions and read helper fields:
//!
//! ```text
//! unit LineQuery {
//!     fn execute(lines) {
//!         return <query>;
//!     }
//!
//! <helpers>
//! }
//! ```
//!
//! Nothing is escaped or validated here. Diagnostics are later reported
//! against the line numbers of this wrapped text, not the operator's
//! original offsets.

/// Name of the generated unit.
pub const UNIT_NAME: &str = "LineQuery";

/// Entry point called by the invoker.
pub const ENTRY_POINT: &str = "execute";

/// Parameter of the entry point bound to the input lines.
pub const LINES_PARAM: &str = "lines";

/// The single compilable text built from a query and its helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedSource {
    text: String,
}

impl WrappedSource {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Source lines without terminators.
    pub fn lines(&self) -> Vec<&str> {
        self.text
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .collect()
    }

    /// Lines from two before through two after `line` (1-based), clamped to
    /// the source, each paired with its own line number.
    pub fn context_window(&self, line: usize) -> Vec<(usize, String)> {
        let lines = self.lines();
        if lines.is_empty() || line == 0 {
            return vec![];
        }
        let first = line.saturating_sub(2).max(1);
        let last = (line + 2).min(lines.len());
        (first..=last)
            .map(|n| (n, lines[n - 1].to_string()))
            .collect()
    }

    /// Wrapped text prefixed with line numbers.
    pub fn numbered(&self) -> String {
        let lines = self.lines();
        let width = lines.len().to_string().len();
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>width$} | {}", i + 1, line, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for WrappedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Substitute the query and optional helper code into the fixed template.
pub fn assemble(query: &str, helpers: Option<&str>) -> WrappedSource {
    let helpers = helpers.unwrap_or_default();
    let mut text = String::with_capacity(query.len() + helpers.len() + 96);

    text.push_str("unit ");
    text.push_str(UNIT_NAME);
    text.push_str(" {\n    fn ");
    text.push_str(ENTRY_POINT);
    text.push('(');
    text.push_str(LINES_PARAM);
    text.push_str(") {\n        return ");
    text.push_str(query);
    text.push_str(";\n    }\n\n");
    text.push_str(helpers);
    text.push_str("\n}\n");

    WrappedSource { text }
}
