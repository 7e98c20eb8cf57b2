//! The query pipeline: assemble, compile, invoke, format.

use std::cell::Cell;
use std::time::Instant;

use tracing::{debug, debug_span, warn};

use crate::{
    assembler::{WrappedSource, assemble},
    compiler::{CompiledUnit, compile_and_load},
    diagnostics::CompileError,
    format::FormatError,
    host::{LineSource, OutputSink},
    invoker::{RuntimeError, invoke},
    value::Value,
};

/// Query text plus optional helper members, as typed by the operator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySpec {
    pub query: String,
    pub helpers: Option<String>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>) -> Self {
        QuerySpec {
            query: query.into(),
            helpers: None,
        }
    }

    /// Attach helper code; blank text counts as none.
    pub fn with_helpers(mut self, helpers: impl Into<String>) -> Self {
        let helpers = helpers.into();
        self.helpers = (!helpers.trim().is_empty()).then_some(helpers);
        self
    }

    pub fn wrap(&self) -> WrappedSource {
        assemble(&self.query, self.helpers.as_deref())
    }
}

/// Snapshot of the input lines taken once per invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSequence {
    lines: Vec<String>,
}

impl LineSequence {
    /// Split raw text into lines, dropping `\n` / `\r\n` terminators.
    pub fn from_text(text: &str) -> Self {
        LineSequence {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The `lines` argument handed to the entry point.
    pub fn to_value(&self) -> Value {
        Value::Array(self.lines.iter().map(|l| Value::String(l.clone())).collect())
    }
}

impl From<Vec<String>> for LineSequence {
    fn from(lines: Vec<String>) -> Self {
        LineSequence { lines }
    }
}

impl<S: Into<String>> FromIterator<S> for LineSequence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        LineSequence {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Any failure of an Execute cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// The line source could not be read
    #[error("cannot read the input lines: {0}")]
    Input(String),

    /// The output buffer could not be written
    #[error("cannot write the output: {0}")]
    Output(String),
}

impl EngineError {
    /// Title of the notification that reports this error.
    pub fn title(&self) -> &'static str {
        match self {
            EngineError::Compile(_) => "Query Compilation Error",
            EngineError::Runtime(_) => "Query Runtime Error",
            EngineError::Format(_) => "Query Format Error",
            EngineError::Input(_) => "Query Input Error",
            EngineError::Output(_) => "Query Output Error",
        }
    }
}

/// Runs queries. Each call compiles and loads a fresh unit and drops it once
/// the result has been formatted.
#[derive(Debug, Default)]
pub struct QueryEngine {
    units_loaded: Cell<u64>,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units compiled and loaded by this engine so far.
    pub fn units_loaded(&self) -> u64 {
        self.units_loaded.get()
    }

    /// Compile without running; returns the wrapped source that compiled.
    pub fn check(&self, spec: &QuerySpec) -> Result<WrappedSource, CompileError> {
        let source = spec.wrap();
        compile_and_load(&source)?;
        Ok(source)
    }

    fn load(&self, source: &WrappedSource) -> Result<CompiledUnit, CompileError> {
        let unit = compile_and_load(source)?;
        self.units_loaded.set(self.units_loaded.get() + 1);
        Ok(unit)
    }

    /// Run `spec` against `lines` and return the formatted output lines.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineq::{LineSequence, QueryEngine, QuerySpec};
    ///
    /// let engine = QueryEngine::new();
    /// let lines = LineSequence::from_text("apple\nkiwi\nbanana");
    ///
    /// let spec = QuerySpec::new("from l in lines where l.len() > 4 select l.upper()");
    /// assert_eq!(engine.execute(&spec, &lines).unwrap(), vec!["APPLE", "BANANA"]);
    ///
    /// let spec = QuerySpec::new("lines.count()");
    /// assert_eq!(engine.execute(&spec, &lines).unwrap(), vec!["3"]);
    /// ```
    pub fn execute(&self, spec: &QuerySpec, lines: &LineSequence) -> Result<Vec<String>, EngineError> {
        let _span = debug_span!("execute", lines = lines.len()).entered();
        let started = Instant::now();

        let source = spec.wrap();
        debug!(bytes = source.as_str().len(), "assembled source");

        let unit = self.load(&source)?;
        let execution = invoke(&unit, lines)?;
        let output = execution.format()?;

        debug!(
            unit = unit.id(),
            units_loaded = self.units_loaded(),
            output_lines = output.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "query finished"
        );
        Ok(output)
    }

    /// One Execute cycle: snapshot the source, run, and write the result to
    /// a fresh output buffer. The sink is only touched once the query has
    /// produced its output; an unreadable source fails before anything runs.
    pub fn run_into(
        &self,
        spec: &QuerySpec,
        source: &dyn LineSource,
        sink: &mut dyn OutputSink,
    ) -> Result<usize, EngineError> {
        let result = source
            .get_lines()
            .map_err(|e| EngineError::Input(e.to_string()))
            .and_then(|lines| self.execute(spec, &LineSequence::from(lines)))
            .and_then(|output| {
                sink.append_lines(&output)
                    .map_err(|e| EngineError::Output(e.to_string()))?;
                Ok(output.len())
            });
        if let Err(e) = &result {
            warn!(kind = e.title(), error = %e, "query failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_helpers_are_dropped() {
        let spec = QuerySpec::new("lines").with_helpers("  \n ");
        assert_eq!(spec.helpers, None);
    }

    #[test]
    fn from_text_strips_terminators() {
        let lines = LineSequence::from_text("a\r\nb\nc\n");
        assert_eq!(lines.as_slice(), ["a", "b", "c"]);
    }

    #[test]
    fn every_execution_loads_a_new_unit() {
        let engine = QueryEngine::new();
        let lines: LineSequence = ["x"].into_iter().collect();
        let spec = QuerySpec::new("lines");
        engine.execute(&spec, &lines).unwrap();
        engine.execute(&spec, &lines).unwrap();
        assert_eq!(engine.units_loaded(), 2);
    }

    #[test]
    fn error_titles() {
        let engine = QueryEngine::new();
        let lines = LineSequence::default();
        let err = engine.execute(&QuerySpec::new("lines."), &lines).unwrap_err();
        assert_eq!(err.title(), "Query Compilation Error");
        let err = engine.execute(&QuerySpec::new("1 / 0"), &lines).unwrap_err();
        assert_eq!(err.title(), "Query Runtime Error");
    }

    #[test]
    fn unreadable_source_never_reaches_the_sink() {
        use crate::host::{BufferSink, FileLines};

        let engine = QueryEngine::new();
        let mut sink = BufferSink::default();
        let source = FileLines::new("/nonexistent/lineq/input.txt");
        let err = engine
            .run_into(&QuerySpec::new("lines.count()"), &source, &mut sink)
            .unwrap_err();
        assert!(matches!(err, EngineError::Input(_)));
        assert_eq!(err.title(), "Query Input Error");
        assert!(sink.buffers.is_empty());
        assert_eq!(engine.units_loaded(), 0);
    }
}
