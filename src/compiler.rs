//! In-memory compilation of a wrapped source into a loadable unit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

use crate::{
    assembler::WrappedSource,
    ast::Unit,
    diagnostics::{CompileError, Diagnostic},
    lexer::Lexer,
    parser::Parser,
    resolver::resolve,
};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// A parsed and resolved unit, ready to be instantiated and called.
///
/// Owned by a single invocation and dropped once its result is formatted;
/// nothing here is cached between calls.
#[derive(Debug)]
pub struct CompiledUnit {
    id: u64,
    unit: Unit,
}

impl CompiledUnit {
    /// Process-unique id, only used to tell units apart in logs.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }
}

/// Compile `source` from scratch.
///
/// Lexical and syntax errors are collected with recovery; name resolution
/// runs only on a clean parse, so its diagnostics never mix with syntax
/// errors. Every problem found by the stage that failed is returned together.
pub fn compile_and_load(source: &WrappedSource) -> Result<CompiledUnit, CompileError> {
    let started = Instant::now();
    let parser = Parser::new(Lexer::new(source.as_str()));
    let (unit, parse_errors) = parser.parse_unit();

    let diagnostics: Vec<Diagnostic> = if parse_errors.is_empty() {
        resolve(&unit)
            .into_iter()
            .map(|e| Diagnostic::new(source, e.pos, e.message))
            .collect()
    } else {
        parse_errors
            .into_iter()
            .map(|e| Diagnostic::new(source, e.pos, e.message))
            .collect()
    };

    if !diagnostics.is_empty() {
        debug!(
            diagnostics = diagnostics.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "compilation failed"
        );
        return Err(CompileError::new(diagnostics));
    }

    let id = NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed);
    debug!(
        unit = id,
        members = unit.members.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "compiled unit"
    );
    Ok(CompiledUnit { id, unit })
}
