//! Loads a compiled unit and calls its entry point once.

use std::time::Instant;

use tracing::debug;

use crate::{
    assembler::ENTRY_POINT,
    compiler::CompiledUnit,
    engine::LineSequence,
    evaluator::{EvalError, Evaluator},
    format::{FormatError, format},
    value::Value,
};

/// A fault raised while the unit was loading or running.
///
/// The message is the underlying evaluation error, unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct RuntimeError(#[from] pub EvalError);

/// The raw result of one call, together with the loaded instance that
/// produced it.
///
/// Declared `display` methods run against this instance, so the value is
/// formatted through the execution before both are dropped.
pub struct Execution<'c> {
    instance: Evaluator<'c>,
    value: Value,
}

impl<'c> Execution<'c> {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn format(&self) -> Result<Vec<String>, FormatError> {
        format(&self.value, &self.instance)
    }
}

/// Instantiate `unit` (initialising its fields) and run
/// `execute(lines)` on the calling thread.
pub fn invoke<'c>(
    unit: &'c CompiledUnit,
    lines: &LineSequence,
) -> Result<Execution<'c>, RuntimeError> {
    let started = Instant::now();
    let mut instance = Evaluator::for_unit(unit.unit());
    instance.initialize_fields(unit.unit())?;

    let value = instance.call_function(ENTRY_POINT, &[lines.to_value()])?;
    debug!(
        unit = unit.id(),
        lines = lines.len(),
        result = value.type_name(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "invoked entry point"
    );
    Ok(Execution { instance, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assembler::assemble, compiler::compile_and_load};

    fn run(query: &str, helpers: Option<&str>, lines: &[&str]) -> Result<Value, RuntimeError> {
        let unit = compile_and_load(&assemble(query, helpers)).unwrap();
        let lines = LineSequence::from(lines.iter().map(|l| l.to_string()).collect::<Vec<_>>());
        invoke(&unit, &lines).map(Execution::into_value)
    }

    #[test]
    fn fields_are_initialised_before_the_call() {
        let value = run("lines.take(limit)", Some("let limit = 1 + 1;"), &["a", "b", "c"]).unwrap();
        assert_eq!(value, Value::Array(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn faults_are_wrapped_unchanged() {
        let err = run("lines.count() / 0", None, &["a"]).unwrap_err();
        assert_eq!(err, RuntimeError(EvalError::DivisionByZero));
        assert_eq!(err.to_string(), "Division by zero");
    }

    #[test]
    fn runaway_recursion_is_a_runtime_error() {
        let err = run("loop(0)", Some("fn loop(n) = loop(n + 1);"), &[]).unwrap_err();
        assert!(matches!(err.0, EvalError::RecursionLimit(_)));
    }
}
