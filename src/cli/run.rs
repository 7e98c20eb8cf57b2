//! Execute lineq queries against text input

use super::CliError;
use crate::{EngineError, LineSequence, QueryEngine, QuerySpec};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The query to execute
    pub query: String,
    /// Helper members appended to the unit
    pub helpers: Option<String>,
    /// Input text, split into lines
    pub input: Option<String>,
}

impl RunOptions {
    fn spec(&self) -> QuerySpec {
        let spec = QuerySpec::new(self.query.as_str());
        match &self.helpers {
            Some(helpers) => spec.with_helpers(helpers.as_str()),
            None => spec,
        }
    }
}

/// Execute a query and return its output lines
pub fn execute_run(options: &RunOptions, engine: &QueryEngine) -> Result<Vec<String>, CliError> {
    let input = options.input.as_ref().ok_or(CliError::NoInput)?;
    let lines = LineSequence::from_text(input);
    Ok(engine.execute(&options.spec(), &lines)?)
}

/// Compile a query without running it
pub fn execute_check(query: &str, helpers: Option<&str>) -> Result<(), CliError> {
    let options = RunOptions {
        query: query.to_string(),
        helpers: helpers.map(str::to_string),
        input: None,
    };
    QueryEngine::new()
        .check(&options.spec())
        .map(|_| ())
        .map_err(|e| CliError::Query(EngineError::Compile(e)))
}

/// The numbered unit a query and its helpers compile as
pub fn wrapped_source(query: &str, helpers: Option<&str>) -> String {
    let mut spec = QuerySpec::new(query);
    if let Some(helpers) = helpers {
        spec = spec.with_helpers(helpers);
    }
    spec.wrap().numbered()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_input() {
        let options = RunOptions {
            query: "lines".to_string(),
            ..Default::default()
        };
        let err = execute_run(&options, &QueryEngine::new()).unwrap_err();
        assert!(matches!(err, CliError::NoInput));
    }

    #[test]
    fn run_with_helpers() {
        let options = RunOptions {
            query: "lines.map(shout(@))".to_string(),
            helpers: Some("fn shout(l) = l.upper() + \"!\";".to_string()),
            input: Some("hi\nyo\n".to_string()),
        };
        let output = execute_run(&options, &QueryEngine::new()).unwrap();
        assert_eq!(output, vec!["HI!", "YO!"]);
    }

    #[test]
    fn check_reports_compile_errors() {
        let err = execute_check("lines.nope()", None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("Query Compilation Error\nCompiler Errors:"));
    }
}
