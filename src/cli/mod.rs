//! CLI support for lineq
//!
//! Provides programmatic access to the `lineq` subcommands so they can be
//! driven from tests or embedded in other tools.

mod docs;
mod run;
mod shell;

pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use run::{RunOptions, execute_check, execute_run, wrapped_source};
pub use shell::run_shell;

use std::io;

use crate::{EngineError, config::ConfigSaveError};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Compilation, runtime or formatting failure of the query
    #[error("{title}\n{0}", title = .0.title())]
    Query(#[from] EngineError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Config could not be written at shutdown
    #[error("Config error: {0}")]
    Config(#[from] ConfigSaveError),

    /// No input provided
    #[error("No input provided. Use --input or pipe lines to stdin.")]
    NoInput,

    /// Unknown documentation category
    #[error("Unknown category: '{0}'\nRun 'lineq docs' to see available categories.")]
    UnknownCategory(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Query(EngineError::Compile(_)) => 2,
            CliError::Query(_) => 3,
            _ => 1,
        }
    }
}
