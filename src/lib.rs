//! lineq: ad-hoc queries over lines of text.
//!
//! A query (plus optional helper code) is assembled into one unit, compiled
//! and loaded in memory, called once with the input lines, and whatever it
//! returns is formatted back into lines.

pub mod assembler;
pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod evaluator;
pub mod format;
pub mod host;
pub mod invoker;
pub mod lexer;
pub mod methods;
pub mod parser;
pub mod resolver;
pub mod shell;
#[cfg(feature = "cli")]
pub mod tracing_setup;
pub mod value;

pub use assembler::{WrappedSource, assemble};
pub use ast::{BinOp, Expr, Token, Unit};
pub use compiler::{CompiledUnit, compile_and_load};
pub use context::AppContext;
pub use diagnostics::{CompileError, Diagnostic};
pub use engine::{EngineError, LineSequence, QueryEngine, QuerySpec};
pub use evaluator::{EvalContext, EvalError, Evaluator};
pub use format::{Capability, FormatError, format, scalar_format};
pub use invoker::{Execution, RuntimeError, invoke};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, Parser};
pub use value::Value;
