//! # lineq query language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the language the
//! engine compiles: one query expression wrapped, together with the
//! operator's helper code, into a single unit.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, names, access, calls, lambdas)
//! - **[operators]** - Binary and unary operators
//! - **[query]** - Query comprehensions (`from ... select ...`)
//! - **[unit]** - The compiled unit and its members (functions, fields, records)
//!
//! ## Quick Start
//!
//! ```text
//! lines.filter(@.contains("ERROR")).map(@.upper())
//! ```
//!
//! This query keeps the lines mentioning `ERROR` and upper-cases them.
//!
//! ## Core Concepts
//!
//! ### The wrapped unit
//!
//! The query is never parsed on its own. It becomes the body of the entry
//! point, and helper code follows as further members:
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
//! ### Method arguments and `@`
//!
//! Higher-order methods evaluate their argument once per element. Inside the
//! argument `@` is the current element; `x => ...` names it instead:
//!
//! ```text
//! lines.sort(@.len())
//! lines.map(l => l.split(",")[0])
//! ```
//!
//! ### Comprehensions
//!
//! ```text
//! from l in lines
//! where not is_blank(l)
//! group l by l.len()
//! ```
//!
//! ### Records
//!
//! Object literals build anonymous records; helpers may declare named
//! record types with an optional `display` method:
//!
//! ```text
//! record Hit(line, count) {
//!     fn display(self) = self.count + "x " + self.line;
//! }
//! ```
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod query;
pub mod unit;

pub use tokens::Token;
pub use expressions::Expr;
pub use operators::{BinOp, UnaryOp};
pub use query::{Clause, Ordering, QueryExpr, Terminal};
pub use unit::{FieldDecl, FnDecl, Member, RecordDecl, Unit};
