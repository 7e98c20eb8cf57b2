//! Name and call checking for a parsed unit.
//!
//! Runs after a clean parse and reports every problem it finds rather than
//! stopping at the first, so one compile shows all broken helpers at once.

use std::collections::{HashMap, HashSet};

use crate::{
    assembler::{ENTRY_POINT, LINES_PARAM},
    ast::{Clause, Expr, FnDecl, Member, QueryExpr, Terminal, Unit},
    lexer::Position,
    methods::{function_signature, method_signature},
};

/// A name or call that does not resolve.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ResolveError {
    pub message: String,
    pub pos: Position,
}

/// What a top-level name refers to.
#[derive(Debug, Clone, Copy)]
enum Symbol {
    Function { arity: usize },
    Field,
    Record { arity: usize },
}

struct Resolver<'u> {
    symbols: HashMap<&'u str, Symbol>,
    /// Method names declared on any record type
    record_methods: HashSet<&'u str>,
    /// Local names in scope, innermost last
    scope: Vec<&'u str>,
    /// Number of enclosing method arguments that bind `@`
    implicit_params: usize,
    errors: Vec<ResolveError>,
}

/// Check every name and call in `unit`, returning the problems in source order.
pub fn resolve(unit: &Unit) -> Vec<ResolveError> {
    let mut resolver = Resolver {
        symbols: HashMap::new(),
        record_methods: HashSet::new(),
        scope: Vec::new(),
        implicit_params: 0,
        errors: Vec::new(),
    };

    resolver.declare_members(unit);
    resolver.check_entry_point(unit);

    for member in &unit.members {
        match member {
            Member::Function(f) => resolver.check_function(f),
            Member::Field(field) => resolver.check_expr(&field.value),
            Member::Record(record) => {
                for method in &record.methods {
                    resolver.check_function(method);
                }
            }
        }
    }

    let mut errors = resolver.errors;
    errors.sort_by_key(|e| (e.pos.line, e.pos.column));
    errors
}

impl<'u> Resolver<'u> {
    fn error(&mut self, pos: Position, message: String) {
        self.errors.push(ResolveError { message, pos });
    }

    fn declare_members(&mut self, unit: &'u Unit) {
        for member in &unit.members {
            let symbol = match member {
                Member::Function(f) => Symbol::Function {
                    arity: f.params.len(),
                },
                Member::Field(_) => Symbol::Field,
                Member::Record(r) => {
                    self.record_methods
                        .extend(r.methods.iter().map(|m| m.name.as_str()));
                    Symbol::Record {
                        arity: r.fields.len(),
                    }
                }
            };
            if self.symbols.contains_key(member.name()) {
                self.error(
                    member.pos(),
                    format!(
                        "the unit already contains a definition for `{}`",
                        member.name()
                    ),
                );
                continue;
            }
            self.symbols.insert(member.name(), symbol);
        }
    }

    fn check_entry_point(&mut self, unit: &Unit) {
        let entry = unit.members.iter().find_map(|m| match m {
            Member::Function(f) if f.name == ENTRY_POINT => Some(f),
            _ => None,
        });
        match entry {
            None => self.error(
                Position::new(1, 1),
                format!("unit has no `{}` entry point", ENTRY_POINT),
            ),
            Some(f) if f.params.len() != 1 || f.params[0] != LINES_PARAM => self.error(
                f.pos,
                format!(
                    "entry point `{}` must take exactly one parameter `{}`",
                    ENTRY_POINT, LINES_PARAM
                ),
            ),
            Some(_) => {}
        }
    }

    fn check_function(&mut self, f: &'u FnDecl) {
        let outer = std::mem::take(&mut self.scope);
        let implicit = std::mem::replace(&mut self.implicit_params, 0);
        self.scope.extend(f.params.iter().map(String::as_str));
        self.check_expr(&f.body);
        self.scope = outer;
        self.implicit_params = implicit;
    }

    fn in_scope(&self, name: &str) -> bool {
        self.scope.iter().rev().any(|local| *local == name)
    }

    fn check_args(&mut self, args: &'u [Expr]) {
        for arg in args {
            self.check_expr(arg);
        }
    }

    fn check_expr(&mut self, expr: &'u Expr) {
        match expr {
            Expr::Float(_) | Expr::Integer(_) | Expr::String(_) | Expr::Boolean(_) | Expr::Null => {}
            Expr::Ident { name, pos } => {
                if self.in_scope(name) {
                    return;
                }
                match self.symbols.get(name.as_str()) {
                    Some(Symbol::Field) => {}
                    Some(Symbol::Function { .. }) | Some(Symbol::Record { .. }) => self.error(
                        *pos,
                        format!("`{}` is not a value; call it with `{}(...)`", name, name),
                    ),
                    None => self.error(
                        *pos,
                        format!("the name `{}` does not exist in the current context", name),
                    ),
                }
            }
            Expr::LambdaParam { pos } => {
                if self.implicit_params == 0 {
                    self.error(
                        *pos,
                        "`@` can only be used inside a method argument".to_string(),
                    );
                }
            }
            Expr::Member { object, .. } => self.check_expr(object),
            Expr::Index { object, index } => {
                self.check_expr(object);
                self.check_expr(index);
            }
            Expr::BinaryOp { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            Expr::Unary { operand, .. } => self.check_expr(operand),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expr(condition);
                self.check_expr(then_branch);
                self.check_expr(else_branch);
            }
            Expr::MethodCall {
                object,
                method,
                args,
                pos,
            } => {
                self.check_expr(object);
                self.check_method(method, args.len(), *pos);
                for arg in args {
                    self.check_method_arg(arg);
                }
            }
            Expr::Call { name, args, pos } => {
                self.check_call(name, args.len(), *pos);
                self.check_args(args);
            }
            Expr::Lambda { pos, .. } => self.error(
                *pos,
                "a lambda can only be used as a method argument".to_string(),
            ),
            Expr::Query(query) => self.check_query(query),
            Expr::Object(fields) => {
                for (_, value) in fields {
                    self.check_expr(value);
                }
            }
            Expr::Array(items) => self.check_args(items),
        }
    }

    fn check_method_arg(&mut self, arg: &'u Expr) {
        match arg {
            Expr::Lambda { param, body, .. } => {
                self.scope.push(param);
                self.check_expr(body);
                self.scope.pop();
            }
            other => {
                self.implicit_params += 1;
                self.check_expr(other);
                self.implicit_params -= 1;
            }
        }
    }

    fn check_method(&mut self, method: &str, argc: usize, pos: Position) {
        if self.record_methods.contains(method) {
            // Arity of declared methods depends on the receiver type
            return;
        }
        match method_signature(method) {
            None => self.error(pos, format!("unknown method `{}`", method)),
            Some(sig) if argc < sig.min_args || argc > sig.max_args => self.error(
                pos,
                format!(
                    "method `{}` takes {} argument(s) but {} were supplied",
                    method,
                    arity_text(sig.min_args, sig.max_args),
                    argc
                ),
            ),
            Some(_) => {}
        }
    }

    fn check_call(&mut self, name: &str, argc: usize, pos: Position) {
        let expected = match self.symbols.get(name) {
            Some(Symbol::Function { arity }) => Some((*arity, *arity)),
            Some(Symbol::Record { arity }) => Some((*arity, *arity)),
            Some(Symbol::Field) => {
                self.error(pos, format!("field `{}` cannot be called", name));
                return;
            }
            None => function_signature(name).map(|sig| (sig.min_args, sig.max_args)),
        };
        match expected {
            None => self.error(pos, format!("unknown function `{}`", name)),
            Some((min, max)) if argc < min || argc > max => self.error(
                pos,
                format!(
                    "`{}` takes {} argument(s) but {} were supplied",
                    name,
                    arity_text(min, max),
                    argc
                ),
            ),
            Some(_) => {}
        }
    }

    fn check_query(&mut self, query: &'u QueryExpr) {
        let depth = self.scope.len();
        for clause in &query.clauses {
            match clause {
                Clause::From { var, source } => {
                    self.check_expr(source);
                    self.scope.push(var);
                }
                Clause::Where(condition) => self.check_expr(condition),
                Clause::Let { name, value } => {
                    self.check_expr(value);
                    self.scope.push(name);
                }
                Clause::OrderBy(orderings) => {
                    for ordering in orderings {
                        self.check_expr(&ordering.key);
                    }
                }
            }
        }
        match &query.terminal {
            Terminal::Select(expr) => self.check_expr(expr),
            Terminal::Group { element, key } => {
                self.check_expr(element);
                self.check_expr(key);
            }
        }
        self.scope.truncate(depth);
    }
}

fn arity_text(min: usize, max: usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{} to {}", min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assembler::assemble, lexer::Lexer, parser::Parser};

    fn resolve_query(query: &str, helpers: Option<&str>) -> Vec<String> {
        let source = assemble(query, helpers);
        let (unit, errors) = Parser::new(Lexer::new(source.as_str())).parse_unit();
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        resolve(&unit).into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn clean_query_resolves() {
        let errors = resolve_query(
            "from l in lines where keep(l) select l.upper()",
            Some("fn keep(l) = l.len() > limit;\nlet limit = 2;"),
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn unknown_name_is_reported() {
        let errors = resolve_query("line.count()", None);
        assert_eq!(
            errors,
            vec!["the name `line` does not exist in the current context"]
        );
    }

    #[test]
    fn lines_is_not_visible_in_helpers() {
        let errors = resolve_query("lines", Some("fn total() = lines.count();"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("`lines`"));
    }

    #[test]
    fn duplicate_helper_is_reported() {
        let errors = resolve_query("lines", Some("fn f(x) = x;\nfn f(y) = y;"));
        assert_eq!(
            errors,
            vec!["the unit already contains a definition for `f`"]
        );
    }

    #[test]
    fn arity_mismatches_are_reported() {
        let errors = resolve_query("lines.take()", Some("fn f(x) = range(x);"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn implicit_param_needs_method_argument() {
        let errors = resolve_query("@", None);
        assert_eq!(errors, vec!["`@` can only be used inside a method argument"]);
        assert!(resolve_query("lines.map(@.split(\",\").map(@.trim()))", None).is_empty());
    }

    #[test]
    fn comprehension_variables_go_out_of_scope() {
        let errors = resolve_query("[from l in lines select l, l]", None);
        assert_eq!(errors.len(), 1);
    }
}
