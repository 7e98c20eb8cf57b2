use crate::ast::Expr;

/// Query comprehension.
///
/// The first clause is always the `from` that introduces the range variable;
/// the terminal is either a `select` or a `group ... by ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpr {
    /// Clauses in source order
    pub clauses: Vec<Clause>,

    /// Final projection
    pub terminal: Terminal,
}

/// Intermediate comprehension clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `from name in source`
    ///
    /// A second `from` produces the cross product of both sources.
    From { var: String, source: Expr },

    /// `where condition`
    Where(Expr),

    /// `let name = value`
    Let { name: String, value: Expr },

    /// `orderby key [ascending|descending], ...`
    OrderBy(Vec<Ordering>),
}

/// One sort key of an `orderby` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub key: Expr,
    pub descending: bool,
}

/// Terminal clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    /// `select expr`
    Select(Expr),

    /// `group element by key`, producing `Grouping` records
    Group { element: Expr, key: Expr },
}
