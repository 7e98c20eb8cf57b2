use crate::ast::{BinOp, QueryExpr, UnaryOp};
use crate::lexer::Position;

/// Abstract Syntax Tree node representing a parsed expression.
///
/// The AST is the internal representation of a query after parsing.
/// It captures the structure and meaning of the query for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 42.0
    /// ```
    Float(f64),

    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// Name reference: a parameter, lambda or comprehension variable, or unit field
    ///
    /// # Examples
    /// ```text
    /// lines
    /// limit
    /// ```
    Ident { name: String, pos: Position },

    /// Implicit method-argument parameter (`@`)
    ///
    /// Refers to the current item inside the argument of a method such as
    /// `filter`, `map` or `sort`.
    LambdaParam { pos: Position },

    // Access
    /// Record field access
    ///
    /// # Examples
    /// ```text
    /// g.Key
    /// point.x
    /// ```
    Member { object: Box<Expr>, name: String },

    /// Array, string or record index
    ///
    /// # Examples
    /// ```text
    /// parts[0]
    /// parts[-1]
    /// row["name"]
    /// ```
    Index { object: Box<Expr>, index: Box<Expr> },

    // Operations
    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation (negation, logical not)
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Conditional expression
    ///
    /// # Example
    /// ```text
    /// if l.len() > 80 then l.substring(0, 80) else l
    /// ```
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Method call
    ///
    /// # Examples
    /// ```text
    /// lines.any(@.contains("TODO"))
    /// parts.sum()
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        pos: Position,
    },

    /// Call of a helper function, record constructor or built-in function
    ///
    /// # Examples
    /// ```text
    /// is_comment(l)
    /// Point(1, 2)
    /// range(0, 10)
    /// ```
    Call {
        name: String,
        args: Vec<Expr>,
        pos: Position,
    },

    /// Lambda with a named parameter, only valid as a method argument
    ///
    /// # Example
    /// ```text
    /// lines.map(l => l.trim())
    /// ```
    Lambda {
        param: String,
        body: Box<Expr>,
        pos: Position,
    },

    /// Query comprehension
    ///
    /// # Example
    /// ```text
    /// from l in lines where l.len() > 0 select l
    /// ```
    Query(Box<QueryExpr>),

    // Record and Array Literals
    /// Anonymous record literal, fields kept in written order
    ///
    /// # Example
    /// ```text
    /// { Line: l, Length: l.len() }
    /// ```
    Object(Vec<(String, Expr)>),

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [l, l.upper()]
    /// ```
    Array(Vec<Expr>),
}
