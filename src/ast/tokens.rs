#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 0.5
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 314
    /// ```
    Integer(i64),

    /// String literal enclosed in double or single quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'item #1'
    /// ```
    String(String),

    /// Boolean values
    ///
    /// # Examples
    /// ```text
    /// true
    /// false
    /// ```
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers and References
    /// Name of a variable, field, function, record or method
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// lines
    /// item_count
    /// _internal
    /// ```
    Identifier(String),

    /// Implicit parameter of a method argument
    ///
    /// # Examples
    /// ```text
    /// lines.filter(@.len() > 3)
    /// lines.sort(@.lower())
    /// ```
    At,

    // Keywords
    /// `unit` - opens the compiled unit
    Unit,
    /// `fn` - helper function or record method
    Fn,
    /// `let` - unit field, or a binding inside a query comprehension
    Let,
    /// `record` - record type declaration
    Record,
    /// `return` - body of a block-bodied function
    Return,

    /// `from` - starts a query comprehension
    ///
    /// # Examples
    /// ```text
    /// from l in lines where l.len() > 3 select l.upper()
    /// ```
    From,
    /// `in`
    In,
    /// `where`
    Where,
    /// `select`
    Select,
    /// `orderby`
    OrderBy,
    /// `ascending`
    Ascending,
    /// `descending`
    Descending,
    /// `group`
    Group,
    /// `by`
    By,

    /// `if`
    If,
    /// `then`
    Then,
    /// `else`
    Else,

    // Operators
    /// Assignment in member declarations and `let` clauses
    ///
    /// # Examples
    /// ```text
    /// let limit = 10;
    /// fn twice(x) = x * 2;
    /// ```
    Assign,

    /// Lambda arrow
    ///
    /// # Examples
    /// ```text
    /// lines.map(l => l.trim())
    /// ```
    FatArrow,

    /// Null-coalescing operator
    ///
    /// # Examples
    /// ```text
    /// l.captures("id=(\\d+)").first() ?? "none"
    /// ```
    QuestionQuestion,

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Arithmetic
    /// Addition or string concatenation
    Plus,

    /// Subtraction or negation
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    // Logical
    /// Logical AND (word, not symbol)
    ///
    /// # Examples
    /// ```text
    /// l.len() > 3 and l.startswith("#")
    /// ```
    And,

    /// Logical OR (word, not symbol)
    Or,

    /// Logical NOT, spelled `not` or `!`
    Not,

    // Delimiters
    /// Left bracket for indexing and array literals
    LBracket,

    /// Right bracket
    RBracket,

    /// Left parenthesis for grouping or calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Left brace for blocks and record literals
    LBrace,

    /// Right brace
    RBrace,

    /// Dot for method calls or field access
    Dot,

    /// Comma for separating arguments or array elements
    Comma,

    /// Colon for record literal fields
    Colon,

    /// Semicolon terminating members and statements
    Semicolon,

    /// End of file
    Eof,
}

impl Token {
    /// Short human-readable rendering used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Float(n) => format!("number `{}`", n),
            Token::Integer(n) => format!("number `{}`", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Boolean(b) => format!("`{}`", b),
            Token::Null => "`null`".to_string(),
            Token::Identifier(name) => format!("identifier `{}`", name),
            Token::Eof => "end of input".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    /// Source text of a keyword token (`select`, `where`, `and`, ...).
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = self.symbol();
        text.chars().all(|c| c.is_ascii_alphabetic()).then_some(text)
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::At => "@",
            Token::Unit => "unit",
            Token::Fn => "fn",
            Token::Let => "let",
            Token::Record => "record",
            Token::Return => "return",
            Token::From => "from",
            Token::In => "in",
            Token::Where => "where",
            Token::Select => "select",
            Token::OrderBy => "orderby",
            Token::Ascending => "ascending",
            Token::Descending => "descending",
            Token::Group => "group",
            Token::By => "by",
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::Assign => "=",
            Token::FatArrow => "=>",
            Token::QuestionQuestion => "??",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            _ => "?",
        }
    }
}
