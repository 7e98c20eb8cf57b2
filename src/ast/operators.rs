use super::Token;

/// Binary operators, loosest binding first:
/// `??`, `or`, `and`, comparisons, `+ -`, `* / %`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    /// `??`
    NullCoalesce,
    Or,
    And,

    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    /// Addition, or concatenation when either side is text
    Add,
    Subtract,
    Multiply,
    /// Exact integer division stays integral
    Divide,
    Modulo,
}

impl BinOp {
    pub fn from_token(token: &Token) -> Option<BinOp> {
        Some(match token {
            Token::QuestionQuestion => BinOp::NullCoalesce,
            Token::Or => BinOp::Or,
            Token::And => BinOp::And,
            Token::EqEq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::Gt => BinOp::GreaterThan,
            Token::LtEq => BinOp::LessEqual,
            Token::GtEq => BinOp::GreaterEqual,
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Subtract,
            Token::Star => BinOp::Multiply,
            Token::Slash => BinOp::Divide,
            Token::Percent => BinOp::Modulo,
            _ => return None,
        })
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::NullCoalesce => 1,
            BinOp::Or => 2,
            BinOp::And => 3,
            BinOp::Add | BinOp::Subtract => 5,
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => 6,
            _ => 4,
        }
    }

    /// Comparisons do not chain: `a < b < c` is rejected.
    pub fn is_comparison(self) -> bool {
        self.precedence() == 4
    }

    /// The right operand is only evaluated when the left does not decide.
    pub fn short_circuits(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::NullCoalesce)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::NullCoalesce => "??",
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
        }
    }

    /// Noun used in arithmetic error messages.
    pub fn operation(self) -> &'static str {
        match self {
            BinOp::Add => "addition",
            BinOp::Subtract => "subtraction",
            BinOp::Multiply => "multiplication",
            BinOp::Divide => "division",
            BinOp::Modulo => "modulo",
            other => other.symbol(),
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// `-x`
    Negate,
    /// `not x` / `!x`
    Not,
}

impl UnaryOp {
    pub fn from_token(token: &Token) -> Option<UnaryOp> {
        match token {
            Token::Minus => Some(UnaryOp::Negate),
            Token::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_ladder() {
        let ladder = [
            BinOp::NullCoalesce,
            BinOp::Or,
            BinOp::And,
            BinOp::Equal,
            BinOp::Add,
            BinOp::Multiply,
        ];
        assert!(ladder.windows(2).all(|w| w[0].precedence() < w[1].precedence()));
    }

    #[test]
    fn minus_is_both_unary_and_binary() {
        assert_eq!(BinOp::from_token(&Token::Minus), Some(BinOp::Subtract));
        assert_eq!(UnaryOp::from_token(&Token::Minus), Some(UnaryOp::Negate));
        assert_eq!(BinOp::from_token(&Token::Not), None);
    }
}
