use crate::ast::Token;

/// 1-based line and column of a token in the wrapped source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A token together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: Position,
}

/// Malformed input found while scanning.
///
/// The lexer has already moved past the offending text when this is
/// returned, so callers can keep asking for tokens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub pos: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_char(1) == Some('/') {
                while let Some(c) = self.current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        let mut bad_escape = None;
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return match bad_escape {
                        Some((esc, pos)) => Err(LexError {
                            message: format!("invalid escape sequence '\\{}'", esc),
                            pos,
                        }),
                        None => Ok(result),
                    };
                }
                '\n' => break,
                '\\' => {
                    let escape_pos = self.here();
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('0') => result.push('\0'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            // Report once the literal is skipped so scanning resumes after it
                            if bad_escape.is_none() {
                                bad_escape = Some((ch, escape_pos));
                            }
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "unterminated string literal".to_string(),
            pos: start,
        })
    }

    fn read_number(&mut self, start: Position) -> Result<Token, LexError> {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self
            .current_char()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            let suffix = self.read_identifier();
            return Err(LexError {
                message: format!("invalid number literal '{}{}'", number, suffix),
                pos: start,
            });
        }

        if is_float {
            number.parse::<f64>().map(Token::Float).map_err(|_| LexError {
                message: format!("invalid number literal '{}'", number),
                pos: start,
            })
        } else {
            number.parse::<i64>().map(Token::Integer).map_err(|_| LexError {
                message: format!("integer literal '{}' is out of range", number),
                pos: start,
            })
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    fn double(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        self.advance();
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace_and_comments();

        let pos = self.here();
        let token = match self.current_char() {
            None => Ok(Token::Eof),
            Some('@') => self.single(Token::At),
            Some('.') => self.single(Token::Dot),
            Some(',') => self.single(Token::Comma),
            Some(';') => self.single(Token::Semicolon),
            Some(':') => self.single(Token::Colon),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some('/') => self.single(Token::Slash),
            Some('%') => self.single(Token::Percent),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('{') => self.single(Token::LBrace),
            Some('}') => self.single(Token::RBrace),
            Some('=') => match self.peek_char(1) {
                Some('=') => self.double(Token::EqEq),
                Some('>') => self.double(Token::FatArrow),
                _ => self.single(Token::Assign),
            },
            Some('?') => {
                if self.peek_char(1) == Some('?') {
                    self.double(Token::QuestionQuestion)
                } else {
                    self.advance();
                    Err(LexError {
                        message: "unexpected character '?' (did you mean '??')".to_string(),
                        pos,
                    })
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.double(Token::GtEq)
                } else {
                    self.single(Token::Gt)
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.double(Token::LtEq)
                } else {
                    self.single(Token::Lt)
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.double(Token::NotEq)
                } else {
                    self.single(Token::Not)
                }
            }
            Some('"') => self.read_string('"', pos).map(Token::String),
            Some('\'') => self.read_string('\'', pos).map(Token::String),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                Ok(match ident.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    "unit" => Token::Unit,
                    "fn" => Token::Fn,
                    "let" => Token::Let,
                    "record" => Token::Record,
                    "return" => Token::Return,
                    "from" => Token::From,
                    "in" => Token::In,
                    "where" => Token::Where,
                    "select" => Token::Select,
                    "orderby" => Token::OrderBy,
                    "ascending" => Token::Ascending,
                    "descending" => Token::Descending,
                    "group" => Token::Group,
                    "by" => Token::By,
                    "if" => Token::If,
                    "then" => Token::Then,
                    "else" => Token::Else,
                    _ => Token::Identifier(ident),
                })
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(pos),
            Some(ch) => {
                self.advance();
                Err(LexError {
                    message: format!("unexpected character '{}'", ch),
                    pos,
                })
            }
        }?;

        Ok(Spanned { token, pos })
    }

    /// Scan the whole input, stopping at the first error.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("and or not true false null"),
            vec![
                Token::And,
                Token::Or,
                Token::Not,
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_method_chain() {
        assert_eq!(
            tokens("lines.filter(@.len() > 5)"),
            vec![
                Token::Identifier("lines".to_string()),
                Token::Dot,
                Token::Identifier("filter".to_string()),
                Token::LParen,
                Token::At,
                Token::Dot,
                Token::Identifier("len".to_string()),
                Token::LParen,
                Token::RParen,
                Token::Gt,
                Token::Integer(5),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines() {
        let all = Lexer::new("fn\n  x").tokenize().unwrap();
        assert_eq!(all[0].pos, Position::new(1, 1));
        assert_eq!(all[1].pos, Position::new(2, 3));
    }

    #[test]
    fn test_error_resumes_after_bad_character() {
        let mut lexer = Lexer::new("a # b");
        assert!(lexer.next_token().is_ok());
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.pos, Position::new(1, 3));
        assert_eq!(
            lexer.next_token().unwrap().token,
            Token::Identifier("b".to_string())
        );
    }
}
