use crate::{
    ast::{
        BinOp, Clause, Expr, FieldDecl, FnDecl, Member, Ordering, QueryExpr, RecordDecl, Terminal,
        Token, UnaryOp, Unit,
    },
    lexer::{LexError, Lexer, Position, Spanned},
};
use std::mem;

/// Syntax error with the position of the token where parsing failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub pos: Position,
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.message,
            pos: e.pos,
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    peeked: Option<Spanned>,
    /// Unclosed braces among the tokens consumed so far
    depth: usize,
    lex_errors: Vec<LexError>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let mut lex_errors = Vec::new();
        let current = Self::fetch(&mut lexer, &mut lex_errors);
        Parser {
            lexer,
            current,
            peeked: None,
            depth: 0,
            lex_errors,
        }
    }

    /// Pull the next valid token, recording lexical errors on the way.
    fn fetch(lexer: &mut Lexer, errors: &mut Vec<LexError>) -> Spanned {
        loop {
            match lexer.next_token() {
                Ok(token) => return token,
                Err(e) => errors.push(e),
            }
        }
    }

    fn advance(&mut self) {
        match self.current.token {
            Token::LBrace => self.depth += 1,
            Token::RBrace => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.current = match self.peeked.take() {
            Some(token) => token,
            None => Self::fetch(&mut self.lexer, &mut self.lex_errors),
        };
    }

    fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(Self::fetch(&mut self.lexer, &mut self.lex_errors));
        }
        match &self.peeked {
            Some(spanned) => &spanned.token,
            None => &Token::Eof,
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError {
            message: message.into(),
            pos: self.current.pos,
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return self.error(format!(
                "expected {}, found {}",
                expected.describe(),
                self.current.token.describe()
            ));
        }
        self.advance();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current.token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => self.error(format!("expected {}, found {}", what, other.describe())),
        }
    }

    /// Parse primary expressions (atoms): literals, names, calls, `@`,
    /// parenthesised expressions, record and array literals.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        match self.current.token.clone() {
            // Literals
            Token::Float(n) => {
                self.advance();
                Ok(Expr::Float(n))
            }
            Token::Integer(n) => {
                self.advance();
                Ok(Expr::Integer(n))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            Token::Boolean(b) => {
                self.advance();
                Ok(Expr::Boolean(b))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Null)
            }

            // References
            Token::Identifier(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call { name, args, pos })
                } else {
                    Ok(Expr::Ident { name, pos })
                }
            }
            Token::At => {
                self.advance();
                Ok(Expr::LambdaParam { pos })
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            // Record literals
            Token::LBrace => {
                self.advance();
                self.parse_object_literal()
            }
            // Array literals
            Token::LBracket => {
                self.advance();
                self.parse_array_literal()
            }

            token => self.error(format!("expected expression, found {}", token.describe())),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut fields: Vec<(String, Expr)> = vec![];

        while !self.check(&Token::RBrace) {
            let key_pos = self.current.pos;
            let key = match &self.current.token {
                Token::String(s) => s.clone(),
                Token::Identifier(s) => s.clone(),
                other => {
                    return self.error(format!(
                        "expected field name in record literal, found {}",
                        other.describe()
                    ));
                }
            };
            if fields.iter().any(|(existing, _)| *existing == key) {
                return Err(ParseError {
                    message: format!("duplicate field `{}` in record literal", key),
                    pos: key_pos,
                });
            }

            self.advance();

            self.expect(Token::Colon)?;

            let value = self.parse_expression()?;
            fields.push((key, value));

            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(Expr::Object(fields))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let mut elements = vec![];

        while !self.check(&Token::RBracket) {
            elements.push(self.parse_expression()?);

            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBracket)?;
        Ok(Expr::Array(elements))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen)?;
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RParen)?;
        Ok(args)
    }

    /// Name after a `.`; keywords are allowed so `lines.select(...)` and
    /// `lines.where(...)` read naturally.
    fn parse_member_name(&mut self) -> Result<String, ParseError> {
        let name = match &self.current.token {
            Token::Identifier(n) => n.clone(),
            other => match other.keyword_text() {
                Some(text) => text.to_string(),
                None => {
                    return self.error(format!(
                        "expected member name after '.', found {}",
                        other.describe()
                    ));
                }
            },
        };
        self.advance();
        Ok(name)
    }

    /// Parse member access, method calls and indexing
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::Dot) {
                self.advance(); // consume '.'

                let pos = self.current.pos;
                let name = self.parse_member_name()?;

                if self.check(&Token::LParen) {
                    let args = self.parse_arguments()?;
                    expr = Expr::MethodCall {
                        object: Box::new(expr),
                        method: name,
                        args,
                        pos,
                    };
                } else {
                    expr = Expr::Member {
                        object: Box::new(expr),
                        name,
                    };
                }
            } else if self.check(&Token::LBracket) {
                self.advance(); // consume '['
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;

                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let Some(op) = UnaryOp::from_token(&self.current.token) else {
            return self.parse_postfix();
        };
        self.advance();
        let operand = self.parse_unary()?; // Right-associative
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Left-associative binary operators binding at least as tightly as
    /// `min_precedence`.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = BinOp::from_token(&self.current.token)
            && op.precedence() >= min_precedence
        {
            self.advance();
            let right = self.parse_binary(op.precedence() + 1)?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };

            if op.is_comparison()
                && let Some(next) = BinOp::from_token(&self.current.token)
                && next.is_comparison()
            {
                return self.error(format!(
                    "comparison operators cannot be chained; found `{}` after `{}`",
                    next.symbol(),
                    op.symbol()
                ));
            }
        }
        Ok(left)
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let pos = self.current.pos;
        let param = self.expect_identifier("lambda parameter")?;
        self.expect(Token::FatArrow)?;
        let body = self.parse_expression()?;
        Ok(Expr::Lambda {
            param,
            body: Box::new(body),
            pos,
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        self.advance(); // consume `if`
        let condition = self.parse_expression()?;
        self.expect(Token::Then)?;
        let then_branch = self.parse_expression()?;
        self.expect(Token::Else)?;
        let else_branch = self.parse_expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_from_clause(&mut self) -> Result<Clause, ParseError> {
        self.expect(Token::From)?;
        let var = self.expect_identifier("range variable after `from`")?;
        self.expect(Token::In)?;
        let source = self.parse_expression()?;
        Ok(Clause::From { var, source })
    }

    fn parse_comprehension(&mut self) -> Result<Expr, ParseError> {
        let mut clauses = vec![self.parse_from_clause()?];

        let terminal = loop {
            match &self.current.token {
                Token::From => clauses.push(self.parse_from_clause()?),
                Token::Where => {
                    self.advance();
                    clauses.push(Clause::Where(self.parse_expression()?));
                }
                Token::Let => {
                    self.advance();
                    let name = self.expect_identifier("name after `let`")?;
                    self.expect(Token::Assign)?;
                    let value = self.parse_expression()?;
                    clauses.push(Clause::Let { name, value });
                }
                Token::OrderBy => {
                    self.advance();
                    let mut orderings = vec![];
                    loop {
                        let key = self.parse_expression()?;
                        let descending = match self.current.token {
                            Token::Descending => {
                                self.advance();
                                true
                            }
                            Token::Ascending => {
                                self.advance();
                                false
                            }
                            _ => false,
                        };
                        orderings.push(Ordering { key, descending });
                        if !self.check(&Token::Comma) {
                            break;
                        }
                        self.advance();
                    }
                    clauses.push(Clause::OrderBy(orderings));
                }
                Token::Select => {
                    self.advance();
                    break Terminal::Select(self.parse_expression()?);
                }
                Token::Group => {
                    self.advance();
                    let element = self.parse_expression()?;
                    self.expect(Token::By)?;
                    let key = self.parse_expression()?;
                    break Terminal::Group { element, key };
                }
                other => {
                    return self.error(format!(
                        "expected query clause, `select` or `group`, found {}",
                        other.describe()
                    ));
                }
            }
        };

        Ok(Expr::Query(Box::new(QueryExpr { clauses, terminal })))
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.current.token, Token::Identifier(_)) && *self.peek() == Token::FatArrow {
            return self.parse_lambda();
        }
        match self.current.token {
            Token::If => self.parse_conditional(),
            Token::From => self.parse_comprehension(),
            _ => self.parse_binary(1),
        }
    }

    /// Parse a standalone expression that must consume the whole input.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression();
        if let Some(first) = self.lex_errors.first() {
            return Err(first.clone().into());
        }
        let expr = expr?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}

impl Parser {
    /// Parse a complete unit, recovering after errors.
    ///
    /// Returns the members that parsed cleanly together with every lexical
    /// and syntax error found, ordered by position.
    pub fn parse_unit(mut self) -> (Unit, Vec<ParseError>) {
        let mut errors = vec![];
        let mut unit = Unit {
            name: String::new(),
            members: vec![],
        };

        match self.parse_unit_header() {
            Ok(name) => unit.name = name,
            Err(e) => {
                errors.push(e);
                return self.finish(unit, errors);
            }
        }

        loop {
            let member = match &self.current.token {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => {
                    errors.push(ParseError {
                        message: "expected `}` to close the unit, found end of input".to_string(),
                        pos: self.current.pos,
                    });
                    break;
                }
                Token::Fn => self.parse_function().map(Member::Function),
                Token::Let => self.parse_field().map(Member::Field),
                Token::Record => self.parse_record().map(Member::Record),
                other => self.error(format!(
                    "expected `fn`, `let` or `record`, found {}",
                    other.describe()
                )),
            };

            match member {
                Ok(member) => unit.members.push(member),
                Err(e) => {
                    errors.push(e);
                    self.synchronize();
                }
            }
        }

        if !self.check(&Token::Eof) {
            errors.push(ParseError {
                message: format!(
                    "unexpected {} after the end of the unit",
                    self.current.token.describe()
                ),
                pos: self.current.pos,
            });
        }

        self.finish(unit, errors)
    }

    fn finish(self, unit: Unit, mut errors: Vec<ParseError>) -> (Unit, Vec<ParseError>) {
        errors.extend(self.lex_errors.into_iter().map(ParseError::from));
        errors.sort_by_key(|e| (e.pos.line, e.pos.column));
        (unit, errors)
    }

    /// Skip to the next member keyword or the closing brace of the unit.
    fn synchronize(&mut self) {
        loop {
            match self.current.token {
                Token::Eof => return,
                Token::Fn | Token::Let | Token::Record | Token::RBrace if self.depth == 1 => return,
                _ => self.advance(),
            }
        }
    }

    fn parse_unit_header(&mut self) -> Result<String, ParseError> {
        self.expect(Token::Unit)?;
        let name = self.expect_identifier("unit name")?;
        self.expect(Token::LBrace)?;
        Ok(name)
    }

    fn parse_parameters(&mut self, what: &str) -> Result<Vec<String>, ParseError> {
        self.expect(Token::LParen)?;
        let mut params: Vec<String> = vec![];

        while !self.check(&Token::RParen) {
            let pos = self.current.pos;
            let name = self.expect_identifier(what)?;
            if params.contains(&name) {
                return Err(ParseError {
                    message: format!("duplicate {} `{}`", what, name),
                    pos,
                });
            }
            params.push(name);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RParen)?;
        Ok(params)
    }

    fn parse_function(&mut self) -> Result<FnDecl, ParseError> {
        let pos = self.current.pos;
        self.expect(Token::Fn)?;
        let name = self.expect_identifier("function name after `fn`")?;
        let params = self.parse_parameters("parameter")?;

        let body = if self.check(&Token::LBrace) {
            self.advance();
            self.expect(Token::Return)?;
            let body = self.parse_expression()?;
            self.expect(Token::Semicolon)?;
            self.expect(Token::RBrace)?;
            body
        } else {
            self.expect(Token::Assign)?;
            let body = self.parse_expression()?;
            self.expect(Token::Semicolon)?;
            body
        };

        Ok(FnDecl {
            name,
            params,
            body,
            pos,
        })
    }

    fn parse_field(&mut self) -> Result<FieldDecl, ParseError> {
        let pos = self.current.pos;
        self.expect(Token::Let)?;
        let name = self.expect_identifier("field name after `let`")?;
        self.expect(Token::Assign)?;
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;
        Ok(FieldDecl { name, value, pos })
    }

    fn parse_record(&mut self) -> Result<RecordDecl, ParseError> {
        let pos = self.current.pos;
        self.expect(Token::Record)?;
        let name = self.expect_identifier("record name after `record`")?;
        let fields = self.parse_parameters("record field")?;
        let mut methods: Vec<FnDecl> = vec![];

        if self.check(&Token::LBrace) {
            self.advance();
            while !self.check(&Token::RBrace) {
                if !self.check(&Token::Fn) {
                    return self.error(format!(
                        "expected `fn` or `}}` in record body, found {}",
                        self.current.token.describe()
                    ));
                }
                let method = self.parse_function()?;
                if method.params.is_empty() {
                    return Err(ParseError {
                        message: format!(
                            "method `{}` of record `{}` must take the record as its first parameter",
                            method.name, name
                        ),
                        pos: method.pos,
                    });
                }
                if methods.iter().any(|m| m.name == method.name) {
                    return Err(ParseError {
                        message: format!(
                            "duplicate method `{}` in record `{}`",
                            method.name, name
                        ),
                        pos: method.pos,
                    });
                }
                methods.push(method);
            }
            self.expect(Token::RBrace)?;
        } else {
            self.expect(Token::Semicolon)?;
        }

        Ok(RecordDecl {
            name,
            fields,
            methods,
            pos,
        })
    }
}
