use crate::ast::{BinaryOp, CmpOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{KnlError, Span};
use crate::lexer::{Token, TokenType};

/// Recursive-descent parser. A translation unit is the start keyword, a
/// newline, a statement sequence, and the end keyword. Block-bodied
/// statements reuse the end keyword (ಮುಗಿಯಿರಿ) as their terminator.
///
/// Any grammar violation aborts the parse with one error naming the
/// offending token; there is no recovery and no partial tree.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, KnlError> {
        self.skip_newlines();
        self.consume(TokenType::Start, "the program start keyword")?;
        self.consume(TokenType::Newline, "a newline after the start keyword")?;

        let statements = self.statement_list()?;
        if statements.is_empty() {
            return Err(self.error_at_current("at least one statement"));
        }

        self.consume(TokenType::End, "the program end keyword")
            .map_err(|e| {
                e.with_help("Every program must close with 'ಮುಗಿಯಿರಿ'.".to_string())
            })?;
        self.skip_newlines();
        if !self.is_at_end() {
            return Err(self.error_at_current("end of input after the program end keyword"));
        }

        Ok(Program { statements })
    }

    /// Statements until a block boundary. Boundary tokens are left for the
    /// caller to consume.
    fn statement_list(&mut self) -> Result<Vec<Stmt>, KnlError> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_block_boundary() {
                break;
            }
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn at_block_boundary(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::End
                | TokenType::Elif
                | TokenType::Else
                | TokenType::Except
                | TokenType::Finally
                | TokenType::Eof
        )
    }

    fn statement(&mut self) -> Result<Stmt, KnlError> {
        match self.peek().token_type {
            TokenType::Print => {
                self.advance();
                self.print_statement()
            }
            TokenType::Identifier => self.identifier_statement(),
            TokenType::If => {
                self.advance();
                self.if_statement()
            }
            TokenType::While => {
                self.advance();
                self.while_statement()
            }
            TokenType::For => {
                self.advance();
                self.for_statement()
            }
            TokenType::Def => {
                self.advance();
                self.function_definition()
            }
            TokenType::Return => {
                self.advance();
                self.return_statement()
            }
            TokenType::Break => {
                let span = self.advance().span.clone();
                self.end_of_statement()?;
                Ok(Stmt::Break { span })
            }
            TokenType::Continue => {
                let span = self.advance().span.clone();
                self.end_of_statement()?;
                Ok(Stmt::Continue { span })
            }
            TokenType::Pass => {
                let span = self.advance().span.clone();
                self.end_of_statement()?;
                Ok(Stmt::Pass { span })
            }
            TokenType::Try => {
                self.advance();
                self.try_statement()
            }
            TokenType::Import => {
                self.advance();
                self.import_statement()
            }
            TokenType::From => {
                self.advance();
                self.from_import_statement()
            }
            TokenType::Class => {
                self.advance();
                self.class_definition()
            }
            _ => Err(self.error_at_current("a statement")),
        }
    }

    fn print_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        self.consume(TokenType::LeftParen, "'(' after the print keyword")?;

        let mut values = vec![self.expression()?];
        while self.match_type(TokenType::Comma) {
            values.push(self.expression()?);
        }

        let end = self
            .consume(TokenType::RightParen, "')' after the print arguments")?
            .span
            .end;
        self.end_of_statement()?;
        Ok(Stmt::Print {
            values,
            span: Span::new(start, end),
        })
    }

    /// Assignment, input binding, or a bare call, all led by an identifier.
    fn identifier_statement(&mut self) -> Result<Stmt, KnlError> {
        let name_token = self.advance().clone();

        if self.match_type(TokenType::Assign) {
            if self.check(TokenType::Input) {
                self.advance();
                self.consume(TokenType::LeftParen, "'(' after the input keyword")?;
                let end = self
                    .consume(TokenType::RightParen, "')' to close the input request")?
                    .span
                    .end;
                self.end_of_statement()?;
                return Ok(Stmt::Input {
                    target: name_token.lexeme,
                    span: Span::new(name_token.span.start, end),
                });
            }

            let value = self.expression()?;
            let end = value.span().end;
            self.end_of_statement()?;
            return Ok(Stmt::Assign {
                target: name_token.lexeme,
                value,
                span: Span::new(name_token.span.start, end),
            });
        }

        if self.match_type(TokenType::LeftParen) {
            let args = self.argument_list()?;
            let end = self
                .consume(TokenType::RightParen, "')' after the call arguments")?
                .span
                .end;
            self.end_of_statement()?;
            return Ok(Stmt::FunctionCall {
                name: name_token.lexeme,
                args,
                span: Span::new(name_token.span.start, end),
            });
        }

        Err(self.error_at_current("'=' or '(' after an identifier"))
    }

    fn if_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let condition = self.expression()?;
        self.consume(TokenType::Colon, "':' after the condition")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;

        let body = self.statement_list()?;

        let else_body = if self.match_type(TokenType::Elif) {
            // A trailing elif nests as a single if in the else branch and
            // shares the chain's closing end keyword.
            Some(vec![self.if_statement()?])
        } else if self.match_type(TokenType::Else) {
            self.consume(TokenType::Colon, "':' after the else keyword")?;
            self.consume(TokenType::Newline, "a newline after ':'")?;
            let statements = self.statement_list()?;
            self.close_block()?;
            Some(statements)
        } else {
            self.close_block()?;
            None
        };

        let end = self.previous().span.end;
        Ok(Stmt::If {
            condition,
            body,
            else_body,
            span: Span::new(start, end),
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let condition = self.expression()?;
        self.consume(TokenType::Colon, "':' after the condition")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;
        let body = self.statement_list()?;
        self.close_block()?;

        Ok(Stmt::While {
            condition,
            body,
            span: Span::new(start, self.previous().span.end),
        })
    }

    /// `ನಿಮಿತ್ತ (x ಒಳಗೆ ವ್ಯಾಪ್ತಿ(a, b)):` with literal integer bounds;
    /// the range is half-open.
    fn for_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        self.consume(TokenType::LeftParen, "'(' after the for keyword")?;
        let var = self
            .consume(TokenType::Identifier, "a loop variable name")?
            .lexeme
            .clone();
        self.consume(TokenType::In, "the in keyword after the loop variable")?;
        self.consume(TokenType::Range, "the range keyword")?;
        self.consume(TokenType::LeftParen, "'(' after the range keyword")?;
        let range_start = self.integer_literal("the range start")?;
        self.consume(TokenType::Comma, "',' between the range bounds")?;
        let range_end = self.integer_literal("the range end")?;
        self.consume(TokenType::RightParen, "')' after the range bounds")?;
        self.consume(TokenType::RightParen, "')' to close the loop header")?;
        self.consume(TokenType::Colon, "':' after the loop header")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;

        let body = self.statement_list()?;
        self.close_block()?;

        Ok(Stmt::For {
            var,
            start: range_start,
            end: range_end,
            body,
            span: Span::new(start, self.previous().span.end),
        })
    }

    fn integer_literal(&mut self, what: &str) -> Result<i64, KnlError> {
        let token = self.consume(TokenType::Number, what)?.clone();
        token.lexeme.parse::<i64>().map_err(|_| {
            KnlError::parse_error(
                token.span.clone(),
                format!("Invalid integer literal '{}'", token.lexeme),
            )
        })
    }

    fn function_definition(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let name = self
            .consume(TokenType::Identifier, "a function name")?
            .lexeme
            .clone();
        self.consume(TokenType::LeftParen, "'(' after the function name")?;

        let mut params = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                params.push(
                    self.consume(TokenType::Identifier, "a parameter name")?
                        .lexeme
                        .clone(),
                );
                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "')' after the parameter list")?;
        self.consume(TokenType::Colon, "':' after the parameter list")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;

        let body = self.statement_list()?;
        self.close_block()?;

        Ok(Stmt::FunctionDef {
            name,
            params,
            body,
            span: Span::new(start, self.previous().span.end),
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let value = self.expression()?;
        let end = value.span().end;
        self.end_of_statement()?;
        Ok(Stmt::Return {
            value,
            span: Span::new(start, end),
        })
    }

    fn try_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        self.consume(TokenType::Colon, "':' after the try keyword")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;
        let try_body = self.statement_list()?;

        self.consume(TokenType::Except, "the except keyword after a try body")?;
        self.consume(TokenType::Colon, "':' after the except keyword")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;
        let except_body = self.statement_list()?;

        let finally_body = if self.match_type(TokenType::Finally) {
            self.consume(TokenType::Colon, "':' after the finally keyword")?;
            self.consume(TokenType::Newline, "a newline after ':'")?;
            Some(self.statement_list()?)
        } else {
            None
        };
        self.close_block()?;

        Ok(Stmt::TryExcept {
            try_body,
            except_body,
            finally_body,
            span: Span::new(start, self.previous().span.end),
        })
    }

    fn import_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let module = self
            .consume(TokenType::Identifier, "a module name after the import keyword")?
            .clone();
        self.end_of_statement()?;
        Ok(Stmt::Import {
            module: module.lexeme,
            span: Span::new(start, module.span.end),
        })
    }

    fn from_import_statement(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let module = self
            .consume(TokenType::Identifier, "a module name after the from keyword")?
            .lexeme
            .clone();
        self.consume(TokenType::Import, "the import keyword")?;
        let name = self
            .consume(TokenType::Identifier, "a name to import")?
            .clone();
        self.end_of_statement()?;
        Ok(Stmt::FromImport {
            module,
            name: name.lexeme,
            span: Span::new(start, name.span.end),
        })
    }

    fn class_definition(&mut self) -> Result<Stmt, KnlError> {
        let start = self.previous().span.start;
        let name = self
            .consume(TokenType::Identifier, "a class name")?
            .lexeme
            .clone();

        let parent = if self.match_type(TokenType::LeftParen) {
            let parent = self
                .consume(TokenType::Identifier, "a parent class name")?
                .lexeme
                .clone();
            self.consume(TokenType::RightParen, "')' after the parent class name")?;
            Some(parent)
        } else {
            None
        };

        self.consume(TokenType::Colon, "':' after the class header")?;
        self.consume(TokenType::Newline, "a newline after ':'")?;
        let body = self.statement_list()?;
        self.close_block()?;

        Ok(Stmt::ClassDef {
            name,
            parent,
            body,
            span: Span::new(start, self.previous().span.end),
        })
    }

    /// Consume the end keyword that closes a block body, then the statement
    /// terminator.
    fn close_block(&mut self) -> Result<(), KnlError> {
        self.consume(TokenType::End, "the end keyword to close the block")
            .map_err(|e| {
                e.with_help("Every block opened with ':' must close with 'ಮುಗಿಯಿರಿ'.".to_string())
            })?;
        self.end_of_statement()
    }

    /// A statement ends at a newline, or immediately before a block
    /// boundary (so a terminator may share a line with the block's closer).
    fn end_of_statement(&mut self) -> Result<(), KnlError> {
        if self.match_type(TokenType::Newline) || self.at_block_boundary() {
            Ok(())
        } else {
            Err(self.error_at_current("a newline after the statement"))
        }
    }

    // Expressions, loosest binding first. All binary tiers associate left.

    fn expression(&mut self) -> Result<Expr, KnlError> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, KnlError> {
        let mut expr = self.term()?;

        while let Some(op) = self.match_comparison_op() {
            let right = self.term()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Comparison {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn match_comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek().token_type {
            TokenType::Less => CmpOp::Less,
            TokenType::Greater => CmpOp::Greater,
            TokenType::Equal => CmpOp::Equal,
            TokenType::NotEqual => CmpOp::NotEqual,
            TokenType::LessEqual => CmpOp::LessEqual,
            TokenType::GreaterEqual => CmpOp::GreaterEqual,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn term(&mut self) -> Result<Expr, KnlError> {
        let mut expr = self.factor()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, KnlError> {
        let mut expr = self.unary()?;

        loop {
            let op = match self.peek().token_type {
                TokenType::Star => BinaryOp::Multiply,
                TokenType::Slash => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            let span = Span::new(expr.span().start, right.span().end);
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                span,
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, KnlError> {
        if self.match_type(TokenType::Minus) {
            let start = self.previous().span.start;
            let operand = self.unary()?;
            let span = Span::new(start, operand.span().end);
            return Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
                span,
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, KnlError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Number => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    KnlError::parse_error(
                        token.span.clone(),
                        format!("Invalid integer literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Number {
                    value,
                    span: token.span,
                })
            }
            TokenType::Str => {
                self.advance();
                Ok(Expr::Str {
                    value: token.lexeme,
                    span: token.span,
                })
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::Bool {
                    value: true,
                    span: token.span,
                })
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::Bool {
                    value: false,
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                self.advance();
                if self.match_type(TokenType::LeftParen) {
                    let args = self.argument_list()?;
                    let end = self
                        .consume(TokenType::RightParen, "')' after the call arguments")?
                        .span
                        .end;
                    return Ok(Expr::Call {
                        name: token.lexeme,
                        args,
                        span: Span::new(token.span.start, end),
                    });
                }
                Ok(Expr::Identifier {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "')' after the expression")?;
                Ok(expr)
            }
            _ => Err(self.error_at_current("an expression")),
        }
    }

    fn argument_list(&mut self) -> Result<Vec<Expr>, KnlError> {
        let mut args = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_type(TokenType::Comma) {
                    break;
                }
            }
        }
        Ok(args)
    }

    // Token-stream plumbing.

    fn skip_newlines(&mut self) {
        while self.check(TokenType::Newline) {
            self.advance();
        }
    }

    fn match_type(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: TokenType, what: &str) -> Result<&Token, KnlError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(what))
        }
    }

    /// One diagnostic naming the offending token (or end of input) and what
    /// the grammar expected instead.
    fn error_at_current(&self, expected: &str) -> KnlError {
        let token = self.peek();
        let span = if self.is_at_end() && self.current > 0 {
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            token.span.clone()
        };
        KnlError::parse_error(
            span,
            format!("Syntax error at {}: expected {}", token.describe(), expected),
        )
    }
}
