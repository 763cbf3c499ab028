//! Recursive-descent parser
//!
//! Consumes the token stream from the lexer and produces a [`Program`].
//! Each variable-reference node gets a fresh [`ExprId`] so the resolver can
//! key its distance table on the occurrence rather than the name.

use crate::ast::{
    BinOp, Expr, ExprId, FunctionDecl, Lit, LogicOp, Program, Span, Spanned, Stmt, UnOp,
};
use crate::error::{CompileError, Result};
use crate::lexer::Token;

/// Parse tokens into a program
pub fn parse(tokens: Vec<(Token, Span)>) -> Result<Program> {
    parse_with_ids(tokens, 0).map(|(program, _)| program)
}

/// Parse tokens, numbering reference nodes starting at `first_id`.
///
/// Returns the next unused id so a REPL can keep ids unique across inputs.
pub fn parse_with_ids(tokens: Vec<(Token, Span)>, first_id: u32) -> Result<(Program, u32)> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        next_id: first_id,
    };
    let program = parser.program()?;
    Ok((program, parser.next_id))
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    next_id: u32,
}

impl Parser {
    fn program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while !self.at_end() {
            statements.push(self.declaration()?);
        }
        Ok(Program { statements })
    }

    // ---- declarations ----

    fn declaration(&mut self) -> Result<Spanned<Stmt>> {
        if self.eat(&Token::Class) {
            self.class_declaration()
        } else if self.eat(&Token::Fun) {
            let decl = self.function("function")?;
            let span = decl.span;
            Ok(Spanned::new(Stmt::Function(decl), span))
        } else if self.eat(&Token::Var) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.previous_span();
        let name = self.expect_ident("expected class name")?;

        let superclass = if self.eat(&Token::Lt) {
            let super_name = self.expect_ident("expected superclass name")?;
            let id = self.fresh_id();
            Some(Box::new(Spanned::new(
                Expr::Variable {
                    name: super_name.node,
                    id,
                },
                super_name.span,
            )))
        } else {
            None
        };

        self.expect(&Token::LBrace, "expected '{' before class body")?;
        let mut methods = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_end() {
            methods.push(self.function("method")?);
        }
        let end = self.expect(&Token::RBrace, "expected '}' after class body")?;

        Ok(Spanned::new(
            Stmt::Class {
                name,
                superclass,
                methods,
            },
            start.merge(end),
        ))
    }

    fn function(&mut self, kind: &str) -> Result<FunctionDecl> {
        let name = self.expect_ident(&format!("expected {kind} name"))?;
        self.expect(&Token::LParen, &format!("expected '(' after {kind} name"))?;

        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.expect_ident("expected parameter name")?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "expected ')' after parameters")?;

        self.expect(&Token::LBrace, &format!("expected '{{' before {kind} body"))?;
        let (body, end) = self.block_body()?;

        let span = name.span.merge(end);
        Ok(FunctionDecl {
            name,
            params,
            body,
            span,
        })
    }

    fn var_declaration(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.previous_span();
        let name = self.expect_ident("expected variable name")?;

        let init = if self.eat(&Token::Eq) {
            Some(self.expression()?)
        } else {
            None
        };

        let end = self.expect(&Token::Semicolon, "expected ';' after variable declaration")?;
        Ok(Spanned::new(Stmt::Var { name, init }, start.merge(end)))
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<Spanned<Stmt>> {
        if self.eat(&Token::For) {
            self.for_statement()
        } else if self.eat(&Token::If) {
            self.if_statement()
        } else if self.eat(&Token::Print) {
            self.print_statement()
        } else if self.eat(&Token::Return) {
            self.return_statement()
        } else if self.eat(&Token::While) {
            self.while_statement()
        } else if self.eat(&Token::LBrace) {
            let start = self.previous_span();
            let (statements, end) = self.block_body()?;
            Ok(Spanned::new(Stmt::Block(statements), start.merge(end)))
        } else {
            self.expression_statement()
        }
    }

    /// `for` is sugar: the initializer, condition and increment are rewritten
    /// into an enclosing block and a `while` loop.
    fn for_statement(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.previous_span();
        self.expect(&Token::LParen, "expected '(' after 'for'")?;

        let init = if self.eat(&Token::Semicolon) {
            None
        } else if self.eat(&Token::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let cond = if self.check(&Token::Semicolon) {
            let span = self.peek_span();
            Spanned::new(Expr::Literal(Lit::Bool(true)), span)
        } else {
            self.expression()?
        };
        self.expect(&Token::Semicolon, "expected ';' after loop condition")?;

        let incr = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&Token::RParen, "expected ')' after for clauses")?;

        let mut body = self.statement()?;
        let span = start.merge(body.span);

        if let Some(incr) = incr {
            let incr_span = incr.span;
            body = Spanned::new(
                Stmt::Block(vec![body, Spanned::new(Stmt::Expression(incr), incr_span)]),
                span,
            );
        }

        body = Spanned::new(
            Stmt::While {
                cond,
                body: Box::new(body),
            },
            span,
        );

        if let Some(init) = init {
            body = Spanned::new(Stmt::Block(vec![init, body]), span);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.previous_span();
        self.expect(&Token::LParen, "expected '(' after 'if'")?;
        let cond = self.expression()?;
        self.expect(&Token::RParen, "expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        // An `else` binds to the nearest `if`
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        let end = else_branch
            .as_ref()
            .map(|s| s.span)
            .unwrap_or(then_branch.span);
        Ok(Spanned::new(
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            },
            start.merge(end),
        ))
    }

    fn print_statement(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.previous_span();
        let value = self.expression()?;
        let end = self.expect(&Token::Semicolon, "expected ';' after value")?;
        Ok(Spanned::new(Stmt::Print(value), start.merge(end)))
    }

    fn return_statement(&mut self) -> Result<Spanned<Stmt>> {
        let keyword = self.previous_span();
        let value = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        let end = self.expect(&Token::Semicolon, "expected ';' after return value")?;
        Ok(Spanned::new(
            Stmt::Return { keyword, value },
            keyword.merge(end),
        ))
    }

    fn while_statement(&mut self) -> Result<Spanned<Stmt>> {
        let start = self.previous_span();
        self.expect(&Token::LParen, "expected '(' after 'while'")?;
        let cond = self.expression()?;
        self.expect(&Token::RParen, "expected ')' after while condition")?;
        let body = Box::new(self.statement()?);
        let span = start.merge(body.span);
        Ok(Spanned::new(Stmt::While { cond, body }, span))
    }

    fn expression_statement(&mut self) -> Result<Spanned<Stmt>> {
        let expr = self.expression()?;
        let span = expr.span;
        let end = self.expect(&Token::Semicolon, "expected ';' after expression")?;
        Ok(Spanned::new(Stmt::Expression(expr), span.merge(end)))
    }

    /// Statements of a block, after the opening brace has been consumed.
    /// Returns the statements and the span of the closing brace.
    fn block_body(&mut self) -> Result<(Vec<Spanned<Stmt>>, Span)> {
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) && !self.at_end() {
            statements.push(self.declaration()?);
        }
        let end = self.expect(&Token::RBrace, "expected '}' after block")?;
        Ok((statements, end))
    }

    // ---- expressions, lowest precedence first ----

    fn expression(&mut self) -> Result<Spanned<Expr>> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Spanned<Expr>> {
        let expr = self.or()?;

        if self.eat(&Token::Eq) {
            let eq_span = self.previous_span();
            let value = self.assignment()?;
            let span = expr.span.merge(value.span);

            return match expr.node {
                Expr::Variable { name, id } => Ok(Spanned::new(
                    Expr::Assign {
                        name,
                        id,
                        value: Box::new(value),
                    },
                    span,
                )),
                Expr::Get { object, name } => Ok(Spanned::new(
                    Expr::Set {
                        object,
                        name,
                        value: Box::new(value),
                    },
                    span,
                )),
                _ => Err(CompileError::parser("invalid assignment target", eq_span)),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            let span = expr.span.merge(right.span);
            expr = Spanned::new(
                Expr::Logical {
                    left: Box::new(expr),
                    op: LogicOp::Or,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.equality()?;
        while self.eat(&Token::And) {
            let right = self.equality()?;
            let span = expr.span.merge(right.span);
            expr = Spanned::new(
                Expr::Logical {
                    left: Box::new(expr),
                    op: LogicOp::And,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.comparison()?;
        loop {
            let op = if self.eat(&Token::EqEq) {
                BinOp::Eq
            } else if self.eat(&Token::BangEq) {
                BinOp::Ne
            } else {
                break;
            };
            let right = self.comparison()?;
            expr = Self::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.term()?;
        loop {
            let op = if self.eat(&Token::Lt) {
                BinOp::Lt
            } else if self.eat(&Token::Le) {
                BinOp::Le
            } else if self.eat(&Token::Gt) {
                BinOp::Gt
            } else if self.eat(&Token::Ge) {
                BinOp::Ge
            } else {
                break;
            };
            let right = self.term()?;
            expr = Self::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.factor()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinOp::Add
            } else if self.eat(&Token::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.factor()?;
            expr = Self::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.unary()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinOp::Mul
            } else if self.eat(&Token::Slash) {
                BinOp::Div
            } else {
                break;
            };
            let right = self.unary()?;
            expr = Self::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn binary(left: Spanned<Expr>, op: BinOp, right: Spanned<Expr>) -> Spanned<Expr> {
        let span = left.span.merge(right.span);
        Spanned::new(
            Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    fn unary(&mut self) -> Result<Spanned<Expr>> {
        let op = if self.eat(&Token::Bang) {
            Some(UnOp::Not)
        } else if self.eat(&Token::Minus) {
            Some(UnOp::Neg)
        } else {
            None
        };

        if let Some(op) = op {
            let op_span = self.previous_span();
            let expr = self.unary()?;
            let span = op_span.merge(expr.span);
            return Ok(Spanned::new(
                Expr::Unary {
                    op,
                    expr: Box::new(expr),
                },
                span,
            ));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.primary()?;

        loop {
            if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                if !self.check(&Token::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                let end = self.expect(&Token::RParen, "expected ')' after arguments")?;
                let span = expr.span.merge(end);
                expr = Spanned::new(
                    Expr::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.eat(&Token::Dot) {
                let name = self.expect_ident("expected property name after '.'")?;
                let span = expr.span.merge(name.span);
                expr = Spanned::new(
                    Expr::Get {
                        object: Box::new(expr),
                        name,
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>> {
        let (token, span) = match self.advance() {
            Some(t) => t,
            None => {
                return Err(CompileError::parser(
                    "unexpected end of input",
                    self.eof_span(),
                ));
            }
        };

        let expr = match token {
            Token::False => Expr::Literal(Lit::Bool(false)),
            Token::True => Expr::Literal(Lit::Bool(true)),
            Token::Nil => Expr::Literal(Lit::Nil),
            Token::Number(n) => Expr::Literal(Lit::Number(n)),
            Token::Str(s) => Expr::Literal(Lit::Str(s)),
            Token::This => Expr::This {
                id: self.fresh_id(),
            },
            Token::Ident(name) => Expr::Variable {
                name,
                id: self.fresh_id(),
            },
            Token::Super => {
                self.expect(&Token::Dot, "expected '.' after 'super'")?;
                let method = self.expect_ident("expected superclass method name")?;
                let id = self.fresh_id();
                let full = span.merge(method.span);
                return Ok(Spanned::new(Expr::Super { id, method }, full));
            }
            Token::LParen => {
                let inner = self.expression()?;
                let end = self.expect(&Token::RParen, "expected ')' after expression")?;
                return Ok(Spanned::new(
                    Expr::Grouping(Box::new(inner)),
                    span.merge(end),
                ));
            }
            other => {
                return Err(CompileError::parser(
                    format!("unexpected token: {other}"),
                    span,
                ));
            }
        };

        Ok(Spanned::new(expr, span))
    }

    // ---- token stream helpers ----

    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .unwrap_or_else(|| self.eof_span())
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.pos.wrapping_sub(1))
            .map(|(_, s)| *s)
            .unwrap_or_else(|| self.eof_span())
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map(|(_, s)| Span::new(s.end, s.end + 1))
            .unwrap_or_else(|| Span::new(0, 1))
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, message: &str) -> Result<Span> {
        if self.check(token) {
            let span = self.peek_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(CompileError::parser(message, self.peek_span()))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<Spanned<String>> {
        match self.tokens.get(self.pos) {
            Some((Token::Ident(name), span)) => {
                let spanned = Spanned::new(name.clone(), *span);
                self.pos += 1;
                Ok(spanned)
            }
            _ => Err(CompileError::parser(message, self.peek_span())),
        }
    }
}
