use std::rc::Rc;

use crate::syntax::ast::*;
use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Enclosing `while`/`repeat`/`for` bodies; reset inside function bodies.
    loop_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, loop_depth: 0 }
    }

    pub fn parse(mut self) -> Result<Chunk, Vec<Error>> {
        let mut errors = Vec::new();
        let mut stmts = Vec::new();
        let mut ret = None;

        while !self.is_at_end() {
            let pos_before = self.pos;

            if self.check(&TokenKind::Return) {
                match self.parse_return() {
                    Ok(r) if self.is_at_end() => ret = Some(r),
                    Ok(_) => {
                        errors.push(self.error_at_current(ErrorCode::P001,
                            "`return` must be the last statement of a block"));
                        self.recover();
                    }
                    Err(e) => { errors.push(e); self.recover(); }
                }
            } else {
                match self.parse_stmt() {
                    Ok(s) => stmts.push(s),
                    Err(e) => { errors.push(e); self.recover(); }
                }
            }

            // guarantee progress on tokens no rule consumes
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Chunk { block: Block { stmts, ret } })
        } else {
            Err(errors)
        }
    }

    // ─── Blocks ──────────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Block, Error> {
        let mut stmts = Vec::new();
        while !self.peek_kind().is_block_end() && !self.check(&TokenKind::Return) {
            stmts.push(self.parse_stmt()?);
        }
        let ret = if self.check(&TokenKind::Return) { Some(self.parse_return()?) } else { None };
        Ok(Block { stmts, ret })
    }

    /// Body of a `while`/`repeat`/`for`, where `break` is legal.
    fn parse_loop_body(&mut self) -> Result<Block, Error> {
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        body
    }

    fn parse_return(&mut self) -> Result<ReturnStmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let values = if self.peek_kind().is_block_end() || self.check(&TokenKind::Semicolon) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.matches(&TokenKind::Semicolon);
        Ok(ReturnStmt { values, span })
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Semicolon => { self.advance(); Ok(Stmt::Semicolon(span)) }
            TokenKind::Break => {
                if self.loop_depth == 0 {
                    return Err(self.error_at_current(ErrorCode::P003, "`break` outside a loop"));
                }
                self.advance();
                Ok(Stmt::Break(span))
            }
            TokenKind::Local    => self.parse_local(),
            TokenKind::If       => self.parse_if(),
            TokenKind::Function => self.parse_function_def(),
            TokenKind::While    => self.parse_while(),
            TokenKind::Repeat   => self.parse_repeat(),
            TokenKind::For      => self.parse_for(),
            TokenKind::Do       => self.parse_do(),

            TokenKind::Name(name) => {
                let name = name.clone();
                if name == "print" && self.peek_next_is(&TokenKind::LParen) {
                    let (args, span) = self.parse_print()?;
                    Ok(Stmt::Print(args, span))
                } else if self.is_read_call() {
                    let (format, span) = self.parse_read()?;
                    Ok(Stmt::Read(format, span))
                } else if self.peek_next_is(&TokenKind::LParen) {
                    Ok(Stmt::Call(self.parse_call()?))
                } else {
                    self.parse_assign()
                }
            }

            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_local(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Local)?;
        let target_span = self.span();
        let name = self.expect_name()?;
        if self.check(&TokenKind::Dot) || self.check(&TokenKind::LBracket) {
            return Err(self.error_at_current(ErrorCode::P004,
                format!("`local {name}` cannot have an index path")));
        }
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        let target = VarRef { name, path: Vec::new(), span: target_span };
        Ok(Stmt::Assign(Assign { local: true, target, value, span }))
    }

    fn parse_assign(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        let target = self.parse_var_ref()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign(Assign { local: false, target, value, span }))
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        let mut branches = Vec::new();
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        branches.push((condition, self.parse_block()?));

        while self.matches(&TokenKind::Elseif) {
            let condition = self.parse_expr()?;
            self.expect(TokenKind::Then)?;
            branches.push((condition, self.parse_block()?));
        }

        let else_block = if self.matches(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        self.expect(TokenKind::End)?;
        Ok(Stmt::If(IfStmt { branches, else_block, span }))
    }

    fn parse_function_def(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Function)?;
        let name = self.expect_name()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_name()?);
            if !self.matches(&TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;

        // `break` never crosses a function boundary
        let saved = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_block();
        self.loop_depth = saved;
        let body = body?;

        self.expect(TokenKind::End)?;
        Ok(Stmt::FunctionDef(Rc::new(FunctionDef { name, params, body, span })))
    }

    fn parse_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_loop_body()?;
        self.expect(TokenKind::End)?;
        Ok(Stmt::Loop(LoopStmt { keyword: "while", kind: LoopKind::While { condition, body }, span }))
    }

    fn parse_repeat(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Repeat)?;
        let body = self.parse_loop_body()?;
        self.expect(TokenKind::Until)?;
        let condition = self.parse_expr()?;
        Ok(Stmt::Loop(LoopStmt { keyword: "repeat", kind: LoopKind::Repeat { body, condition }, span }))
    }

    fn parse_for(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::For)?;
        let var = self.expect_name()?;
        self.expect(TokenKind::Assign)?;
        let start = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let stop = self.parse_expr()?;
        let step = if self.matches(&TokenKind::Comma) { Some(self.parse_expr()?) } else { None };
        self.expect(TokenKind::Do)?;
        let body = self.parse_loop_body()?;
        self.expect(TokenKind::End)?;
        let kind = LoopKind::NumericFor { var, start, stop, step, body };
        Ok(Stmt::Loop(LoopStmt { keyword: "for", kind, span }))
    }

    fn parse_do(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Do)?;
        let body = self.parse_block()?;
        self.expect(TokenKind::End)?;
        Ok(Stmt::Loop(LoopStmt { keyword: "do", kind: LoopKind::Do(body), span }))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_or()
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut exprs = vec![self.parse_expr()?];
        while self.matches(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let span = self.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BinOp { left: Box::new(left), op: BinOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        while self.check(&TokenKind::And) {
            let span = self.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::BinOp { left: Box::new(left), op: BinOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_concat()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq    => BinOp::Eq,
                TokenKind::TildeEq => BinOp::NotEq,
                TokenKind::Lt      => BinOp::Lt,
                TokenKind::LtEq    => BinOp::LtEq,
                TokenKind::Gt      => BinOp::Gt,
                TokenKind::GtEq    => BinOp::GtEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_concat()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    /// `..` is right associative.
    fn parse_concat(&mut self) -> Result<Expr, Error> {
        let left = self.parse_additive()?;
        if self.check(&TokenKind::Concat) {
            let span = self.span();
            self.advance();
            let right = self.parse_concat()?;
            return Ok(Expr::BinOp { left: Box::new(left), op: BinOp::Concat, right: Box::new(right), span });
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star    => BinOp::Mul,
                TokenKind::Slash   => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not   => UnOp::Not,
            TokenKind::Hash  => UnOp::Len,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::UnOp { op, operand: Box::new(operand), span })
    }

    /// `^` binds tighter than a unary operator on its left and is right associative:
    /// `-2^2` is `-(2^2)`, `2^-1` is `2^(-1)`, `2^3^2` is `2^(3^2)`.
    fn parse_power(&mut self) -> Result<Expr, Error> {
        let base = self.parse_primary()?;
        if self.check(&TokenKind::Caret) {
            let span = self.span();
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinOp { left: Box::new(base), op: BinOp::Pow, right: Box::new(exponent), span });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Nil   => { self.advance(); Ok(Expr::Nil(span)) }
            TokenKind::True  => { self.advance(); Ok(Expr::Bool(true, span)) }
            TokenKind::False => { self.advance(); Ok(Expr::Bool(false, span)) }
            TokenKind::Int(text) => {
                self.advance();
                Ok(Expr::Number { text, kind: NumberKind::Integer, span })
            }
            TokenKind::Float(text) => {
                self.advance();
                Ok(Expr::Number { text, kind: NumberKind::Float, span })
            }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::StringLit(s, span)) }

            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(expr), span))
            }

            TokenKind::LBrace => self.parse_table(),

            TokenKind::Name(name) => {
                if name == "print" && self.peek_next_is(&TokenKind::LParen) {
                    let (args, span) = self.parse_print()?;
                    Ok(Expr::Print(args, span))
                } else if self.is_read_call() {
                    let (format, span) = self.parse_read()?;
                    Ok(Expr::Read(format, span))
                } else if self.peek_next_is(&TokenKind::LParen) {
                    Ok(Expr::Call(self.parse_call()?))
                } else {
                    Ok(Expr::Var(self.parse_var_ref()?))
                }
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    /// `name` followed by any number of `.field` / `[expr]` steps.
    fn parse_var_ref(&mut self) -> Result<VarRef, Error> {
        let span = self.span();
        let name = self.expect_name()?;
        let mut path = Vec::new();
        loop {
            if self.check(&TokenKind::Dot) {
                self.advance();
                let key_span = self.span();
                let field = self.expect_name()?;
                path.push(Expr::StringLit(field, key_span));
            } else if self.check(&TokenKind::LBracket) {
                self.advance();
                path.push(self.parse_expr()?);
                self.expect(TokenKind::RBracket)?;
            } else {
                break;
            }
        }
        Ok(VarRef { name, path, span })
    }

    fn parse_table(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            fields.push(self.parse_table_field()?);
            if !self.matches(&TokenKind::Comma) && !self.matches(&TokenKind::Semicolon) { break; }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Table(TableConstructor { fields, span }))
    }

    fn parse_table_field(&mut self) -> Result<TableField, Error> {
        // name = value
        if let TokenKind::Name(name) = self.peek_kind() {
            if self.peek_next_is(&TokenKind::Assign) {
                let key = Expr::StringLit(name.clone(), self.span());
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                return Ok(TableField { key: Some(key), value });
            }
        }
        // [key] = value
        if self.matches(&TokenKind::LBracket) {
            let key = self.parse_expr()?;
            self.expect(TokenKind::RBracket)?;
            self.expect(TokenKind::Assign)?;
            let value = self.parse_expr()?;
            return Ok(TableField { key: Some(key), value });
        }
        Ok(TableField { key: None, value: self.parse_expr()? })
    }

    // ─── Calls ───────────────────────────────────────────────────────────────

    fn parse_call(&mut self) -> Result<Call, Error> {
        let span = self.span();
        let callee = self.expect_name()?;
        let args = self.parse_args()?;
        Ok(Call { callee, args, span })
    }

    fn parse_print(&mut self) -> Result<(Vec<Expr>, Span), Error> {
        let span = self.span();
        self.advance(); // `print`
        Ok((self.parse_args()?, span))
    }

    /// `io.read()` or `io.read(fmt)`
    fn parse_read(&mut self) -> Result<(Option<Box<Expr>>, Span), Error> {
        let span = self.span();
        self.advance(); // io
        self.advance(); // .
        self.advance(); // read
        self.expect(TokenKind::LParen)?;
        let format = if self.check(&TokenKind::RParen) { None } else { Some(Box::new(self.parse_expr()?)) };
        self.expect(TokenKind::RParen)?;
        Ok((format, span))
    }

    fn is_read_call(&self) -> bool {
        let at = |offset: usize| self.tokens.get(self.pos + offset).map(|t| &t.kind);
        matches!(at(0), Some(TokenKind::Name(n)) if n == "io")
            && at(1) == Some(&TokenKind::Dot)
            && matches!(at(2), Some(TokenKind::Name(n)) if n == "read")
            && at(3) == Some(&TokenKind::LParen)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, Error> {
        self.expect(TokenKind::LParen)?;
        let args = if self.check(&TokenKind::RParen) { Vec::new() } else { self.parse_expr_list()? };
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // ─── Token helpers ───────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_next_is(&self, kind: &TokenKind) -> bool {
        self.tokens.get(self.pos + 1).is_some_and(|t| &t.kind == kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.is_at_end() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == &TokenKind::Eof
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(ErrorCode::P002, format!(
                "expected {}, found {}", kind.describe(), self.peek_kind().describe()
            )))
        }
    }

    fn expect_name(&mut self) -> Result<String, Error> {
        match self.peek_kind() {
            TokenKind::Name(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error_at_current(ErrorCode::P002, format!(
                "expected name, found {}", self.peek_kind().describe()
            ))),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error_at_current(ErrorCode::P001, format!(
            "expected {expected}, found {}", self.peek_kind().describe()
        ))
    }

    fn error_at_current(&self, code: ErrorCode, msg: impl Into<String>) -> Error {
        let tok = self.peek();
        Error::new(code, tok.line, tok.column, msg)
    }

    /// Skip to the next token that can only begin a statement.
    fn recover(&mut self) {
        self.loop_depth = 0;
        self.advance();
        while !self.is_at_end() && !self.peek_kind().starts_statement() {
            self.advance();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
