//! Tree-walking interpreter. Evaluates a `Chunk` against a fresh `Scope`.
//! Statements produce a `Flow` so `break` and `return` unwind without any
//! shared flags; expressions produce a `Value`.

use std::rc::Rc;

use tracing::debug;

use crate::config::InterpreterConfig;
use crate::error::RuntimeError;
use crate::runtime::io::{self, SharedPrintHandler, SharedReadHandler};
use crate::runtime::ops::{self, eval_binop, eval_unop};
use crate::runtime::scope::Scope;
use crate::runtime::value::{Table, Value};
use crate::syntax::ast::{
    Assign, BinOp, Block, Call, Chunk, Expr, IfStmt, LoopKind, LoopStmt, NumberKind, ReturnStmt,
    Span, Stmt, TableConstructor, VarRef,
};

/// How control leaves a statement or block.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

const NUMBER_FORMATS: [&str; 4] = ["n", "*n", "number", "*number"];

// ─── Interpreter ─────────────────────────────────────────────────────────────

pub struct Interpreter {
    config: InterpreterConfig,
    scope: Scope,
    output: SharedPrintHandler,
    input: SharedReadHandler,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            scope: Scope::new(&config),
            config,
            output: io::stdout_handler(),
            input: io::stdin_handler(),
        }
    }

    pub fn with_print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.output = handler;
        self
    }

    pub fn with_read_handler(mut self, handler: SharedReadHandler) -> Self {
        self.input = handler;
        self
    }

    /// Scope left behind by the last `execute`, for inspecting globals.
    pub fn scope(&self) -> &Scope { &self.scope }

    /// Run a program from a clean scope. The value of a top-level `return`
    /// is the result; otherwise nil.
    pub fn execute(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.scope = Scope::new(&self.config);
        debug!(statements = chunk.block.stmts.len(), "program start");
        let result = match self.exec_block(&chunk.block)? {
            Flow::Return(v) => v,
            Flow::Normal | Flow::Break => Value::Nil,
        };
        debug!(result = %result, "program end");
        Ok(result)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    pub fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        for stmt in &block.stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        match &block.ret {
            Some(ret) => Ok(Flow::Return(self.eval_return(ret)?)),
            None => Ok(Flow::Normal),
        }
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Semicolon(_) => Ok(Flow::Normal),
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Assign(a) => {
                self.exec_assign(a)?;
                Ok(Flow::Normal)
            }
            Stmt::If(i) => self.exec_if(i),
            Stmt::FunctionDef(def) => {
                debug!(function = %def.name, params = def.params.len(), "define function");
                self.scope.define_function(Rc::clone(def));
                Ok(Flow::Normal)
            }
            Stmt::Loop(l) => self.exec_loop(l),
            Stmt::Call(call) => {
                self.eval_call(call)?;
                Ok(Flow::Normal)
            }
            Stmt::Print(args, span) => {
                self.eval_print(args, span)?;
                Ok(Flow::Normal)
            }
            Stmt::Read(format, span) => {
                self.eval_read(format.as_deref(), span)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_assign(&mut self, a: &Assign) -> Result<(), RuntimeError> {
        let path = self.eval_path(&a.target)?;
        let value = self.eval_expr(&a.value)?;
        if a.local {
            self.scope.declare(&a.target.name, value);
            Ok(())
        } else {
            self.scope.assign(&a.target.name, &path, value, &a.span)
        }
    }

    fn exec_if(&mut self, i: &IfStmt) -> Result<Flow, RuntimeError> {
        for (condition, block) in &i.branches {
            if self.eval_condition(condition, "if")? {
                return self.exec_block(block);
            }
        }
        match &i.else_block {
            Some(block) => self.exec_block(block),
            None => Ok(Flow::Normal),
        }
    }

    fn eval_return(&mut self, ret: &ReturnStmt) -> Result<Value, RuntimeError> {
        let values = self.eval_exprs(&ret.values)?;
        Ok(if values.is_empty() { Value::Nil } else { Value::from_values(values) })
    }

    // ─── Loops ───────────────────────────────────────────────────────────────

    fn exec_loop(&mut self, l: &LoopStmt) -> Result<Flow, RuntimeError> {
        match &l.kind {
            LoopKind::While { condition, body } => {
                self.in_loop_frame(l.keyword, |me| me.run_while(condition, body))
            }
            LoopKind::Repeat { body, condition } => {
                self.in_loop_frame(l.keyword, |me| me.run_repeat(body, condition))
            }
            // `break` inside `do` belongs to the enclosing loop
            LoopKind::Do(body) => self.in_loop_frame(l.keyword, |me| me.exec_block(body)),
            LoopKind::NumericFor { var, start, stop, step, body } => {
                self.exec_numeric_for(l.keyword, var, start, stop, step.as_ref(), body, &l.span)
            }
        }
    }

    /// Run `body` inside a loop frame. The frame is popped before any error propagates.
    fn in_loop_frame(
        &mut self,
        keyword: &'static str,
        body: impl FnOnce(&mut Self) -> Result<Flow, RuntimeError>,
    ) -> Result<Flow, RuntimeError> {
        self.scope.push_loop(keyword);
        let result = body(self);
        self.scope.pop_loop();
        result
    }

    fn run_while(&mut self, condition: &Expr, body: &Block) -> Result<Flow, RuntimeError> {
        while self.eval_condition(condition, "while")? {
            match self.exec_block(body)? {
                Flow::Normal => {}
                Flow::Break => break,
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    fn run_repeat(&mut self, body: &Block, condition: &Expr) -> Result<Flow, RuntimeError> {
        loop {
            match self.exec_block(body)? {
                Flow::Normal => {}
                Flow::Break => return Ok(Flow::Normal),
                ret @ Flow::Return(_) => return Ok(ret),
            }
            // evaluated in the loop frame so it sees the body's locals
            if self.eval_condition(condition, "until")? {
                return Ok(Flow::Normal);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_numeric_for(
        &mut self,
        keyword: &'static str,
        var: &str,
        start: &Expr,
        stop: &Expr,
        step: Option<&Expr>,
        body: &Block,
        span: &Span,
    ) -> Result<Flow, RuntimeError> {
        let start = self.eval_for_bound(start, "initial value")?;
        let stop = self.eval_for_bound(stop, "limit")?;
        let step = match step {
            Some(e) => self.eval_for_bound(e, "step")?,
            None => Value::Integer(1),
        };
        let ascending = match step {
            Value::Integer(s) if s != 0 => s > 0,
            Value::Float(s) if s != 0.0 && !s.is_nan() => s > 0.0,
            _ => return Err(RuntimeError::arithmetic(span, format!("'for' step must be non-zero, got {step}"))),
        };
        let finished = |counter: &Value| -> bool {
            let op = if ascending { BinOp::Gt } else { BinOp::Lt };
            // a NaN bound never admits an iteration
            counter.compare(&stop).is_none() || ops::compare(op, counter, &stop)
        };

        self.in_loop_frame(keyword, |me| {
            me.scope.declare(var, start);
            loop {
                // the body may reassign the control variable; the loop follows it
                let current = me.scope.read(var, &[], span)?;
                if finished(&current) {
                    return Ok(Flow::Normal);
                }
                match me.exec_block(body)? {
                    Flow::Normal => {}
                    Flow::Break => return Ok(Flow::Normal),
                    ret @ Flow::Return(_) => return Ok(ret),
                }
                let current = me.scope.read(var, &[], span)?;
                let next = match (&current, &step) {
                    // stop instead of wrapping past the end of the integer range
                    (Value::Integer(c), Value::Integer(s)) => match c.checked_add(*s) {
                        Some(next) => Value::Integer(next),
                        None => return Ok(Flow::Normal),
                    },
                    _ => ops::arith(BinOp::Add, &current, &step, span)?,
                };
                me.scope.declare(var, next);
            }
        })
    }

    fn eval_for_bound(&mut self, expr: &Expr, what: &str) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(expr)?.first();
        if !value.is_number() {
            return Err(RuntimeError::type_error(
                expr.span(),
                format!("'for' {what} must be a number, got {}", value.type_name()),
            ));
        }
        Ok(value)
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Nil(_) => Ok(Value::Nil),
            Expr::Bool(b, _) => Ok(Value::Boolean(*b)),
            Expr::Number { text, kind, span } => eval_number(text, *kind, span),
            Expr::StringLit(s, _) => Ok(Value::string(s.as_str())),

            Expr::Var(var) => {
                let path = self.eval_path(var)?;
                self.scope.read(&var.name, &path, &var.span)
            }

            Expr::Table(t) => self.eval_table(t),
            Expr::Call(call) => self.eval_call(call),
            Expr::Print(args, span) => self.eval_print(args, span),
            Expr::Read(format, span) => self.eval_read(format.as_deref(), span),

            Expr::BinOp { left, op: op @ (BinOp::And | BinOp::Or), right, .. } => {
                let l = self.eval_condition(left, op.symbol())?;
                // short-circuit: the right operand is not evaluated
                if (*op == BinOp::And && !l) || (*op == BinOp::Or && l) {
                    return Ok(Value::Boolean(l));
                }
                Ok(Value::Boolean(self.eval_condition(right, op.symbol())?))
            }

            Expr::BinOp { left, op, right, span } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                eval_binop(*op, &l, &r, span)
            }

            Expr::UnOp { op, operand, span } => {
                let v = self.eval_expr(operand)?;
                eval_unop(*op, &v, span)
            }

            Expr::Paren(inner, _) => Ok(self.eval_expr(inner)?.first()),
        }
    }

    fn eval_exprs(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|e| self.eval_expr(e)).collect()
    }

    fn eval_path(&mut self, var: &VarRef) -> Result<Vec<Value>, RuntimeError> {
        self.eval_exprs(&var.path)
    }

    /// Evaluate `expr` and require a boolean. `context` names the construct for diagnostics.
    fn eval_condition(&mut self, expr: &Expr, context: &str) -> Result<bool, RuntimeError> {
        match self.eval_expr(expr)? {
            Value::Boolean(b) => Ok(b),
            other => Err(RuntimeError::type_error(
                expr.span(),
                format!("`{context}` expects a boolean, got {} ({other})", other.type_name()),
            )),
        }
    }

    fn eval_table(&mut self, t: &TableConstructor) -> Result<Value, RuntimeError> {
        let table = Table::new();
        let mut next_index = 1;
        for field in &t.fields {
            let key = match &field.key {
                Some(key) => self.eval_expr(key)?,
                None => {
                    let key = Value::Integer(next_index);
                    next_index += 1;
                    key
                }
            };
            let value = self.eval_expr(&field.value)?;
            table
                .set(key, value)
                .map_err(|e| RuntimeError::type_error(field.value.span(), e.to_string()))?;
        }
        Ok(Value::Table(table))
    }

    // ─── Calls & builtins ────────────────────────────────────────────────────

    fn eval_call(&mut self, call: &Call) -> Result<Value, RuntimeError> {
        let mut args = self.eval_exprs(&call.args)?;
        // the last argument's values spread into the argument list
        if matches!(args.last(), Some(Value::List(_))) {
            if let Some(last) = args.pop() {
                args.extend(last.into_values());
            }
        }

        let def = self.scope.function(&call.callee).ok_or_else(|| RuntimeError::name(
            &call.span,
            format!("attempt to call undefined function `{}`", call.callee),
        ))?;

        debug!(function = %def.name, args = args.len(), depth = self.scope.call_depth(), "call");
        self.scope.push_call(&def, args, &call.span)?;
        let flow = self.exec_block(&def.body);
        self.scope.pop_call();

        let result = match flow? {
            Flow::Return(v) => v,
            Flow::Normal | Flow::Break => Value::Nil,
        };
        debug!(function = %def.name, result = %result, "return");
        Ok(result)
    }

    fn eval_print(&mut self, args: &[Expr], span: &Span) -> Result<Value, RuntimeError> {
        let line = self
            .eval_exprs(args)?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\t");
        self.output.println(&line).map_err(|e| RuntimeError::io(span, &e))?;
        Ok(Value::Nil)
    }

    fn eval_read(&mut self, format: Option<&Expr>, span: &Span) -> Result<Value, RuntimeError> {
        let format = match format {
            Some(expr) => Some(self.eval_expr(expr)?.to_string()),
            None => None,
        };
        let Some(line) = self.input.read_line().map_err(|e| RuntimeError::io(span, &e))? else {
            return Ok(Value::Nil);
        };
        match format {
            Some(f) if NUMBER_FORMATS.contains(&f.as_str()) => parse_number_input(&line, span),
            _ => Ok(Value::string(line)),
        }
    }
}

// ─── Literals ────────────────────────────────────────────────────────────────

fn eval_number(text: &str, kind: NumberKind, span: &Span) -> Result<Value, RuntimeError> {
    match kind {
        NumberKind::Integer => text.parse::<i64>().map(Value::Integer).map_err(|_| {
            RuntimeError::format(span, format!("integer literal `{text}` does not fit in 64 bits"))
        }),
        NumberKind::Float => text.parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::format(span, format!("malformed number `{text}`"))
        }),
    }
}

/// `io.read("n")`: a line with a `.` reads as a float, otherwise as an integer.
fn parse_number_input(line: &str, span: &Span) -> Result<Value, RuntimeError> {
    let text = line.trim();
    let invalid = || RuntimeError::format(span, format!("expected a number, read \"{line}\""));
    if text.contains('.') {
        ops::parse_float(text).map(Value::Float).ok_or_else(invalid)
    } else {
        text.parse::<i64>().map(Value::Integer).map_err(|_| invalid())
    }
}
