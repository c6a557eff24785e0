//! Operator semantics. `and`/`or` short-circuit and live in the interpreter;
//! everything else is a pure function of already-evaluated operands.

use std::cmp::Ordering;

use crate::error::RuntimeError;
use crate::runtime::value::Value;
use crate::syntax::ast::{BinOp, Span, UnOp};

// ─── Binary ──────────────────────────────────────────────────────────────────

pub fn eval_binop(op: BinOp, l: &Value, r: &Value, span: &Span) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => arith(op, l, r, span),
        BinOp::Pow    => power(l, r, span),
        BinOp::Concat => Ok(concat(l, r)),
        BinOp::Eq     => Ok(Value::Boolean(l.equals(r))),
        BinOp::NotEq  => Ok(Value::Boolean(!l.equals(r))),
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => Ok(Value::Boolean(compare(op, l, r))),
        BinOp::And | BinOp::Or => Err(RuntimeError::type_error(
            span,
            format!("`{}` must be evaluated lazily", op.symbol()),
        )),
    }
}

/// `+ - * / %`. Two integers stay integral (wrapping); any other numeric pair
/// is computed in floating point from the operands' text.
pub fn arith(op: BinOp, l: &Value, r: &Value, span: &Span) -> Result<Value, RuntimeError> {
    if let (Value::Integer(a), Value::Integer(b)) = (l, r) {
        return int_arith(op, *a, *b, span).map(Value::Integer);
    }
    let a = to_float(l, op, span)?;
    let b = to_float(r, op, span)?;
    let x = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a - (a / b).floor() * b,
        _ => return Err(RuntimeError::type_error(span, format!("`{}` is not arithmetic", op.symbol()))),
    };
    Ok(Value::Float(x))
}

fn int_arith(op: BinOp, a: i64, b: i64, span: &Span) -> Result<i64, RuntimeError> {
    match op {
        BinOp::Add => Ok(a.wrapping_add(b)),
        BinOp::Sub => Ok(a.wrapping_sub(b)),
        BinOp::Mul => Ok(a.wrapping_mul(b)),
        BinOp::Div if b == 0 => Err(RuntimeError::arithmetic(span, "attempt to divide by zero")),
        BinOp::Div => Ok(a.wrapping_div(b)),
        BinOp::Mod if b == 0 => Err(RuntimeError::arithmetic(span, "attempt to perform `n % 0`")),
        BinOp::Mod => {
            let m = a.wrapping_rem(b);
            // floored: the result takes the divisor's sign
            Ok(if m != 0 && (m ^ b) < 0 { m + b } else { m })
        }
        _ => Err(RuntimeError::type_error(span, format!("`{}` is not arithmetic", op.symbol()))),
    }
}

/// `^` always produces a float. The exponent must be integral.
pub fn power(l: &Value, r: &Value, span: &Span) -> Result<Value, RuntimeError> {
    let base = to_float(l, BinOp::Pow, span)?;
    let exp = to_float(r, BinOp::Pow, span)?;
    if !exp.is_finite() || exp.fract() != 0.0 {
        return Err(RuntimeError::type_error(
            span,
            format!("exponent must be an integer, got {}", r),
        ));
    }
    Ok(Value::Float(base.powf(exp)))
}

pub fn concat(l: &Value, r: &Value) -> Value {
    Value::string(format!("{l}{r}"))
}

/// Ordering comparisons. Anything involving NaN is false.
pub fn compare(op: BinOp, l: &Value, r: &Value) -> bool {
    let Some(ord) = l.compare(r) else { return false };
    match op {
        BinOp::Lt   => ord == Ordering::Less,
        BinOp::LtEq => ord != Ordering::Greater,
        BinOp::Gt   => ord == Ordering::Greater,
        BinOp::GtEq => ord != Ordering::Less,
        _ => false,
    }
}

/// Numeric view of an operand: numbers directly, strings by parsing their
/// trimmed text.
pub fn to_float(v: &Value, op: BinOp, span: &Span) -> Result<f64, RuntimeError> {
    match v {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(x) => Ok(*x),
        Value::String(s) => parse_float(s).ok_or_else(|| RuntimeError::format(
            span,
            format!("cannot convert \"{s}\" to a number for `{}`", op.symbol()),
        )),
        other => Err(RuntimeError::type_error(
            span,
            format!("attempt to perform arithmetic (`{}`) on a {} value", op.symbol(), other.type_name()),
        )),
    }
}

/// Decimal text only: `inf`, `nan` and friends are not numbers here.
pub fn parse_float(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')) {
        return None;
    }
    t.parse().ok()
}

// ─── Unary ───────────────────────────────────────────────────────────────────

pub fn eval_unop(op: UnOp, v: &Value, span: &Span) -> Result<Value, RuntimeError> {
    match (op, v) {
        (UnOp::Neg, Value::Integer(i)) => Ok(Value::Integer(i.wrapping_neg())),
        (UnOp::Neg, Value::Float(x))   => Ok(Value::Float(-x)),
        (UnOp::Neg, other) => Err(RuntimeError::type_error(
            span,
            format!("attempt to negate a {} value", other.type_name()),
        )),
        (UnOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnOp::Not, other) => Err(RuntimeError::type_error(
            span,
            format!("`not` requires a boolean, got {}", other.type_name()),
        )),
        (UnOp::Len, Value::List(values)) => Ok(Value::Integer(values.len() as i64)),
        (UnOp::Len, other) => Err(RuntimeError::type_error(
            span,
            format!("attempt to get length of a {} value", other.type_name()),
        )),
    }
}
