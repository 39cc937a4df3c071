//! Const policy: evaluation and symbolic expansion of constant expressions.
//!
//! `eval` computes a literal at learning time with checked 64-bit integer
//! arithmetic. `expand` keeps the expression for the host toolchain, with known
//! constant names rewritten to their host names and C-only literal suffixes
//! dropped.

mod expr;

use cbind_ir::ConstValue;
use rustc_hash::FxHashMap;

use crate::config::{ConstMode, ConstRules, ConstScope};
use crate::ConstEvalError;

pub use expr::{parse_expr, BinaryOp, Expr, UnaryOp};

/// Constants visible to an expression.
pub trait ConstEnv {
    /// Evaluated value of a known constant, if it has one.
    fn value(&self, raw: &str) -> Option<&ConstValue>;

    /// Host name of a known constant.
    fn host_name(&self, raw: &str) -> Option<&str>;
}

#[derive(Clone, Debug)]
struct KnownConst {
    name: String,
    value: Option<ConstValue>,
}

/// Constants learned so far, by raw name.
#[derive(Clone, Debug, Default)]
pub struct KnownConsts {
    map: FxHashMap<String, KnownConst>,
}

impl KnownConsts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a constant. `value` is `None` when it could not be evaluated.
    pub fn insert(&mut self, raw: impl Into<String>, name: impl Into<String>, value: Option<ConstValue>) {
        self.map.insert(
            raw.into(),
            KnownConst {
                name: name.into(),
                value,
            },
        );
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.map.contains_key(raw)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl ConstEnv for KnownConsts {
    fn value(&self, raw: &str) -> Option<&ConstValue> {
        self.map.get(raw).and_then(|c| c.value.as_ref())
    }

    fn host_name(&self, raw: &str) -> Option<&str> {
        self.map.get(raw).map(|c| c.name.as_str())
    }
}

/// Per-scope choice between evaluation and expansion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstPolicy {
    rules: ConstRules,
}

impl ConstPolicy {
    pub fn new(rules: ConstRules) -> Self {
        ConstPolicy { rules }
    }

    #[inline]
    pub fn mode(&self, scope: ConstScope) -> ConstMode {
        self.rules.mode(scope)
    }

    /// Resolve `expression` according to the mode configured for `scope`.
    pub fn evaluate(
        &self,
        scope: ConstScope,
        expression: &str,
        env: &dyn ConstEnv,
    ) -> Result<ConstValue, ConstEvalError> {
        match self.mode(scope) {
            ConstMode::Eval => eval_text(expression, env),
            ConstMode::Expand => expand(expression, env).map(ConstValue::Expr),
        }
    }
}

/// Fully evaluate an expression.
pub fn eval_text(text: &str, env: &dyn ConstEnv) -> Result<ConstValue, ConstEvalError> {
    let expr = parse_expr(text)?;
    Ok(match eval(&expr, env)? {
        Value::Int(v) => ConstValue::Int(v),
        Value::Float(v) => ConstValue::Float(v),
        Value::Str(s) => ConstValue::Str(s),
    })
}

/// Re-tokenize an expression for the host toolchain.
pub fn expand(text: &str, env: &dyn ConstEnv) -> Result<String, ConstEvalError> {
    let expr = parse_expr(text)?;
    let mut out = String::with_capacity(text.len());
    render(&expr, env, &mut out)?;
    Ok(out)
}

#[derive(Clone, Debug, PartialEq)]
enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    fn truthy(&self) -> Result<bool, ConstEvalError> {
        match self {
            Value::Int(v) => Ok(*v != 0),
            Value::Float(v) => Ok(*v != 0.0),
            Value::Str(_) => Err(string_operand()),
        }
    }

    #[allow(clippy::cast_precision_loss, reason = "C promotes integers to double")]
    fn as_float(&self) -> Result<f64, ConstEvalError> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            Value::Str(_) => Err(string_operand()),
        }
    }
}

fn string_operand() -> ConstEvalError {
    ConstEvalError::Unsupported("operator on a string".to_string())
}

fn from_bool(b: bool) -> Value {
    Value::Int(i64::from(b))
}

fn eval(expr: &Expr, env: &dyn ConstEnv) -> Result<Value, ConstEvalError> {
    match expr {
        Expr::Int { value, .. } => value.map(Value::Int).ok_or(ConstEvalError::Overflow),
        Expr::Char { value, .. } => Ok(Value::Int(*value)),
        Expr::Float { value, .. } => Ok(Value::Float(*value)),
        Expr::Str { value, .. } => Ok(Value::Str(value.clone())),
        Expr::Ident(raw) => match env.value(raw) {
            Some(ConstValue::Int(v)) => Ok(Value::Int(*v)),
            Some(ConstValue::Float(v)) => Ok(Value::Float(*v)),
            Some(ConstValue::Str(s)) => Ok(Value::Str(s.clone())),
            Some(ConstValue::Expr(_)) | None => Err(ConstEvalError::UnknownIdent(raw.clone())),
        },
        Expr::Paren(inner) => eval(inner, env),
        Expr::Unary(op, operand) => eval_unary(*op, eval(operand, env)?),
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            if !eval(lhs, env)?.truthy()? {
                return Ok(from_bool(false));
            }
            Ok(from_bool(eval(rhs, env)?.truthy()?))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            if eval(lhs, env)?.truthy()? {
                return Ok(from_bool(true));
            }
            Ok(from_bool(eval(rhs, env)?.truthy()?))
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, eval(lhs, env)?, eval(rhs, env)?),
        Expr::Ternary(cond, then, otherwise) => {
            if eval(cond, env)?.truthy()? {
                eval(then, env)
            } else {
                eval(otherwise, env)
            }
        }
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, ConstEvalError> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(from_bool(!value.truthy()?)),
        (_, Value::Str(_)) => Err(string_operand()),
        (UnaryOp::Plus, value) => Ok(value),
        (UnaryOp::Neg, Value::Int(v)) => v.checked_neg().map(Value::Int).ok_or(ConstEvalError::Overflow),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::BitNot, Value::Int(v)) => Ok(Value::Int(!v)),
        (UnaryOp::BitNot, Value::Float(_)) => Err(ConstEvalError::Unsupported(
            "`~` on a floating value".to_string(),
        )),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ConstEvalError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, a, b),
        (Value::Str(_), _) | (_, Value::Str(_)) => Err(string_operand()),
        (a, b) => float_binary(op, a.as_float()?, b.as_float()?),
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, ConstEvalError> {
    let value = match op {
        BinaryOp::Mul => a.checked_mul(b).ok_or(ConstEvalError::Overflow)?,
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(ConstEvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b).ok_or(ConstEvalError::Overflow)?,
        BinaryOp::Rem => a.checked_rem(b).ok_or(ConstEvalError::Overflow)?,
        BinaryOp::Add => a.checked_add(b).ok_or(ConstEvalError::Overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or(ConstEvalError::Overflow)?,
        BinaryOp::Shl => {
            let shift = u32::try_from(b).map_err(|_| ConstEvalError::Overflow)?;
            let shifted = a.checked_shl(shift).ok_or(ConstEvalError::Overflow)?;
            if shifted >> shift != a {
                return Err(ConstEvalError::Overflow);
            }
            shifted
        }
        BinaryOp::Shr => {
            let shift = u32::try_from(b).map_err(|_| ConstEvalError::Overflow)?;
            a.checked_shr(shift).ok_or(ConstEvalError::Overflow)?
        }
        BinaryOp::Lt => i64::from(a < b),
        BinaryOp::LtEq => i64::from(a <= b),
        BinaryOp::Gt => i64::from(a > b),
        BinaryOp::GtEq => i64::from(a >= b),
        BinaryOp::Eq => i64::from(a == b),
        BinaryOp::NotEq => i64::from(a != b),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::BitOr => a | b,
        BinaryOp::And => i64::from(a != 0 && b != 0),
        BinaryOp::Or => i64::from(a != 0 || b != 0),
    };
    Ok(Value::Int(value))
}

#[allow(clippy::float_cmp, reason = "C equality on constant doubles")]
fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, ConstEvalError> {
    Ok(match op {
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => Value::Float(a / b),
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Lt => from_bool(a < b),
        BinaryOp::LtEq => from_bool(a <= b),
        BinaryOp::Gt => from_bool(a > b),
        BinaryOp::GtEq => from_bool(a >= b),
        BinaryOp::Eq => from_bool(a == b),
        BinaryOp::NotEq => from_bool(a != b),
        BinaryOp::And => from_bool(a != 0.0 && b != 0.0),
        BinaryOp::Or => from_bool(a != 0.0 || b != 0.0),
        BinaryOp::Rem
        | BinaryOp::Shl
        | BinaryOp::Shr
        | BinaryOp::BitAnd
        | BinaryOp::BitXor
        | BinaryOp::BitOr => {
            return Err(ConstEvalError::Unsupported(format!(
                "`{}` on a floating value",
                op.symbol()
            )))
        }
    })
}

fn render(expr: &Expr, env: &dyn ConstEnv, out: &mut String) -> Result<(), ConstEvalError> {
    match expr {
        Expr::Int { text, .. } | Expr::Float { text, .. } | Expr::Char { text, .. } => {
            out.push_str(text);
        }
        Expr::Str { parts, .. } => out.push_str(&parts.join(" + ")),
        Expr::Ident(raw) => {
            let name = env
                .host_name(raw)
                .ok_or_else(|| ConstEvalError::UnknownIdent(raw.clone()))?;
            out.push_str(name);
        }
        Expr::Paren(inner) => {
            out.push('(');
            render(inner, env, out)?;
            out.push(')');
        }
        Expr::Unary(op, operand) => {
            out.push_str(op.symbol());
            render(operand, env, out)?;
        }
        Expr::Binary(op, lhs, rhs) => {
            render(lhs, env, out)?;
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            render(rhs, env, out)?;
        }
        Expr::Ternary(..) => {
            return Err(ConstEvalError::Unsupported(
                "conditional operator in an expanded constant".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
