//! Constant values stored on the model.

/// The resolved representation of a constant.
///
/// `Int`, `Float` and `Str` are the result of full evaluation; `Expr` keeps the
/// re-tokenized source expression for the host toolchain to evaluate.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Str(String),
    Expr(String),
}

impl ConstValue {
    /// Integer value, if this is an evaluated integer.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// True if the value was kept as an expression.
    #[inline]
    pub fn is_expr(&self) -> bool {
        matches!(self, ConstValue::Expr(_))
    }
}
