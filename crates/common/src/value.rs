//! Runtime value representation for the Tarn VM.
//!
//! Values are what live on the operand stack, in locals and in the
//! constant pool. They are immutable; strings are shared `Arc<str>` so a
//! clone never copies text.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::decimal::Decimal;
use crate::error::ValueError;
use crate::value_kind::ValueKind;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE 754 64-bit float.
    Float(f64),
    /// Exact fixed-point decimal.
    Decimal(Decimal),
    Bool(bool),
    /// Immutable text.
    String(Arc<str>),
}

// Float equality is bitwise so that Value can implement Eq. This means
// NaN == NaN for identical bit patterns and 0.0 != -0.0; arithmetic never
// goes through this impl.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Arithmetic operators handled by [`Value::arith`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
        }
    }

    fn int(self, a: i64, b: i64) -> Option<i64> {
        let (a, b) = (a as i128, b as i128);
        let wide = match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        };
        i64::try_from(wide).ok()
    }

    fn decimal(self, a: Decimal, b: Decimal) -> Option<Decimal> {
        match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => a.checked_div(b),
        }
    }

    fn float(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }
}

impl Value {
    pub fn null() -> Self {
        Value::Null
    }

    pub fn from_int(value: i64) -> Self {
        Value::Int(value)
    }

    pub fn from_float(value: f64) -> Self {
        Value::Float(value)
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Value::Decimal(value)
    }

    pub fn from_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    pub fn from_string(value: impl Into<Arc<str>>) -> Self {
        Value::String(value.into())
    }

    /// Returns the kind tag for this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::Decimal(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Int, Float or Decimal.
    pub fn is_number(&self) -> bool {
        self.kind().is_numeric()
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(other.accessor_mismatch("as_int")),
        }
    }

    pub fn as_float(&self) -> Result<f64, ValueError> {
        match self {
            Value::Float(v) => Ok(*v),
            other => Err(other.accessor_mismatch("as_float")),
        }
    }

    pub fn as_decimal(&self) -> Result<Decimal, ValueError> {
        match self {
            Value::Decimal(v) => Ok(*v),
            other => Err(other.accessor_mismatch("as_decimal")),
        }
    }

    /// The only boolean coercion: `Bool` passes, everything else is a
    /// type mismatch.
    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(other.accessor_mismatch("as_bool")),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Value::String(v) => Ok(v),
            other => Err(other.accessor_mismatch("as_str")),
        }
    }

    fn accessor_mismatch(&self, op: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            op,
            found: self.kind().to_string(),
        }
    }

    fn pair_mismatch(op: &'static str, lhs: &Value, rhs: &Value) -> ValueError {
        ValueError::TypeMismatch {
            op,
            found: format!("{} and {}", lhs.kind(), rhs.kind()),
        }
    }

    /// Numerically zero (Int 0, Float ±0.0, Decimal 0).
    fn is_zero_number(&self) -> bool {
        match self {
            Value::Int(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Decimal(v) => v.is_zero(),
            _ => false,
        }
    }

    fn to_f64_lossy(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(v) => Some(v.to_f64()),
            _ => None,
        }
    }

    /// Apply an arithmetic operator.
    ///
    /// - `Int op Int` stays `Int` and fails on overflow.
    /// - `Decimal op Decimal` stays `Decimal`.
    /// - any other numeric pair is computed as `Float`.
    /// - `Add` with a `String` on either side concatenates renderings.
    /// - `Div` by a numeric zero fails before any of the above.
    pub fn arith(op: ArithOp, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
        if op == ArithOp::Add && (lhs.is_string() || rhs.is_string()) {
            return Ok(Value::from_string(format!("{lhs}{rhs}")));
        }
        if !lhs.is_number() || !rhs.is_number() {
            return Err(Self::pair_mismatch(op.name(), lhs, rhs));
        }
        if op == ArithOp::Div && rhs.is_zero_number() {
            return Err(ValueError::DivisionByZero);
        }
        let overflow = || ValueError::ArithmeticOverflow { op: op.name() };

        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => op.int(*a, *b).map(Value::Int).ok_or_else(overflow),
            (Value::Decimal(a), Value::Decimal(b)) => {
                op.decimal(*a, *b).map(Value::Decimal).ok_or_else(overflow)
            }
            _ => match (lhs.to_f64_lossy(), rhs.to_f64_lossy()) {
                (Some(a), Some(b)) => Ok(Value::Float(op.float(a, b))),
                _ => Err(Self::pair_mismatch(op.name(), lhs, rhs)),
            },
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, ValueError> {
        Self::arith(ArithOp::Add, self, rhs)
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, ValueError> {
        Self::arith(ArithOp::Sub, self, rhs)
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, ValueError> {
        Self::arith(ArithOp::Mul, self, rhs)
    }

    pub fn div(&self, rhs: &Value) -> Result<Value, ValueError> {
        Self::arith(ArithOp::Div, self, rhs)
    }

    /// Numeric `<`.
    ///
    /// Float on either side compares as `f64`; otherwise Decimal on either
    /// side compares exactly as decimals; otherwise as `i64`.
    pub fn less_than(&self, rhs: &Value) -> Result<bool, ValueError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a < b),
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                match (self.to_f64_lossy(), rhs.to_f64_lossy()) {
                    (Some(a), Some(b)) => Ok(a < b),
                    _ => Err(Self::pair_mismatch("cmp_lt", self, rhs)),
                }
            }
            (Value::Decimal(a), Value::Decimal(b)) => Ok(a.cmp(b) == Ordering::Less),
            (Value::Decimal(a), Value::Int(b)) => Ok(*a < Decimal::from_i64(*b)),
            (Value::Int(a), Value::Decimal(b)) => Ok(Decimal::from_i64(*a) < *b),
            _ => Err(Self::pair_mismatch("cmp_lt", self, rhs)),
        }
    }
}

/// Canonical rendering, used by string concatenation and the print syscall.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}
