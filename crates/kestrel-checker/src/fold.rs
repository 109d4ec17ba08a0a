//! Constant folding.
//!
//! Folding works on [`ConstValue`]s only; whether the result fits the
//! operand type is decided by the caller. Integer arithmetic is done in
//! `i128` and reports overflow of that range as "not foldable".

use kestrel_ast::{BinaryOp, UnaryOp};
use kestrel_core::ConstValue;

/// Why a binary fold produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
    DivisionByZero,
    /// A shift by a negative amount or by the full width or more.
    InvalidShift(i128),
    /// The operator does not apply to these constants.
    Unsupported,
}

/// Fold a unary operator. `bits` is the operand width, used for `~`.
pub fn fold_unary(op: UnaryOp, value: &ConstValue, bits: Option<(u32, bool)>) -> Option<ConstValue> {
    match (op, value) {
        (UnaryOp::Plus, ConstValue::Int(_) | ConstValue::Float(_)) => Some(value.clone()),
        (UnaryOp::Neg, ConstValue::Int(v)) => v.checked_neg().map(ConstValue::Int),
        (UnaryOp::Neg, ConstValue::Float(v)) => Some(ConstValue::float(-v.0)),
        (UnaryOp::LogicalNot, ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
        (UnaryOp::BitwiseNot, ConstValue::Int(v)) => {
            let flipped = ConstValue::Int(!v);
            Some(match bits {
                Some((bits, signed)) => flipped.wrap_integer(bits, signed),
                None => flipped,
            })
        }
        _ => None,
    }
}

/// Fold a binary operator over two constants.
pub fn fold_binary(op: BinaryOp, lhs: &ConstValue, rhs: &ConstValue) -> Result<ConstValue, FoldError> {
    use ConstValue::*;

    match (lhs, rhs) {
        (Int(a), Int(b)) => fold_int(op, *a, *b),
        (Float(_), Int(_)) | (Int(_), Float(_)) | (Float(_), Float(_)) => {
            let (Some(a), Some(b)) = (lhs.as_float(), rhs.as_float()) else {
                return Err(FoldError::Unsupported);
            };
            fold_float(op, a, b)
        }
        (Bool(a), Bool(b)) => match op {
            BinaryOp::LogicalAnd => Ok(Bool(*a && *b)),
            BinaryOp::LogicalOr => Ok(Bool(*a || *b)),
            BinaryOp::Equal => Ok(Bool(a == b)),
            BinaryOp::NotEqual => Ok(Bool(a != b)),
            _ => Err(FoldError::Unsupported),
        },
        (String(a), String(b)) => match op {
            BinaryOp::Equal => Ok(Bool(a == b)),
            BinaryOp::NotEqual => Ok(Bool(a != b)),
            BinaryOp::Less => Ok(Bool(a < b)),
            BinaryOp::LessEqual => Ok(Bool(a <= b)),
            BinaryOp::Greater => Ok(Bool(a > b)),
            BinaryOp::GreaterEqual => Ok(Bool(a >= b)),
            _ => Err(FoldError::Unsupported),
        },
        (Nil, Nil) => match op {
            BinaryOp::Equal => Ok(Bool(true)),
            BinaryOp::NotEqual => Ok(Bool(false)),
            _ => Err(FoldError::Unsupported),
        },
        _ => Err(FoldError::Unsupported),
    }
}

fn fold_int(op: BinaryOp, a: i128, b: i128) -> Result<ConstValue, FoldError> {
    use ConstValue::{Bool, Int};

    let overflow = FoldError::Unsupported;
    match op {
        BinaryOp::Add => a.checked_add(b).map(Int).ok_or(overflow),
        BinaryOp::Sub => a.checked_sub(b).map(Int).ok_or(overflow),
        BinaryOp::Mul => a.checked_mul(b).map(Int).ok_or(overflow),
        BinaryOp::Div if b == 0 => Err(FoldError::DivisionByZero),
        BinaryOp::Mod if b == 0 => Err(FoldError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b).map(Int).ok_or(overflow),
        BinaryOp::Mod => a.checked_rem(b).map(Int).ok_or(overflow),
        BinaryOp::BitwiseAnd => Ok(Int(a & b)),
        BinaryOp::BitwiseOr => Ok(Int(a | b)),
        BinaryOp::BitwiseXor => Ok(Int(a ^ b)),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let shift = u32::try_from(b)
                .ok()
                .filter(|shift| *shift < i128::BITS)
                .ok_or(FoldError::InvalidShift(b))?;
            if op == BinaryOp::ShiftLeft {
                Ok(Int(a << shift))
            } else {
                Ok(Int(a >> shift))
            }
        }
        BinaryOp::Equal => Ok(Bool(a == b)),
        BinaryOp::NotEqual => Ok(Bool(a != b)),
        BinaryOp::Less => Ok(Bool(a < b)),
        BinaryOp::LessEqual => Ok(Bool(a <= b)),
        BinaryOp::Greater => Ok(Bool(a > b)),
        BinaryOp::GreaterEqual => Ok(Bool(a >= b)),
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => Err(FoldError::Unsupported),
    }
}

fn fold_float(op: BinaryOp, a: f64, b: f64) -> Result<ConstValue, FoldError> {
    use ConstValue::Bool;

    match op {
        BinaryOp::Add => Ok(ConstValue::float(a + b)),
        BinaryOp::Sub => Ok(ConstValue::float(a - b)),
        BinaryOp::Mul => Ok(ConstValue::float(a * b)),
        BinaryOp::Div if b == 0.0 => Err(FoldError::DivisionByZero),
        BinaryOp::Div => Ok(ConstValue::float(a / b)),
        BinaryOp::Equal => Ok(Bool(a == b)),
        BinaryOp::NotEqual => Ok(Bool(a != b)),
        BinaryOp::Less => Ok(Bool(a < b)),
        BinaryOp::LessEqual => Ok(Bool(a <= b)),
        BinaryOp::Greater => Ok(Bool(a > b)),
        BinaryOp::GreaterEqual => Ok(Bool(a >= b)),
        _ => Err(FoldError::Unsupported),
    }
}
