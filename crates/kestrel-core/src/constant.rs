//! Compile-time constant values.
//!
//! Integers are held as `i128` so that every value of every 64-bit signed or
//! unsigned type is representable before a range check decides whether it
//! fits its target type.

use std::fmt;

use ordered_float::OrderedFloat;

/// A folded compile-time value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(OrderedFloat<f64>),
    String(String),
    Nil,
}

impl ConstValue {
    /// Build a float constant.
    pub fn float(value: f64) -> Self {
        ConstValue::Float(OrderedFloat(value))
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Bool(b) => Some(*b as i128),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Float(v) => Some(v.0),
            ConstValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether the value is a numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Int(v) => *v == 0,
            ConstValue::Float(v) => v.0 == 0.0,
            _ => false,
        }
    }

    /// Reinterpret an integer constant as a float constant.
    pub fn to_float(&self) -> ConstValue {
        match self {
            ConstValue::Int(v) => ConstValue::float(*v as f64),
            other => other.clone(),
        }
    }

    /// Reinterpret a numeric constant as an integer, truncating floats.
    pub fn to_int(&self) -> ConstValue {
        match self {
            ConstValue::Float(v) => ConstValue::Int(v.0.trunc() as i128),
            ConstValue::Bool(b) => ConstValue::Int(*b as i128),
            other => other.clone(),
        }
    }

    /// Whether an integer constant fits in an integer of the given width.
    ///
    /// Non-integer constants always fit.
    pub fn fits_integer(&self, bits: u32, signed: bool) -> bool {
        let ConstValue::Int(v) = self else {
            return true;
        };
        let (min, max) = integer_range(bits, signed);
        *v >= min && *v <= max
    }

    /// Wrap an integer constant to the given width, as a conversion would.
    pub fn wrap_integer(&self, bits: u32, signed: bool) -> ConstValue {
        let ConstValue::Int(v) = self else {
            return self.clone();
        };
        if bits >= 128 {
            return self.clone();
        }
        let mask = (1i128 << bits) - 1;
        let raw = v & mask;
        if signed && raw >> (bits - 1) & 1 == 1 {
            ConstValue::Int(raw - (1i128 << bits))
        } else {
            ConstValue::Int(raw)
        }
    }
}

/// Inclusive range of an integer type.
pub fn integer_range(bits: u32, signed: bool) -> (i128, i128) {
    let bits = bits.min(64);
    if signed {
        let max = (1i128 << (bits - 1)) - 1;
        (-max - 1, max)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(v) => write!(f, "{}", v),
            ConstValue::Float(v) => {
                if v.0.fract() == 0.0 && v.0.is_finite() {
                    write!(f, "{:.1}", v.0)
                } else {
                    write!(f, "{}", v.0)
                }
            }
            ConstValue::String(s) => write!(f, "{:?}", s),
            ConstValue::Nil => write!(f, "nil"),
        }
    }
}
