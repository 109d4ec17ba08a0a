//! Operator definitions for Kestrel expressions.
//!
//! Provides enums for binary and unary operators along with the precedence
//! information the expression printer uses to parenthesize.

use std::fmt;

/// Binary operators.
///
/// Organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Logical OR (precedence 1)
    /// `||`
    LogicalOr,

    // Logical AND (precedence 2)
    /// `&&`
    LogicalAnd,

    // Equality and relational (precedence 3)
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    // Additive (precedence 4)
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,

    // Multiplicative (precedence 5)
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `&`
    BitwiseAnd,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
}

impl BinaryOp {
    /// Get the binding power (precedence) for this operator.
    ///
    /// Higher values bind more tightly. Returns (left_bp, right_bp); every
    /// operator is left-associative so right_bp = left_bp + 1.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            LogicalOr => (1, 2),
            LogicalAnd => (3, 4),
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => (5, 6),
            Add | Sub | BitwiseOr | BitwiseXor => (7, 8),
            Mul | Div | Mod | BitwiseAnd | ShiftLeft | ShiftRight => (9, 10),
        }
    }

    /// `==`, `!=`, `<`, `<=`, `>`, `>=`
    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual
        )
    }

    /// `<`, `<=`, `>`, `>=`
    pub fn is_ordering(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Less | LessEqual | Greater | GreaterEqual)
    }

    /// `&&`, `||`
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    /// `/`, `%`
    pub fn is_division(&self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Mod)
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::ShiftLeft | BinaryOp::ShiftRight)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            BitwiseAnd => "&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        };
        write!(f, "{}", s)
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-` negation
    Neg,
    /// `+` plus (unary)
    Plus,
    /// `!` logical NOT
    LogicalNot,
    /// `~` bitwise NOT
    BitwiseNot,
    /// `&` address-of
    AddressOf,
    /// `<` dereference
    Deref,
}

impl UnaryOp {
    /// Get the binding power for prefix operators.
    pub fn binding_power() -> u8 {
        11
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UnaryOp::*;
        let s = match self {
            Neg => "-",
            Plus => "+",
            LogicalNot => "!",
            BitwiseNot => "~",
            AddressOf => "&",
            Deref => "<",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(BinaryOp::Mul.binding_power().0 > BinaryOp::Add.binding_power().0);
        assert!(BinaryOp::LogicalAnd.binding_power().0 > BinaryOp::LogicalOr.binding_power().0);
    }

    #[test]
    fn classification() {
        assert!(BinaryOp::Less.is_comparison());
        assert!(BinaryOp::Less.is_ordering());
        assert!(!BinaryOp::Equal.is_ordering());
        assert!(BinaryOp::Mod.is_division());
        assert!(BinaryOp::LogicalOr.is_logical());
    }

    #[test]
    fn display() {
        assert_eq!(BinaryOp::ShiftLeft.to_string(), "<<");
        assert_eq!(UnaryOp::Deref.to_string(), "<");
        assert_eq!(UnaryOp::AddressOf.to_string(), "&");
    }
}
