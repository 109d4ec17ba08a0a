//! Binary operators.
//!
//! Operands are reconciled to one type before the operator is checked:
//! an untyped operand adopts the other side's type, otherwise either side
//! may convert implicitly to the other. Comparisons and logical operators
//! yield `bool`; everything else yields the shared operand type.

use kestrel_ast::{BinaryExpr, BinaryOp};
use kestrel_core::{CheckError, ConstValue, TypeId, TypeKind, TypeTable};

use crate::checker::Checker;
use crate::conversion::Convert;
use crate::fold::{FoldError, fold_binary};
use crate::operand::Operand;

/// Whether `op` is defined for operands of type `ty`.
///
/// Arithmetic and bitwise operators apply to vectors element-wise.
pub(crate) fn operator_applies(types: &TypeTable, op: BinaryOp, ty: TypeId) -> bool {
    use BinaryOp::*;

    let elem = types.unwrap_vector(ty);
    match op {
        Add | Sub | Mul | Div => types.is_number(elem),
        Mod => types.is_integer(elem),
        BitwiseAnd | BitwiseOr | BitwiseXor | ShiftLeft | ShiftRight => {
            types.is_integer(elem) || types.is_enum_flags(elem)
        }
        Equal | NotEqual => types.is_equatable(ty),
        Less | LessEqual | Greater | GreaterEqual => types.is_comparable(ty) || types.is_enum(ty),
        LogicalAnd | LogicalOr => types.is_bool(ty),
    }
}

pub(super) fn check_binary(checker: &mut Checker<'_>, binary: &BinaryExpr) -> Operand {
    let mut lhs = checker.check_value(&binary.lhs, None);
    let mut rhs = checker.check_value(&binary.rhs, None);

    if lhs.is_nil() && rhs.is_nil() {
        checker.report(CheckError::NilNeedsType {
            span: binary.lhs.span(),
        });
        return Operand::invalid();
    }
    if lhs.is_invalid() || rhs.is_invalid() {
        return Operand::invalid();
    }

    let Some(ty) = unify(checker, binary, &mut lhs, &mut rhs) else {
        return Operand::invalid();
    };

    if !operator_applies(checker.types(), binary.op, ty) {
        checker.report(CheckError::OperatorUndefined {
            op: binary.op.to_string(),
            operand: checker.describe(&binary.lhs, &lhs),
            span: binary.span,
        });
        return Operand::invalid();
    }

    let result_ty = if binary.op.is_comparison() || binary.op.is_logical() {
        TypeId::BOOL
    } else {
        ty
    };
    let mut result = Operand::computed(result_ty);
    result.absorb(&lhs);
    result.absorb(&rhs);

    if binary.op.is_division() && rhs.constant.as_ref().is_some_and(|c| c.is_zero()) {
        checker.report(CheckError::DivisionByZero {
            span: binary.rhs.span(),
        });
        return Operand::invalid();
    }
    if binary.op.is_shift()
        && let Some(ConstValue::Int(amount)) = &rhs.constant
        && *amount < 0
    {
        checker.report(CheckError::InvalidShift {
            amount: *amount,
            span: binary.rhs.span(),
        });
        return Operand::invalid();
    }

    let (Some(l), Some(r)) = (&lhs.constant, &rhs.constant) else {
        return result;
    };
    match fold_binary(binary.op, l, r) {
        Ok(value) => {
            if let TypeKind::Integer { bits, signed } = checker.types().base_kind(result_ty)
                && !value.fits_integer(*bits, *signed)
            {
                checker.report(CheckError::ConstantOverflow {
                    value: value.to_string(),
                    ty: checker.display(result_ty),
                    span: binary.span,
                });
                return Operand::invalid();
            }
            result.constant = Some(value);
        }
        Err(FoldError::DivisionByZero) => {
            checker.report(CheckError::DivisionByZero {
                span: binary.rhs.span(),
            });
            return Operand::invalid();
        }
        Err(FoldError::InvalidShift(amount)) => {
            checker.report(CheckError::InvalidShift {
                amount,
                span: binary.rhs.span(),
            });
            return Operand::invalid();
        }
        Err(FoldError::Unsupported) => {}
    }
    result
}

/// Bring both operands to one type, reporting a mismatch.
fn unify(checker: &mut Checker<'_>, binary: &BinaryExpr, lhs: &mut Operand, rhs: &mut Operand) -> Option<TypeId> {
    if lhs.is_nil() {
        return adopt(checker, binary, lhs, true, rhs.ty, rhs);
    }
    if rhs.is_nil() {
        return adopt(checker, binary, rhs, false, lhs.ty, lhs);
    }
    if lhs.ty == rhs.ty {
        return Some(lhs.ty);
    }

    let types = checker.types();
    let (l_untyped, r_untyped) = (types.is_untyped(lhs.ty), types.is_untyped(rhs.ty));
    if l_untyped && r_untyped {
        // untyped integer meets untyped float
        return if lhs.ty == TypeId::UNTYPED_INT {
            adopt(checker, binary, lhs, true, TypeId::UNTYPED_FLOAT, rhs)
        } else {
            adopt(checker, binary, rhs, false, TypeId::UNTYPED_FLOAT, lhs)
        };
    }
    if l_untyped {
        return adopt(checker, binary, lhs, true, rhs.ty, rhs);
    }
    if r_untyped {
        return adopt(checker, binary, rhs, false, lhs.ty, lhs);
    }

    let target = rhs.ty;
    if checker.try_convert(lhs, target, &binary.lhs) == Convert::Converted {
        return Some(target);
    }
    let target = lhs.ty;
    if checker.try_convert(rhs, target, &binary.rhs) == Convert::Converted {
        return Some(target);
    }
    mismatch(checker, binary, lhs, rhs);
    None
}

/// Convert one side to `target`; `other` is the opposite operand.
fn adopt(
    checker: &mut Checker<'_>,
    binary: &BinaryExpr,
    operand: &mut Operand,
    on_left: bool,
    target: TypeId,
    other: &Operand,
) -> Option<TypeId> {
    let expr = if on_left { &binary.lhs } else { &binary.rhs };
    match checker.try_convert(operand, target, expr) {
        Convert::Converted => Some(target),
        Convert::Overflow => {
            checker.report(CheckError::ConstantOverflow {
                value: operand
                    .constant
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                ty: checker.display(target),
                span: expr.span(),
            });
            None
        }
        Convert::Incompatible => {
            if operand.is_nil() {
                checker.report(CheckError::CannotConvert {
                    value: "'nil'".to_string(),
                    target: checker.display(target),
                    span: expr.span(),
                });
            } else {
                let (l, r) = if on_left {
                    (operand.ty, other.ty)
                } else {
                    (other.ty, operand.ty)
                };
                checker.report(CheckError::MismatchedTypes {
                    lhs: checker.display(l),
                    rhs: checker.display(r),
                    op: binary.op.to_string(),
                    span: binary.span,
                });
            }
            None
        }
    }
}

fn mismatch(checker: &mut Checker<'_>, binary: &BinaryExpr, lhs: &Operand, rhs: &Operand) {
    checker.report(CheckError::MismatchedTypes {
        lhs: checker.display(lhs.ty),
        rhs: checker.display(rhs.ty),
        op: binary.op.to_string(),
        span: binary.span,
    });
}

#[cfg(test)]
mod tests {
    use kestrel_ast::{AstBuilder, UnaryOp};
    use kestrel_core::FileId;

    use super::*;
    use crate::testing::check_source;

    /// `f :: (x: <param>) { y := x <op> <rhs> }`
    fn check_with_param(
        param: &str,
        op: BinaryOp,
        rhs: impl FnOnce(&mut AstBuilder) -> kestrel_ast::Expr,
    ) -> crate::Program {
        let mut b = AstBuilder::new(FileId(0));
        let x = b.name("x");
        let rhs = rhs(&mut b);
        let value = b.binary(op, x, rhs);
        let y = b.var("y", None, Some(value));
        let param = b.name(param);
        let func = b.func(vec![("x", param)], vec![], vec![y]);
        let f = b.const_item("f", func);
        check_source(vec![b.finish("main.k", vec![f])]).0
    }

    #[test]
    fn float_division_by_constant_zero() {
        let program = check_with_param("f32", BinaryOp::Div, |b| b.float(0.0));
        assert_eq!(program.diagnostics(FileId(0)).messages(), vec!["division by zero"]);

        let program = check_with_param("f64", BinaryOp::Div, |b| b.int(0));
        assert_eq!(program.diagnostics(FileId(0)).messages(), vec!["division by zero"]);
    }

    #[test]
    fn negative_shift_of_a_variable() {
        let program = check_with_param("i32", BinaryOp::ShiftRight, |b| {
            let two = b.int(2);
            b.unary(UnaryOp::Neg, two)
        });
        assert_eq!(
            program.diagnostics(FileId(0)).messages(),
            vec!["invalid shift amount -2"]
        );

        let program = check_with_param("i32", BinaryOp::ShiftRight, |b| b.int(2));
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
    }

    #[test]
    fn operator_table() {
        let mut types = TypeTable::default();
        assert!(operator_applies(&types, BinaryOp::Add, TypeId::F32));
        assert!(!operator_applies(&types, BinaryOp::Mod, TypeId::F32));
        assert!(operator_applies(&types, BinaryOp::Mod, TypeId::U8));
        assert!(operator_applies(&types, BinaryOp::LogicalAnd, TypeId::BOOL));
        assert!(!operator_applies(&types, BinaryOp::LogicalAnd, TypeId::I32));
        assert!(operator_applies(&types, BinaryOp::Less, TypeId::STRING));
        assert!(!operator_applies(&types, BinaryOp::Add, TypeId::STRING));

        let vector = types.vector(4, TypeId::F32);
        assert!(operator_applies(&types, BinaryOp::Mul, vector));
        assert!(!operator_applies(&types, BinaryOp::ShiftLeft, vector));
    }
}
