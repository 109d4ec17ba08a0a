//! Unary operators.

use kestrel_ast::{UnaryExpr, UnaryOp};
use kestrel_core::{CheckError, TypeId, TypeKind};

use crate::checker::Checker;
use crate::fold::fold_unary;
use crate::operand::{Mode, Operand};

pub(super) fn check_unary(checker: &mut Checker<'_>, unary: &UnaryExpr, desired: Option<TypeId>) -> Operand {
    match unary.op {
        UnaryOp::AddressOf => return check_address_of(checker, unary),
        UnaryOp::Deref => return check_deref(checker, unary),
        _ => {}
    }

    let operand = checker.check_value(&unary.operand, desired);
    if operand.is_invalid() {
        return operand;
    }

    let types = checker.types();
    let element = types.unwrap_vector(operand.ty);
    let applies = match unary.op {
        UnaryOp::Neg | UnaryOp::Plus => types.is_number(element),
        UnaryOp::BitwiseNot => types.is_integer(element) || types.is_enum_flags(element),
        UnaryOp::LogicalNot => types.is_bool(operand.ty) || types.is_pointer(operand.ty),
        UnaryOp::AddressOf | UnaryOp::Deref => unreachable!("handled above"),
    };
    if !applies {
        checker.report(CheckError::OperatorUndefined {
            op: unary.op.to_string(),
            operand: checker.describe(&unary.operand, &operand),
            span: unary.span,
        });
        return Operand::invalid();
    }

    let ty = match unary.op {
        UnaryOp::LogicalNot => TypeId::BOOL,
        _ => operand.ty,
    };
    let bits = match checker.types().base_kind(ty) {
        TypeKind::Integer { bits, signed } => Some((*bits, *signed)),
        _ => None,
    };

    let mut result = Operand::computed(ty).with_dependencies(operand.dependencies.clone());
    if let Some(value) = &operand.constant {
        result.constant = fold_unary(unary.op, value, bits);
        if let (Some(folded), Some((bits, signed))) = (&result.constant, bits)
            && !folded.fits_integer(bits, signed)
        {
            checker.report(CheckError::ConstantOverflow {
                value: folded.to_string(),
                ty: checker.display(ty),
                span: unary.span,
            });
            return Operand::invalid();
        }
    }
    result
}

fn check_address_of(checker: &mut Checker<'_>, unary: &UnaryExpr) -> Operand {
    let operand = checker.check_value(&unary.operand, None);
    if operand.is_invalid() {
        return operand;
    }
    if !operand.is_addressable() {
        checker.report(CheckError::CannotTakeAddress {
            operand: checker.describe(&unary.operand, &operand),
            span: unary.span,
        });
        return Operand::invalid();
    }
    let ty = checker.types_mut().pointer(operand.ty);
    Operand::computed(ty).with_dependencies(operand.dependencies)
}

fn check_deref(checker: &mut Checker<'_>, unary: &UnaryExpr) -> Operand {
    let operand = checker.check_value(&unary.operand, None);
    if operand.is_invalid() {
        return operand;
    }
    match checker.types().pointee(operand.ty) {
        Some(pointee) => Operand::new(Mode::Assignable, pointee).with_dependencies(operand.dependencies),
        None => {
            checker.report(CheckError::OperatorUndefined {
                op: unary.op.to_string(),
                operand: checker.describe(&unary.operand, &operand),
                span: unary.span,
            });
            Operand::invalid()
        }
    }
}
