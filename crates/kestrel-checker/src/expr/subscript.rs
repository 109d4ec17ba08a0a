//! Indexing and slicing.

use kestrel_ast::{Expr, SliceExpr, SubscriptExpr};
use kestrel_core::{CheckError, TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{Mode, Operand};

/// Check an index or bound; `None` when it is not an integer.
fn check_index(checker: &mut Checker<'_>, index: &Expr) -> Option<Operand> {
    let mut operand = checker.check_value(index, None);
    if operand.is_invalid() {
        return None;
    }
    if !checker.types().is_integer(operand.ty) {
        checker.report(CheckError::NonIntegerIndex {
            operand: checker.describe(index, &operand),
            span: index.span(),
        });
        return None;
    }
    checker.default_operand(&mut operand, index);
    Some(operand)
}

pub(super) fn check_subscript(checker: &mut Checker<'_>, subscript: &SubscriptExpr) -> Operand {
    let receiver = checker.check_value(&subscript.receiver, None);
    let index = check_index(checker, &subscript.index);
    if receiver.is_invalid() {
        return Operand::invalid();
    }
    let Some(index) = index else {
        return Operand::invalid();
    };

    let mode = if receiver.mode == Mode::Assignable {
        Mode::Assignable
    } else {
        Mode::Addressable
    };
    let (elem, mode) = match checker.types().base_kind(receiver.ty).clone() {
        TypeKind::Array { len, elem } => {
            if let (Some(len), Some(value)) = (len, index.constant.as_ref().and_then(|c| c.as_int()))
                && (value < 0 || value as u64 >= len)
            {
                checker.report(CheckError::IndexOutOfBounds {
                    index: value,
                    len,
                    span: subscript.index.span(),
                });
                return Operand::invalid();
            }
            (elem, mode)
        }
        TypeKind::Slice(elem) | TypeKind::Pointer(elem) => (elem, Mode::Assignable),
        TypeKind::Vector { size, elem } => {
            if let Some(value) = index.constant.as_ref().and_then(|c| c.as_int())
                && (value < 0 || value >= size as i128)
            {
                checker.report(CheckError::IndexOutOfBounds {
                    index: value,
                    len: size as u64,
                    span: subscript.index.span(),
                });
                return Operand::invalid();
            }
            (elem, mode)
        }
        TypeKind::String => (TypeId::U8, Mode::Computed),
        _ => {
            checker.report(CheckError::CannotSubscript {
                operand: checker.describe(&subscript.receiver, &receiver),
                span: subscript.span,
            });
            return Operand::invalid();
        }
    };

    let mut operand = Operand::new(mode, elem);
    operand.absorb(&receiver);
    operand.absorb(&index);
    operand
}

pub(super) fn check_slice(checker: &mut Checker<'_>, slice: &SliceExpr) -> Operand {
    let receiver = checker.check_value(&slice.receiver, None);
    let lo = slice.lo.as_ref().map(|lo| check_index(checker, lo));
    let hi = slice.hi.as_ref().map(|hi| check_index(checker, hi));
    if receiver.is_invalid() || matches!(lo, Some(None)) || matches!(hi, Some(None)) {
        return Operand::invalid();
    }

    let ty = match checker.types().base_kind(receiver.ty).clone() {
        TypeKind::Array { elem, .. } | TypeKind::Pointer(elem) => checker.types_mut().slice(elem),
        TypeKind::Slice(_) => receiver.ty,
        TypeKind::String => TypeId::STRING,
        _ => {
            checker.report(CheckError::CannotSlice {
                operand: checker.describe(&slice.receiver, &receiver),
                span: slice.span,
            });
            return Operand::invalid();
        }
    };

    let mut operand = Operand::computed(ty);
    operand.absorb(&receiver);
    for bound in [lo, hi].into_iter().flatten().flatten() {
        operand.absorb(&bound);
    }
    operand
}
