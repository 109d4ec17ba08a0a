//! `cast(T) x`, `bitcast(T) x` and `autocast x`.

use kestrel_ast::{CastExpr, CastKind, Expr};
use kestrel_core::{CheckError, ConstValue, NodeId, Span, TypeId, TypeKind};

use crate::checker::Checker;
use crate::conversion::{Convert, can_cast, default_type};
use crate::operand::Operand;
use crate::table::Conversion;

pub(super) fn check_cast(checker: &mut Checker<'_>, cast: &CastExpr, desired: Option<TypeId>) -> Operand {
    let target = match (&cast.ty, desired) {
        (Some(ty), _) => checker.check_type(ty),
        (None, Some(desired)) => desired,
        (None, None) => {
            checker.report(CheckError::AutocastNeedsContext { span: cast.span });
            checker.check_value(&cast.expr, None);
            return Operand::invalid();
        }
    };
    let mut operand = checker.check_value(&cast.expr, Some(target));
    if target.is_invalid() || operand.is_invalid() {
        return Operand::invalid();
    }

    let result = match cast.kind {
        CastKind::Cast | CastKind::Autocast => {
            convert_explicit(checker, &cast.expr, cast.id, cast.span, &mut operand, target)
        }
        CastKind::Bitcast => reinterpret(checker, cast, &mut operand, target),
    };
    let Some(mut result) = result else {
        return Operand::invalid();
    };
    result.absorb(&operand);
    result
}

/// Convert a checked operand to `target` under the cast rules.
///
/// Used by `cast(T) x` and by the call form `T(x)`; `node` is the node the
/// conversion is recorded against.
pub(super) fn convert_explicit(
    checker: &mut Checker<'_>,
    expr: &Expr,
    node: NodeId,
    span: Span,
    operand: &mut Operand,
    target: TypeId,
) -> Option<Operand> {
    if operand.is_nil() {
        if checker.try_convert(operand, target, expr) == Convert::Converted {
            return Some(Operand::computed(target));
        }
        checker.report(CheckError::InvalidCast {
            from: "nil".to_string(),
            to: checker.display(target),
            span,
        });
        return None;
    }
    // untyped constants that fit need no runtime conversion
    if checker.types().is_untyped(operand.ty) {
        let mut attempt = operand.clone();
        if checker.try_convert(&mut attempt, target, expr) == Convert::Converted {
            let mut result = Operand::computed(target);
            result.constant = attempt.constant;
            return Some(result);
        }
        let concrete = default_type(operand.ty);
        checker.default_operand(operand, expr);
        if operand.is_invalid() {
            return None;
        }
        operand.ty = concrete;
    }

    let from = operand.ty;
    if !can_cast(checker.types(), from, target) {
        checker.report(CheckError::InvalidCast {
            from: checker.display(from),
            to: checker.display(target),
            span,
        });
        return None;
    }
    checker
        .table_mut()
        .conversions
        .insert(node, Conversion { from, to: target });

    let mut result = Operand::computed(target);
    result.constant = operand
        .constant
        .as_ref()
        .and_then(|value| fold_cast(checker.types().base_kind(target), value));
    Some(result)
}

/// The value a constant takes after an explicit numeric cast.
fn fold_cast(target: &TypeKind, value: &ConstValue) -> Option<ConstValue> {
    match target {
        TypeKind::Integer { bits, signed } => match value {
            ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Bool(_) => {
                Some(value.to_int().wrap_integer(*bits, *signed))
            }
            _ => None,
        },
        TypeKind::Float { .. } => match value {
            ConstValue::Int(_) | ConstValue::Float(_) => Some(value.to_float()),
            _ => None,
        },
        TypeKind::Bool => value.as_int().map(|v| ConstValue::Bool(v != 0)),
        TypeKind::String => match value {
            ConstValue::String(_) => Some(value.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn reinterpret(checker: &mut Checker<'_>, cast: &CastExpr, operand: &mut Operand, target: TypeId) -> Option<Operand> {
    checker.default_operand(operand, &cast.expr);
    if operand.is_invalid() {
        return None;
    }
    let from = operand.ty;
    let from_width = checker.types().width(from);
    let to_width = checker.types().width(target);
    match (from_width, to_width) {
        (Some(from_width), Some(to_width)) if from_width == to_width => {}
        _ => {
            checker.report(CheckError::BitcastWidth {
                from: checker.display(from),
                to: checker.display(target),
                from_width: from_width.unwrap_or(0),
                to_width: to_width.unwrap_or(0),
                span: cast.span,
            });
            return None;
        }
    }
    checker
        .table_mut()
        .conversions
        .insert(cast.id, Conversion { from, to: target });
    Some(Operand::computed(target))
}
