//! `cond ? then : els` and `cond ?: els`.

use kestrel_ast::TernaryExpr;
use kestrel_core::{CheckError, ConstValue, TypeId};

use crate::checker::Checker;
use crate::conversion::Convert;
use crate::operand::Operand;

pub(super) fn check_ternary(checker: &mut Checker<'_>, ternary: &TernaryExpr, desired: Option<TypeId>) -> Operand {
    let cond = checker.check_value(&ternary.cond, Some(TypeId::BOOL));
    if cond.is_invalid() {
        return cond;
    }
    let types = checker.types();
    if !(types.is_bool(cond.ty) || types.is_pointer(cond.ty) || types.is_number(cond.ty)) {
        checker.report(CheckError::InvalidCondition {
            operand: checker.describe(&ternary.cond, &cond),
            construct: "ternary expression".to_string(),
            span: ternary.cond.span(),
        });
        return Operand::invalid();
    }

    let mut then = match &ternary.then {
        Some(expr) => checker.check_value(expr, desired),
        None => cond.clone(),
    };
    let then_expr = ternary.then.as_ref().unwrap_or(&ternary.cond);
    let mut els = checker.check_value(&ternary.els, Some(then.ty).filter(|t| !t.is_invalid()).or(desired));
    if then.is_invalid() || els.is_invalid() {
        return Operand::invalid();
    }

    let ty = if then.ty == els.ty {
        then.ty
    } else if checker.try_convert(&mut els, then.ty, &ternary.els) == Convert::Converted {
        then.ty
    } else if checker.try_convert(&mut then, els.ty, then_expr) == Convert::Converted {
        els.ty
    } else {
        checker.report(CheckError::MismatchedTypes {
            lhs: checker.display(then.ty),
            rhs: checker.display(els.ty),
            op: "?:".to_string(),
            span: ternary.span,
        });
        return Operand::invalid();
    };

    let mut result = Operand::computed(ty);
    result.absorb(&cond);
    result.absorb(&then);
    result.absorb(&els);
    result.constant = match cond.constant.as_ref() {
        Some(ConstValue::Bool(true)) => then.constant.clone(),
        Some(ConstValue::Bool(false)) => els.constant.clone(),
        _ => None,
    };
    result
}
