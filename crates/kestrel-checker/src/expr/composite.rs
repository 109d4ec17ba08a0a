//! Composite literals: `T{a, b}`, `T{x = a}` and untyped `{..}` in context.

use kestrel_ast::{CompositeLit, KeyValue};
use kestrel_core::{CheckError, TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{Mode, Operand};

pub(super) fn check_composite(checker: &mut Checker<'_>, lit: &CompositeLit, desired: Option<TypeId>) -> Operand {
    let ty = match (&lit.ty, desired) {
        (Some(ty), _) => checker.check_type(ty),
        (None, Some(desired)) => desired,
        (None, None) => {
            checker.report(CheckError::CompositeNeedsType { span: lit.span });
            check_unmatched(checker, &lit.elements);
            return Operand::invalid();
        }
    };
    if ty.is_invalid() {
        check_unmatched(checker, &lit.elements);
        return Operand::invalid();
    }

    let mut result = Operand::new(Mode::Addressable, ty);
    let ok = match checker.types().base_kind(ty).clone() {
        TypeKind::Struct(id) if !checker.types().struct_def(id).polymorphic => {
            let fields: Vec<(String, TypeId)> = checker
                .types()
                .struct_def(id)
                .fields
                .values()
                .map(|field| (field.name.clone(), field.ty))
                .collect();
            check_struct_elements(checker, lit, ty, &fields, &mut result)
        }
        TypeKind::Union(id) => {
            let cases: Vec<(String, TypeId)> = checker
                .types()
                .union_def(id)
                .cases
                .values()
                .map(|case| (case.name.clone(), case.ty))
                .collect();
            check_union_element(checker, lit, ty, &cases, &mut result)
        }
        TypeKind::Array { len, elem } => {
            let ok = check_sequence(checker, lit, ty, elem, len, &mut result);
            if len.is_none() {
                result.ty = checker.types_mut().array(Some(lit.elements.len() as u64), elem);
            }
            ok
        }
        TypeKind::Slice(elem) => check_sequence(checker, lit, ty, elem, None, &mut result),
        TypeKind::Vector { size, elem } => {
            check_sequence(checker, lit, ty, elem, Some(size as u64), &mut result)
        }
        _ => {
            checker.report(CheckError::InvalidCompositeType {
                ty: checker.display(ty),
                span: lit.span,
            });
            check_unmatched(checker, &lit.elements);
            false
        }
    };
    if ok { result } else { Operand::invalid() }
}

/// Check elements that cannot be matched to anything, for their own errors.
fn check_unmatched(checker: &mut Checker<'_>, elements: &[KeyValue]) {
    for element in elements {
        checker.check_expr(&element.value, None);
    }
}

fn too_many(checker: &mut Checker<'_>, lit: &CompositeLit, ty: TypeId, expected: usize) {
    checker.report(CheckError::CompositeCount {
        ty: checker.display(ty),
        expected,
        found: lit.elements.len(),
        span: lit.span,
    });
}

fn check_struct_elements(
    checker: &mut Checker<'_>,
    lit: &CompositeLit,
    ty: TypeId,
    fields: &[(String, TypeId)],
    result: &mut Operand,
) -> bool {
    let keyed = lit.elements.iter().any(|element| element.key.is_some());
    if !keyed && lit.elements.len() > fields.len() {
        too_many(checker, lit, ty, fields.len());
        check_unmatched(checker, &lit.elements);
        return false;
    }

    let mut ok = true;
    for (i, element) in lit.elements.iter().enumerate() {
        let field = match &element.key {
            Some(key) => fields.iter().find(|(name, _)| *name == key.name),
            None => fields.get(i),
        };
        let Some((_, field_ty)) = field else {
            if let Some(key) = &element.key {
                checker.report(CheckError::UnknownMember {
                    member: key.name.clone(),
                    receiver: checker.display(ty),
                    span: key.span,
                });
            }
            checker.check_expr(&element.value, None);
            ok = false;
            continue;
        };
        let operand = checker.check_converted(&element.value, *field_ty);
        ok &= !operand.is_invalid();
        result.absorb(&operand);
    }
    ok
}

fn check_union_element(
    checker: &mut Checker<'_>,
    lit: &CompositeLit,
    ty: TypeId,
    cases: &[(String, TypeId)],
    result: &mut Operand,
) -> bool {
    let [element] = lit.elements.as_slice() else {
        checker.report(CheckError::UnionLiteral { span: lit.span });
        check_unmatched(checker, &lit.elements);
        return false;
    };
    let Some(key) = &element.key else {
        checker.report(CheckError::UnionLiteral { span: lit.span });
        check_unmatched(checker, &lit.elements);
        return false;
    };
    let Some((_, case_ty)) = cases.iter().find(|(name, _)| *name == key.name) else {
        checker.report(CheckError::UnknownMember {
            member: key.name.clone(),
            receiver: checker.display(ty),
            span: key.span,
        });
        check_unmatched(checker, &lit.elements);
        return false;
    };
    let operand = checker.check_converted(&element.value, *case_ty);
    result.absorb(&operand);
    !operand.is_invalid()
}

/// Arrays, slices and vectors: positional elements of one type.
fn check_sequence(
    checker: &mut Checker<'_>,
    lit: &CompositeLit,
    ty: TypeId,
    elem: TypeId,
    capacity: Option<u64>,
    result: &mut Operand,
) -> bool {
    if let Some(capacity) = capacity
        && lit.elements.len() as u64 > capacity
    {
        too_many(checker, lit, ty, capacity as usize);
        check_unmatched(checker, &lit.elements);
        return false;
    }
    if lit.elements.iter().any(|element| element.key.is_some()) {
        checker.report(CheckError::InvalidCompositeType {
            ty: checker.display(ty),
            span: lit.span,
        });
        check_unmatched(checker, &lit.elements);
        return false;
    }

    let mut ok = true;
    for element in &lit.elements {
        let operand = checker.check_converted(&element.value, elem);
        ok &= !operand.is_invalid();
        result.absorb(&operand);
    }
    ok
}
