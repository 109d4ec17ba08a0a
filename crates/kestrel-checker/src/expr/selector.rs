//! Member selection: `receiver.member`.
//!
//! The receiver decides what a member is:
//! - an import: a declaration owned by the imported file
//! - an enum or union type: a case constant
//! - a value: a field, case, length, lane or `any` component, looked up
//!   through at most one pointer

use kestrel_ast::SelectorExpr;
use kestrel_core::{CheckError, ConstValue, TypeId, TypeKind};

use crate::checker::Checker;
use crate::operand::{Mode, Operand};
use crate::table::SelectorKind;

use super::ident::operand_for_entity;

pub(super) fn check_selector(checker: &mut Checker<'_>, selector: &SelectorExpr) -> Operand {
    let receiver = checker.check_expr(&selector.receiver, None);
    if receiver.is_invalid() {
        return Operand::invalid();
    }

    let result = match receiver.mode {
        Mode::File => select_from_file(checker, selector, &receiver),
        Mode::Type => select_from_type(checker, selector, &receiver),
        Mode::Nil => None,
        _ => select_from_value(checker, selector, &receiver),
    };
    let Some((mut operand, kind)) = result else {
        return Operand::invalid();
    };
    checker.table_mut().selectors.insert(selector.id, kind);
    operand.absorb(&receiver);
    operand
}

fn unknown_member(checker: &mut Checker<'_>, selector: &SelectorExpr, receiver: &Operand) {
    let receiver = match receiver.mode {
        Mode::Type | Mode::File => format!("{}", selector.receiver),
        _ => checker.display(receiver.ty),
    };
    checker.report(CheckError::UnknownMember {
        member: selector.member.name.clone(),
        receiver,
        span: selector.member.span,
    });
}

fn no_member_scope(checker: &mut Checker<'_>, selector: &SelectorExpr, receiver: &Operand) {
    checker.report(CheckError::NoMemberScope {
        receiver: checker.describe(&selector.receiver, receiver),
        span: selector.span,
    });
}

fn select_from_file(
    checker: &mut Checker<'_>,
    selector: &SelectorExpr,
    receiver: &Operand,
) -> Option<(Operand, SelectorKind)> {
    let TypeKind::File(scope) = *checker.types().kind(receiver.ty) else {
        no_member_scope(checker, selector, receiver);
        return None;
    };
    let member = checker
        .program
        .scopes
        .lookup_local(scope, &selector.member.name)
        .filter(|member| member.owned);
    let Some(member) = member else {
        unknown_member(checker, selector, receiver);
        return None;
    };
    checker.record_entity(&selector.member, member.entity);
    let operand = operand_for_entity(checker, member.entity, &selector.member);
    if operand.is_invalid() {
        return None;
    }
    Some((operand, SelectorKind::File(member.entity)))
}

fn select_from_type(
    checker: &mut Checker<'_>,
    selector: &SelectorExpr,
    receiver: &Operand,
) -> Option<(Operand, SelectorKind)> {
    let instance = checker.types().lower_metatype(receiver.ty)?;
    let name = selector.member.name.as_str();
    match checker.types().base_kind(instance).clone() {
        TypeKind::Enum(id) => {
            let Some(value) = checker.types().enum_def(id).case(name).map(|c| c.value) else {
                unknown_member(checker, selector, receiver);
                return None;
            };
            Some((
                Operand::constant(instance, ConstValue::Int(value)),
                SelectorKind::EnumCase(value),
            ))
        }
        TypeKind::Union(id) => {
            let def = checker.types().union_def(id);
            let tag_type = def.tag_type;
            let Some(tag) = def.cases.get(name).map(|c| c.tag) else {
                unknown_member(checker, selector, receiver);
                return None;
            };
            Some((
                Operand::constant(tag_type, ConstValue::Int(tag as i128)),
                SelectorKind::UnionCase(tag),
            ))
        }
        _ => {
            no_member_scope(checker, selector, receiver);
            None
        }
    }
}

fn select_from_value(
    checker: &mut Checker<'_>,
    selector: &SelectorExpr,
    receiver: &Operand,
) -> Option<(Operand, SelectorKind)> {
    let (ty, through_pointer) = match checker.types().pointee(receiver.ty) {
        Some(pointee) => (pointee, true),
        None => (receiver.ty, false),
    };
    let mode = if through_pointer || receiver.mode == Mode::Assignable {
        Mode::Assignable
    } else {
        Mode::Computed
    };
    let name = selector.member.name.as_str();

    let selected = match checker.types().base_kind(ty).clone() {
        TypeKind::Struct(id) => checker
            .types()
            .struct_def(id)
            .fields
            .get(name)
            .map(|field| {
                (
                    Operand::new(mode, field.ty),
                    SelectorKind::StructField {
                        index: field.index,
                        offset: field.offset,
                    },
                )
            }),
        TypeKind::Union(id) => {
            let def = checker.types().union_def(id);
            if name == "Tag" {
                Some((Operand::new(mode, def.tag_type), SelectorKind::UnionTag))
            } else {
                def.cases
                    .get(name)
                    .map(|case| (Operand::new(mode, case.ty), SelectorKind::UnionCase(case.tag)))
            }
        }
        TypeKind::Array { len, elem } => match name {
            "len" => {
                let mut operand = Operand::computed(TypeId::U64);
                operand.constant = len.map(|len| ConstValue::Int(len as i128));
                Some((operand, SelectorKind::Length))
            }
            "raw" => {
                let ptr = checker.types_mut().pointer(elem);
                Some((Operand::computed(ptr), SelectorKind::Raw))
            }
            _ => None,
        },
        TypeKind::Slice(elem) => match name {
            "len" => Some((Operand::new(mode, TypeId::U64), SelectorKind::Length)),
            "cap" => Some((Operand::new(mode, TypeId::U64), SelectorKind::Capacity)),
            "raw" => {
                let ptr = checker.types_mut().pointer(elem);
                Some((Operand::new(mode, ptr), SelectorKind::Raw))
            }
            _ => None,
        },
        TypeKind::String => match name {
            "len" => {
                let mut operand = Operand::computed(TypeId::U64);
                if let Some(ConstValue::String(text)) = &receiver.constant {
                    operand.constant = Some(ConstValue::Int(text.len() as i128));
                }
                Some((operand, SelectorKind::Length))
            }
            "raw" => Some((Operand::computed(TypeId::RAWPTR), SelectorKind::Raw)),
            _ => None,
        },
        TypeKind::Vector { size, elem } => return select_lanes(checker, selector, receiver, mode, size, elem),
        TypeKind::Any => match name {
            "type" => Some((Operand::computed(TypeId::RAWPTR), SelectorKind::AnyType)),
            "data" => Some((Operand::computed(TypeId::RAWPTR), SelectorKind::AnyData)),
            _ => None,
        },
        _ => {
            no_member_scope(checker, selector, receiver);
            return None;
        }
    };

    if selected.is_none() {
        unknown_member(checker, selector, receiver);
    }
    selected
}

/// `v.x`, `v.rgb` and other lane selections of a vector.
fn select_lanes(
    checker: &mut Checker<'_>,
    selector: &SelectorExpr,
    receiver: &Operand,
    mode: Mode,
    size: u32,
    elem: TypeId,
) -> Option<(Operand, SelectorKind)> {
    let Some(lanes) = lane_indices(&selector.member.name, size) else {
        unknown_member(checker, selector, receiver);
        return None;
    };
    if let [lane] = lanes.as_slice() {
        return Some((Operand::new(mode, elem), SelectorKind::VectorLane(*lane)));
    }
    let ty = checker.types_mut().vector(lanes.len() as u32, elem);
    Some((Operand::new(mode, ty), SelectorKind::Swizzle))
}

/// Lane numbers named by `xyzw` or `rgba` letters, if all exist.
fn lane_indices(name: &str, size: u32) -> Option<Vec<u32>> {
    name.chars()
        .map(|c| {
            let lane = match c {
                'x' | 'r' => 0,
                'y' | 'g' => 1,
                'z' | 'b' => 2,
                'w' | 'a' => 3,
                _ => return None,
            };
            (lane < size).then_some(lane)
        })
        .collect()
}
