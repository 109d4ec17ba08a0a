//! Type expressions.
//!
//! Every check here produces a [`Mode::Type`](crate::operand::Mode) operand
//! whose type is the metatype of the denoted type.

use indexmap::IndexMap;
use kestrel_ast::{
    ArrayType, EnumType, Expr, PointerType, PolyType, SliceType, StructType, UnionType,
    VariadicType, VectorType,
};
use kestrel_core::{
    CheckError, EnumCase, EnumDef, StructDef, StructField, TypeId, TypeKind, UnionCase, UnionDef,
    integer_range,
};

use crate::checker::Checker;
use crate::entity::EntityFlags;
use crate::operand::Operand;
use crate::scope::ScopeKind;

/// Wrap a checked type as a type operand.
fn type_operand(checker: &mut Checker<'_>, ty: TypeId) -> Operand {
    if ty.is_invalid() {
        return Operand::invalid();
    }
    let meta = checker.types_mut().metatype(ty);
    Operand::type_(meta)
}

/// Round a bit count up to whole bytes.
fn round_to_bytes(bits: u32) -> u32 {
    bits.div_ceil(8) * 8
}

// ============================================================================
// Placeholders
// ============================================================================

pub(crate) fn check_poly_type(checker: &mut Checker<'_>, poly: &PolyType) -> Operand {
    let Some(ident) = poly.explicit.as_ident() else {
        checker.report(CheckError::UnsupportedPolymorphicType {
            expr: format!("'{}'", poly.explicit),
            span: poly.span,
        });
        return Operand::invalid();
    };

    let scope = checker.scope();
    if let Some(member) = checker.program.scopes.lookup_local(scope, &ident.name)
        && checker.entity(member.entity).is(EntityFlags::IMPLICIT_TYPE)
    {
        // a repeated `$T`, or a specialization's binding of it
        checker.record_entity(ident, member.entity);
        let ty = checker.entity(member.entity).ty.unwrap_or(TypeId::INVALID);
        return Operand::type_(ty);
    }

    let kind = checker.program.scopes.get(scope).kind;
    if !matches!(kind, ScopeKind::Function | ScopeKind::Specialization) {
        checker.report(CheckError::UnsupportedPolymorphicType {
            expr: format!("'${}'", ident.name),
            span: poly.span,
        });
        return Operand::invalid();
    }

    let entity = checker.new_entity(
        ident,
        EntityFlags::TYPE | EntityFlags::CONSTANT | EntityFlags::IMPLICIT_TYPE,
    );
    let placeholder = checker.types_mut().polymorphic(entity, &ident.name);
    let meta = checker.types_mut().metatype(placeholder);
    checker.resolve_entity(entity, meta, None);
    checker.declare(entity);
    Operand::type_(meta)
}

pub(super) fn check_variadic(checker: &mut Checker<'_>, variadic: &VariadicType) -> Operand {
    let elem = checker.check_type(&variadic.explicit);
    if elem.is_invalid() {
        return Operand::invalid();
    }
    let slice = checker.types_mut().slice(elem);
    type_operand(checker, slice)
}

// ============================================================================
// Structural types
// ============================================================================

pub(super) fn check_pointer_type(checker: &mut Checker<'_>, pointer: &PointerType) -> Operand {
    let pointee = checker.check_type(&pointer.pointee);
    if pointee.is_invalid() {
        return Operand::invalid();
    }
    let ty = checker.types_mut().pointer(pointee);
    type_operand(checker, ty)
}

pub(super) fn check_slice_type(checker: &mut Checker<'_>, slice: &SliceType) -> Operand {
    let elem = checker.check_type(&slice.element);
    if elem.is_invalid() {
        return Operand::invalid();
    }
    let ty = checker.types_mut().slice(elem);
    type_operand(checker, ty)
}

pub(super) fn check_array_type(checker: &mut Checker<'_>, array: &ArrayType) -> Operand {
    let len = match &array.length {
        Some(length) => match constant_length(checker, length, "array length") {
            Some(len) => Some(len),
            None => return Operand::invalid(),
        },
        None => None,
    };
    let elem = checker.check_type(&array.element);
    if elem.is_invalid() {
        return Operand::invalid();
    }
    let ty = checker.types_mut().array(len, elem);
    type_operand(checker, ty)
}

pub(super) fn check_vector_type(checker: &mut Checker<'_>, vector: &VectorType) -> Operand {
    let Some(size) = constant_length(checker, &vector.size, "vector size") else {
        return Operand::invalid();
    };
    let elem = checker.check_type(&vector.element);
    if elem.is_invalid() {
        return Operand::invalid();
    }
    let types = checker.types();
    if !types.is_number(elem) || types.is_untyped(elem) {
        checker.report(CheckError::InvalidVectorElement {
            ty: checker.display(elem),
            span: vector.element.span(),
        });
        return Operand::invalid();
    }
    let Ok(size) = u32::try_from(size) else {
        checker.report(CheckError::InvalidLength {
            value: size as i128,
            span: vector.size.span(),
        });
        return Operand::invalid();
    };
    let ty = checker.types_mut().vector(size, elem);
    type_operand(checker, ty)
}

/// A non-negative constant integer used as a length.
fn constant_length(checker: &mut Checker<'_>, expr: &Expr, what: &str) -> Option<u64> {
    let operand = checker.check_value(expr, None);
    if operand.is_invalid() {
        return None;
    }
    let value = match &operand.constant {
        Some(value) if checker.types().is_integer(operand.ty) => value.as_int(),
        _ => None,
    };
    let Some(value) = value else {
        checker.report(CheckError::NotConstant {
            what: what.to_string(),
            span: expr.span(),
        });
        return None;
    };
    match u64::try_from(value) {
        Ok(len) => Some(len),
        Err(_) => {
            checker.report(CheckError::InvalidLength {
                value,
                span: expr.span(),
            });
            None
        }
    }
}

// ============================================================================
// Nominal types
// ============================================================================

pub(crate) fn check_struct(checker: &mut Checker<'_>, st: &StructType) -> Operand {
    if !st.poly_params.is_empty() {
        return checker.check_poly_struct(st);
    }
    let mut def = struct_fields(checker, st);
    def.packed = st.packed;
    let ty = checker.types_mut().add_struct(def);
    type_operand(checker, ty)
}

/// Lay out the fields of a struct body in the current scope.
///
/// Fields follow each other, each padded to whole bytes unless the struct
/// is packed.
pub(crate) fn struct_fields(checker: &mut Checker<'_>, st: &StructType) -> StructDef {
    let mut fields: IndexMap<String, StructField> = IndexMap::new();
    let mut width = 0u32;
    let mut polymorphic = false;

    for decl in &st.fields {
        let ty = checker.check_type(&decl.ty);
        polymorphic |= checker.types().is_polymorphic(ty);
        for name in &decl.names {
            if let Some(previous) = fields.get(&name.name) {
                checker.report(CheckError::Redeclaration {
                    name: name.name.clone(),
                    span: name.span,
                    previous: previous.span,
                });
                continue;
            }
            if is_unfinished_named(checker, ty) {
                checker.report(CheckError::RecursiveType {
                    ty: checker.display(ty),
                    span: name.span,
                });
                continue;
            }
            let field_width = checker.types().width(ty).unwrap_or(0);
            fields.insert(
                name.name.clone(),
                StructField {
                    name: name.name.clone(),
                    ty,
                    index: fields.len() as u32,
                    offset: width,
                    span: name.span,
                },
            );
            width = if st.packed {
                width + field_width
            } else {
                round_to_bytes(width + field_width)
            };
        }
    }

    StructDef {
        fields,
        width,
        packed: st.packed,
        polymorphic,
    }
}

/// A named type whose own declaration is still being checked.
fn is_unfinished_named(checker: &Checker<'_>, ty: TypeId) -> bool {
    match checker.types().kind(ty) {
        TypeKind::Named(entity) => checker.types().named_base(*entity).is_none(),
        _ => false,
    }
}

pub(super) fn check_union(checker: &mut Checker<'_>, union: &UnionType) -> Operand {
    let mut cases: IndexMap<String, UnionCase> = IndexMap::new();
    let mut largest = 0u32;

    for decl in &union.cases {
        let ty = checker.check_type(&decl.ty);
        for name in &decl.names {
            if let Some(previous) = cases.get(&name.name) {
                checker.report(CheckError::Redeclaration {
                    name: name.name.clone(),
                    span: name.span,
                    previous: previous.span,
                });
                continue;
            }
            if is_unfinished_named(checker, ty) {
                checker.report(CheckError::RecursiveType {
                    ty: checker.display(ty),
                    span: name.span,
                });
                continue;
            }
            let width = round_to_bytes(checker.types().width(ty).unwrap_or(0));
            largest = largest.max(width);
            cases.insert(
                name.name.clone(),
                UnionCase {
                    name: name.name.clone(),
                    ty,
                    tag: cases.len() as u32,
                    span: name.span,
                },
            );
        }
    }

    let tag_type = match &union.tag {
        Some(tag) => {
            let ty = checker.check_type(tag);
            if !ty.is_invalid() && !checker.types().is_integer(ty) {
                checker.report(CheckError::InvalidEnumBacking {
                    ty: checker.display(ty),
                    span: tag.span(),
                });
            }
            ty
        }
        None => smallest_tag(cases.len()),
    };

    let tag_width = checker.types().width(tag_type).unwrap_or(0);
    let width = if union.inline_tag {
        largest.max(tag_width)
    } else {
        largest + tag_width
    };
    let ty = checker.types_mut().add_union(UnionDef {
        cases,
        width,
        tag_type,
        inline_tag: union.inline_tag,
    });
    type_operand(checker, ty)
}

/// The smallest unsigned type that can tag `count` cases.
fn smallest_tag(count: usize) -> TypeId {
    match count {
        0..=0xff => TypeId::U8,
        0x100..=0xffff => TypeId::U16,
        _ => TypeId::U32,
    }
}

pub(super) fn check_enum(checker: &mut Checker<'_>, en: &EnumType) -> Operand {
    let backing = match &en.backing {
        Some(expr) => {
            let ty = checker.check_type(expr);
            if ty.is_invalid() {
                return Operand::invalid();
            }
            if !checker.types().is_integer(ty) || checker.types().is_untyped(ty) {
                checker.report(CheckError::InvalidEnumBacking {
                    ty: checker.display(ty),
                    span: expr.span(),
                });
                return Operand::invalid();
            }
            Some(ty)
        }
        None => None,
    };

    let range = backing.map(|ty| match checker.types().base_kind(ty) {
        TypeKind::Integer { bits, signed } if en.flags => (0, integer_range(*bits, *signed).1),
        TypeKind::Integer { bits, signed } => integer_range(*bits, *signed),
        _ => (i128::MIN, i128::MAX),
    });

    let mut cases: IndexMap<String, EnumCase> = IndexMap::new();
    let mut current: i128 = if en.flags { 1 } else { 0 };
    let mut largest: i128 = 0;

    for (i, case) in en.cases.iter().enumerate() {
        if let Some(value_expr) = &case.value {
            let mut operand = checker.check_value(value_expr, backing);
            if operand.is_invalid() {
                continue;
            }
            if let Some(backing) = backing
                && !checker.convert(&mut operand, backing, value_expr)
            {
                continue;
            }
            let Some(value) = operand.constant.as_ref().and_then(|c| c.as_int()) else {
                checker.report(CheckError::NotConstant {
                    what: "enum case value".to_string(),
                    span: value_expr.span(),
                });
                continue;
            };
            current = value;
        } else if i > 0 {
            if en.flags {
                if current <= 0 || current & (current - 1) != 0 {
                    checker.report(CheckError::FlagsNotPowerOfTwo {
                        name: case.name.name.clone(),
                        span: case.span,
                    });
                    continue;
                }
                current <<= 1;
            } else {
                current += 1;
            }
        }

        if let (Some((min, max)), Some(ty)) = (range, backing)
            && (current < min || current > max)
        {
            checker.report(CheckError::EnumValueOutOfRange {
                value: current,
                ty: checker.display(ty),
                span: case.span,
            });
            continue;
        }
        if let Some(previous) = cases.get(&case.name.name) {
            checker.report(CheckError::Redeclaration {
                name: case.name.name.clone(),
                span: case.name.span,
                previous: previous.span,
            });
            continue;
        }

        largest = largest.max(current);
        cases.insert(
            case.name.name.clone(),
            EnumCase {
                name: case.name.name.clone(),
                value: current,
                span: case.span,
            },
        );
    }

    let width = match backing {
        Some(ty) => checker.types().width(ty).unwrap_or(0),
        None => bits_for(largest),
    };
    let ty = checker.types_mut().add_enum(EnumDef {
        cases,
        backing,
        flags: en.flags,
        width,
    });
    type_operand(checker, ty)
}

/// Bits needed to hold a non-negative value; at least one.
fn bits_for(value: i128) -> u32 {
    if value <= 0 {
        1
    } else {
        128 - value.leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_width_without_backing() {
        assert_eq!(bits_for(0), 1);
        assert_eq!(bits_for(1), 1);
        assert_eq!(bits_for(2), 2);
        assert_eq!(bits_for(255), 8);
        assert_eq!(bits_for(256), 9);
    }

    #[test]
    fn union_tags() {
        assert_eq!(smallest_tag(3), TypeId::U8);
        assert_eq!(smallest_tag(300), TypeId::U16);
        assert_eq!(smallest_tag(70_000), TypeId::U32);
    }

    #[test]
    fn byte_rounding() {
        assert_eq!(round_to_bytes(1), 8);
        assert_eq!(round_to_bytes(8), 8);
        assert_eq!(round_to_bytes(40), 40);
        assert_eq!(round_to_bytes(41), 48);
    }
}
