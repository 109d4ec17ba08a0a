//! Implicit conversions, untyped defaulting and cast legality.
//!
//! Conversion rules, in the order they are tried:
//! - invalid operands convert silently, so one error is reported once
//! - identical types convert trivially
//! - `nil` converts to pointer and function types
//! - untyped constants adopt a numeric target after a range check
//! - any value converts to `any`
//! - a named type and its unnamed underlying type convert both ways
//! - pointers convert to and from `rawptr`
//!
//! A successful conversion re-records the node's type and value so later
//! stages see the converted form.

use kestrel_ast::Expr;
use kestrel_core::{CheckError, ConstValue, FnFlags, TypeId, TypeKind, TypeTable};

use crate::checker::Checker;
use crate::operand::{Mode, Operand};
use crate::table::Conversion;

/// Outcome of a conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Convert {
    Converted,
    /// An untyped constant does not fit the target.
    Overflow,
    Incompatible,
}

/// The type an untyped constant takes when nothing constrains it.
pub fn default_type(ty: TypeId) -> TypeId {
    match ty {
        TypeId::UNTYPED_INT => TypeId::I64,
        TypeId::UNTYPED_FLOAT => TypeId::F64,
        other => other,
    }
}

/// Whether an untyped type may adopt `target`.
pub fn constrains_untyped(types: &TypeTable, from: TypeId, target: TypeId) -> bool {
    match from {
        TypeId::UNTYPED_INT => types.is_number(target),
        TypeId::UNTYPED_FLOAT => types.is_float(target),
        _ => false,
    }
}

/// Whether two types share an underlying type and at most one is named.
///
/// Two distinct named types never convert implicitly.
pub fn identical_underlying(types: &TypeTable, from: TypeId, to: TypeId) -> bool {
    let both_named = matches!(types.kind(from), TypeKind::Named(_))
        && matches!(types.kind(to), TypeKind::Named(_));
    if both_named {
        return false;
    }
    let (a, b) = (types.base(from), types.base(to));
    if a == b {
        return true;
    }
    // function types that differ only in being discardable
    match (types.kind(a), types.kind(b)) {
        (TypeKind::Function(x), TypeKind::Function(y)) => {
            let strip = FnFlags::DISCARDABLE;
            x.params == y.params && x.result == y.result && x.flags - strip == y.flags - strip
        }
        _ => false,
    }
}

/// Whether an explicit `cast(T)` from `from` to `to` is allowed.
pub fn can_cast(types: &TypeTable, from: TypeId, to: TypeId) -> bool {
    let (f, t) = (types.base(from), types.base(to));
    if f == t || types.is_any(to) || identical_underlying(types, from, to) {
        return true;
    }
    let integral = |ty: TypeId| types.is_integer(ty) || types.is_enum(ty) || types.is_bool(ty);
    let pointerish = |ty: TypeId| types.is_pointer(ty) || types.is_function(ty);

    (types.is_number(f) && types.is_number(t))
        || (integral(f) && integral(t))
        || (pointerish(f) && pointerish(t))
        || (pointerish(f) && types.is_integer(t))
        || (types.is_integer(f) && pointerish(t))
        || (types.is_enum(f) && types.is_number(t))
}

impl Checker<'_> {
    /// Convert `operand` to `target`, reporting a failure.
    ///
    /// On failure the operand becomes invalid.
    pub fn convert(&mut self, operand: &mut Operand, target: TypeId, expr: &Expr) -> bool {
        match self.try_convert(operand, target, expr) {
            Convert::Converted => true,
            Convert::Overflow => {
                let value = operand
                    .constant
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                self.report(CheckError::ConstantOverflow {
                    value,
                    ty: self.display(target),
                    span: expr.span(),
                });
                *operand = Operand::invalid();
                false
            }
            Convert::Incompatible => {
                self.report(CheckError::CannotConvert {
                    value: self.describe(expr, operand),
                    target: self.display(target),
                    span: expr.span(),
                });
                *operand = Operand::invalid();
                false
            }
        }
    }

    /// Attempt a conversion without reporting.
    pub(crate) fn try_convert(&mut self, operand: &mut Operand, target: TypeId, expr: &Expr) -> Convert {
        let from = operand.ty;
        if target.is_invalid() || (operand.is_invalid() && !operand.is_nil()) {
            return Convert::Converted;
        }
        if operand.is_nil() {
            if self.types().is_nilable(target) {
                operand.mode = Mode::Computed;
                self.retype(operand, target, expr);
                return Convert::Converted;
            }
            return Convert::Incompatible;
        }
        if from == target {
            return Convert::Converted;
        }
        if operand.is_type() || matches!(operand.mode, Mode::File) {
            return Convert::Incompatible;
        }
        if self.types().is_untyped(from) {
            return self.convert_untyped(operand, target, expr);
        }
        if self.types().is_void(from) {
            return Convert::Incompatible;
        }
        if self.types().is_any(target) {
            self.record_conversion(expr, from, target);
            operand.ty = target;
            operand.constant = None;
            return Convert::Converted;
        }

        let types = self.types();
        let rawptr = |ty: TypeId| types.base(ty) == TypeId::RAWPTR;
        let allowed = identical_underlying(types, from, target)
            || (types.is_pointer(from) && rawptr(target))
            || (rawptr(from) && types.is_pointer(target));
        if allowed {
            self.record_conversion(expr, from, target);
            operand.ty = target;
            self.table_mut().record_type(expr.id(), target);
            return Convert::Converted;
        }
        Convert::Incompatible
    }

    fn convert_untyped(&mut self, operand: &mut Operand, target: TypeId, expr: &Expr) -> Convert {
        let kind = self.types().base_kind(target).clone();
        match (operand.ty, kind) {
            (TypeId::UNTYPED_INT, TypeKind::Integer { bits, signed }) => {
                if let Some(value) = &operand.constant
                    && !value.fits_integer(bits, signed)
                {
                    return Convert::Overflow;
                }
                self.retype(operand, target, expr);
                Convert::Converted
            }
            (TypeId::UNTYPED_INT, TypeKind::Float { .. } | TypeKind::UntypedFloat) => {
                operand.constant = operand.constant.as_ref().map(ConstValue::to_float);
                self.retype(operand, target, expr);
                Convert::Converted
            }
            (TypeId::UNTYPED_FLOAT, TypeKind::Float { .. }) => {
                self.retype(operand, target, expr);
                Convert::Converted
            }
            (TypeId::UNTYPED_FLOAT, TypeKind::Integer { bits, signed }) => {
                // only floats with an exact integer value
                let Some(value) = operand.constant.as_ref().and_then(ConstValue::as_float) else {
                    return Convert::Incompatible;
                };
                if value.fract() != 0.0 {
                    return Convert::Incompatible;
                }
                let int = ConstValue::Int(value as i128);
                if !int.fits_integer(bits, signed) {
                    return Convert::Overflow;
                }
                operand.constant = Some(int);
                self.retype(operand, target, expr);
                Convert::Converted
            }
            (_, TypeKind::Any) => {
                let concrete = default_type(operand.ty);
                self.retype(operand, concrete, expr);
                self.record_conversion(expr, concrete, target);
                operand.ty = target;
                operand.constant = None;
                Convert::Converted
            }
            _ => Convert::Incompatible,
        }
    }

    /// Give an untyped operand its default type.
    pub fn default_operand(&mut self, operand: &mut Operand, expr: &Expr) {
        if operand.is_invalid() || !self.types().is_untyped(operand.ty) {
            return;
        }
        let target = default_type(operand.ty);
        self.convert(operand, target, expr);
    }

    /// Re-record a node (and any parentheses around it) under a new type.
    fn retype(&mut self, operand: &mut Operand, target: TypeId, expr: &Expr) {
        operand.ty = target;
        let value = operand.constant.clone();
        let mut node = expr;
        loop {
            let table = self.table_mut();
            table.record_type(node.id(), target);
            table.record_constant(node.id(), value.clone());
            match node {
                Expr::Paren(paren) => node = &paren.inner,
                _ => break,
            }
        }
    }

    fn record_conversion(&mut self, expr: &Expr, from: TypeId, to: TypeId) {
        self.table_mut()
            .conversions
            .insert(expr.id(), Conversion { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::{EntityId, FunctionSig};

    #[test]
    fn defaults() {
        assert_eq!(default_type(TypeId::UNTYPED_INT), TypeId::I64);
        assert_eq!(default_type(TypeId::UNTYPED_FLOAT), TypeId::F64);
        assert_eq!(default_type(TypeId::U8), TypeId::U8);
    }

    #[test]
    fn untyped_constraints() {
        let types = TypeTable::default();
        assert!(constrains_untyped(&types, TypeId::UNTYPED_INT, TypeId::F32));
        assert!(constrains_untyped(&types, TypeId::UNTYPED_INT, TypeId::U16));
        assert!(constrains_untyped(&types, TypeId::UNTYPED_FLOAT, TypeId::F64));
        assert!(!constrains_untyped(&types, TypeId::UNTYPED_FLOAT, TypeId::I32));
        assert!(!constrains_untyped(&types, TypeId::I64, TypeId::I32));
    }

    #[test]
    fn named_types_convert_to_their_base_only() {
        let mut types = TypeTable::default();
        let meters = types.named(EntityId(10), "Meters");
        types.set_named_base(EntityId(10), TypeId::F64);
        let feet = types.named(EntityId(11), "Feet");
        types.set_named_base(EntityId(11), TypeId::F64);

        assert!(identical_underlying(&types, meters, TypeId::F64));
        assert!(identical_underlying(&types, TypeId::F64, meters));
        assert!(!identical_underlying(&types, meters, feet));
        assert!(can_cast(&types, meters, feet));
    }

    #[test]
    fn discardable_functions_match() {
        let mut types = TypeTable::default();
        let result = types.tuple(vec![TypeId::I32]);
        let plain = types.function(FunctionSig {
            params: vec![TypeId::I32],
            result,
            flags: FnFlags::empty(),
        });
        let discardable = types.function(FunctionSig {
            params: vec![TypeId::I32],
            result,
            flags: FnFlags::DISCARDABLE,
        });
        assert!(identical_underlying(&types, plain, discardable));
    }

    #[test]
    fn casts() {
        let mut types = TypeTable::default();
        let ptr = types.pointer(TypeId::I32);
        assert!(can_cast(&types, TypeId::F64, TypeId::I8));
        assert!(can_cast(&types, ptr, TypeId::RAWPTR));
        assert!(can_cast(&types, ptr, TypeId::U64));
        assert!(can_cast(&types, TypeId::BOOL, TypeId::I32));
        assert!(!can_cast(&types, TypeId::STRING, TypeId::I32));
        assert!(!can_cast(&types, TypeId::F32, ptr));
    }
}
