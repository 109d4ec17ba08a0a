//! The result of checking an expression.

use kestrel_core::{ConstValue, EntityId, TypeId};
use rustc_hash::FxHashSet;

/// How an expression's value may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Checking failed; uses of the operand report nothing further.
    #[default]
    Invalid,
    /// An rvalue.
    Computed,
    /// Has an address, but cannot be assigned (e.g. a constant).
    Addressable,
    /// A variable, dereference or field of one.
    Assignable,
    /// The expression denotes a type; `ty` is a metatype.
    Type,
    /// An import reference.
    File,
    /// `nil` before it is given a type by context.
    Nil,
}

/// Checked expression: mode, type, folded value and referenced entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub mode: Mode,
    pub ty: TypeId,
    pub constant: Option<ConstValue>,
    pub dependencies: FxHashSet<EntityId>,
}

impl Default for Operand {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Operand {
    pub fn invalid() -> Self {
        Self {
            mode: Mode::Invalid,
            ty: TypeId::INVALID,
            constant: None,
            dependencies: FxHashSet::default(),
        }
    }

    pub fn new(mode: Mode, ty: TypeId) -> Self {
        Self {
            mode,
            ty,
            constant: None,
            dependencies: FxHashSet::default(),
        }
    }

    pub fn computed(ty: TypeId) -> Self {
        Self::new(Mode::Computed, ty)
    }

    pub fn constant(ty: TypeId, value: ConstValue) -> Self {
        Self {
            mode: Mode::Computed,
            ty,
            constant: Some(value),
            dependencies: FxHashSet::default(),
        }
    }

    /// An operand denoting a type; `metatype` must be a metatype.
    pub fn type_(metatype: TypeId) -> Self {
        Self::new(Mode::Type, metatype)
    }

    pub fn nil() -> Self {
        Self::constant_mode(Mode::Nil, TypeId::INVALID, ConstValue::Nil)
    }

    fn constant_mode(mode: Mode, ty: TypeId, value: ConstValue) -> Self {
        Self {
            mode,
            ty,
            constant: Some(value),
            dependencies: FxHashSet::default(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: FxHashSet<EntityId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn depends_on(mut self, entity: EntityId) -> Self {
        self.dependencies.insert(entity);
        self
    }

    /// Merge another operand's dependencies into this one.
    pub fn absorb(&mut self, other: &Operand) {
        self.dependencies.extend(other.dependencies.iter().copied());
    }

    pub fn is_invalid(&self) -> bool {
        self.mode == Mode::Invalid || (self.ty.is_invalid() && self.mode != Mode::Nil)
    }

    pub fn is_type(&self) -> bool {
        self.mode == Mode::Type
    }

    pub fn is_nil(&self) -> bool {
        self.mode == Mode::Nil
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    /// Whether the operand can be assigned to.
    pub fn is_assignable(&self) -> bool {
        self.mode == Mode::Assignable
    }

    /// Whether `&` may be applied.
    pub fn is_addressable(&self) -> bool {
        matches!(self.mode, Mode::Assignable | Mode::Addressable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_by_default() {
        assert!(Operand::default().is_invalid());
        assert!(Operand::invalid().is_invalid());
        assert!(!Operand::computed(TypeId::I64).is_invalid());
    }

    #[test]
    fn nil_is_not_invalid() {
        let nil = Operand::nil();
        assert!(nil.is_nil());
        assert!(!nil.is_invalid());
        assert_eq!(nil.constant, Some(ConstValue::Nil));
    }

    #[test]
    fn dependencies_merge() {
        let mut a = Operand::computed(TypeId::I64).depends_on(EntityId(4));
        let b = Operand::computed(TypeId::I64).depends_on(EntityId(5));
        a.absorb(&b);
        assert!(a.dependencies.contains(&EntityId(4)));
        assert!(a.dependencies.contains(&EntityId(5)));
    }

    #[test]
    fn modes() {
        let var = Operand::new(Mode::Assignable, TypeId::I32);
        assert!(var.is_assignable() && var.is_addressable());
        let constant = Operand::constant(TypeId::UNTYPED_INT, ConstValue::Int(1));
        assert!(constant.is_constant() && !constant.is_assignable());
    }
}
