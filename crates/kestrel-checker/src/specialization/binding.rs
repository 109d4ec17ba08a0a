//! Binding placeholders to argument types.

use kestrel_core::{EntityId, TypeId, TypeKind, TypeTable};
use rustc_hash::FxHashMap;

/// Placeholder bindings collected for one call.
#[derive(Debug, Clone, Default)]
pub(crate) struct PolyBindings {
    map: FxHashMap<EntityId, TypeId>,
}

impl PolyBindings {
    pub fn get(&self, placeholder: EntityId) -> Option<TypeId> {
        self.map.get(&placeholder).copied()
    }

    #[cfg(test)]
    pub fn contains(&self, placeholder: EntityId) -> bool {
        self.map.contains_key(&placeholder)
    }

    /// Match `pattern` against `arg` structurally, binding placeholders.
    ///
    /// A placeholder already bound must match the same type again. Parts of
    /// the pattern without placeholders always match; the argument is
    /// converted to them afterwards.
    pub fn bind(&mut self, types: &TypeTable, pattern: TypeId, arg: TypeId) -> bool {
        if !types.is_polymorphic(pattern) {
            return true;
        }
        if let TypeKind::Polymorphic(placeholder) = types.kind(pattern) {
            return match self.map.get(placeholder) {
                Some(bound) => *bound == arg,
                None => {
                    self.map.insert(*placeholder, arg);
                    true
                }
            };
        }

        let arg = types.base(arg);
        match (types.kind(pattern).clone(), types.kind(arg).clone()) {
            (TypeKind::Pointer(p), TypeKind::Pointer(a))
            | (TypeKind::Slice(p), TypeKind::Slice(a)) => self.bind(types, p, a),
            (TypeKind::Array { len: pl, elem: p }, TypeKind::Array { len: al, elem: a }) => {
                (pl.is_none() || pl == al) && self.bind(types, p, a)
            }
            (TypeKind::Vector { size: ps, elem: p }, TypeKind::Vector { size: asz, elem: a }) => {
                ps == asz && self.bind(types, p, a)
            }
            (TypeKind::Tuple(ps), TypeKind::Tuple(args)) => {
                ps.len() == args.len()
                    && ps
                        .iter()
                        .zip(&args)
                        .all(|(p, a)| self.bind(types, *p, *a))
            }
            (TypeKind::Function(p), TypeKind::Function(a)) => {
                p.params.len() == a.params.len()
                    && p.params
                        .iter()
                        .zip(&a.params)
                        .all(|(pp, ap)| self.bind(types, *pp, *ap))
                    && self.bind(types, p.result, a.result)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::{FnFlags, FunctionSig};

    fn placeholder(types: &mut TypeTable, id: u32, name: &str) -> (EntityId, TypeId) {
        let entity = EntityId(id);
        (entity, types.polymorphic(entity, name))
    }

    #[test]
    fn binds_direct_placeholder() {
        let mut types = TypeTable::default();
        let (t, ty) = placeholder(&mut types, 20, "T");
        let mut bindings = PolyBindings::default();
        assert!(bindings.bind(&types, ty, TypeId::I64));
        assert_eq!(bindings.get(t), Some(TypeId::I64));
        // consistent rebinding
        assert!(bindings.bind(&types, ty, TypeId::I64));
        assert!(!bindings.bind(&types, ty, TypeId::F32));
    }

    #[test]
    fn binds_through_structure() {
        let mut types = TypeTable::default();
        let (t, ty) = placeholder(&mut types, 21, "T");
        let pattern = types.slice(ty);
        let pattern = types.pointer(pattern);
        let arg = types.slice(TypeId::U8);
        let arg = types.pointer(arg);

        let mut bindings = PolyBindings::default();
        assert!(bindings.bind(&types, pattern, arg));
        assert_eq!(bindings.get(t), Some(TypeId::U8));
    }

    #[test]
    fn shape_mismatch_fails() {
        let mut types = TypeTable::default();
        let (t, ty) = placeholder(&mut types, 22, "T");
        let pattern = types.slice(ty);
        let mut bindings = PolyBindings::default();
        assert!(!bindings.bind(&types, pattern, TypeId::I32));
        assert!(!bindings.contains(t));
    }

    #[test]
    fn binds_function_types() {
        let mut types = TypeTable::default();
        let (t, ty) = placeholder(&mut types, 23, "T");
        let result = types.tuple(vec![ty]);
        let pattern = types.function(FunctionSig {
            params: vec![ty],
            result,
            flags: FnFlags::POLYMORPHIC,
        });
        let concrete_result = types.tuple(vec![TypeId::F64]);
        let arg = types.function(FunctionSig {
            params: vec![TypeId::F64],
            result: concrete_result,
            flags: FnFlags::empty(),
        });
        let mut bindings = PolyBindings::default();
        assert!(bindings.bind(&types, pattern, arg));
        assert_eq!(bindings.get(t), Some(TypeId::F64));
    }
}
