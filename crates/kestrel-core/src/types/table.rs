//! Interning table for types.

use rustc_hash::FxHashMap;

use super::{
    EnumDef, EnumId, FnFlags, FunctionSig, StructDef, StructId, TypeDisplay, TypeId, TypeKind,
    UnionDef, UnionId,
};
use crate::{EntityId, ScopeId};

/// Alias chains longer than this are treated as cyclic.
const MAX_ALIAS_DEPTH: usize = 64;

/// Owns every type of a program.
#[derive(Debug, Clone)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    interned: FxHashMap<TypeKind, TypeId>,
    structs: Vec<StructDef>,
    unions: Vec<UnionDef>,
    enums: Vec<EnumDef>,
    named_bases: FxHashMap<EntityId, TypeId>,
    names: FxHashMap<EntityId, String>,
    pointer_width: u32,
}

impl TypeTable {
    /// Create a table holding the well-known types at their fixed ids.
    pub fn new(pointer_width: u32) -> Self {
        let mut table = Self {
            kinds: Vec::new(),
            interned: FxHashMap::default(),
            structs: Vec::new(),
            unions: Vec::new(),
            enums: Vec::new(),
            named_bases: FxHashMap::default(),
            names: FxHashMap::default(),
            pointer_width,
        };

        let well_known = [
            (TypeId::INVALID, TypeKind::Invalid),
            (TypeId::VOID, TypeKind::Void),
            (TypeId::BOOL, TypeKind::Bool),
            (TypeId::I8, TypeKind::Integer { bits: 8, signed: true }),
            (TypeId::I16, TypeKind::Integer { bits: 16, signed: true }),
            (TypeId::I32, TypeKind::Integer { bits: 32, signed: true }),
            (TypeId::I64, TypeKind::Integer { bits: 64, signed: true }),
            (TypeId::U8, TypeKind::Integer { bits: 8, signed: false }),
            (TypeId::U16, TypeKind::Integer { bits: 16, signed: false }),
            (TypeId::U32, TypeKind::Integer { bits: 32, signed: false }),
            (TypeId::U64, TypeKind::Integer { bits: 64, signed: false }),
            (TypeId::F32, TypeKind::Float { bits: 32 }),
            (TypeId::F64, TypeKind::Float { bits: 64 }),
            (TypeId::STRING, TypeKind::String),
            (TypeId::ANY, TypeKind::Any),
            (TypeId::UNTYPED_INT, TypeKind::UntypedInteger),
            (TypeId::UNTYPED_FLOAT, TypeKind::UntypedFloat),
            (TypeId::RAWPTR, TypeKind::Pointer(TypeId::U8)),
            (TypeId::VOID_TUPLE, TypeKind::Tuple(vec![TypeId::VOID])),
        ];
        for (expected, kind) in well_known {
            let id = table.intern(kind);
            assert_eq!(id, expected, "well-known type registered out of order");
        }
        table
    }

    /// Intern a type, returning the existing id for a structurally equal one.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = TypeId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.kinds[ty.index()]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn pointer_width(&self) -> u32 {
        self.pointer_width
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(pointee))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Slice(elem))
    }

    pub fn array(&mut self, len: Option<u64>, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Array { len, elem })
    }

    pub fn vector(&mut self, size: u32, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Vector { size, elem })
    }

    /// A tuple; an empty list produces `(void)`.
    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        if elems.is_empty() {
            return TypeId::VOID_TUPLE;
        }
        self.intern(TypeKind::Tuple(elems))
    }

    pub fn function(&mut self, sig: FunctionSig) -> TypeId {
        self.intern(TypeKind::Function(sig))
    }

    pub fn metatype(&mut self, instance: TypeId) -> TypeId {
        self.intern(TypeKind::Metatype(instance))
    }

    pub fn file(&mut self, scope: ScopeId) -> TypeId {
        self.intern(TypeKind::File(scope))
    }

    /// The named type declared by `entity`. Its base is set separately.
    pub fn named(&mut self, entity: EntityId, name: &str) -> TypeId {
        self.names.entry(entity).or_insert_with(|| name.to_string());
        self.intern(TypeKind::Named(entity))
    }

    pub fn set_named_base(&mut self, entity: EntityId, base: TypeId) {
        self.named_bases.insert(entity, base);
    }

    pub fn named_base(&self, entity: EntityId) -> Option<TypeId> {
        self.named_bases.get(&entity).copied()
    }

    /// The placeholder type declared by `$name`.
    pub fn polymorphic(&mut self, entity: EntityId, name: &str) -> TypeId {
        self.names.entry(entity).or_insert_with(|| name.to_string());
        self.intern(TypeKind::Polymorphic(entity))
    }

    /// Display name registered for a named or placeholder entity.
    pub fn name_of(&self, entity: EntityId) -> &str {
        self.names.get(&entity).map(String::as_str).unwrap_or("<anonymous>")
    }

    pub fn add_struct(&mut self, def: StructDef) -> TypeId {
        let id = StructId(self.structs.len() as u32);
        self.structs.push(def);
        self.intern(TypeKind::Struct(id))
    }

    pub fn add_union(&mut self, def: UnionDef) -> TypeId {
        let id = UnionId(self.unions.len() as u32);
        self.unions.push(def);
        self.intern(TypeKind::Union(id))
    }

    pub fn add_enum(&mut self, def: EnumDef) -> TypeId {
        let id = EnumId(self.enums.len() as u32);
        self.enums.push(def);
        self.intern(TypeKind::Enum(id))
    }

    pub fn struct_def(&self, id: StructId) -> &StructDef {
        &self.structs[id.0 as usize]
    }

    pub fn union_def(&self, id: UnionId) -> &UnionDef {
        &self.unions[id.0 as usize]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0 as usize]
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Follow the alias chain of named types to the underlying type.
    ///
    /// A named type whose base has not been set yet is returned unchanged;
    /// a cyclic chain yields `INVALID`.
    pub fn base(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.kind(current) {
                TypeKind::Named(entity) => match self.named_base(*entity) {
                    Some(base) => current = base,
                    None => return current,
                },
                _ => return current,
            }
        }
        TypeId::INVALID
    }

    pub fn base_kind(&self, ty: TypeId) -> &TypeKind {
        self.kind(self.base(ty))
    }

    /// A one-element tuple collapses to its element.
    pub fn splat(&self, ty: TypeId) -> TypeId {
        match self.kind(ty) {
            TypeKind::Tuple(elems) if elems.len() == 1 => elems[0],
            _ => ty,
        }
    }

    /// Elements of a tuple, or the type itself as a single element.
    pub fn tuple_elems(&self, ty: TypeId) -> Vec<TypeId> {
        match self.kind(ty) {
            TypeKind::Tuple(elems) => elems.clone(),
            _ => vec![ty],
        }
    }

    /// The type denoted by a type-valued expression.
    pub fn lower_metatype(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Metatype(instance) => Some(*instance),
            _ => None,
        }
    }

    pub fn signature(&self, ty: TypeId) -> Option<&FunctionSig> {
        match self.base_kind(ty) {
            TypeKind::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Element type of arrays, slices and vectors.
    pub fn element(&self, ty: TypeId) -> Option<TypeId> {
        match self.base_kind(ty) {
            TypeKind::Array { elem, .. } | TypeKind::Slice(elem) | TypeKind::Vector { elem, .. } => {
                Some(*elem)
            }
            _ => None,
        }
    }

    pub fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        match self.base_kind(ty) {
            TypeKind::Pointer(pointee) => Some(*pointee),
            _ => None,
        }
    }

    /// Vectors apply operators element-wise; predicates look at the element.
    pub fn unwrap_vector(&self, ty: TypeId) -> TypeId {
        match self.base_kind(ty) {
            TypeKind::Vector { elem, .. } => *elem,
            _ => ty,
        }
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    pub fn is_integer(&self, ty: TypeId) -> bool {
        matches!(
            self.base_kind(ty),
            TypeKind::Integer { .. } | TypeKind::UntypedInteger
        )
    }

    pub fn is_signed(&self, ty: TypeId) -> bool {
        match self.base_kind(ty) {
            TypeKind::Integer { signed, .. } => *signed,
            TypeKind::UntypedInteger => true,
            _ => false,
        }
    }

    pub fn is_float(&self, ty: TypeId) -> bool {
        matches!(
            self.base_kind(ty),
            TypeKind::Float { .. } | TypeKind::UntypedFloat
        )
    }

    pub fn is_number(&self, ty: TypeId) -> bool {
        self.is_integer(ty) || self.is_float(ty)
    }

    pub fn is_bool(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Bool)
    }

    pub fn is_string(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::String)
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Pointer(_))
    }

    pub fn is_function(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Function(_))
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(self.splat(ty)), TypeKind::Void)
    }

    pub fn is_any(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Any)
    }

    pub fn is_untyped(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::UntypedInteger | TypeKind::UntypedFloat
        )
    }

    pub fn is_metatype(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Metatype(_))
    }

    pub fn is_enum(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Enum(_))
    }

    pub fn is_enum_flags(&self, ty: TypeId) -> bool {
        match self.base_kind(ty) {
            TypeKind::Enum(id) => self.enum_def(*id).flags,
            _ => false,
        }
    }

    pub fn is_union(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Union(_))
    }

    pub fn is_struct(&self, ty: TypeId) -> bool {
        matches!(self.base_kind(ty), TypeKind::Struct(_))
    }

    /// Types that accept `nil`.
    pub fn is_nilable(&self, ty: TypeId) -> bool {
        matches!(
            self.base_kind(ty),
            TypeKind::Pointer(_) | TypeKind::Function(_)
        )
    }

    /// Types supporting `==` and `!=`.
    pub fn is_equatable(&self, ty: TypeId) -> bool {
        self.is_number(ty)
            || matches!(
                self.base_kind(ty),
                TypeKind::Bool
                    | TypeKind::Pointer(_)
                    | TypeKind::Enum(_)
                    | TypeKind::String
                    | TypeKind::Function(_)
            )
    }

    /// Types supporting ordering comparisons.
    pub fn is_comparable(&self, ty: TypeId) -> bool {
        self.is_number(ty) || matches!(self.base_kind(ty), TypeKind::Pointer(_) | TypeKind::String)
    }

    /// Whether any placeholder occurs inside the type.
    pub fn is_polymorphic(&self, ty: TypeId) -> bool {
        self.first_polymorphic(ty).is_some()
    }

    /// The first placeholder found in a depth-first walk of the type.
    pub fn first_polymorphic(&self, ty: TypeId) -> Option<EntityId> {
        let mut found = Vec::new();
        self.collect_polymorphics(ty, &mut found);
        found.first().copied()
    }

    /// Every placeholder inside the type, in depth-first order without repeats.
    pub fn collect_polymorphics(&self, ty: TypeId, out: &mut Vec<EntityId>) {
        match self.kind(ty) {
            TypeKind::Polymorphic(entity) => {
                if !out.contains(entity) {
                    out.push(*entity);
                }
            }
            TypeKind::Pointer(inner)
            | TypeKind::Slice(inner)
            | TypeKind::Metatype(inner)
            | TypeKind::Array { elem: inner, .. }
            | TypeKind::Vector { elem: inner, .. } => self.collect_polymorphics(*inner, out),
            TypeKind::Tuple(elems) => {
                for elem in elems {
                    self.collect_polymorphics(*elem, out);
                }
            }
            TypeKind::Function(sig) => {
                for param in &sig.params {
                    self.collect_polymorphics(*param, out);
                }
                self.collect_polymorphics(sig.result, out);
            }
            TypeKind::Struct(id) => {
                let fields: Vec<TypeId> =
                    self.struct_def(*id).fields.values().map(|f| f.ty).collect();
                for field in fields {
                    self.collect_polymorphics(field, out);
                }
            }
            _ => {}
        }
    }

    /// Replace bound placeholders throughout a type.
    pub fn substitute(&mut self, ty: TypeId, bindings: &FxHashMap<EntityId, TypeId>) -> TypeId {
        if bindings.is_empty() || !self.is_polymorphic(ty) {
            return ty;
        }
        let kind = self.kind(ty).clone();
        match kind {
            TypeKind::Polymorphic(entity) => bindings.get(&entity).copied().unwrap_or(ty),
            TypeKind::Pointer(inner) => {
                let inner = self.substitute(inner, bindings);
                self.pointer(inner)
            }
            TypeKind::Slice(inner) => {
                let inner = self.substitute(inner, bindings);
                self.slice(inner)
            }
            TypeKind::Metatype(inner) => {
                let inner = self.substitute(inner, bindings);
                self.metatype(inner)
            }
            TypeKind::Array { len, elem } => {
                let elem = self.substitute(elem, bindings);
                self.array(len, elem)
            }
            TypeKind::Vector { size, elem } => {
                let elem = self.substitute(elem, bindings);
                self.vector(size, elem)
            }
            TypeKind::Tuple(elems) => {
                let elems = elems
                    .into_iter()
                    .map(|elem| self.substitute(elem, bindings))
                    .collect();
                self.tuple(elems)
            }
            TypeKind::Function(sig) => {
                let params = sig
                    .params
                    .into_iter()
                    .map(|param| self.substitute(param, bindings))
                    .collect();
                let result = self.substitute(sig.result, bindings);
                let mut sig = FunctionSig {
                    params,
                    result,
                    flags: sig.flags,
                };
                let still_generic = self.function_has_placeholders(&sig);
                sig.flags.set(FnFlags::POLYMORPHIC, still_generic);
                self.function(sig)
            }
            _ => ty,
        }
    }

    fn function_has_placeholders(&self, sig: &FunctionSig) -> bool {
        sig.params.iter().any(|p| self.is_polymorphic(*p)) || self.is_polymorphic(sig.result)
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Width of a value of the type in bits, if it has a runtime representation.
    pub fn width(&self, ty: TypeId) -> Option<u32> {
        let ptr = self.pointer_width;
        match self.kind(ty) {
            TypeKind::Void => Some(0),
            TypeKind::Bool => Some(1),
            TypeKind::Integer { bits, .. } | TypeKind::Float { bits } => Some(*bits),
            TypeKind::UntypedInteger | TypeKind::UntypedFloat => Some(64),
            TypeKind::String | TypeKind::Any => Some(ptr * 2),
            TypeKind::Pointer(_) | TypeKind::Function(_) => Some(ptr),
            TypeKind::Slice(_) => Some(ptr * 3),
            TypeKind::Array { len, elem } => {
                let len = (*len)?;
                Some(len as u32 * self.width(*elem)?)
            }
            TypeKind::Vector { size, elem } => Some(size * self.width(*elem)?),
            TypeKind::Tuple(elems) => elems.iter().map(|e| self.width(*e)).sum(),
            TypeKind::Struct(id) => Some(self.struct_def(*id).width),
            TypeKind::Union(id) => Some(self.union_def(*id).width),
            TypeKind::Enum(id) => Some(self.enum_def(*id).width),
            TypeKind::Named(entity) => self.width(self.named_base(*entity)?),
            TypeKind::Invalid
            | TypeKind::Metatype(_)
            | TypeKind::Polymorphic(_)
            | TypeKind::File(_) => None,
        }
    }

    /// Size in bytes, rounding the bit width up.
    pub fn size_of(&self, ty: TypeId) -> Option<u64> {
        self.width(ty).map(|bits| (bits as u64).div_ceil(8))
    }

    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay::new(self, ty)
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StructField, UnionCase};
    use crate::Span;
    use indexmap::IndexMap;

    #[test]
    fn well_known_types_are_fixed() {
        let table = TypeTable::default();
        assert_eq!(
            *table.kind(TypeId::I64),
            TypeKind::Integer {
                bits: 64,
                signed: true
            }
        );
        assert_eq!(*table.kind(TypeId::RAWPTR), TypeKind::Pointer(TypeId::U8));
        assert_eq!(table.splat(TypeId::VOID_TUPLE), TypeId::VOID);
    }

    #[test]
    fn structural_types_are_interned() {
        let mut table = TypeTable::default();
        let a = table.slice(TypeId::I32);
        let b = table.slice(TypeId::I32);
        let c = table.slice(TypeId::I64);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.pointer(TypeId::U8), TypeId::RAWPTR);
    }

    #[test]
    fn structs_are_nominal() {
        let mut table = TypeTable::default();
        let a = table.add_struct(StructDef::default());
        let b = table.add_struct(StructDef::default());
        assert_ne!(a, b);
    }

    #[test]
    fn named_base_chain() {
        let mut table = TypeTable::default();
        let outer = table.named(EntityId(10), "Outer");
        let inner = table.named(EntityId(11), "Inner");
        assert_eq!(table.base(outer), outer);

        table.set_named_base(EntityId(10), inner);
        table.set_named_base(EntityId(11), TypeId::U16);
        assert_eq!(table.base(outer), TypeId::U16);
        assert!(table.is_integer(outer));
        assert_eq!(table.width(outer), Some(16));
    }

    #[test]
    fn cyclic_alias_chain_is_invalid() {
        let mut table = TypeTable::default();
        let a = table.named(EntityId(10), "A");
        let b = table.named(EntityId(11), "B");
        table.set_named_base(EntityId(10), b);
        table.set_named_base(EntityId(11), a);
        assert_eq!(table.base(a), TypeId::INVALID);
    }

    #[test]
    fn substitute_replaces_placeholders() {
        let mut table = TypeTable::default();
        let t = table.polymorphic(EntityId(20), "T");
        let slice_t = table.slice(t);
        assert!(table.is_polymorphic(slice_t));
        assert_eq!(table.first_polymorphic(slice_t), Some(EntityId(20)));

        let mut bindings = FxHashMap::default();
        bindings.insert(EntityId(20), TypeId::F32);
        let concrete = table.substitute(slice_t, &bindings);
        assert_eq!(concrete, table.slice(TypeId::F32));
        assert!(!table.is_polymorphic(concrete));
    }

    #[test]
    fn substitute_strips_polymorphic_flag_from_functions() {
        let mut table = TypeTable::default();
        let t = table.polymorphic(EntityId(20), "T");
        let result = table.tuple(vec![t]);
        let generic = table.function(FunctionSig {
            params: vec![t],
            result,
            flags: FnFlags::POLYMORPHIC,
        });
        let mut bindings = FxHashMap::default();
        bindings.insert(EntityId(20), TypeId::I64);
        let concrete = table.substitute(generic, &bindings);
        let sig = table.signature(concrete).cloned().unwrap();
        assert!(!sig.flags.contains(FnFlags::POLYMORPHIC));
        assert_eq!(sig.params, vec![TypeId::I64]);
    }

    #[test]
    fn widths() {
        let mut table = TypeTable::new(32);
        assert_eq!(table.width(TypeId::RAWPTR), Some(32));
        let array = table.array(Some(4), TypeId::I16);
        assert_eq!(table.width(array), Some(64));
        let implicit = table.array(None, TypeId::I16);
        assert_eq!(table.width(implicit), None);
        assert_eq!(table.size_of(TypeId::BOOL), Some(1));

        let mut fields = IndexMap::new();
        fields.insert(
            "a".to_string(),
            StructField {
                name: "a".into(),
                ty: TypeId::I32,
                index: 0,
                offset: 0,
                span: Span::default(),
            },
        );
        let s = table.add_struct(StructDef {
            fields,
            width: 32,
            packed: false,
            polymorphic: false,
        });
        assert_eq!(table.width(s), Some(32));
    }

    #[test]
    fn predicates_see_through_aliases() {
        let mut table = TypeTable::default();
        let mut cases = IndexMap::new();
        cases.insert(
            "a".to_string(),
            UnionCase {
                name: "a".into(),
                ty: TypeId::I32,
                tag: 0,
                span: Span::default(),
            },
        );
        let union = table.add_union(UnionDef {
            cases,
            width: 40,
            tag_type: TypeId::U8,
            inline_tag: false,
        });
        let named = table.named(EntityId(30), "Shape");
        table.set_named_base(EntityId(30), union);
        assert!(table.is_union(named));
        assert!(!table.is_nilable(named));
        assert!(table.is_nilable(TypeId::RAWPTR));
        assert!(table.is_equatable(TypeId::STRING));
        assert!(!table.is_comparable(TypeId::BOOL));
    }
}
