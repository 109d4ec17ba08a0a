//! Type representation.
//!
//! Types are interned in a [`TypeTable`] and referred to by [`TypeId`]. Two
//! structurally equal types always share an id, so type equality is id
//! equality. Nominal types (structs, unions, enums) carry an index into a
//! side arena so every declaration produces a distinct type.
//!
//! Named types refer to the entity that declared them; their base type is
//! recorded separately so a declaration can be given a stub named type
//! before its definition has been checked.

mod display;
mod table;

pub use display::TypeDisplay;
pub use table::TypeTable;

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::{EntityId, ScopeId, Span};

// ============================================================================
// Handles
// ============================================================================

/// Handle to an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub const INVALID: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const I8: TypeId = TypeId(3);
    pub const I16: TypeId = TypeId(4);
    pub const I32: TypeId = TypeId(5);
    pub const I64: TypeId = TypeId(6);
    pub const U8: TypeId = TypeId(7);
    pub const U16: TypeId = TypeId(8);
    pub const U32: TypeId = TypeId(9);
    pub const U64: TypeId = TypeId(10);
    pub const F32: TypeId = TypeId(11);
    pub const F64: TypeId = TypeId(12);
    pub const STRING: TypeId = TypeId(13);
    pub const ANY: TypeId = TypeId(14);
    pub const UNTYPED_INT: TypeId = TypeId(15);
    pub const UNTYPED_FLOAT: TypeId = TypeId(16);
    /// `*u8`
    pub const RAWPTR: TypeId = TypeId(17);
    /// `(void)`, the result tuple of a function returning nothing.
    pub const VOID_TUPLE: TypeId = TypeId(18);

    /// The raw index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_invalid(self) -> bool {
        self == TypeId::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnionId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub(crate) u32);

// ============================================================================
// Kinds
// ============================================================================

bitflags! {
    /// Function type flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FnFlags: u8 {
        /// Last parameter collects excess arguments into a slice.
        const VARIADIC = 1 << 0;
        /// Last parameter collects excess arguments C style.
        const C_VARIADIC = 1 << 1;
        /// At least one parameter or result mentions a placeholder.
        const POLYMORPHIC = 1 << 2;
        /// Implemented by the compiler.
        const BUILTIN = 1 << 3;
        /// Results may be ignored without assignment.
        const DISCARDABLE = 1 << 4;
    }
}

/// Signature of a function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSig {
    pub params: Vec<TypeId>,
    /// Always a tuple type.
    pub result: TypeId,
    pub flags: FnFlags,
}

/// The structure of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Invalid,
    Void,
    Bool,
    Integer { bits: u32, signed: bool },
    Float { bits: u32 },
    String,
    Any,
    UntypedInteger,
    UntypedFloat,
    Pointer(TypeId),
    /// `len` is `None` for an implicit-length array awaiting a composite literal.
    Array { len: Option<u64>, elem: TypeId },
    Slice(TypeId),
    Vector { size: u32, elem: TypeId },
    Tuple(Vec<TypeId>),
    Function(FunctionSig),
    Struct(StructId),
    Union(UnionId),
    Enum(EnumId),
    Named(EntityId),
    /// The type of an expression that denotes a type.
    Metatype(TypeId),
    /// A polymorphic placeholder declared by `$T`.
    Polymorphic(EntityId),
    /// The type of an import reference.
    File(ScopeId),
}

// ============================================================================
// Nominal definitions
// ============================================================================

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub index: u32,
    /// Offset in bits.
    pub offset: u32,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct StructDef {
    pub fields: IndexMap<String, StructField>,
    /// Width in bits.
    pub width: u32,
    pub packed: bool,
    /// Fields mention placeholders; the struct must be instantiated before use.
    pub polymorphic: bool,
}

#[derive(Debug, Clone)]
pub struct UnionCase {
    pub name: String,
    pub ty: TypeId,
    pub tag: u32,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnionDef {
    pub cases: IndexMap<String, UnionCase>,
    pub width: u32,
    pub tag_type: TypeId,
    /// The tag is stored inside the payload instead of before it.
    pub inline_tag: bool,
}

#[derive(Debug, Clone)]
pub struct EnumCase {
    pub name: String,
    pub value: i128,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub cases: IndexMap<String, EnumCase>,
    pub backing: Option<TypeId>,
    pub flags: bool,
    pub width: u32,
}

impl EnumDef {
    pub fn case(&self, name: &str) -> Option<&EnumCase> {
        self.cases.get(name)
    }
}
