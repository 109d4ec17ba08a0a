//! Printed forms of types.
//!
//! These strings appear in diagnostics and in mangled specialization names,
//! so they must be deterministic.

use std::fmt;

use super::{FnFlags, TypeId, TypeKind, TypeTable};

/// Formats a type using the names recorded in its table.
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: TypeId,
}

impl<'a> TypeDisplay<'a> {
    pub(crate) fn new(table: &'a TypeTable, ty: TypeId) -> Self {
        Self { table, ty }
    }

    fn nested(&self, ty: TypeId) -> TypeDisplay<'a> {
        TypeDisplay::new(self.table, ty)
    }

    fn list(&self, f: &mut fmt::Formatter<'_>, types: &[TypeId]) -> fmt::Result {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.nested(*ty))?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table;
        match table.kind(self.ty) {
            TypeKind::Invalid => write!(f, "<invalid>"),
            TypeKind::Void => write!(f, "void"),
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Integer { bits, signed } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, bits)
            }
            TypeKind::Float { bits } => write!(f, "f{}", bits),
            TypeKind::String => write!(f, "string"),
            TypeKind::Any => write!(f, "any"),
            TypeKind::UntypedInteger => write!(f, "untyped integer"),
            TypeKind::UntypedFloat => write!(f, "untyped float"),
            TypeKind::Pointer(pointee) => write!(f, "*{}", self.nested(*pointee)),
            TypeKind::Array { len: Some(len), elem } => {
                write!(f, "[{}]{}", len, self.nested(*elem))
            }
            TypeKind::Array { len: None, elem } => write!(f, "[..]{}", self.nested(*elem)),
            TypeKind::Slice(elem) => write!(f, "[]{}", self.nested(*elem)),
            TypeKind::Vector { size, elem } => {
                write!(f, "[vector {}]{}", size, self.nested(*elem))
            }
            TypeKind::Tuple(elems) => {
                if elems.len() == 1 {
                    return write!(f, "{}", self.nested(elems[0]));
                }
                write!(f, "(")?;
                self.list(f, elems)?;
                write!(f, ")")
            }
            TypeKind::Function(sig) => {
                write!(f, "(")?;
                let variadic = sig.flags.intersects(FnFlags::VARIADIC | FnFlags::C_VARIADIC);
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if variadic && i + 1 == sig.params.len() {
                        let elem = table.element(*param).unwrap_or(*param);
                        write!(f, "..{}", self.nested(elem))?;
                    } else {
                        write!(f, "{}", self.nested(*param))?;
                    }
                }
                write!(f, ") -> {}", self.nested(sig.result))
            }
            TypeKind::Struct(id) => {
                write!(f, "struct {{")?;
                for (i, field) in table.struct_def(*id).fields.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, self.nested(field.ty))?;
                }
                write!(f, "}}")
            }
            TypeKind::Union(id) => {
                write!(f, "union {{")?;
                for (i, case) in table.union_def(*id).cases.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", case.name, self.nested(case.ty))?;
                }
                write!(f, "}}")
            }
            TypeKind::Enum(id) => {
                write!(f, "enum {{")?;
                for (i, case) in table.enum_def(*id).cases.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", case.name)?;
                }
                write!(f, "}}")
            }
            TypeKind::Named(entity) | TypeKind::Polymorphic(entity) => {
                write!(f, "{}", table.name_of(*entity))
            }
            TypeKind::Metatype(instance) => write!(f, "type {}", self.nested(*instance)),
            TypeKind::File(_) => write!(f, "file"),
        }
    }
}
