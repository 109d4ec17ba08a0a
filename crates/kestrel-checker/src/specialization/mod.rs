//! Polymorphic functions and their specializations.
//!
//! A function literal whose signature declares `$T` placeholders is not
//! checked when it is declared. Each call site binds the placeholders from
//! the argument types and looks the binding up in the generic's cache:
//!
//! ```text
//! call  ──bind──▶ key [T1, T2, ..] ──cache hit──▶ existing specialization
//!                                 └─cache miss─▶ clone template, check it,
//!                                                 append to SpecializationList
//! ```
//!
//! Polymorphic structs (`struct($A) { ... }`) are instantiated the same way
//! with explicit type arguments.

mod binding;
mod instantiation;
mod mangle;
mod poly_struct;

use std::sync::Arc;

use kestrel_ast::FuncLit;
use kestrel_core::{EntityId, FileId, FnFlags, ScopeId, TypeId};
use parking_lot::Mutex;

use crate::table::NodeTable;

pub(crate) use binding::PolyBindings;
pub use mangle::mangle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecializationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolyStructId(pub u32);

// ============================================================================
// Polymorphic functions
// ============================================================================

#[derive(Debug, Clone)]
pub struct GenericParam {
    pub label: Option<String>,
    /// Declared type, mentioning placeholders.
    pub ty: TypeId,
    /// The parameter's type expression declares a placeholder.
    pub polymorphic: bool,
}

/// A polymorphic function literal awaiting specialization.
#[derive(Debug, Clone)]
pub struct GenericFunction {
    pub entity: Option<EntityId>,
    pub name: String,
    pub file: FileId,
    pub template: Arc<FuncLit>,
    /// Scope the literal was declared in; specializations are children of it.
    pub declaring_scope: ScopeId,
    pub ty: TypeId,
    pub params: Vec<GenericParam>,
    /// Placeholders in declaration order.
    pub placeholders: Vec<EntityId>,
    pub flags: FnFlags,
    pub specializations: Vec<SpecializationId>,
}

impl GenericFunction {
    pub fn is_variadic(&self) -> bool {
        self.flags.intersects(FnFlags::VARIADIC | FnFlags::C_VARIADIC)
    }
}

/// What is known about a specialization as soon as its signature is checked.
///
/// Headers are appended before the body is checked, so a recursive call
/// with the same key finds the specialization in progress.
#[derive(Debug, Clone)]
pub struct SpecializationHeader {
    pub generic: GenericId,
    pub key: Vec<TypeId>,
    pub fn_type: TypeId,
    pub mangled_name: String,
}

/// A fully checked specialization.
#[derive(Debug, Clone)]
pub struct FunctionSpecialization {
    pub id: SpecializationId,
    pub generic: GenericId,
    pub name: String,
    pub mangled_name: String,
    pub key: Vec<TypeId>,
    /// Printed forms of `key`.
    pub key_names: Vec<String>,
    pub fn_type: TypeId,
    /// Printed form of `fn_type`.
    pub signature: String,
    pub file: FileId,
    pub scope: ScopeId,
    pub params: Vec<EntityId>,
    /// The cloned literal; node ids match the template's.
    pub body: FuncLit,
    pub table: NodeTable,
}

// ============================================================================
// Polymorphic structs
// ============================================================================

#[derive(Debug, Clone)]
pub struct PolyStruct {
    pub entity: Option<EntityId>,
    pub name: String,
    pub file: FileId,
    pub declaring_scope: ScopeId,
    /// Placeholders in declaration order.
    pub placeholders: Vec<EntityId>,
    /// The uninstantiated struct type.
    pub ty: TypeId,
    /// Key to instantiated named type.
    pub instances: Vec<(Vec<TypeId>, TypeId)>,
}

// ============================================================================
// SpecializationList
// ============================================================================

/// Specializations produced by checking, shared with later stages.
///
/// Cloning the list shares it. Pushes are serialized by a mutex, so other
/// threads may drain or inspect it while checking runs.
#[derive(Debug, Clone, Default)]
pub struct SpecializationList {
    inner: Arc<Mutex<Vec<Arc<FunctionSpecialization>>>>,
}

impl SpecializationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, specialization: Arc<FunctionSpecialization>) {
        self.inner.lock().push(specialization);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> Vec<Arc<FunctionSpecialization>> {
        self.inner.lock().clone()
    }

    /// Remove and return everything pushed so far.
    pub fn drain(&self) -> Vec<Arc<FunctionSpecialization>> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn mangled_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .iter()
            .map(|spec| spec.mangled_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::AstBuilder;
    use std::thread;

    fn specialization(id: u32, name: &str) -> Arc<FunctionSpecialization> {
        let mut b = AstBuilder::new(FileId(0));
        let body = b.func_lit(Vec::new(), Vec::new(), Vec::new());
        Arc::new(FunctionSpecialization {
            id: SpecializationId(id),
            generic: GenericId(0),
            name: "f".into(),
            mangled_name: name.into(),
            key: vec![TypeId::I64],
            key_names: vec!["i64".into()],
            fn_type: TypeId::INVALID,
            signature: String::new(),
            file: FileId(0),
            scope: ScopeId(0),
            params: Vec::new(),
            body,
            table: NodeTable::default(),
        })
    }

    #[test]
    fn clones_share_contents() {
        let list = SpecializationList::new();
        let other = list.clone();
        list.push(specialization(0, "main.f$i64"));
        assert_eq!(other.len(), 1);
        assert_eq!(other.mangled_names(), vec!["main.f$i64"]);

        let drained = other.drain();
        assert_eq!(drained.len(), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn concurrent_pushes() {
        let list = SpecializationList::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let list = list.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        list.push(specialization(t * 25 + i, "x"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(list.len(), 100);
        assert_eq!(list.snapshot().len(), 100);
    }
}
