//! Lexical scopes.
//!
//! Scopes form a parent-linked tree stored in a [`ScopeArena`]:
//! - the universe scope holds builtin types and functions
//! - one package scope sits below it
//! - each file gets a file scope under the package scope
//! - blocks, function bodies and specializations open child scopes
//!
//! Lookup walks outward from the innermost scope and the first match wins,
//! which gives shadowing.

use kestrel_core::{EntityId, FileId, ScopeId};
use rustc_hash::FxHashMap;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Block,
    Function,
    Specialization,
}

/// A name bound in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub entity: EntityId,
    /// Imported and `using`-introduced names are not owned by the scope.
    pub owned: bool,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub file: Option<FileId>,
    members: FxHashMap<String, Member>,
}

impl Scope {
    pub fn is_file(&self) -> bool {
        self.kind == ScopeKind::File
    }

    pub fn is_package(&self) -> bool {
        self.kind == ScopeKind::Package
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ============================================================================
// ScopeArena
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, parent: Option<ScopeId>, kind: ScopeKind, file: Option<FileId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            kind,
            file,
            members: FxHashMap::default(),
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Bind `name` in `scope`.
    ///
    /// Returns the existing member on a collision and leaves it in place.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        name: &str,
        entity: EntityId,
        owned: bool,
    ) -> Result<(), Member> {
        let members = &mut self.scopes[scope.index()].members;
        if let Some(existing) = members.get(name) {
            return Err(*existing);
        }
        members.insert(name.to_string(), Member { entity, owned });
        Ok(())
    }

    /// Look a name up in one scope only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<Member> {
        self.get(scope).members.get(name).copied()
    }

    /// Look a name up walking outward through parents.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<EntityId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(member) = scope.members.get(name) {
                return Some(member.entity);
            }
            current = scope.parent;
        }
        None
    }

    /// Members of a scope ordered by entity id, i.e. by declaration order.
    pub fn members(&self, scope: ScopeId) -> Vec<(String, Member)> {
        let mut members: Vec<(String, Member)> = self
            .get(scope)
            .members
            .iter()
            .map(|(name, member)| (name.clone(), *member))
            .collect();
        members.sort_by_key(|(_, member)| member.entity);
        members
    }

    /// Whether `inner` is `outer` or nested inside it.
    pub fn is_within(&self, inner: ScopeId, outer: ScopeId) -> bool {
        let mut current = Some(inner);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            current = self.get(id).parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
