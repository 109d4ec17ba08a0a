//! Named declarations.
//!
//! An [`Entity`] is created when its name is first reserved (during
//! collection for file-scope names, at the declaration for locals) and is
//! given its type exactly once, when its declaration is checked. Entities
//! live in an [`EntityArena`] and are referred to by [`EntityId`].

use bitflags::bitflags;
use kestrel_core::{ConstValue, EntityId, FileId, ScopeId, Span, TypeId};

bitflags! {
    /// What an entity is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u32 {
        const CONSTANT = 1 << 0;
        const VARIABLE = 1 << 1;
        const TYPE = 1 << 2;
        const FUNCTION = 1 << 3;
        const FIELD = 1 << 4;
        const PARAMETER = 1 << 5;
        const POLY_PARAMETER = 1 << 6;
        const LABEL = 1 << 7;
        const FILE = 1 << 8;
        const LIBRARY = 1 << 9;
        const BUILTIN = 1 << 10;
        const FOREIGN = 1 << 11;
        const ANONYMOUS = 1 << 12;
        /// Declared by a `$T` placeholder (or a specialization's copy of one).
        const IMPLICIT_TYPE = 1 << 13;
        /// The break label of a loop; `continue` may target it.
        const LOOP_LABEL = 1 << 14;
        const CHECKED = 1 << 15;
    }
}

/// Where the declaration of a file-scope entity lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub file: FileId,
    /// Index of the item in the file.
    pub item: u32,
    /// Index inside a declaration block.
    pub member: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub span: Span,
    pub flags: EntityFlags,
    /// `None` until the declaration is checked.
    pub ty: Option<TypeId>,
    pub constant: Option<ConstValue>,
    pub owning_scope: Option<ScopeId>,
    /// Members of a file or library reference.
    pub member_scope: Option<ScopeId>,
    /// Set for file-scope entities, which may be checked on demand.
    pub decl: Option<DeclRef>,
    pub linkname: Option<String>,
    pub mangled_name: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>, span: Span, flags: EntityFlags) -> Self {
        Self {
            name: name.into(),
            span,
            flags,
            ty: None,
            constant: None,
            owning_scope: None,
            member_scope: None,
            decl: None,
            linkname: None,
            mangled_name: None,
        }
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_constant(mut self, value: ConstValue) -> Self {
        self.constant = Some(value);
        self
    }

    pub fn in_scope(mut self, scope: ScopeId) -> Self {
        self.owning_scope = Some(scope);
        self
    }

    pub fn is(&self, flags: EntityFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn is_type(&self) -> bool {
        self.flags.contains(EntityFlags::TYPE)
    }

    pub fn is_checked(&self) -> bool {
        self.ty.is_some()
    }
}

/// Owns every entity of a program.
#[derive(Debug, Clone)]
pub struct EntityArena {
    entities: Vec<Entity>,
}

impl EntityArena {
    pub fn new() -> Self {
        let anonymous = Entity::new("_", Span::default(), EntityFlags::ANONYMOUS);
        let invalid = Entity::new("<invalid>", Span::default(), EntityFlags::empty())
            .with_type(TypeId::INVALID);
        let arena = Self {
            entities: vec![anonymous, invalid],
        };
        debug_assert_eq!(arena.entities[EntityId::INVALID.index()].name, "<invalid>");
        arena
    }

    pub fn alloc(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }
}

impl Default for EntityArena {
    fn default() -> Self {
        Self::new()
    }
}
