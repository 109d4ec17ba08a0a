//! The checker core shared by every pass.
//!
//! [`Checker`] borrows the [`Program`] being filled in and walks the syntax
//! trees of its files. Besides the context chain it keeps a stack of node
//! tables: results go to the current file's table, except while a
//! specialization body is checked, when they go to that specialization's
//! own table.

use kestrel_ast::{DeclBlock, Declaration, Expr, Ident, Item, SourceFile};
use kestrel_core::{
    CheckError, ConstValue, Diagnostic, EntityId, FileId, NodeId, Note, ScopeId, TypeId, TypeTable,
};
use tracing::{debug, trace};

use crate::context::{ContextFrame, ContextStack};
use crate::entity::{DeclRef, Entity, EntityFlags};
use crate::operand::{Mode, Operand};
use crate::program::Program;
use crate::scope::{Member, ScopeKind};
use crate::specialization::SpecializationList;
use crate::table::NodeTable;

/// Where results are recorded.
#[derive(Debug)]
pub(crate) enum TableSlot {
    File(FileId),
    Owned(Box<NodeTable>),
}

/// Walks the files of a program and records what it learns.
pub struct Checker<'a> {
    pub(crate) program: &'a mut Program,
    pub(crate) sources: &'a [SourceFile],
    pub(crate) shared: &'a SpecializationList,
    /// File whose declarations are being checked.
    pub(crate) file: FileId,
    pub(crate) contexts: ContextStack,
    tables: Vec<TableSlot>,
    /// Constant whose value is being checked; a function literal takes it
    /// as its own entity.
    pub(crate) declaring: Option<EntityId>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(
        program: &'a mut Program,
        sources: &'a [SourceFile],
        shared: &'a SpecializationList,
    ) -> Self {
        let package = program.package;
        let mut contexts = ContextStack::new();
        contexts.push(ContextFrame::boundary(package));
        Self {
            program,
            sources,
            shared,
            file: FileId(0),
            contexts,
            tables: Vec::new(),
            declaring: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn types(&self) -> &TypeTable {
        &self.program.types
    }

    pub fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.program.types
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        self.program.entities.get(id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        self.program.entities.get_mut(id)
    }

    /// The innermost scope.
    pub fn scope(&self) -> ScopeId {
        self.contexts.scope()
    }

    pub(crate) fn file_scope(&self, file: FileId) -> ScopeId {
        self.program.files[file.index()].scope
    }

    pub(crate) fn source(&self, file: FileId) -> &'a SourceFile {
        &self.sources[file.index()]
    }

    /// Printed form of a type.
    pub fn display(&self, ty: TypeId) -> String {
        self.program.types.display(ty).to_string()
    }

    /// `'expr' (type T)`, the form operands take in messages.
    pub fn describe(&self, expr: &Expr, operand: &Operand) -> String {
        match operand.mode {
            Mode::Invalid | Mode::Nil => format!("'{expr}'"),
            Mode::Type => format!("type '{expr}'"),
            _ if operand.ty.is_invalid() => format!("'{expr}'"),
            _ => format!("'{}' (type {})", expr, self.display(operand.ty)),
        }
    }

    // ========================================================================
    // Node tables
    // ========================================================================

    pub fn table(&self) -> &NodeTable {
        match self.tables.last() {
            Some(TableSlot::File(file)) => &self.program.files[file.index()].table,
            Some(TableSlot::Owned(table)) => table,
            None => panic!("no node table is active"),
        }
    }

    pub fn table_mut(&mut self) -> &mut NodeTable {
        match self.tables.last_mut() {
            Some(TableSlot::File(file)) => &mut self.program.files[file.index()].table,
            Some(TableSlot::Owned(table)) => table,
            None => panic!("no node table is active"),
        }
    }

    pub(crate) fn push_owned_table(&mut self) {
        self.tables.push(TableSlot::Owned(Box::default()));
    }

    pub(crate) fn pop_owned_table(&mut self) -> NodeTable {
        match self.tables.pop() {
            Some(TableSlot::Owned(table)) => *table,
            other => panic!("expected an owned node table, found {other:?}"),
        }
    }

    /// Record the type and value of a node.
    pub fn record(&mut self, node: NodeId, operand: &Operand) {
        let table = self.table_mut();
        table.record_type(node, operand.ty);
        table.record_constant(node, operand.constant.clone());
    }

    pub(crate) fn record_entity(&mut self, ident: &Ident, entity: EntityId) {
        self.table_mut().entities.insert(ident.id, entity);
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Record an error against the file its span points into.
    ///
    /// Inside a specialization the diagnostic gains one note per
    /// specialization call on the context chain, innermost first.
    pub fn report(&mut self, error: CheckError) {
        let span = error.span();
        let mut diagnostic = Diagnostic::from(error);
        for call in self.contexts.specialization_calls() {
            diagnostic = diagnostic.with_note(Note::at("called from here", call));
        }
        debug!(span = %span, message = %diagnostic.message, "diagnostic");

        let file = if span.file.index() < self.program.files.len() {
            span.file
        } else {
            self.file
        };
        self.program.files[file.index()].diagnostics.push(diagnostic);
    }

    // ========================================================================
    // Contexts and scopes
    // ========================================================================

    /// Open a child scope of the current one.
    pub(crate) fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = self
            .program
            .scopes
            .alloc(Some(self.scope()), kind, Some(self.file));
        self.contexts.push(ContextFrame::new(scope));
        scope
    }

    /// Open a function or specialization scope that hides outer targets.
    pub(crate) fn push_boundary(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let scope = self.program.scopes.alloc(Some(parent), kind, Some(self.file));
        self.contexts.push(ContextFrame::boundary(scope));
        scope
    }

    pub(crate) fn pop_context(&mut self) {
        self.contexts.pop();
    }

    /// Make `file` current: its scope, its table. Returns the previous file.
    pub(crate) fn enter_file(&mut self, file: FileId) -> FileId {
        let previous = std::mem::replace(&mut self.file, file);
        let scope = self.file_scope(file);
        self.contexts.push(ContextFrame::boundary(scope));
        self.tables.push(TableSlot::File(file));
        previous
    }

    pub(crate) fn leave_file(&mut self, previous: FileId) {
        self.tables.pop();
        self.contexts.pop();
        self.file = previous;
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Create an entity for `ident` owned by the current scope.
    pub(crate) fn new_entity(&mut self, ident: &Ident, flags: EntityFlags) -> EntityId {
        if ident.is_anonymous() {
            return EntityId::ANONYMOUS;
        }
        let entity = Entity::new(ident.name.clone(), ident.span, flags).in_scope(self.scope());
        let id = self.program.entities.alloc(entity);
        self.record_entity(ident, id);
        id
    }

    /// Bind an entity's name in `scope`, returning the colliding member.
    ///
    /// The anonymous name binds nothing. Importing the same file twice under
    /// one name is not a collision.
    pub(crate) fn bind(&mut self, scope: ScopeId, entity: EntityId, owned: bool) -> Result<(), Member> {
        if entity == EntityId::ANONYMOUS {
            return Ok(());
        }
        let name = self.entity(entity).name.clone();
        match self.program.scopes.insert(scope, &name, entity, owned) {
            Ok(()) => Ok(()),
            Err(existing) if existing.entity == entity => Ok(()),
            Err(existing) => {
                let old = self.entity(existing.entity);
                let new = self.entity(entity);
                let same_file = old.is(EntityFlags::FILE)
                    && new.is(EntityFlags::FILE)
                    && old.member_scope == new.member_scope;
                if same_file { Ok(()) } else { Err(existing) }
            }
        }
    }

    /// Declare an entity in its owning scope, reporting a redeclaration.
    pub(crate) fn declare(&mut self, entity: EntityId) {
        if entity == EntityId::ANONYMOUS {
            return;
        }
        let scope = self.entity(entity).owning_scope.unwrap_or_else(|| self.scope());
        if let Err(existing) = self.bind(scope, entity, true) {
            let previous = self.entity(existing.entity).span;
            let (name, span) = {
                let e = self.entity(entity);
                (e.name.clone(), e.span)
            };
            self.report(CheckError::Redeclaration {
                name,
                span,
                previous,
            });
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<EntityId> {
        self.program.scopes.lookup(self.scope(), name)
    }

    /// Give an entity its type (and value), marking it checked.
    pub(crate) fn resolve_entity(&mut self, entity: EntityId, ty: TypeId, constant: Option<ConstValue>) {
        if entity == EntityId::ANONYMOUS {
            return;
        }
        let e = self.entity_mut(entity);
        e.ty = Some(ty);
        e.constant = constant;
        e.flags |= EntityFlags::CHECKED;
    }

    // ========================================================================
    // On-demand checking
    // ========================================================================

    /// The declaration node a file-scope entity came from.
    pub(crate) fn declaration(&self, decl: DeclRef) -> Option<(&'a Declaration, Option<&'a DeclBlock>)> {
        let item = self.source(decl.file).items.get(decl.item as usize)?;
        match (item, decl.member) {
            (Item::Decl(d), None) => Some((d, None)),
            (Item::DeclBlock(block), Some(member)) => {
                Some((block.decls.get(member as usize)?, Some(block)))
            }
            _ => None,
        }
    }

    /// Check a file-scope declaration unless it is checked or in progress.
    pub(crate) fn check_top_level(&mut self, decl: DeclRef) {
        let Some((node, block)) = self.declaration(decl) else {
            return;
        };
        if !self.table_mut().checked.insert(node.id) {
            return;
        }
        self.check_declaration(node, block);
    }

    /// The type of an entity, checking its declaration first if needed.
    ///
    /// `None` means the declaration is being checked right now: the entity
    /// was reached through its own initializer.
    pub(crate) fn ensure_checked(&mut self, entity: EntityId) -> Option<TypeId> {
        if let Some(ty) = self.entity(entity).ty {
            return Some(ty);
        }
        let decl = self.entity(entity).decl?;
        trace!(name = %self.entity(entity).name, "checking declaration on demand");

        let previous = self.enter_file(decl.file);
        let saved_declaring = self.declaring.take();
        self.check_top_level(decl);
        self.declaring = saved_declaring;
        self.leave_file(previous);

        self.entity(entity).ty
    }

    /// Report a reference to an entity whose declaration depends on itself.
    pub(crate) fn report_cycle(&mut self, ident: &Ident) {
        self.report(CheckError::CyclicDeclaration {
            name: ident.name.clone(),
            span: ident.span,
        });
    }

    /// Name of the function being checked, for messages.
    pub(crate) fn function_name(&self) -> String {
        match self.contexts.nearest_function() {
            Some(entity) => self.entity(entity).name.clone(),
            None => "function literal".to_string(),
        }
    }
}
