//! Statement checking.
//!
//! [`Checker::check_stmt`] dispatches on the statement kind. Block-scoped
//! constructs push a context of their own:
//! - blocks, loop bodies, if branches and case clauses open a block scope
//! - loops and switches also install their break (and continue) label
//! - case clauses record the label `fallthrough` transfers to
//!
//! Labels are entities like any other, so a labelled `break` resolves by
//! ordinary scope lookup and the result is recorded against the branch.

mod assign;
mod branch;
pub(crate) mod decl;
mod defer;
mod for_stmt;
mod if_stmt;
mod return_stmt;
mod switch_stmt;
pub(crate) mod using;

use kestrel_ast::{Block, Expr, ExprStmt, Ident, Stmt};
use kestrel_core::{CheckError, EntityId, FnFlags, NodeId, Span, TypeId};

use crate::checker::Checker;
use crate::entity::{Entity, EntityFlags};
use crate::scope::ScopeKind;
use crate::table::Labels;

impl Checker<'_> {
    /// Check a statement in the current scope.
    pub fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Empty(_) => {}
            Stmt::Expr(stmt) => self.check_expr_stmt(stmt),
            Stmt::Decl(decl) => self.check_declaration(decl, None),
            Stmt::DeclBlock(block) => self.check_decl_block(block),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Block(block) => self.check_block(block),
            Stmt::Using(using) => self.check_using(using),
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Defer(defer) => self.check_defer(defer),
            Stmt::For(stmt) => self.check_for(stmt),
            Stmt::ForIn(stmt) => self.check_for_in(stmt),
            Stmt::If(stmt) => self.check_if(stmt),
            Stmt::DirectiveIf(stmt) => self.check_directive_if(stmt),
            Stmt::Switch(switch) => self.check_switch(switch),
            Stmt::Branch(branch) => self.check_branch(branch),
        }
    }

    /// Check a block in a scope of its own.
    pub fn check_block(&mut self, block: &Block) {
        self.push_scope(ScopeKind::Block);
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.pop_context();
    }

    /// An expression evaluated for its effect.
    ///
    /// Only calls may stand alone, and only when they return nothing or
    /// their function is `#discardable`.
    fn check_expr_stmt(&mut self, stmt: &ExprStmt) {
        let operand = self.check_expr(&stmt.expr, None);
        if operand.is_invalid() {
            return;
        }
        let used = match stmt.expr.unparen() {
            Expr::Call(call) => {
                self.types().is_void(operand.ty)
                    || self
                        .table()
                        .type_of(call.callee.id())
                        .and_then(|callee| self.types().signature(callee))
                        .is_some_and(|sig| sig.flags.contains(FnFlags::DISCARDABLE))
            }
            _ => false,
        };
        if !used {
            self.report(CheckError::UnusedExpression { span: stmt.span });
        }
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Create the label of a loop or switch and record it against `node`.
    ///
    /// A named label is declared in the current scope; an unnamed one only
    /// exists as a branch target.
    pub(crate) fn new_label(&mut self, node: NodeId, label: Option<&Ident>, is_loop: bool) -> EntityId {
        let mut flags = EntityFlags::LABEL | EntityFlags::CHECKED;
        if is_loop {
            flags |= EntityFlags::LOOP_LABEL;
        }
        let entity = match label {
            Some(ident) => {
                let entity = self.new_entity(ident, flags);
                self.declare(entity);
                entity
            }
            None => self.anonymous_label(flags, Span::default()),
        };
        if entity != EntityId::ANONYMOUS {
            self.entity_mut(entity).ty = Some(TypeId::VOID);
        }
        self.table_mut().labels.insert(
            node,
            Labels {
                break_label: entity,
                continue_label: is_loop.then_some(entity),
            },
        );
        entity
    }

    /// A label entity that no scope binds.
    pub(crate) fn anonymous_label(&mut self, flags: EntityFlags, span: Span) -> EntityId {
        let entity = Entity::new("", span, flags)
            .in_scope(self.scope())
            .with_type(TypeId::VOID);
        self.program.entities.alloc(entity)
    }
}
