//! `for` loops, both the three-clause form and `for x, i in aggregate`.

use kestrel_ast::{ForInStmt, ForStmt, Ident};
use kestrel_core::{CheckError, EntityId, TypeId, TypeKind};

use crate::checker::Checker;
use crate::entity::EntityFlags;
use crate::scope::ScopeKind;
use crate::table::{Aggregate, ForInInfo};

impl Checker<'_> {
    pub(crate) fn check_for(&mut self, stmt: &ForStmt) {
        self.push_scope(ScopeKind::Block);
        let label = self.new_label(stmt.id, stmt.label.as_ref(), true);

        if let Some(init) = &stmt.init {
            self.check_stmt(init);
        }
        if let Some(cond) = &stmt.cond {
            self.check_condition(cond, "for statement");
        }
        if let Some(step) = &stmt.step {
            self.check_stmt(step);
        }

        self.enter_loop(label);
        self.check_block(&stmt.body);
        self.pop_context();
    }

    pub(crate) fn check_for_in(&mut self, stmt: &ForInStmt) {
        let operand = self.check_value(&stmt.aggregate, None);
        let iterated = if operand.is_invalid() {
            None
        } else {
            let iterated = match self.types().base_kind(operand.ty) {
                TypeKind::Array { elem, .. } => Some((*elem, Aggregate::Array)),
                TypeKind::Slice(elem) => Some((*elem, Aggregate::Slice)),
                TypeKind::String => Some((TypeId::U8, Aggregate::String)),
                _ => None,
            };
            if iterated.is_none() {
                self.report(CheckError::CannotRange {
                    operand: self.describe(&stmt.aggregate, &operand),
                    span: stmt.aggregate.span(),
                });
            }
            iterated
        };
        let (elem, aggregate) = iterated.unwrap_or((TypeId::INVALID, Aggregate::Array));

        self.push_scope(ScopeKind::Block);
        let label = self.new_label(stmt.id, stmt.label.as_ref(), true);

        let mut names = stmt.names.iter();
        let element = match names.next() {
            Some(ident) => self.loop_variable(ident, elem),
            None => EntityId::ANONYMOUS,
        };
        let index = names.next().map(|ident| self.loop_variable(ident, TypeId::I64));

        if iterated.is_some() {
            self.table_mut().for_in.insert(
                stmt.id,
                ForInInfo {
                    element,
                    index,
                    aggregate,
                },
            );
        }

        self.enter_loop(label);
        self.check_block(&stmt.body);
        self.pop_context();
    }

    fn loop_variable(&mut self, ident: &Ident, ty: TypeId) -> EntityId {
        let entity = self.new_entity(ident, EntityFlags::VARIABLE);
        self.resolve_entity(entity, ty, None);
        self.declare(entity);
        entity
    }

    /// Make `label` the target of unlabelled `break` and `continue`.
    fn enter_loop(&mut self, label: EntityId) {
        let frame = self.contexts.top_mut();
        frame.loop_break = Some(label);
        frame.loop_continue = Some(label);
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::{AstBuilder, BinaryOp};
    use kestrel_core::{FileId, TypeId};

    use crate::testing::check_source;

    #[test]
    fn counting_loop() {
        let mut b = AstBuilder::new(FileId(0));
        let zero = b.int(0);
        let init = b.var("i", None, Some(zero));
        let i = b.name("i");
        let ten = b.int(10);
        let cond = b.binary(BinaryOp::Less, i, ten);
        let i = b.name("i");
        let one = b.int(1);
        let step = b.compound_assign(BinaryOp::Add, i, one);
        let cont = b.cont(None);
        let body = b.for_stmt(Some(init), Some(cond), Some(step), vec![cont]);
        let func = b.func(vec![], vec![], vec![body]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
    }

    #[test]
    fn condition_must_be_boolean() {
        let mut b = AstBuilder::new(FileId(0));
        let one = b.int(1);
        let body = b.for_stmt(None, Some(one), None, vec![]);
        let func = b.func(vec![], vec![], vec![body]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("used in for statement"));
    }

    #[test]
    fn ranging_over_a_string_yields_bytes() {
        let mut b = AstBuilder::new(FileId(0));
        let text = b.string("abc");
        let c = b.name("c");
        let i = b.name("i");
        let byte = b.var("byte", None, Some(c));
        let index = b.var("at", None, Some(i));
        let body = b.for_in(&["c", "i"], text, vec![byte, index]);
        let func = b.func(vec![], vec![], vec![body]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        let table = program.table(FileId(0));
        let info = table.for_in.values().next().copied();
        let info = info.expect("for-in was recorded");
        assert_eq!(program.entity(info.element).ty, Some(TypeId::U8));
        assert_eq!(info.index.and_then(|i| program.entity(i).ty), Some(TypeId::I64));
    }

    #[test]
    fn cannot_range_over_integers() {
        let mut b = AstBuilder::new(FileId(0));
        let five = b.int(5);
        let body = b.for_in(&["x"], five, vec![]);
        let func = b.func(vec![], vec![], vec![body]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("cannot range over"));
    }
}
