//! `break`, `continue` and `fallthrough`.

use kestrel_ast::{BranchKind, BranchStmt, Ident};
use kestrel_core::{CheckError, EntityId};

use crate::checker::Checker;
use crate::entity::EntityFlags;

impl Checker<'_> {
    pub(crate) fn check_branch(&mut self, branch: &BranchStmt) {
        let target = match (branch.kind, &branch.label) {
            (BranchKind::Fallthrough, _) => {
                let next = self.contexts.nearest_next_case();
                if next.is_none() {
                    self.report(CheckError::FallthroughWithoutCase { span: branch.span });
                }
                next
            }
            (kind, Some(label)) => self.resolve_label(kind, label),
            (BranchKind::Break, None) => {
                let target = self.contexts.nearest_break();
                if target.is_none() {
                    self.report(CheckError::BreakOutsideLoop { span: branch.span });
                }
                target
            }
            (BranchKind::Continue, None) => {
                let target = self.contexts.nearest_continue();
                if target.is_none() {
                    self.report(CheckError::ContinueOutsideLoop { span: branch.span });
                }
                target
            }
        };
        if let Some(target) = target {
            self.table_mut().branch_targets.insert(branch.id, target);
        }
    }

    /// Resolve `break name` or `continue name`.
    fn resolve_label(&mut self, kind: BranchKind, label: &Ident) -> Option<EntityId> {
        let entity = self
            .lookup(&label.name)
            .filter(|entity| self.entity(*entity).is(EntityFlags::LABEL))
            .filter(|entity| self.contexts.is_visible_target(*entity));
        let Some(entity) = entity else {
            self.report(CheckError::NotALabel {
                name: label.name.clone(),
                span: label.span,
            });
            return None;
        };
        self.record_entity(label, entity);

        if kind == BranchKind::Continue && !self.entity(entity).is(EntityFlags::LOOP_LABEL) {
            self.report(CheckError::ContinueOutsideLoop { span: label.span });
            return None;
        }
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::AstBuilder;
    use kestrel_core::FileId;

    use crate::testing::check_source;

    #[test]
    fn branches_outside_loops() {
        let mut b = AstBuilder::new(FileId(0));
        let brk = b.brk(None);
        let cont = b.cont(None);
        let fall = b.fallthrough();
        let func = b.func(vec![], vec![], vec![brk, cont, fall]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert_eq!(
            program.diagnostics(FileId(0)).messages(),
            vec![
                "break outside of a loop or switch",
                "continue outside of a loop",
                "fallthrough has no following case to transfer control to",
            ]
        );
    }

    #[test]
    fn labelled_break_leaves_outer_loop() {
        let mut b = AstBuilder::new(FileId(0));
        let brk = b.brk(Some("outer"));
        let inner = b.for_stmt(None, None, None, vec![brk]);
        let outer = b.for_stmt(None, None, None, vec![inner]);
        let outer = b.labeled("outer", outer);
        let func = b.func(vec![], vec![], vec![outer]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
    }

    #[test]
    fn labels_do_not_cross_function_literals() {
        let mut b = AstBuilder::new(FileId(0));
        let brk = b.brk(Some("outer"));
        let inner = b.func(vec![], vec![], vec![brk]);
        let decl = b.constant("inner", inner);
        let outer = b.for_stmt(None, None, None, vec![decl]);
        let outer = b.labeled("outer", outer);
        let func = b.func(vec![], vec![], vec![outer]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("'outer' is not a label"));
    }
}
