//! `if` and the compile-time `#if`.

use kestrel_ast::{DirectiveIf, IfStmt};
use kestrel_core::{CheckError, TypeId};

use crate::checker::Checker;

impl Checker<'_> {
    pub(crate) fn check_if(&mut self, stmt: &IfStmt) {
        self.check_condition(&stmt.cond, "if statement");
        self.check_stmt(&stmt.body);
        if let Some(els) = &stmt.els {
            self.check_stmt(els);
        }
    }

    /// Only the branch selected by the constant condition is checked; the
    /// other may refer to declarations that do not exist on this target.
    pub(crate) fn check_directive_if(&mut self, stmt: &DirectiveIf) {
        let operand = self.check_value(&stmt.cond, Some(TypeId::BOOL));
        if operand.is_invalid() {
            return;
        }
        if !self.types().is_bool(operand.ty) {
            self.report(CheckError::InvalidCondition {
                operand: self.describe(&stmt.cond, &operand),
                construct: "#if".to_string(),
                span: stmt.cond.span(),
            });
            return;
        }
        let Some(taken) = operand.constant.as_ref().and_then(|c| c.as_bool()) else {
            self.report(CheckError::NotConstant {
                what: "#if condition".to_string(),
                span: stmt.cond.span(),
            });
            return;
        };

        self.table_mut().directives.insert(stmt.id, taken);
        if taken {
            self.check_block(&stmt.body);
        } else if let Some(els) = &stmt.els {
            self.check_stmt(els);
        }
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::AstBuilder;
    use kestrel_core::FileId;

    use crate::testing::check_source;

    #[test]
    fn if_condition_must_be_boolean() {
        let mut b = AstBuilder::new(FileId(0));
        let text = b.string("yes");
        let stmt = b.if_stmt(text, vec![], None);
        let func = b.func(vec![], vec![], vec![stmt]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(program.diagnostics(FileId(0)).contains("used in if statement"));
    }

    #[test]
    fn directive_if_skips_the_untaken_branch() {
        let mut b = AstBuilder::new(FileId(0));
        let cond = b.name("false");
        let missing = b.name("does_not_exist");
        let dead = b.var("x", None, Some(missing));
        let one = b.int(1);
        let live = b.var("y", None, Some(one));
        let stmt = b.directive_if(cond, vec![dead], Some(vec![live]));
        let stmt_id = stmt.id();
        let func = b.func(vec![], vec![], vec![stmt]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        assert_eq!(program.table(FileId(0)).directives.get(&stmt_id), Some(&false));
    }

    #[test]
    fn directive_if_needs_a_constant() {
        let mut b = AstBuilder::new(FileId(0));
        let truth = b.name("true");
        let decl = b.var("flag", None, Some(truth));
        let cond = b.name("flag");
        let stmt = b.directive_if(cond, vec![], None);
        let func = b.func(vec![], vec![], vec![decl, stmt]);
        let item = b.const_item("main", func);
        let file = b.finish("main.k", vec![item]);

        let (program, _) = check_source(vec![file]);
        assert_eq!(
            program.diagnostics(FileId(0)).messages(),
            vec!["#if condition must be a compile-time constant"]
        );
    }
}
