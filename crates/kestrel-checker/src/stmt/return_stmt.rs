//! Return statements.

use kestrel_ast::ReturnStmt;
use kestrel_core::CheckError;

use crate::checker::Checker;

impl Checker<'_> {
    /// Check results positionally against the enclosing function's result
    /// tuple. A count mismatch is reported once; the values that do have a
    /// slot are still converted to it.
    pub(crate) fn check_return(&mut self, ret: &ReturnStmt) {
        let Some(expected) = self.contexts.nearest_expected_return() else {
            self.report(CheckError::ReturnOutsideFunction { span: ret.span });
            for result in &ret.results {
                self.check_expr(result, None);
            }
            return;
        };

        if self.types().is_void(expected) {
            if let Some(first) = ret.results.first() {
                self.report(CheckError::VoidReturnsValue { span: first.span() });
                for result in &ret.results {
                    self.check_expr(result, None);
                }
            }
            return;
        }

        let elems = self.types().tuple_elems(expected);
        if ret.results.len() < elems.len() {
            self.report(CheckError::NotEnoughReturnValues { span: ret.span });
        } else if ret.results.len() > elems.len() {
            self.report(CheckError::TooManyReturnValues { span: ret.span });
        }

        for (i, result) in ret.results.iter().enumerate() {
            match elems.get(i) {
                Some(ty) => {
                    self.check_converted(result, *ty);
                }
                None => {
                    self.check_expr(result, None);
                }
            }
        }
    }
}
