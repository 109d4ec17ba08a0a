use kestrel_ast::DeferStmt;

use crate::checker::Checker;
use crate::scope::ScopeKind;

impl Checker<'_> {
    /// The deferred statement runs at scope exit; declarations it makes are
    /// local to it.
    pub(crate) fn check_defer(&mut self, defer: &DeferStmt) {
        self.push_scope(ScopeKind::Block);
        self.check_stmt(&defer.stmt);
        self.pop_context();
    }
}
