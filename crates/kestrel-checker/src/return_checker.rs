//! Return path verification for functions with results.
//!
//! [`all_paths_return`] walks a function body structurally and decides
//! whether control can reach its end. Only the last statement of a block
//! matters; what it must look like depends on its kind:
//!
//! - `return` always terminates
//! - a block terminates if its own last statement does
//! - `if` and `#if` terminate when both branches do
//! - `switch` terminates when it has a default clause, every clause
//!   terminates (a clause ending in `fallthrough` defers to the next one)
//!   and no `break` leaves it
//! - `for` without a condition terminates when no `break` leaves it
//!
//! `defer` never terminates: the deferred statement runs on exit and does
//! not produce the function's results.

use kestrel_ast::{BranchKind, Stmt, SwitchStmt};

/// Whether every path through `stmts` ends in a `return`.
pub(crate) fn all_paths_return(stmts: &[Stmt]) -> bool {
    let Some(last) = stmts.iter().rev().find(|stmt| !matches!(stmt, Stmt::Empty(_))) else {
        return false;
    };
    terminates(last)
}

fn terminates(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Block(block) => all_paths_return(&block.stmts),
        Stmt::If(stmt) => match &stmt.els {
            Some(els) => terminates(&stmt.body) && terminates(els),
            None => false,
        },
        Stmt::DirectiveIf(stmt) => match &stmt.els {
            Some(els) => all_paths_return(&stmt.body.stmts) && terminates(els),
            None => false,
        },
        Stmt::Switch(switch) => switch_terminates(switch),
        Stmt::For(stmt) => {
            let label = stmt.label.as_ref().map(|l| l.name.as_str());
            stmt.cond.is_none() && !breaks_out(&stmt.body.stmts, label)
        }
        _ => false,
    }
}

fn switch_terminates(switch: &SwitchStmt) -> bool {
    if !switch.cases.iter().any(|case| case.is_default()) {
        return false;
    }
    let label = switch.label.as_ref().map(|l| l.name.as_str());
    let count = switch.cases.len();
    switch.cases.iter().enumerate().all(|(i, case)| {
        let stmts = &case.block.stmts;
        if breaks_out(stmts, label) {
            return false;
        }
        let last = stmts.iter().rev().find(|stmt| !matches!(stmt, Stmt::Empty(_)));
        match last {
            Some(Stmt::Branch(branch)) if branch.kind == BranchKind::Fallthrough => i + 1 < count,
            _ => all_paths_return(stmts),
        }
    })
}

/// Whether a `break` in `stmts` leaves the construct labelled `label`.
///
/// Unlabelled breaks inside nested loops and switches belong to those.
fn breaks_out(stmts: &[Stmt], label: Option<&str>) -> bool {
    stmts.iter().any(|stmt| stmt_breaks_out(stmt, label, true))
}

fn stmt_breaks_out(stmt: &Stmt, label: Option<&str>, direct: bool) -> bool {
    let nested = |stmts: &[Stmt], direct: bool| stmts.iter().any(|s| stmt_breaks_out(s, label, direct));
    match stmt {
        Stmt::Branch(branch) if branch.kind == BranchKind::Break => match (&branch.label, label) {
            (None, _) => direct,
            (Some(target), Some(label)) => target.name == label,
            (Some(_), None) => false,
        },
        Stmt::Block(block) => nested(&block.stmts, direct),
        Stmt::If(stmt) => {
            stmt_breaks_out(&stmt.body, label, direct)
                || stmt.els.as_ref().is_some_and(|els| stmt_breaks_out(els, label, direct))
        }
        Stmt::DirectiveIf(stmt) => {
            nested(&stmt.body.stmts, direct)
                || stmt.els.as_ref().is_some_and(|els| stmt_breaks_out(els, label, direct))
        }
        Stmt::For(stmt) => nested(&stmt.body.stmts, false),
        Stmt::ForIn(stmt) => nested(&stmt.body.stmts, false),
        Stmt::Switch(switch) => switch.cases.iter().any(|case| nested(&case.block.stmts, false)),
        _ => false,
    }
}
