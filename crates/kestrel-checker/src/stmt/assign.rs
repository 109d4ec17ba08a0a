//! Assignment: `a, b = x, y`, `a, b = f()` and `a op= x`.

use kestrel_ast::{AssignStmt, BinaryOp, Expr};
use kestrel_core::{CheckError, TypeId};

use crate::checker::Checker;
use crate::conversion::identical_underlying;
use crate::expr::operator_applies;
use crate::operand::Operand;

impl Checker<'_> {
    pub(crate) fn check_assign(&mut self, assign: &AssignStmt) {
        if let Some(op) = assign.op {
            self.check_compound_assign(assign, op);
            return;
        }

        let targets: Vec<Option<TypeId>> = assign.lhs.iter().map(|lhs| self.check_target(lhs)).collect();

        if assign.lhs.len() == assign.rhs.len() {
            for (target, value) in targets.iter().zip(&assign.rhs) {
                match target {
                    Some(ty) if !ty.is_invalid() => {
                        self.check_converted(value, *ty);
                    }
                    _ => {
                        let mut operand = self.check_value(value, None);
                        self.default_operand(&mut operand, value);
                    }
                }
            }
            return;
        }

        if let [value] = assign.rhs.as_slice() {
            let operand = self.check_value(value, None);
            if operand.is_invalid() {
                return;
            }
            let elems = self.types().tuple_elems(operand.ty);
            if elems.len() != targets.len() {
                self.report(CheckError::AssignmentArity {
                    targets: targets.len(),
                    values: elems.len(),
                    span: assign.span,
                });
                return;
            }
            for (target, elem) in targets.into_iter().zip(elems) {
                let Some(ty) = target else { continue };
                if ty.is_invalid() || elem == ty || identical_underlying(self.types(), elem, ty) {
                    continue;
                }
                self.report(CheckError::CannotConvert {
                    value: format!("'{value}' (type {})", self.display(elem)),
                    target: self.display(ty),
                    span: value.span(),
                });
            }
            return;
        }

        self.report(CheckError::AssignmentArity {
            targets: assign.lhs.len(),
            values: assign.rhs.len(),
            span: assign.span,
        });
        for value in &assign.rhs {
            self.check_expr(value, None);
        }
    }

    /// Check the left side of an assignment.
    ///
    /// Returns the type values convert to, `None` for the blank `_`, or
    /// `INVALID` when the target is not assignable.
    fn check_target(&mut self, lhs: &Expr) -> Option<TypeId> {
        if lhs.as_ident().is_some_and(|ident| ident.is_anonymous()) {
            return None;
        }
        let operand = self.check_expr(lhs, None);
        if operand.is_invalid() {
            return Some(TypeId::INVALID);
        }
        if !operand.is_assignable() {
            self.report(CheckError::CannotAssign {
                target: self.describe(lhs, &operand),
                span: lhs.span(),
            });
            return Some(TypeId::INVALID);
        }
        Some(operand.ty)
    }

    fn check_compound_assign(&mut self, assign: &AssignStmt, op: BinaryOp) {
        let ([lhs], [rhs]) = (assign.lhs.as_slice(), assign.rhs.as_slice()) else {
            self.report(CheckError::AssignmentArity {
                targets: assign.lhs.len(),
                values: assign.rhs.len(),
                span: assign.span,
            });
            return;
        };

        let Some(target) = self.check_target(lhs) else {
            self.report(CheckError::CannotAssign {
                target: format!("'{lhs}'"),
                span: lhs.span(),
            });
            self.check_expr(rhs, None);
            return;
        };
        if target.is_invalid() {
            self.check_expr(rhs, None);
            return;
        }

        if op.is_comparison() || op.is_logical() || !operator_applies(self.types(), op, target) {
            let operand = Operand::computed(target);
            self.report(CheckError::OperatorUndefined {
                op: format!("{op}="),
                operand: self.describe(lhs, &operand),
                span: assign.span,
            });
            self.check_expr(rhs, None);
            return;
        }

        let value = match op {
            // the shift amount keeps its own integer type
            BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
                let mut value = self.check_value(rhs, None);
                if !value.is_invalid() && !self.types().is_integer(value.ty) {
                    self.report(CheckError::OperatorUndefined {
                        op: format!("{op}="),
                        operand: self.describe(rhs, &value),
                        span: rhs.span(),
                    });
                    return;
                }
                self.default_operand(&mut value, rhs);
                value
            }
            _ => self.check_converted(rhs, target),
        };

        if op.is_division() && value.constant.as_ref().is_some_and(|c| c.is_zero()) {
            self.report(CheckError::DivisionByZero { span: rhs.span() });
        }
    }
}
