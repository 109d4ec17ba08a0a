//! Call expressions.
//!
//! A call is one of:
//! - a builtin call form with a custom check
//! - a type conversion `T(x)`, or `Pair(i32, f64)` for a polymorphic struct
//! - a call of a polymorphic function, routed to a specialization
//! - an ordinary call through a function value

use kestrel_ast::{CallExpr, Expr};
use kestrel_core::{CheckError, EntityId, FnFlags, TypeId};

use crate::checker::Checker;
use crate::entity::EntityFlags;
use crate::operand::{Mode, Operand};
use crate::specialization::GenericId;
use crate::table::{CallKind, SelectorKind};

use super::cast::convert_explicit;

/// What the arguments of a call are matched against.
#[derive(Debug, Clone)]
pub(crate) struct CallTarget {
    pub name: String,
    pub params: Vec<TypeId>,
    pub labels: Vec<Option<String>>,
    pub flags: FnFlags,
}

pub(super) fn check_call(checker: &mut Checker<'_>, call: &CallExpr) -> Operand {
    if let Some(result) = check_custom_builtin(checker, call) {
        return result;
    }

    let callee = checker.check_expr(&call.callee, None);
    if callee.is_invalid() {
        for arg in &call.args {
            checker.check_expr(&arg.value, None);
        }
        return Operand::invalid();
    }
    if callee.mode == Mode::Type {
        return check_type_call(checker, call, &callee);
    }
    if callee.mode == Mode::File || callee.is_nil() {
        return cannot_call(checker, call, &callee);
    }

    let Some(sig) = checker.types().signature(callee.ty).cloned() else {
        return cannot_call(checker, call, &callee);
    };

    if sig.flags.contains(FnFlags::POLYMORPHIC) {
        let Some(generic) = generic_of(checker, &call.callee) else {
            checker.report(CheckError::IndirectPolymorphicCall {
                callee: checker.describe(&call.callee, &callee),
                span: call.callee.span(),
            });
            for arg in &call.args {
                checker.check_expr(&arg.value, None);
            }
            return Operand::invalid();
        };
        return check_specialized_call(checker, call, generic, &callee);
    }

    let callee_entity = callee_entity(checker, &call.callee);
    let target = CallTarget {
        name: format!("'{}'", call.callee),
        params: sig.params.clone(),
        labels: callee_entity
            .and_then(|e| checker.program.function_labels.get(&e).cloned())
            .unwrap_or_default(),
        flags: sig.flags,
    };
    let pending = vec![None; call.args.len()];
    let Some(args) = checker.check_call_arguments(call, &target, pending) else {
        return Operand::invalid();
    };

    let kind = match callee_entity.and_then(|e| checker.program.builtin_entities.get(&e).copied()) {
        Some(builtin) => CallKind::Builtin(builtin),
        None => CallKind::Call,
    };
    checker.table_mut().calls.insert(call.id, kind);

    let mut result = Operand::computed(checker.types().splat(sig.result));
    result.absorb(&callee);
    for arg in &args {
        result.absorb(arg);
    }
    result
}

fn cannot_call(checker: &mut Checker<'_>, call: &CallExpr, callee: &Operand) -> Operand {
    checker.report(CheckError::CannotCall {
        callee: checker.describe(&call.callee, callee),
        span: call.span,
    });
    for arg in &call.args {
        checker.check_expr(&arg.value, None);
    }
    Operand::invalid()
}

/// Run the custom check of a builtin call form, if the callee names one.
fn check_custom_builtin(checker: &mut Checker<'_>, call: &CallExpr) -> Option<Operand> {
    let Expr::Ident(ident) = call.callee.unparen() else {
        return None;
    };
    let entity = checker.lookup(&ident.name)?;
    if !checker.entity(entity).is(EntityFlags::BUILTIN) {
        return None;
    }
    let id = checker.program.builtin_entities.get(&entity).copied()?;
    let check = checker.program.builtins[id.0 as usize].check?;

    checker.record_entity(ident, entity);
    let result = check(checker, call);
    checker.table_mut().calls.insert(call.id, CallKind::Builtin(id));
    Some(result)
}

/// The entity a callee expression names directly, if any.
pub(crate) fn callee_entity(checker: &Checker<'_>, callee: &Expr) -> Option<EntityId> {
    match callee.unparen() {
        Expr::Ident(ident) => checker.table().entity_of(ident.id),
        Expr::Selector(selector) => match checker.table().selector_kind(selector.id) {
            Some(SelectorKind::File(entity)) => Some(entity),
            _ => None,
        },
        _ => None,
    }
}

/// The polymorphic function a callee refers to.
fn generic_of(checker: &Checker<'_>, callee: &Expr) -> Option<GenericId> {
    if let Expr::Func(func) = callee.unparen() {
        return checker.table().generics.get(&func.id).copied();
    }
    let entity = callee_entity(checker, callee)?;
    checker.program.generic_entities.get(&entity).copied()
}

fn check_specialized_call(checker: &mut Checker<'_>, call: &CallExpr, generic: GenericId, callee: &Operand) -> Operand {
    // arguments are typed bottom-up so they can bind placeholders
    let checked: Vec<Operand> = call
        .args
        .iter()
        .map(|arg| checker.check_expr_argument(&arg.value))
        .collect();
    if checked.iter().any(|arg| arg.is_invalid() && !arg.is_nil()) {
        return Operand::invalid();
    }

    let Some(specialization) = checker.specialize(generic, call, &checked) else {
        return Operand::invalid();
    };
    let header = &checker.program.specializations[specialization.0 as usize];
    let fn_type = header.fn_type;
    let Some(sig) = checker.types().signature(fn_type).cloned() else {
        unreachable!("specialization of a non-function type");
    };

    let generic_def = &checker.program.generics[generic.0 as usize];
    let target = CallTarget {
        name: format!("'{}'", generic_def.name),
        params: sig.params.clone(),
        labels: generic_def.params.iter().map(|p| p.label.clone()).collect(),
        flags: sig.flags,
    };
    let pending = checked.into_iter().map(Some).collect();
    let Some(args) = checker.check_call_arguments(call, &target, pending) else {
        return Operand::invalid();
    };

    checker
        .table_mut()
        .calls
        .insert(call.id, CallKind::Specialized(specialization));
    let mut result = Operand::computed(checker.types().splat(sig.result));
    result.absorb(callee);
    for arg in &args {
        result.absorb(arg);
    }
    result
}

/// `T(x)` and polymorphic struct instantiation.
fn check_type_call(checker: &mut Checker<'_>, call: &CallExpr, callee: &Operand) -> Operand {
    let Some(target) = checker.types().lower_metatype(callee.ty) else {
        return cannot_call(checker, call, callee);
    };
    if checker.is_poly_struct(target) {
        return checker.instantiate_struct(call, target);
    }

    let [arg] = call.args.as_slice() else {
        let callee_name = format!("'{}'", call.callee);
        let error = if call.args.is_empty() {
            CheckError::NotEnoughArguments {
                callee: callee_name,
                span: call.span,
            }
        } else {
            CheckError::TooManyArguments {
                callee: callee_name,
                span: call.span,
            }
        };
        checker.report(error);
        for arg in &call.args {
            checker.check_expr(&arg.value, None);
        }
        return Operand::invalid();
    };
    let mut operand = checker.check_value(&arg.value, Some(target));
    if operand.is_invalid() && !operand.is_nil() {
        return Operand::invalid();
    }
    let Some(mut result) = convert_explicit(checker, &arg.value, call.id, call.span, &mut operand, target) else {
        return Operand::invalid();
    };
    result.absorb(&operand);
    result
}

impl Checker<'_> {
    /// Check an argument before the parameter it binds is known.
    fn check_expr_argument(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::Variadic(spread) if !spread.c_variadic => {
                let operand = self.check_value(&spread.explicit, None);
                self.record(expr.id(), &operand);
                operand
            }
            _ => self.check_value(expr, None),
        }
    }

    /// Match call arguments against parameters.
    ///
    /// `pending` holds arguments that were already checked; the rest are
    /// checked here against their parameter type. Excess arguments of a
    /// variadic function convert to the element of the variadic slice,
    /// except for C-style variadics, which only default. A trailing `..x`
    /// passes a slice as the variadic parameter itself.
    pub(crate) fn check_call_arguments(
        &mut self,
        call: &CallExpr,
        target: &CallTarget,
        pending: Vec<Option<Operand>>,
    ) -> Option<Vec<Operand>> {
        let variadic = target.flags.intersects(FnFlags::VARIADIC | FnFlags::C_VARIADIC);
        let fixed = if variadic {
            target.params.len().saturating_sub(1)
        } else {
            target.params.len()
        };

        let mut ok = true;
        if call.args.len() < fixed {
            self.report(CheckError::NotEnoughArguments {
                callee: target.name.clone(),
                span: call.span,
            });
            ok = false;
        } else if !variadic && call.args.len() > fixed {
            self.report(CheckError::TooManyArguments {
                callee: target.name.clone(),
                span: call.span,
            });
            ok = false;
        }

        for (i, arg) in call.args.iter().enumerate() {
            let (Some(label), Some(Some(expected))) = (&arg.label, target.labels.get(i)) else {
                continue;
            };
            if label.name != *expected {
                self.report(CheckError::ArgumentLabelMismatch {
                    expected: expected.clone(),
                    found: label.name.clone(),
                    span: label.span,
                });
                ok = false;
            }
        }

        let variadic_param = variadic.then(|| target.params.last().copied()).flatten();
        let mut args = Vec::with_capacity(call.args.len());
        for ((i, arg), checked) in call.args.iter().enumerate().zip(pending) {
            let operand = if i < fixed {
                let param = target.params.get(i).copied().unwrap_or(TypeId::INVALID);
                self.argument(&arg.value, param, checked)
            } else if let Some(slice) = variadic_param {
                self.variadic_argument(&arg.value, slice, target.flags, i + 1 == call.args.len(), checked)
            } else {
                match checked {
                    Some(operand) => operand,
                    None => self.check_value(&arg.value, None),
                }
            };
            ok &= !operand.is_invalid();
            args.push(operand);
        }
        ok.then_some(args)
    }

    fn argument(&mut self, expr: &Expr, param: TypeId, checked: Option<Operand>) -> Operand {
        match checked {
            Some(mut operand) => {
                self.convert(&mut operand, param, expr);
                operand
            }
            None => self.check_converted(expr, param),
        }
    }

    fn variadic_argument(
        &mut self,
        expr: &Expr,
        slice: TypeId,
        flags: FnFlags,
        last: bool,
        checked: Option<Operand>,
    ) -> Operand {
        if flags.contains(FnFlags::C_VARIADIC) {
            let mut operand = match checked {
                Some(operand) => operand,
                None => self.check_value(expr, None),
            };
            self.default_operand(&mut operand, expr);
            return operand;
        }
        if let Expr::Variadic(spread) = expr
            && last
            && !spread.c_variadic
        {
            let operand = match checked {
                Some(mut operand) => {
                    self.convert(&mut operand, slice, &spread.explicit);
                    operand
                }
                None => self.check_converted(&spread.explicit, slice),
            };
            self.record(expr.id(), &operand);
            return operand;
        }
        let elem = self.types().element(slice).unwrap_or(TypeId::INVALID);
        self.argument(expr, elem, checked)
    }
}
