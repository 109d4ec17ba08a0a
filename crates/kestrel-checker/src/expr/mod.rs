//! Expression checking.
//!
//! [`Checker::check_expr`] dispatches on the node kind, records the
//! resulting type and value against the node and returns an [`Operand`].
//! The optional `desired` type flows top-down into literals that cannot
//! type themselves (`nil`, untyped composite literals, `autocast`); every
//! other expression is typed bottom-up and converted by its consumer.

mod binary;
pub(crate) mod call;
mod cast;
mod composite;
pub(crate) mod func;
mod ident;
mod literals;
mod selector;
mod subscript;
mod ternary;
pub(crate) mod types;
mod unary;

use kestrel_ast::Expr;
use kestrel_core::{CheckError, TypeId};

use crate::checker::Checker;
use crate::operand::{Mode, Operand};

pub(crate) use binary::operator_applies;

impl Checker<'_> {
    /// Check an expression and record its type and value.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_expr(&mut self, expr: &Expr, desired: Option<TypeId>) -> Operand {
        let operand = match expr {
            Expr::Nil(_) => Operand::nil(),
            Expr::Ident(ident) => ident::check_ident(self, ident),
            Expr::Lit(lit) => literals::check_basic_lit(self, lit),
            Expr::Location(location) => literals::check_location(self, location),
            Expr::Composite(lit) => composite::check_composite(self, lit, desired),
            Expr::Func(func) => func::check_func_lit(self, func),
            Expr::FuncType(ft) => func::check_func_type(self, ft),
            Expr::PolyType(poly) => types::check_poly_type(self, poly),
            Expr::Variadic(variadic) => types::check_variadic(self, variadic),
            Expr::Pointer(pointer) => types::check_pointer_type(self, pointer),
            Expr::Array(array) => types::check_array_type(self, array),
            Expr::SliceType(slice) => types::check_slice_type(self, slice),
            Expr::Vector(vector) => types::check_vector_type(self, vector),
            Expr::Struct(st) => types::check_struct(self, st),
            Expr::Union(union) => types::check_union(self, union),
            Expr::Enum(en) => types::check_enum(self, en),
            Expr::Paren(paren) => self.check_expr(&paren.inner, desired),
            Expr::Unary(unary) => unary::check_unary(self, unary, desired),
            Expr::Binary(binary) => binary::check_binary(self, binary),
            Expr::Ternary(ternary) => ternary::check_ternary(self, ternary, desired),
            Expr::Selector(selector) => selector::check_selector(self, selector),
            Expr::Subscript(subscript) => subscript::check_subscript(self, subscript),
            Expr::Slice(slice) => subscript::check_slice(self, slice),
            Expr::Call(call) => call::check_call(self, call),
            Expr::Cast(cast) => cast::check_cast(self, cast, desired),
        };
        self.record(expr.id(), &operand);
        operand
    }

    /// Check an expression used as a value.
    ///
    /// Types, imports and void results are rejected.
    pub fn check_value(&mut self, expr: &Expr, desired: Option<TypeId>) -> Operand {
        let operand = self.check_expr(expr, desired);
        match operand.mode {
            Mode::Type | Mode::File => {
                self.report(CheckError::NotAnExpression {
                    expr: format!("'{expr}'"),
                    span: expr.span(),
                });
                Operand::invalid()
            }
            _ if !operand.is_invalid() && self.types().is_void(operand.ty) => {
                self.report(CheckError::VoidValue { span: expr.span() });
                Operand::invalid()
            }
            _ => operand,
        }
    }

    /// Check a value and convert it to `target`.
    pub fn check_converted(&mut self, expr: &Expr, target: TypeId) -> Operand {
        let mut operand = self.check_value(expr, Some(target));
        if !operand.is_invalid() || operand.is_nil() {
            self.convert(&mut operand, target, expr);
        }
        operand
    }

    /// Check an expression that must denote a type and return that type.
    pub fn check_type(&mut self, expr: &Expr) -> TypeId {
        let operand = self.check_expr(expr, None);
        if operand.is_invalid() {
            return TypeId::INVALID;
        }
        match self.types().lower_metatype(operand.ty) {
            Some(ty) if operand.is_type() => ty,
            _ => {
                self.report(CheckError::NotAType {
                    expr: self.describe(expr, &operand),
                    span: expr.span(),
                });
                TypeId::INVALID
            }
        }
    }

    /// Check a boolean condition of `construct`.
    pub(crate) fn check_condition(&mut self, expr: &Expr, construct: &str) -> Operand {
        let mut operand = self.check_value(expr, Some(TypeId::BOOL));
        if operand.is_invalid() {
            return operand;
        }
        if !self.types().is_bool(operand.ty) {
            self.report(CheckError::InvalidCondition {
                operand: self.describe(expr, &operand),
                construct: construct.to_string(),
                span: expr.span(),
            });
            operand = Operand::invalid();
        }
        operand
    }
}
