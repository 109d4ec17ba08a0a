//! Source-like rendering of expressions for diagnostics.

use std::fmt;

use crate::expr::{CastKind, Expr, LitKind, LocationKind};
use crate::ops::UnaryOp;

fn list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", expr)?;
    }
    Ok(())
}

/// Precedence of an expression when it appears as a binary operand.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary(b) => b.op.binding_power().0,
        Expr::Ternary(_) => 0,
        _ => u8::MAX,
    }
}

fn operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min: u8) -> fmt::Result {
    if precedence(expr) < min {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nil(_) => write!(f, "nil"),
            Expr::Ident(ident) => write!(f, "{}", ident.name),
            Expr::Lit(lit) => match lit.kind {
                LitKind::String => write!(f, "{:?}", lit.text),
                LitKind::Int | LitKind::Float => write!(f, "{}", lit.text),
            },
            Expr::Composite(lit) => {
                if let Some(ty) = &lit.ty {
                    write!(f, "{}", ty)?;
                }
                write!(f, "{{")?;
                for (i, element) in lit.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(key) = &element.key {
                        write!(f, "{} = ", key.name)?;
                    }
                    write!(f, "{}", element.value)?;
                }
                write!(f, "}}")
            }
            Expr::Func(func) => {
                write!(f, "fn")?;
                write!(f, "{}", Expr::FuncType(Box::new(func.signature.clone())))?;
                write!(f, " {{ ... }}")
            }
            Expr::FuncType(ty) => {
                write!(f, "(")?;
                for (i, param) in ty.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(label) = ty.labels.as_ref().and_then(|labels| labels.get(i)) {
                        write!(f, "{}: ", label.name)?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> ")?;
                match ty.results.len() {
                    0 => write!(f, "void"),
                    1 => write!(f, "{}", ty.results[0]),
                    _ => {
                        write!(f, "(")?;
                        list(f, &ty.results)?;
                        write!(f, ")")
                    }
                }
            }
            Expr::PolyType(poly) => write!(f, "${}", poly.explicit),
            Expr::Variadic(v) => write!(f, "..{}", v.explicit),
            Expr::Pointer(p) => write!(f, "*{}", p.pointee),
            Expr::Array(a) => match &a.length {
                Some(len) => write!(f, "[{}]{}", len, a.element),
                None => write!(f, "[..]{}", a.element),
            },
            Expr::SliceType(s) => write!(f, "[]{}", s.element),
            Expr::Vector(v) => write!(f, "[vector {}]{}", v.size, v.element),
            Expr::Struct(s) => {
                write!(f, "struct")?;
                if !s.poly_params.is_empty() {
                    write!(f, "(")?;
                    for (i, poly) in s.poly_params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "${}", poly.explicit)?;
                    }
                    write!(f, ")")?;
                }
                write!(f, " {{ ... }}")
            }
            Expr::Union(_) => write!(f, "union {{ ... }}"),
            Expr::Enum(_) => write!(f, "enum {{ ... }}"),
            Expr::Paren(p) => write!(f, "({})", p.inner),
            Expr::Unary(u) => {
                write!(f, "{}", u.op)?;
                operand(f, &u.operand, UnaryOp::binding_power())
            }
            Expr::Binary(b) => {
                let (left, right) = b.op.binding_power();
                operand(f, &b.lhs, left)?;
                write!(f, " {} ", b.op)?;
                operand(f, &b.rhs, right)
            }
            Expr::Ternary(t) => match &t.then {
                Some(then) => write!(f, "{} ? {} : {}", t.cond, then, t.els),
                None => write!(f, "{} ?: {}", t.cond, t.els),
            },
            Expr::Selector(s) => write!(f, "{}.{}", s.receiver, s.member.name),
            Expr::Subscript(s) => write!(f, "{}[{}]", s.receiver, s.index),
            Expr::Slice(s) => {
                write!(f, "{}[", s.receiver)?;
                if let Some(lo) = &s.lo {
                    write!(f, "{}", lo)?;
                }
                write!(f, ":")?;
                if let Some(hi) = &s.hi {
                    write!(f, "{}", hi)?;
                }
                write!(f, "]")
            }
            Expr::Call(call) => {
                write!(f, "{}(", call.callee)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(label) = &arg.label {
                        write!(f, "{}: ", label.name)?;
                    }
                    write!(f, "{}", arg.value)?;
                }
                write!(f, ")")
            }
            Expr::Cast(cast) => match (cast.kind, &cast.ty) {
                (CastKind::Autocast, _) | (_, None) => write!(f, "autocast {}", cast.expr),
                (CastKind::Cast, Some(ty)) => write!(f, "cast({}) {}", ty, cast.expr),
                (CastKind::Bitcast, Some(ty)) => write!(f, "bitcast({}) {}", ty, cast.expr),
            },
            Expr::Location(loc) => match loc.kind {
                LocationKind::File => write!(f, "#file"),
                LocationKind::Line => write!(f, "#line"),
                LocationKind::Function => write!(f, "#function"),
            },
        }
    }
}
