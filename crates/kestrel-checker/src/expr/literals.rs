//! Basic literals and location directives.

use kestrel_ast::{BasicLit, LitKind, LocationDirective, LocationKind};
use kestrel_core::{CheckError, ConstValue, TypeId};

use crate::checker::Checker;
use crate::operand::Operand;

pub(super) fn check_basic_lit(checker: &mut Checker<'_>, lit: &BasicLit) -> Operand {
    match lit.kind {
        LitKind::Int => match parse_int(&lit.text) {
            Some(value) => Operand::constant(TypeId::UNTYPED_INT, ConstValue::Int(value)),
            None => invalid_literal(checker, lit, "integer"),
        },
        LitKind::Float => match lit.text.replace('_', "").parse::<f64>() {
            Ok(value) if value.is_finite() => {
                Operand::constant(TypeId::UNTYPED_FLOAT, ConstValue::float(value))
            }
            _ => invalid_literal(checker, lit, "float"),
        },
        LitKind::String => Operand::constant(TypeId::STRING, ConstValue::String(lit.text.clone())),
    }
}

fn invalid_literal(checker: &mut Checker<'_>, lit: &BasicLit, kind: &str) -> Operand {
    checker.report(CheckError::InvalidLiteral {
        kind: kind.to_string(),
        text: lit.text.clone(),
        span: lit.span,
    });
    Operand::invalid()
}

/// Parse decimal, `0x`, `0o` and `0b` integers with `_` separators.
fn parse_int(text: &str) -> Option<i128> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let (radix, body) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };
    if body.is_empty() {
        return None;
    }
    let value = u128::from_str_radix(body, radix).ok()?;
    i128::try_from(value).ok()
}

pub(super) fn check_location(checker: &mut Checker<'_>, location: &LocationDirective) -> Operand {
    match location.kind {
        LocationKind::File => {
            let path = checker.source(checker.file).path.clone();
            Operand::constant(TypeId::STRING, ConstValue::String(path))
        }
        LocationKind::Line => Operand::constant(
            TypeId::UNTYPED_INT,
            ConstValue::Int(location.span.line as i128),
        ),
        LocationKind::Function => {
            let name = checker.function_name();
            Operand::constant(TypeId::STRING, ConstValue::String(name))
        }
    }
}
