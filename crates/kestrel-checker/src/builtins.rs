//! Builtin types, constants and call forms.
//!
//! The universe scope is populated once per [`Program`]: primitive types,
//! `true`/`false` and the builtin functions. A builtin function either has
//! an ordinary signature (its calls are checked like any other call and
//! only tagged as builtin) or a custom [`BuiltinCheck`] that replaces
//! argument matching entirely.

use std::fmt;

use kestrel_ast::CallExpr;
use kestrel_core::{CheckError, ConstValue, EntityId, FnFlags, FunctionSig, Span, TypeId};
use thiserror::Error;
use tracing::debug;

use crate::checker::Checker;
use crate::conversion::default_type;
use crate::entity::{Entity, EntityFlags};
use crate::operand::{Mode, Operand};
use crate::program::Program;

/// Custom type rule of a builtin call form.
///
/// The callback receives the whole call and checks its arguments itself.
pub type BuiltinCheck = fn(&mut Checker<'_>, &CallExpr) -> Operand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuiltinId(pub u32);

#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub entity: EntityId,
    /// `None` for builtins checked through their signature.
    pub check: Option<BuiltinCheck>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("entity", &self.entity)
            .field("custom", &self.check.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuiltinError {
    #[error("builtin '{0}' is already declared")]
    Duplicate(String),
}

const BUILTIN_TYPES: &[(&str, TypeId)] = &[
    ("void", TypeId::VOID),
    ("bool", TypeId::BOOL),
    ("i8", TypeId::I8),
    ("i16", TypeId::I16),
    ("i32", TypeId::I32),
    ("i64", TypeId::I64),
    ("u8", TypeId::U8),
    ("u16", TypeId::U16),
    ("u32", TypeId::U32),
    ("u64", TypeId::U64),
    ("f32", TypeId::F32),
    ("f64", TypeId::F64),
    ("string", TypeId::STRING),
    ("rawptr", TypeId::RAWPTR),
    ("any", TypeId::ANY),
];

// ============================================================================
// Registration
// ============================================================================

/// Declare the builtin types, constants and functions in the universe scope.
pub(crate) fn populate_universe(program: &mut Program) {
    for (name, ty) in BUILTIN_TYPES {
        let meta = program.types.metatype(*ty);
        let entity = Entity::new(*name, Span::default(), EntityFlags::TYPE | EntityFlags::BUILTIN)
            .with_type(meta);
        declare_universe(program, entity);
    }
    for (name, value) in [("true", true), ("false", false)] {
        let entity = Entity::new(name, Span::default(), EntityFlags::CONSTANT | EntityFlags::BUILTIN)
            .with_type(TypeId::BOOL)
            .with_constant(ConstValue::Bool(value));
        declare_universe(program, entity);
    }

    let builtins = [
        ("sizeof", None, Some(check_sizeof as BuiltinCheck)),
        ("assert", Some(TypeId::BOOL), None),
        ("panic", Some(TypeId::STRING), None),
    ];
    for (name, param, check) in builtins {
        let registered = match (param, check) {
            (_, Some(check)) => program.register_builtin(name, check),
            (Some(param), None) => register_signature(program, name, vec![param]),
            (None, None) => unreachable!("builtin '{name}' has neither a signature nor a check"),
        };
        if let Err(error) = registered {
            unreachable!("universe population failed: {error}");
        }
    }
}

fn declare_universe(program: &mut Program, entity: Entity) -> EntityId {
    let name = entity.name.clone();
    let mut entity = entity.in_scope(program.universe);
    entity.flags |= EntityFlags::CHECKED;
    let id = program.entities.alloc(entity);
    if program.scopes.insert(program.universe, &name, id, true).is_err() {
        unreachable!("builtin '{name}' declared twice");
    }
    id
}

/// Declare a builtin function with an ordinary signature returning nothing.
fn register_signature(program: &mut Program, name: &str, params: Vec<TypeId>) -> Result<BuiltinId, BuiltinError> {
    if program.scopes.lookup_local(program.universe, name).is_some() {
        return Err(BuiltinError::Duplicate(name.to_string()));
    }
    let ty = program.types.function(FunctionSig {
        params,
        result: TypeId::VOID_TUPLE,
        flags: FnFlags::BUILTIN,
    });
    let entity = Entity::new(
        name,
        Span::default(),
        EntityFlags::CONSTANT | EntityFlags::FUNCTION | EntityFlags::BUILTIN,
    )
    .with_type(ty);
    let entity = declare_universe(program, entity);
    Ok(add_builtin(program, name, entity, None))
}

/// Declare a builtin call form checked by `check`.
pub(crate) fn register_custom(program: &mut Program, name: &str, check: BuiltinCheck) -> Result<BuiltinId, BuiltinError> {
    if program.scopes.lookup_local(program.universe, name).is_some() {
        return Err(BuiltinError::Duplicate(name.to_string()));
    }
    // only usable as a callee; any other use is a void value
    let entity = Entity::new(name, Span::default(), EntityFlags::FUNCTION | EntityFlags::BUILTIN)
        .with_type(TypeId::VOID_TUPLE);
    let entity = declare_universe(program, entity);
    Ok(add_builtin(program, name, entity, Some(check)))
}

fn add_builtin(program: &mut Program, name: &str, entity: EntityId, check: Option<BuiltinCheck>) -> BuiltinId {
    let id = BuiltinId(program.builtins.len() as u32);
    program.builtins.push(Builtin {
        name: name.to_string(),
        entity,
        check,
    });
    program.builtin_entities.insert(entity, id);
    debug!(name, custom = check.is_some(), "registered builtin");
    id
}

// ============================================================================
// Custom checks
// ============================================================================

/// `sizeof(T)` or `sizeof(value)`: the size in bytes as a `u64` constant.
fn check_sizeof(checker: &mut Checker<'_>, call: &CallExpr) -> Operand {
    let [arg] = call.args.as_slice() else {
        for arg in &call.args {
            checker.check_expr(&arg.value, None);
        }
        let callee = format!("'{}'", call.callee);
        let error = if call.args.is_empty() {
            CheckError::NotEnoughArguments {
                callee,
                span: call.span,
            }
        } else {
            CheckError::TooManyArguments {
                callee,
                span: call.span,
            }
        };
        checker.report(error);
        return Operand::invalid();
    };

    let operand = checker.check_expr(&arg.value, None);
    if operand.is_invalid() {
        return Operand::invalid();
    }
    let ty = match operand.mode {
        Mode::Type => checker.types().lower_metatype(operand.ty).unwrap_or(TypeId::INVALID),
        Mode::File => {
            checker.report(CheckError::NotAnExpression {
                expr: format!("'{}'", arg.value),
                span: arg.value.span(),
            });
            return Operand::invalid();
        }
        _ => default_type(operand.ty),
    };
    match checker.types().size_of(ty) {
        Some(bytes) => Operand::constant(TypeId::U64, ConstValue::Int(bytes as i128)),
        None => {
            checker.report(CheckError::Unsized {
                ty: checker.display(ty),
                span: arg.value.span(),
            });
            Operand::invalid()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CheckerOptions;

    #[test]
    fn universe_has_primitive_types() {
        let program = Program::new(CheckerOptions::default());
        let i32_entity = program.lookup_universe("i32").unwrap();
        let entity = program.entity(i32_entity);
        assert!(entity.is_type());
        assert_eq!(program.types().lower_metatype(entity.ty.unwrap()), Some(TypeId::I32));

        let truth = program.entity(program.lookup_universe("true").unwrap());
        assert_eq!(truth.constant, Some(ConstValue::Bool(true)));
    }

    #[test]
    fn builtin_functions_are_registered() {
        let program = Program::new(CheckerOptions::default());
        let names: Vec<&str> = program.builtins().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["sizeof", "assert", "panic"]);
        assert!(program.builtins()[0].check.is_some());
        assert!(program.builtins()[1].check.is_none());
    }

    #[test]
    fn duplicate_registration_fails() {
        fn always_void(_: &mut Checker<'_>, _: &CallExpr) -> Operand {
            Operand::invalid()
        }
        let mut program = Program::new(CheckerOptions::default());
        assert!(program.register_builtin("typeid", always_void).is_ok());
        assert_eq!(
            program.register_builtin("sizeof", always_void),
            Err(BuiltinError::Duplicate("sizeof".to_string()))
        );
    }
}
