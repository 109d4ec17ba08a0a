//! Kestrel front end: syntax tree, type model and checker.
//!
//! Parsing and code generation live elsewhere. This crate takes resolved
//! syntax trees, checks them, and hands back a [`Program`] plus the
//! specializations later stages compile.
//!
//! ```text
//! SourceFile[] ──▶ Program::check ──▶ Program (types, entities, tables, diagnostics)
//!                                └──▶ SpecializationList (shared, thread-safe)
//! ```

pub use kestrel_ast as ast;
pub use kestrel_checker as checker;
pub use kestrel_core as core;

pub use kestrel_ast::{AstBuilder, SourceFile};
pub use kestrel_checker::{CheckerOptions, Program, SpecializationList};
pub use kestrel_core::{CheckError, Diagnostic, Diagnostics, FileId, Span, TypeId};

/// Check `sources` with `options`, returning the program and the
/// specializations it produced.
pub fn check(sources: &[SourceFile], options: CheckerOptions) -> (Program, SpecializationList) {
    let specializations = SpecializationList::new();
    let mut program = Program::new(options);
    program.check(sources, &specializations);
    (program, specializations)
}

pub mod prelude {
    pub use crate::check;
    pub use kestrel_ast::*;
    pub use kestrel_checker::{
        Builtin, BuiltinCheck, BuiltinError, BuiltinId, CallKind, Checker, CheckerOptions, Entity,
        EntityFlags, FunctionSpecialization, Mode, NodeTable, Operand, Program, SelectorKind,
        SpecializationList,
    };
    pub use kestrel_core::{
        CheckError, ConstValue, Diagnostic, Diagnostics, EntityId, FileId, NodeId, Note, ScopeId,
        Span, TypeId, TypeKind, TypeTable,
    };
}
