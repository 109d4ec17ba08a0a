//! Kestrel Type Checker
//!
//! Resolves names, assigns types, folds constants and specializes
//! polymorphic functions for a set of parsed Kestrel files.
//!
//! ## Architecture
//!
//! - **Pass 1 (Collection)**: reserve every top-level name, bind imports
//! - **Pass 2 (Checking)**: type declarations on demand, then `#test` blocks
//!
//! ## Modules
//!
//! - [`builtins`]: universe scope and builtin call forms
//! - [`checker`]: the walker shared by both passes
//! - [`context`]: context chain (scope, function, loop and switch targets)
//! - [`conversion`]: assignability and untyped defaulting
//! - [`entity`]: named program objects
//! - [`expr`]: expression and type-expression checking
//! - [`fold`]: constant folding
//! - [`operand`]: the result of checking an expression
//! - [`passes`]: the two passes
//! - [`program`]: everything a check produces
//! - [`scope`]: lexical scopes
//! - [`specialization`]: polymorphic functions and structs
//! - [`stmt`]: statement checking
//! - [`table`]: per-node results

pub mod builtins;
pub mod checker;
pub mod context;
pub mod conversion;
pub mod entity;
pub mod expr;
pub mod fold;
pub mod operand;
pub mod options;
pub mod passes;
pub mod program;
mod return_checker;
pub mod scope;
pub mod specialization;
pub mod stmt;
pub mod table;

pub use builtins::{Builtin, BuiltinCheck, BuiltinError, BuiltinId};
pub use checker::Checker;
pub use entity::{DeclRef, Entity, EntityArena, EntityFlags};
pub use operand::{Mode, Operand};
pub use options::CheckerOptions;
pub use passes::{CheckingOutput, CheckingPass, CollectionOutput, CollectionPass};
pub use program::Program;
pub use scope::{Member, Scope, ScopeArena, ScopeKind};
pub use specialization::{
    FunctionSpecialization, GenericFunction, GenericId, GenericParam, PolyStruct, PolyStructId,
    SpecializationHeader, SpecializationId, SpecializationList, mangle,
};
pub use table::{
    CallKind, Conversion, ForInInfo, FunctionInfo, Labels, NodeTable, SelectorKind, UsingField,
};
