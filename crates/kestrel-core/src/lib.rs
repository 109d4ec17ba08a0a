//! Shared vocabulary of the Kestrel front end.
//!
//! This crate holds the pieces every later stage agrees on:
//! - [`Span`] and the index handles ([`FileId`], [`NodeId`], [`EntityId`], [`ScopeId`])
//! - the interned type model ([`TypeTable`], [`TypeId`], [`TypeKind`])
//! - folded constants ([`ConstValue`])
//! - errors and per-file diagnostics ([`CheckError`], [`Diagnostics`])

pub mod constant;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod span;
pub mod types;

pub use constant::{ConstValue, integer_range};
pub use diagnostics::{Diagnostic, Diagnostics, Note};
pub use error::CheckError;
pub use ids::{EntityId, FileId, NodeId, ScopeId};
pub use span::Span;
pub use types::{
    EnumCase, EnumDef, EnumId, FnFlags, FunctionSig, StructDef, StructField, StructId, TypeDisplay,
    TypeId, TypeKind, TypeTable, UnionCase, UnionDef, UnionId,
};
