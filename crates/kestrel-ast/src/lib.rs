//! Untyped syntax tree for Kestrel.
//!
//! This crate provides:
//! - expression, statement and declaration nodes, every one carrying a
//!   [`NodeId`](kestrel_core::NodeId) and a [`Span`](kestrel_core::Span)
//! - operator enums with precedence
//! - a source-like printer for expressions
//! - [`AstBuilder`] for constructing trees without a parser
//!
//! Trees are plain owned values and can be cloned; specialization of
//! polymorphic functions clones a function literal and checks the copy.

pub mod builder;
pub mod decl;
pub mod expr;
pub mod ops;
mod printer;
pub mod stmt;

pub use builder::AstBuilder;
pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use stmt::*;
