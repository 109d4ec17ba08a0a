//! Statement nodes.

use kestrel_core::{NodeId, Span};

use crate::decl::{DeclBlock, Declaration};
use crate::expr::{Expr, Ident};
use crate::ops::BinaryOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Empty(EmptyStmt),
    Expr(ExprStmt),
    Decl(Box<Declaration>),
    DeclBlock(Box<DeclBlock>),
    Assign(Box<AssignStmt>),
    Block(Block),
    Using(UsingStmt),
    Return(ReturnStmt),
    Defer(Box<DeferStmt>),
    For(Box<ForStmt>),
    ForIn(Box<ForInStmt>),
    If(Box<IfStmt>),
    DirectiveIf(Box<DirectiveIf>),
    Switch(Box<SwitchStmt>),
    Branch(BranchStmt),
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Empty(s) => s.id,
            Stmt::Expr(s) => s.id,
            Stmt::Decl(s) => s.id,
            Stmt::DeclBlock(s) => s.id,
            Stmt::Assign(s) => s.id,
            Stmt::Block(s) => s.id,
            Stmt::Using(s) => s.id,
            Stmt::Return(s) => s.id,
            Stmt::Defer(s) => s.id,
            Stmt::For(s) => s.id,
            Stmt::ForIn(s) => s.id,
            Stmt::If(s) => s.id,
            Stmt::DirectiveIf(s) => s.id,
            Stmt::Switch(s) => s.id,
            Stmt::Branch(s) => s.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Stmt::Empty(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Decl(s) => s.span,
            Stmt::DeclBlock(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Using(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Defer(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::ForIn(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::DirectiveIf(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::Branch(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmptyStmt {
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub id: NodeId,
    pub expr: Expr,
    pub span: Span,
}

/// `a, b = x, y` or `a += x`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub id: NodeId,
    pub lhs: Vec<Expr>,
    pub rhs: Vec<Expr>,
    /// Operator of a compound assignment.
    pub op: Option<BinaryOp>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// `using a, b`
#[derive(Debug, Clone, PartialEq)]
pub struct UsingStmt {
    pub id: NodeId,
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub results: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferStmt {
    pub id: NodeId,
    pub stmt: Stmt,
    pub span: Span,
}

/// `for init; cond; step { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub id: NodeId,
    pub label: Option<Ident>,
    pub init: Option<Stmt>,
    pub cond: Option<Expr>,
    pub step: Option<Stmt>,
    pub body: Block,
    pub span: Span,
}

/// `for element, index in aggregate { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStmt {
    pub id: NodeId,
    pub label: Option<Ident>,
    /// The element name and an optional index name.
    pub names: Vec<Ident>,
    pub aggregate: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub id: NodeId,
    pub cond: Expr,
    pub body: Stmt,
    pub els: Option<Stmt>,
    pub span: Span,
}

/// `#if cond { ... } else { ... }`, resolved at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveIf {
    pub id: NodeId,
    pub cond: Expr,
    pub body: Block,
    pub els: Option<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub id: NodeId,
    /// Empty for the default case.
    pub matches: Vec<Expr>,
    pub block: Block,
    pub span: Span,
}

impl CaseClause {
    pub fn is_default(&self) -> bool {
        self.matches.is_empty()
    }
}

/// `switch subject { case ...: }`
///
/// Switching on a union or `any` binds the matched payload to `binding`
/// (or to the subject's own name when it is an identifier).
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub id: NodeId,
    pub label: Option<Ident>,
    pub subject: Option<Expr>,
    pub binding: Option<Ident>,
    /// `using switch`: enum cases are usable unqualified in case clauses.
    pub using: bool,
    pub cases: Vec<CaseClause>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Fallthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStmt {
    pub id: NodeId,
    pub kind: BranchKind,
    pub label: Option<Ident>,
    pub span: Span,
}
