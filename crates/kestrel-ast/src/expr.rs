//! Expression nodes.
//!
//! Types are expressions too: `*i32`, `[]T`, `struct { ... }` and `$T` are
//! all [`Expr`] variants and are checked by the same entry point as values.

use kestrel_core::{NodeId, Span};

use crate::ops::{BinaryOp, UnaryOp};
use crate::stmt::Block;

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `nil`
    Nil(NilLit),
    /// `foo`
    Ident(Ident),
    /// `42`, `1.5`, `"text"`
    Lit(BasicLit),
    /// `Point{x = 1, y = 2}`
    Composite(Box<CompositeLit>),
    /// `fn(a: i32) -> i32 { ... }`
    Func(Box<FuncLit>),
    /// `(i32, f32) -> bool`
    FuncType(Box<FuncType>),
    /// `$T`
    PolyType(Box<PolyType>),
    /// `..T` in a parameter list, or a spread argument.
    Variadic(Box<VariadicType>),
    /// `*T`
    Pointer(Box<PointerType>),
    /// `[N]T`, `[..]T`
    Array(Box<ArrayType>),
    /// `[]T`
    SliceType(Box<SliceType>),
    /// `[vector N]T`
    Vector(Box<VectorType>),
    /// `struct { ... }`
    Struct(Box<StructType>),
    /// `union { ... }`
    Union(Box<UnionType>),
    /// `enum { ... }`
    Enum(Box<EnumType>),
    /// `(expr)`
    Paren(Box<ParenExpr>),
    /// `-x`, `&x`
    Unary(Box<UnaryExpr>),
    /// `a + b`
    Binary(Box<BinaryExpr>),
    /// `c ? a : b`
    Ternary(Box<TernaryExpr>),
    /// `a.b`
    Selector(Box<SelectorExpr>),
    /// `a[i]`
    Subscript(Box<SubscriptExpr>),
    /// `a[lo:hi]`
    Slice(Box<SliceExpr>),
    /// `f(x, y)`
    Call(Box<CallExpr>),
    /// `cast(T) x`, `bitcast(T) x`, `autocast x`
    Cast(Box<CastExpr>),
    /// `#file`, `#line`, `#function`
    Location(LocationDirective),
}

macro_rules! each_variant {
    ($self:ident, $node:ident => $body:expr) => {
        match $self {
            Expr::Nil($node) => $body,
            Expr::Ident($node) => $body,
            Expr::Lit($node) => $body,
            Expr::Composite($node) => $body,
            Expr::Func($node) => $body,
            Expr::FuncType($node) => $body,
            Expr::PolyType($node) => $body,
            Expr::Variadic($node) => $body,
            Expr::Pointer($node) => $body,
            Expr::Array($node) => $body,
            Expr::SliceType($node) => $body,
            Expr::Vector($node) => $body,
            Expr::Struct($node) => $body,
            Expr::Union($node) => $body,
            Expr::Enum($node) => $body,
            Expr::Paren($node) => $body,
            Expr::Unary($node) => $body,
            Expr::Binary($node) => $body,
            Expr::Ternary($node) => $body,
            Expr::Selector($node) => $body,
            Expr::Subscript($node) => $body,
            Expr::Slice($node) => $body,
            Expr::Call($node) => $body,
            Expr::Cast($node) => $body,
            Expr::Location($node) => $body,
        }
    };
}

impl Expr {
    /// Get the node id of this expression.
    pub fn id(&self) -> NodeId {
        each_variant!(self, node => node.id)
    }

    /// Get the source span of this expression.
    pub fn span(&self) -> Span {
        each_variant!(self, node => node.span)
    }

    /// The identifier, if this expression is a bare name.
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            Expr::Paren(paren) => paren.inner.as_ident(),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren(paren) => paren.inner.unparen(),
            other => other,
        }
    }

    /// Whether a `$T` placeholder declaration occurs in this type expression.
    pub fn is_polymorphic(&self) -> bool {
        match self {
            Expr::PolyType(_) => true,
            Expr::Variadic(v) => v.explicit.is_polymorphic(),
            Expr::Pointer(p) => p.pointee.is_polymorphic(),
            Expr::Array(a) => a.element.is_polymorphic(),
            Expr::SliceType(s) => s.element.is_polymorphic(),
            Expr::Vector(v) => v.element.is_polymorphic(),
            Expr::Paren(p) => p.inner.is_polymorphic(),
            Expr::FuncType(f) => {
                f.params.iter().any(Expr::is_polymorphic)
                    || f.results.iter().any(Expr::is_polymorphic)
            }
            Expr::Call(call) => call.args.iter().any(|arg| arg.value.is_polymorphic()),
            _ => false,
        }
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// `nil`
#[derive(Debug, Clone, PartialEq)]
pub struct NilLit {
    pub id: NodeId,
    pub span: Span,
}

/// An identifier reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

impl Ident {
    /// `_` declares nothing and resolves to nothing.
    pub fn is_anonymous(&self) -> bool {
        self.name == "_"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    String,
}

/// A literal kept as source text; the checker parses it.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub id: NodeId,
    pub kind: LitKind,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    File,
    Line,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDirective {
    pub id: NodeId,
    pub kind: LocationKind,
    pub span: Span,
}

// ============================================================================
// Literals
// ============================================================================

/// One element of a composite literal, optionally keyed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub id: NodeId,
    pub key: Option<Ident>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    pub id: NodeId,
    /// Absent when the type comes from context.
    pub ty: Option<Expr>,
    pub elements: Vec<KeyValue>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub id: NodeId,
    pub signature: FuncType,
    pub body: Block,
    pub span: Span,
}

// ============================================================================
// Type expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub id: NodeId,
    /// Parameter names; function literals always carry them.
    pub labels: Option<Vec<Ident>>,
    pub params: Vec<Expr>,
    pub results: Vec<Expr>,
    pub discardable: bool,
    pub span: Span,
}

impl FuncType {
    /// The last parameter is `..T`.
    pub fn is_variadic(&self) -> bool {
        matches!(self.params.last(), Some(Expr::Variadic(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolyType {
    pub id: NodeId,
    /// The placeholder name, usually an identifier.
    pub explicit: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariadicType {
    pub id: NodeId,
    pub explicit: Expr,
    /// `#cvargs ..T`
    pub c_variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerType {
    pub id: NodeId,
    pub pointee: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub id: NodeId,
    /// `None` for `[..]T`.
    pub length: Option<Expr>,
    pub element: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceType {
    pub id: NodeId,
    pub element: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorType {
    pub id: NodeId,
    pub size: Expr,
    pub element: Expr,
    pub span: Span,
}

/// `a, b: T` inside a struct or union body.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub id: NodeId,
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub id: NodeId,
    /// `struct($A, $B)` placeholders; empty for ordinary structs.
    pub poly_params: Vec<PolyType>,
    pub fields: Vec<FieldDecl>,
    pub packed: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub id: NodeId,
    pub cases: Vec<FieldDecl>,
    /// Explicit tag type.
    pub tag: Option<Expr>,
    pub inline_tag: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumCaseDecl {
    pub id: NodeId,
    pub name: Ident,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub id: NodeId,
    pub backing: Option<Expr>,
    pub cases: Vec<EnumCaseDecl>,
    /// `#flags`: cases default to successive powers of two.
    pub flags: bool,
    pub span: Span,
}

// ============================================================================
// Operators and accesses
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub id: NodeId,
    pub inner: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub id: NodeId,
    pub op: UnaryOp,
    pub operand: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub id: NodeId,
    pub cond: Expr,
    /// `None` for `cond ?: els`, which yields the condition itself.
    pub then: Option<Expr>,
    pub els: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorExpr {
    pub id: NodeId,
    pub receiver: Expr,
    pub member: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptExpr {
    pub id: NodeId,
    pub receiver: Expr,
    pub index: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub id: NodeId,
    pub receiver: Expr,
    pub lo: Option<Expr>,
    pub hi: Option<Expr>,
    pub span: Span,
}

/// A call argument, optionally labelled `name: value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub label: Option<Ident>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub id: NodeId,
    pub callee: Expr,
    pub args: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Cast,
    Bitcast,
    Autocast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub id: NodeId,
    pub kind: CastKind,
    /// Absent for `autocast`.
    pub ty: Option<Expr>,
    pub expr: Expr,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::FileId;

    fn ident(id: u32, name: &str) -> Expr {
        Expr::Ident(Ident {
            id: NodeId(id),
            name: name.into(),
            span: Span::new(FileId(0), 1, id, 1),
        })
    }

    #[test]
    fn id_and_span_dispatch() {
        let expr = Expr::Paren(Box::new(ParenExpr {
            id: NodeId(2),
            inner: ident(1, "x"),
            span: Span::new(FileId(0), 1, 1, 3),
        }));
        assert_eq!(expr.id(), NodeId(2));
        assert_eq!(expr.span().len, 3);
        assert_eq!(expr.unparen().id(), NodeId(1));
        assert_eq!(expr.as_ident().map(|i| i.name.as_str()), Some("x"));
    }

    #[test]
    fn polymorphic_detection() {
        let poly = Expr::PolyType(Box::new(PolyType {
            id: NodeId(3),
            explicit: ident(2, "T"),
            span: Span::default(),
        }));
        let slice = Expr::SliceType(Box::new(SliceType {
            id: NodeId(4),
            element: poly,
            span: Span::default(),
        }));
        assert!(slice.is_polymorphic());
        assert!(!ident(5, "T").is_polymorphic());
    }
}
