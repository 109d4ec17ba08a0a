//! Programmatic construction of syntax trees.
//!
//! Parsing is outside this workspace, so callers that synthesize programs
//! (and the tests) use [`AstBuilder`]. It hands out node ids that are unique
//! within one file and gives every node a distinct position: nodes are placed
//! on the current line at increasing columns, and [`AstBuilder::line`] moves
//! to a new line.

use kestrel_core::{FileId, NodeId, Span};

use crate::decl::{DeclBlock, Declaration, Import, Item, Library, SourceFile, TestCase};
use crate::expr::*;
use crate::ops::{BinaryOp, UnaryOp};
use crate::stmt::*;

#[derive(Debug)]
pub struct AstBuilder {
    file: FileId,
    next_id: u32,
    line: u32,
    col: u32,
}

impl AstBuilder {
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            next_id: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file
    }

    /// Place subsequent nodes on `line`.
    pub fn line(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self.col = 1;
        self
    }

    fn next(&mut self) -> (NodeId, Span) {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let span = Span::new(self.file, self.line, self.col, 1);
        self.col += 1;
        (id, span)
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    pub fn ident(&mut self, name: &str) -> Ident {
        let (id, span) = self.next();
        Ident {
            id,
            name: name.to_string(),
            span: Span { len: name.len() as u32, ..span },
        }
    }

    /// An identifier expression.
    pub fn name(&mut self, name: &str) -> Expr {
        Expr::Ident(self.ident(name))
    }

    pub fn nil(&mut self) -> Expr {
        let (id, span) = self.next();
        Expr::Nil(NilLit { id, span })
    }

    fn lit(&mut self, kind: LitKind, text: String) -> Expr {
        let (id, span) = self.next();
        Expr::Lit(BasicLit {
            id,
            kind,
            text,
            span,
        })
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.lit(LitKind::Int, value.to_string())
    }

    /// An integer literal with explicit source text, e.g. `0xff`.
    pub fn int_text(&mut self, text: &str) -> Expr {
        self.lit(LitKind::Int, text.to_string())
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.lit(LitKind::Float, format!("{:?}", value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.lit(LitKind::String, value.to_string())
    }

    pub fn location(&mut self, kind: LocationKind) -> Expr {
        let (id, span) = self.next();
        Expr::Location(LocationDirective { id, kind, span })
    }

    // ========================================================================
    // Operators and accesses
    // ========================================================================

    pub fn paren(&mut self, inner: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Paren(Box::new(ParenExpr { id, inner, span }))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Unary(Box::new(UnaryExpr {
            id,
            op,
            operand,
            span,
        }))
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Binary(Box::new(BinaryExpr {
            id,
            op,
            lhs,
            rhs,
            span,
        }))
    }

    pub fn ternary(&mut self, cond: Expr, then: Option<Expr>, els: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Ternary(Box::new(TernaryExpr {
            id,
            cond,
            then,
            els,
            span,
        }))
    }

    pub fn selector(&mut self, receiver: Expr, member: &str) -> Expr {
        let member = self.ident(member);
        let (id, span) = self.next();
        Expr::Selector(Box::new(SelectorExpr {
            id,
            receiver,
            member,
            span,
        }))
    }

    pub fn subscript(&mut self, receiver: Expr, index: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Subscript(Box::new(SubscriptExpr {
            id,
            receiver,
            index,
            span,
        }))
    }

    pub fn slice(&mut self, receiver: Expr, lo: Option<Expr>, hi: Option<Expr>) -> Expr {
        let (id, span) = self.next();
        Expr::Slice(Box::new(SliceExpr {
            id,
            receiver,
            lo,
            hi,
            span,
        }))
    }

    pub fn call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        let args = args
            .into_iter()
            .map(|value| Argument { label: None, value })
            .collect();
        self.call_args(callee, args)
    }

    /// A call whose arguments may carry labels.
    pub fn call_labeled(&mut self, callee: Expr, args: Vec<(Option<&str>, Expr)>) -> Expr {
        let args = args
            .into_iter()
            .map(|(label, value)| Argument {
                label: label.map(|l| self.ident(l)),
                value,
            })
            .collect();
        self.call_args(callee, args)
    }

    fn call_args(&mut self, callee: Expr, args: Vec<Argument>) -> Expr {
        let (id, span) = self.next();
        Expr::Call(Box::new(CallExpr {
            id,
            callee,
            args,
            span,
        }))
    }

    pub fn cast(&mut self, kind: CastKind, ty: Option<Expr>, expr: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Cast(Box::new(CastExpr {
            id,
            kind,
            ty,
            expr,
            span,
        }))
    }

    /// A composite literal; elements are optionally keyed.
    pub fn composite(&mut self, ty: Option<Expr>, elements: Vec<(Option<&str>, Expr)>) -> Expr {
        let elements = elements
            .into_iter()
            .map(|(key, value)| {
                let key = key.map(|k| self.ident(k));
                let (id, span) = self.next();
                KeyValue {
                    id,
                    key,
                    value,
                    span,
                }
            })
            .collect();
        let (id, span) = self.next();
        Expr::Composite(Box::new(CompositeLit {
            id,
            ty,
            elements,
            span,
        }))
    }

    // ========================================================================
    // Type expressions
    // ========================================================================

    pub fn pointer_type(&mut self, pointee: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Pointer(Box::new(PointerType { id, pointee, span }))
    }

    pub fn array_type(&mut self, length: Option<Expr>, element: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Array(Box::new(ArrayType {
            id,
            length,
            element,
            span,
        }))
    }

    pub fn slice_type(&mut self, element: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::SliceType(Box::new(SliceType { id, element, span }))
    }

    pub fn vector_type(&mut self, size: Expr, element: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Vector(Box::new(VectorType {
            id,
            size,
            element,
            span,
        }))
    }

    /// `$name`
    pub fn poly(&mut self, name: &str) -> Expr {
        Expr::PolyType(Box::new(self.poly_type(name)))
    }

    fn poly_type(&mut self, name: &str) -> PolyType {
        let explicit = self.name(name);
        let (id, span) = self.next();
        PolyType { id, explicit, span }
    }

    pub fn variadic(&mut self, explicit: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Variadic(Box::new(VariadicType {
            id,
            explicit,
            c_variadic: false,
            span,
        }))
    }

    pub fn c_variadic(&mut self, explicit: Expr) -> Expr {
        let (id, span) = self.next();
        Expr::Variadic(Box::new(VariadicType {
            id,
            explicit,
            c_variadic: true,
            span,
        }))
    }

    /// An unlabelled function type `(params) -> (results)`.
    pub fn func_type(&mut self, params: Vec<Expr>, results: Vec<Expr>) -> Expr {
        let (id, span) = self.next();
        Expr::FuncType(Box::new(FuncType {
            id,
            labels: None,
            params,
            results,
            discardable: false,
            span,
        }))
    }

    fn fields(&mut self, fields: Vec<(&str, Expr)>) -> Vec<FieldDecl> {
        fields
            .into_iter()
            .map(|(name, ty)| {
                let names = vec![self.ident(name)];
                let (id, span) = self.next();
                FieldDecl {
                    id,
                    names,
                    ty,
                    span,
                }
            })
            .collect()
    }

    pub fn struct_type(&mut self, fields: Vec<(&str, Expr)>) -> Expr {
        self.poly_struct_type(Vec::new(), fields)
    }

    /// `struct($A, ...) { ... }`
    pub fn poly_struct_type(&mut self, params: Vec<&str>, fields: Vec<(&str, Expr)>) -> Expr {
        let poly_params = params.into_iter().map(|p| self.poly_type(p)).collect();
        let fields = self.fields(fields);
        let (id, span) = self.next();
        Expr::Struct(Box::new(StructType {
            id,
            poly_params,
            fields,
            packed: false,
            span,
        }))
    }

    pub fn union_type(&mut self, cases: Vec<(&str, Expr)>) -> Expr {
        let cases = self.fields(cases);
        let (id, span) = self.next();
        Expr::Union(Box::new(UnionType {
            id,
            cases,
            tag: None,
            inline_tag: false,
            span,
        }))
    }

    pub fn enum_type(&mut self, backing: Option<Expr>, cases: Vec<(&str, Option<Expr>)>) -> Expr {
        self.enum_with(backing, cases, false)
    }

    /// `enum #flags { ... }`
    pub fn flags_enum(&mut self, backing: Option<Expr>, cases: Vec<(&str, Option<Expr>)>) -> Expr {
        self.enum_with(backing, cases, true)
    }

    fn enum_with(
        &mut self,
        backing: Option<Expr>,
        cases: Vec<(&str, Option<Expr>)>,
        flags: bool,
    ) -> Expr {
        let cases = cases
            .into_iter()
            .map(|(name, value)| {
                let name = self.ident(name);
                let (id, span) = self.next();
                EnumCaseDecl {
                    id,
                    name,
                    value,
                    span,
                }
            })
            .collect();
        let (id, span) = self.next();
        Expr::Enum(Box::new(EnumType {
            id,
            backing,
            cases,
            flags,
            span,
        }))
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// `fn(name: T, ...) -> (results) { body }`
    pub fn func(&mut self, params: Vec<(&str, Expr)>, results: Vec<Expr>, body: Vec<Stmt>) -> Expr {
        Expr::Func(Box::new(self.func_lit(params, results, body)))
    }

    pub fn func_lit(
        &mut self,
        params: Vec<(&str, Expr)>,
        results: Vec<Expr>,
        body: Vec<Stmt>,
    ) -> FuncLit {
        let mut labels = Vec::with_capacity(params.len());
        let mut types = Vec::with_capacity(params.len());
        for (name, ty) in params {
            labels.push(self.ident(name));
            types.push(ty);
        }
        let (sig_id, sig_span) = self.next();
        let signature = FuncType {
            id: sig_id,
            labels: Some(labels),
            params: types,
            results,
            discardable: false,
            span: sig_span,
        };
        let body = self.block(body);
        let (id, span) = self.next();
        FuncLit {
            id,
            signature,
            body,
            span,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Block {
        let (id, span) = self.next();
        Block { id, stmts, span }
    }

    pub fn block_stmt(&mut self, stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block(self.block(stmts))
    }

    pub fn decl(
        &mut self,
        names: &[&str],
        ty: Option<Expr>,
        values: Vec<Expr>,
        constant: bool,
    ) -> Declaration {
        let names = names.iter().map(|n| self.ident(n)).collect();
        let (id, span) = self.next();
        Declaration {
            id,
            names,
            ty,
            values,
            constant,
            linkname: None,
            callconv: None,
            span,
        }
    }

    /// `name : ty = value`, `name := value` or `name : ty`.
    pub fn var(&mut self, name: &str, ty: Option<Expr>, value: Option<Expr>) -> Stmt {
        let values = value.into_iter().collect();
        Stmt::Decl(Box::new(self.decl(&[name], ty, values, false)))
    }

    pub fn vars(&mut self, names: &[&str], ty: Option<Expr>, values: Vec<Expr>) -> Stmt {
        Stmt::Decl(Box::new(self.decl(names, ty, values, false)))
    }

    /// `name :: value`
    pub fn constant(&mut self, name: &str, value: Expr) -> Stmt {
        Stmt::Decl(Box::new(self.decl(&[name], None, vec![value], true)))
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        let (id, span) = self.next();
        Stmt::Expr(ExprStmt { id, expr, span })
    }

    pub fn assign(&mut self, lhs: Vec<Expr>, rhs: Vec<Expr>) -> Stmt {
        let (id, span) = self.next();
        Stmt::Assign(Box::new(AssignStmt {
            id,
            lhs,
            rhs,
            op: None,
            span,
        }))
    }

    /// `lhs op= rhs`
    pub fn compound_assign(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Stmt {
        let (id, span) = self.next();
        Stmt::Assign(Box::new(AssignStmt {
            id,
            lhs: vec![lhs],
            rhs: vec![rhs],
            op: Some(op),
            span,
        }))
    }

    pub fn ret(&mut self, results: Vec<Expr>) -> Stmt {
        let (id, span) = self.next();
        Stmt::Return(ReturnStmt { id, results, span })
    }

    pub fn if_stmt(&mut self, cond: Expr, then: Vec<Stmt>, els: Option<Vec<Stmt>>) -> Stmt {
        let els = els.map(|stmts| self.block_stmt(stmts));
        self.if_chain(cond, then, els)
    }

    /// `if` whose else branch is any statement, e.g. another `if`.
    pub fn if_chain(&mut self, cond: Expr, then: Vec<Stmt>, els: Option<Stmt>) -> Stmt {
        let body = self.block_stmt(then);
        let (id, span) = self.next();
        Stmt::If(Box::new(IfStmt {
            id,
            cond,
            body,
            els,
            span,
        }))
    }

    pub fn directive_if(&mut self, cond: Expr, then: Vec<Stmt>, els: Option<Vec<Stmt>>) -> Stmt {
        let body = self.block(then);
        let els = els.map(|stmts| self.block_stmt(stmts));
        let (id, span) = self.next();
        Stmt::DirectiveIf(Box::new(DirectiveIf {
            id,
            cond,
            body,
            els,
            span,
        }))
    }

    pub fn for_stmt(
        &mut self,
        init: Option<Stmt>,
        cond: Option<Expr>,
        step: Option<Stmt>,
        body: Vec<Stmt>,
    ) -> Stmt {
        let body = self.block(body);
        let (id, span) = self.next();
        Stmt::For(Box::new(ForStmt {
            id,
            label: None,
            init,
            cond,
            step,
            body,
            span,
        }))
    }

    pub fn for_in(&mut self, names: &[&str], aggregate: Expr, body: Vec<Stmt>) -> Stmt {
        let names = names.iter().map(|n| self.ident(n)).collect();
        let body = self.block(body);
        let (id, span) = self.next();
        Stmt::ForIn(Box::new(ForInStmt {
            id,
            label: None,
            names,
            aggregate,
            body,
            span,
        }))
    }

    /// Attach a label to a loop or switch statement.
    pub fn labeled(&mut self, label: &str, mut stmt: Stmt) -> Stmt {
        let ident = self.ident(label);
        match &mut stmt {
            Stmt::For(s) => s.label = Some(ident),
            Stmt::ForIn(s) => s.label = Some(ident),
            Stmt::Switch(s) => s.label = Some(ident),
            _ => {}
        }
        stmt
    }

    pub fn case(&mut self, matches: Vec<Expr>, body: Vec<Stmt>) -> CaseClause {
        let block = self.block(body);
        let (id, span) = self.next();
        CaseClause {
            id,
            matches,
            block,
            span,
        }
    }

    pub fn switch(
        &mut self,
        subject: Option<Expr>,
        binding: Option<&str>,
        cases: Vec<CaseClause>,
    ) -> Stmt {
        let binding = binding.map(|b| self.ident(b));
        let (id, span) = self.next();
        Stmt::Switch(Box::new(SwitchStmt {
            id,
            label: None,
            subject,
            binding,
            using: false,
            cases,
            span,
        }))
    }

    fn branch(&mut self, kind: BranchKind, label: Option<&str>) -> Stmt {
        let label = label.map(|l| self.ident(l));
        let (id, span) = self.next();
        Stmt::Branch(BranchStmt {
            id,
            kind,
            label,
            span,
        })
    }

    pub fn brk(&mut self, label: Option<&str>) -> Stmt {
        self.branch(BranchKind::Break, label)
    }

    pub fn cont(&mut self, label: Option<&str>) -> Stmt {
        self.branch(BranchKind::Continue, label)
    }

    pub fn fallthrough(&mut self) -> Stmt {
        self.branch(BranchKind::Fallthrough, None)
    }

    pub fn defer(&mut self, stmt: Stmt) -> Stmt {
        let (id, span) = self.next();
        Stmt::Defer(Box::new(DeferStmt { id, stmt, span }))
    }

    pub fn using_stmt(&mut self, exprs: Vec<Expr>) -> UsingStmt {
        let (id, span) = self.next();
        UsingStmt { id, exprs, span }
    }

    pub fn using(&mut self, exprs: Vec<Expr>) -> Stmt {
        Stmt::Using(self.using_stmt(exprs))
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// `name :: value` at file scope.
    pub fn const_item(&mut self, name: &str, value: Expr) -> Item {
        Item::Decl(self.decl(&[name], None, vec![value], true))
    }

    /// `name : ty = value` at file scope.
    pub fn var_item(&mut self, name: &str, ty: Option<Expr>, value: Option<Expr>) -> Item {
        let values = value.into_iter().collect();
        Item::Decl(self.decl(&[name], ty, values, false))
    }

    pub fn import(&mut self, path: &str, alias: Option<&str>, file: Option<FileId>) -> Item {
        let alias = alias.map(|a| self.ident(a));
        let (id, span) = self.next();
        Item::Import(Import {
            id,
            path: path.to_string(),
            alias,
            import_symbols: false,
            export_symbols: false,
            file,
            span,
        })
    }

    /// `#import "path" *`
    pub fn import_symbols(&mut self, path: &str, file: Option<FileId>) -> Item {
        let (id, span) = self.next();
        Item::Import(Import {
            id,
            path: path.to_string(),
            alias: None,
            import_symbols: true,
            export_symbols: false,
            file,
            span,
        })
    }

    pub fn library(&mut self, path: &str, alias: Option<&str>) -> Item {
        let alias = alias.map(|a| self.ident(a));
        let (id, span) = self.next();
        Item::Library(Library {
            id,
            path: path.to_string(),
            alias,
            span,
        })
    }

    /// `#foreign library { decls }`
    pub fn foreign_block(
        &mut self,
        library: &str,
        decls: Vec<Declaration>,
        linkprefix: Option<&str>,
    ) -> Item {
        let foreign = Some(self.ident(library));
        let (id, span) = self.next();
        Item::DeclBlock(DeclBlock {
            id,
            decls,
            foreign,
            linkprefix: linkprefix.map(str::to_string),
            callconv: None,
            span,
        })
    }

    pub fn test_case(&mut self, name: &str, body: Vec<Stmt>) -> Item {
        let body = self.block(body);
        let (id, span) = self.next();
        Item::Test(TestCase {
            id,
            name: name.to_string(),
            body,
            span,
        })
    }

    pub fn finish(&self, path: &str, items: Vec<Item>) -> SourceFile {
        SourceFile {
            id: self.file,
            path: path.to_string(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_positions_distinct() {
        let mut b = AstBuilder::new(FileId(3));
        let a = b.name("a");
        let c = b.int(1);
        assert_ne!(a.id(), c.id());
        assert_ne!(a.span(), c.span());
        assert_eq!(a.span().file, FileId(3));
    }

    #[test]
    fn line_moves_the_cursor() {
        let mut b = AstBuilder::new(FileId(0));
        b.line(7);
        let x = b.name("x");
        assert_eq!(x.span().line, 7);
        assert_eq!(x.span().col, 1);
    }

    #[test]
    fn func_carries_labels() {
        let mut b = AstBuilder::new(FileId(0));
        let ty = b.name("i32");
        let ret = b.name("i32");
        let body_value = b.name("a");
        let body = vec![b.ret(vec![body_value])];
        let func = b.func(vec![("a", ty)], vec![ret], body);
        let Expr::Func(lit) = func else {
            panic!("expected function literal");
        };
        assert_eq!(lit.signature.labels.as_ref().map(|l| l.len()), Some(1));
        assert!(!lit.signature.is_variadic());
        assert_eq!(lit.body.stmts.len(), 1);
    }

    #[test]
    fn labeled_sets_loop_label() {
        let mut b = AstBuilder::new(FileId(0));
        let loop_stmt = b.for_stmt(None, None, None, vec![]);
        let Stmt::For(f) = b.labeled("outer", loop_stmt) else {
            panic!("expected for");
        };
        assert_eq!(f.label.map(|l| l.name), Some("outer".to_string()));
    }
}
