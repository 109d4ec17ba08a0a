//! Declarations and top-level items.

use kestrel_core::{FileId, NodeId, Span};

use crate::expr::{Expr, Ident};
use crate::stmt::{Block, UsingStmt};

/// `a, b : T = x, y` (variables) or `a :: x` (constants).
///
/// The checker records the entities it creates for `names` against this
/// node's id; that record is the declaration's resolved-entity slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: NodeId,
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub constant: bool,
    pub linkname: Option<String>,
    pub callconv: Option<String>,
    pub span: Span,
}

/// A group of declarations sharing link attributes.
///
/// With `foreign` set, every member is a body-less declaration provided by
/// that library.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclBlock {
    pub id: NodeId,
    pub decls: Vec<Declaration>,
    pub foreign: Option<Ident>,
    pub linkprefix: Option<String>,
    pub callconv: Option<String>,
    pub span: Span,
}

/// `#import "path" alias`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub id: NodeId,
    pub path: String,
    pub alias: Option<Ident>,
    /// `#import "path" *`: members are also declared directly in this file.
    pub import_symbols: bool,
    /// Imported members are owned by this file's scope and re-exported.
    pub export_symbols: bool,
    /// The imported file, filled in by import resolution.
    pub file: Option<FileId>,
    pub span: Span,
}

/// `#library "name" alias`
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    pub id: NodeId,
    pub path: String,
    pub alias: Option<Ident>,
    pub span: Span,
}

/// `#test "name" { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub id: NodeId,
    pub name: String,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import(Import),
    Library(Library),
    DeclBlock(DeclBlock),
    Decl(Declaration),
    Using(UsingStmt),
    Test(TestCase),
}

impl Item {
    pub fn id(&self) -> NodeId {
        match self {
            Item::Import(i) => i.id,
            Item::Library(i) => i.id,
            Item::DeclBlock(i) => i.id,
            Item::Decl(i) => i.id,
            Item::Using(i) => i.id,
            Item::Test(i) => i.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Item::Import(i) => i.span,
            Item::Library(i) => i.span,
            Item::DeclBlock(i) => i.span,
            Item::Decl(i) => i.span,
            Item::Using(i) => i.span,
            Item::Test(i) => i.span,
        }
    }
}

/// One parsed source file with its imports resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub id: FileId,
    pub path: String,
    pub items: Vec<Item>,
}

impl SourceFile {
    /// Stem of the file name, used as the module name of its symbols.
    pub fn module_name(&self) -> &str {
        let name = self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path);
        name.split('.').next().unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_strips_directories_and_extension() {
        let file = SourceFile {
            id: FileId(0),
            path: "src/math/vec.kst".into(),
            items: Vec::new(),
        };
        assert_eq!(file.module_name(), "vec");

        let file = SourceFile {
            id: FileId(1),
            path: "main".into(),
            items: Vec::new(),
        };
        assert_eq!(file.module_name(), "main");
    }
}
