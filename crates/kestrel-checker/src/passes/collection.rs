//! Collection Pass (Pass 1) - Reserve top-level names before anything is typed.
//!
//! Every declaration at file scope gets its entities here, untyped, with a
//! [`DeclRef`] back to its node. That is what lets a declaration refer to
//! one further down the file, or in another file: the reference finds an
//! unchecked entity and checks its declaration on the spot.
//!
//! ## Phases
//!
//! 1. Each file's own declarations, declaration blocks and libraries.
//! 2. Imports. Run after phase 1 for all files so `#import "x" *` sees the
//!    complete member list of the imported file.

use kestrel_ast::{DeclBlock, Declaration, Import, Item, Library};
use kestrel_core::{CheckError, EntityId, FileId, TypeId};
use tracing::debug;

use crate::checker::Checker;
use crate::entity::{DeclRef, Entity, EntityFlags};
use crate::stmt::decl::{declaration_flags, link_name};

/// Output of the collection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectionOutput {
    /// Entities reserved for declaration names.
    pub declarations: usize,
    pub libraries: usize,
    /// Imports bound as file entities or as imported symbols.
    pub imports: usize,
}

/// Pass 1: reserve top-level names.
pub struct CollectionPass<'c, 'a> {
    checker: &'c mut Checker<'a>,
    output: CollectionOutput,
}

impl<'c, 'a> CollectionPass<'c, 'a> {
    pub fn new(checker: &'c mut Checker<'a>) -> Self {
        Self {
            checker,
            output: CollectionOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> CollectionOutput {
        let files = self.checker.sources.len();
        for index in 0..files {
            self.collect_file(FileId(index as u32));
        }
        for index in 0..files {
            self.collect_imports(FileId(index as u32));
        }
        self.output
    }

    fn collect_file(&mut self, file: FileId) {
        let previous = self.checker.enter_file(file);
        let source = self.checker.source(file);
        let before = self.output.declarations;

        for (index, item) in source.items.iter().enumerate() {
            let item_index = index as u32;
            match item {
                Item::Decl(decl) => {
                    let decl_ref = DeclRef {
                        file,
                        item: item_index,
                        member: None,
                    };
                    self.collect_decl(decl, None, decl_ref);
                }
                Item::DeclBlock(block) => {
                    for (member, decl) in block.decls.iter().enumerate() {
                        let decl_ref = DeclRef {
                            file,
                            item: item_index,
                            member: Some(member as u32),
                        };
                        self.collect_decl(decl, Some(block), decl_ref);
                    }
                }
                Item::Library(library) => self.collect_library(library),
                Item::Import(_) | Item::Using(_) | Item::Test(_) => {}
            }
        }

        debug!(
            file = %source.path,
            declarations = self.output.declarations - before,
            "collected file"
        );
        self.checker.leave_file(previous);
    }

    fn collect_decl(&mut self, decl: &Declaration, block: Option<&DeclBlock>, decl_ref: DeclRef) {
        let flags = declaration_flags(decl, block);
        let mut entities = Vec::with_capacity(decl.names.len());
        for name in &decl.names {
            let entity = self.checker.new_entity(name, flags);
            if entity != EntityId::ANONYMOUS {
                let linkname = link_name(decl, block, &name.name);
                let e = self.checker.entity_mut(entity);
                e.decl = Some(decl_ref);
                e.linkname = linkname;
                self.checker.declare(entity);
                self.output.declarations += 1;
            }
            entities.push(entity);
        }
        self.checker.table_mut().declared.insert(decl.id, entities);
    }

    /// Libraries may be named more than once; the first name wins.
    fn collect_library(&mut self, library: &Library) {
        let flags = EntityFlags::LIBRARY | EntityFlags::CHECKED;
        let entity = match &library.alias {
            Some(alias) => self.checker.new_entity(alias, flags),
            None => {
                let name = library_name(&library.path);
                if name.is_empty() {
                    self.checker.report(CheckError::ImportNameUnknown {
                        path: library.path.clone(),
                        span: library.span,
                    });
                    return;
                }
                let entity = Entity::new(name, library.span, flags).in_scope(self.checker.scope());
                self.checker.program.entities.alloc(entity)
            }
        };
        if entity == EntityId::ANONYMOUS {
            return;
        }
        self.checker.entity_mut(entity).ty = Some(TypeId::VOID);

        let scope = self.checker.scope();
        if self.checker.bind(scope, entity, false).is_err() {
            debug!(path = %library.path, "library already named in this file");
        }
        self.output.libraries += 1;
    }

    fn collect_imports(&mut self, file: FileId) {
        let previous = self.checker.enter_file(file);
        let source = self.checker.source(file);
        for item in &source.items {
            if let Item::Import(import) = item {
                self.collect_import(import);
            }
        }
        self.checker.leave_file(previous);
    }

    fn collect_import(&mut self, import: &Import) {
        let Some(imported) = import.file.filter(|f| f.index() < self.checker.sources.len()) else {
            self.checker.report(CheckError::UnresolvedImport {
                path: import.path.clone(),
                span: import.span,
            });
            return;
        };
        let member_scope = self.checker.file_scope(imported);

        if import.alias.is_some() || !import.import_symbols {
            self.declare_file_entity(import, imported);
        }
        if import.import_symbols {
            self.import_symbols(import, imported);
        }
        self.output.imports += 1;
        debug!(path = %import.path, scope = ?member_scope, "bound import");
    }

    /// `#import "path" alias`: a file entity whose members are the imported
    /// file's own declarations.
    fn declare_file_entity(&mut self, import: &Import, imported: FileId) {
        let member_scope = self.checker.file_scope(imported);
        let ty = self.checker.types_mut().file(member_scope);
        let flags = EntityFlags::FILE | EntityFlags::CHECKED;

        let entity = match &import.alias {
            Some(alias) => self.checker.new_entity(alias, flags),
            None => {
                let name = self.checker.source(imported).module_name();
                if name.is_empty() {
                    self.checker.report(CheckError::ImportNameUnknown {
                        path: import.path.clone(),
                        span: import.span,
                    });
                    return;
                }
                let entity = Entity::new(name, import.span, flags).in_scope(self.checker.scope());
                self.checker.program.entities.alloc(entity)
            }
        };
        if entity == EntityId::ANONYMOUS {
            return;
        }
        let e = self.checker.entity_mut(entity);
        e.ty = Some(ty);
        e.member_scope = Some(member_scope);

        let scope = self.checker.scope();
        if let Err(existing) = self.checker.bind(scope, entity, false) {
            let previous = self.checker.entity(existing.entity).span;
            self.checker.report(CheckError::Redeclaration {
                name: self.checker.entity(entity).name.clone(),
                span: import.span,
                previous,
            });
        }
    }

    /// `#import "path" *`: the imported file's declarations become visible
    /// unqualified. They stay owned by the imported file unless re-exported.
    fn import_symbols(&mut self, import: &Import, imported: FileId) {
        let member_scope = self.checker.file_scope(imported);
        let members = self.checker.program.scopes.members(member_scope);
        let scope = self.checker.scope();

        for (_, member) in members {
            let entity = self.checker.entity(member.entity);
            if !member.owned || entity.is(EntityFlags::FILE) || entity.is(EntityFlags::LIBRARY) {
                continue;
            }
            if let Err(existing) = self.checker.bind(scope, member.entity, import.export_symbols) {
                let name = self.checker.entity(member.entity).name.clone();
                let previous = self.checker.entity(existing.entity).span;
                self.checker.report(CheckError::AmbiguousImport {
                    name,
                    span: import.span,
                    previous,
                });
            }
        }
    }
}

/// `"path/to/libfoo.so"` names the library `foo`.
fn library_name(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    stem.strip_prefix("lib")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(stem)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::AstBuilder;

    use crate::testing::check_source;

    #[test]
    fn library_names() {
        assert_eq!(library_name("libc"), "c");
        assert_eq!(library_name("/usr/lib/libSDL2.so"), "SDL2");
        assert_eq!(library_name("kernel32.dll"), "kernel32");
        assert_eq!(library_name("lib"), "lib");
    }

    #[test]
    fn forward_references_resolve() {
        let mut b = AstBuilder::new(FileId(0));
        let later = b.name("later");
        let early = b.const_item("early", later);
        let five = b.int(5);
        let later = b.const_item("later", five);
        let file = b.finish("main.k", vec![early, later]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        let early = program.lookup(FileId(0), "early").expect("early is declared");
        assert_eq!(program.entity(early).ty, Some(TypeId::UNTYPED_INT));
    }

    #[test]
    fn redeclaration_at_file_scope() {
        let mut b = AstBuilder::new(FileId(0));
        let one = b.int(1);
        let first = b.const_item("x", one);
        let two = b.int(2);
        let second = b.const_item("x", two);
        let file = b.finish("main.k", vec![first, second]);

        let (program, _) = check_source(vec![file]);
        let diagnostics = program.diagnostics(FileId(0));
        assert_eq!(diagnostics.messages(), vec!["invalid redeclaration of 'x'"]);
        assert_eq!(diagnostics.as_slice()[0].notes.len(), 1);
    }

    #[test]
    fn unresolved_import() {
        let mut b = AstBuilder::new(FileId(0));
        let import = b.import("missing", None, None);
        let file = b.finish("main.k", vec![import]);

        let (program, _) = check_source(vec![file]);
        assert_eq!(
            program.diagnostics(FileId(0)).messages(),
            vec!["failed to resolve import 'missing'"]
        );
    }

    #[test]
    fn foreign_block_needs_a_library() {
        let mut b = AstBuilder::new(FileId(0));
        let library = b.library("libc", None);
        let i32_ty = b.name("i32");
        let f = b.func_type(vec![i32_ty], vec![]);
        let decl = b.decl(&["exit"], None, vec![f], true);
        let block = b.foreign_block("c", vec![decl], Some("_"));
        let file = b.finish("main.k", vec![library, block]);

        let (program, _) = check_source(vec![file]);
        assert!(!program.has_errors(), "{}", program.render_diagnostics());
        let exit = program.lookup(FileId(0), "exit").expect("exit is declared");
        let exit = program.entity(exit);
        assert!(exit.is(EntityFlags::FOREIGN));
        assert_eq!(exit.linkname.as_deref(), Some("_exit"));
    }
}
