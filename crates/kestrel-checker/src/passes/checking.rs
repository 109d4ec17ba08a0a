//! Checking Pass (Pass 2) - Type every top-level declaration.
//!
//! Declarations are visited in file order, but most will already have been
//! checked by the time the walk reaches them: a reference to an unchecked
//! entity checks its declaration on demand. The per-table `checked` set
//! makes the second visit a no-op.
//!
//! ## Phases
//!
//! 1. File-level `using`, for every file, so the names it introduces are
//!    in place before any declaration is typed.
//! 2. Declarations and declaration blocks.
//! 3. `#test` blocks, only with [`CheckerOptions::test_mode`](crate::CheckerOptions).

use kestrel_ast::{Item, TestCase};
use kestrel_core::{FileId, TypeId};
use tracing::debug;

use crate::checker::Checker;
use crate::entity::DeclRef;
use crate::scope::ScopeKind;

/// Output of the checking pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckingOutput {
    /// Top-level declarations visited.
    pub declarations: usize,
    pub tests: usize,
}

/// Pass 2: type top-level declarations and test blocks.
pub struct CheckingPass<'c, 'a> {
    checker: &'c mut Checker<'a>,
    output: CheckingOutput,
}

impl<'c, 'a> CheckingPass<'c, 'a> {
    pub fn new(checker: &'c mut Checker<'a>) -> Self {
        Self {
            checker,
            output: CheckingOutput::default(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> CheckingOutput {
        let files = self.checker.sources.len();
        for index in 0..files {
            self.check_usings(FileId(index as u32));
        }
        for index in 0..files {
            self.check_file(FileId(index as u32));
        }
        if self.checker.program.options.test_mode {
            for index in 0..files {
                self.check_tests(FileId(index as u32));
            }
        }
        self.output
    }

    fn check_usings(&mut self, file: FileId) {
        let previous = self.checker.enter_file(file);
        for item in &self.checker.source(file).items {
            if let Item::Using(using) = item {
                self.checker.check_using(using);
            }
        }
        self.checker.leave_file(previous);
    }

    fn check_file(&mut self, file: FileId) {
        let previous = self.checker.enter_file(file);
        let source = self.checker.source(file);
        debug!(file = %source.path, items = source.items.len(), "checking file");

        for (index, item) in source.items.iter().enumerate() {
            let item_index = index as u32;
            match item {
                Item::Decl(_) => {
                    self.checker.check_top_level(DeclRef {
                        file,
                        item: item_index,
                        member: None,
                    });
                    self.output.declarations += 1;
                }
                Item::DeclBlock(block) => {
                    if let Some(library) = &block.foreign {
                        self.checker.check_foreign_library(library);
                    }
                    for member in 0..block.decls.len() {
                        self.checker.check_top_level(DeclRef {
                            file,
                            item: item_index,
                            member: Some(member as u32),
                        });
                        self.output.declarations += 1;
                    }
                }
                Item::Import(_) | Item::Library(_) | Item::Using(_) | Item::Test(_) => {}
            }
        }
        self.checker.leave_file(previous);
    }

    fn check_tests(&mut self, file: FileId) {
        let previous = self.checker.enter_file(file);
        for item in &self.checker.source(file).items {
            if let Item::Test(test) = item {
                self.check_test(test);
            }
        }
        self.checker.leave_file(previous);
    }

    /// A test body is checked like the body of a function returning nothing.
    fn check_test(&mut self, test: &TestCase) {
        debug!(name = %test.name, "checking test");
        let scope = self.checker.file_scope(self.checker.file);
        self.checker.push_boundary(scope, ScopeKind::Function);
        self.checker.contexts.top_mut().expected_return = Some(TypeId::VOID_TUPLE);
        self.checker.check_body(&test.body, TypeId::VOID_TUPLE);
        self.checker.pop_context();
        self.output.tests += 1;
    }
}

#[cfg(test)]
mod tests {
    use kestrel_ast::AstBuilder;
    use kestrel_core::FileId;

    use crate::options::CheckerOptions;
    use crate::program::Program;
    use crate::specialization::SpecializationList;

    fn file_with_failing_test() -> kestrel_ast::SourceFile {
        let mut b = AstBuilder::new(FileId(0));
        let missing = b.name("missing");
        let stmt = b.var("x", None, Some(missing));
        let test = b.test_case("broken", vec![stmt]);
        b.finish("main.k", vec![test])
    }

    #[test]
    fn tests_are_skipped_outside_test_mode() {
        let sources = vec![file_with_failing_test()];
        let mut program = Program::new(CheckerOptions::default());
        program.check(&sources, &SpecializationList::new());
        assert!(!program.has_errors());
    }

    #[test]
    fn tests_are_checked_in_test_mode() {
        let sources = vec![file_with_failing_test()];
        let mut program = Program::new(CheckerOptions::default().with_test_mode(true));
        program.check(&sources, &SpecializationList::new());
        assert_eq!(
            program.diagnostics(FileId(0)).messages(),
            vec!["use of undefined identifier 'missing'"]
        );
    }
}
