//! Integration tests for programs spanning several files.

use kestrel::prelude::*;

/// `lib.k`: `answer :: 42` and `VERSION :: "1.0"`.
fn library_file(id: FileId, path: &str) -> SourceFile {
    let mut b = AstBuilder::new(id);
    let value = b.int(42);
    let answer = b.const_item("answer", value);
    let text = b.string("1.0");
    let version = b.const_item("VERSION", text);
    b.finish(path, vec![answer, version])
}

fn messages(program: &Program) -> Vec<String> {
    program.all_diagnostics().map(|d| d.message.clone()).collect()
}

#[test]
fn test_files_do_not_share_top_level_names() {
    let mut b = AstBuilder::new(FileId(0));
    let answer = b.name("answer");
    let x = b.var_item("x", None, Some(answer));
    let main = b.finish("main.k", vec![x]);

    let (program, _) = check(
        &[main, library_file(FileId(1), "lib.k")],
        CheckerOptions::default(),
    );
    assert_eq!(messages(&program), vec!["use of undefined identifier 'answer'"]);
}

#[test]
fn test_aliased_import_selects_members() {
    let mut b = AstBuilder::new(FileId(0));
    let import = b.import("lib.k", Some("lib"), Some(FileId(1)));
    let lib = b.name("lib");
    let answer = b.selector(lib, "answer");
    let x = b.var_item("x", None, Some(answer));
    let main = b.finish("main.k", vec![import, x]);

    let (program, _) = check(
        &[main, library_file(FileId(1), "lib.k")],
        CheckerOptions::default(),
    );
    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let x = program.lookup(FileId(0), "x").unwrap();
    assert_eq!(program.entity(x).ty, Some(TypeId::I64));
}

#[test]
fn test_import_without_alias_uses_module_name() {
    let mut b = AstBuilder::new(FileId(0));
    let import = b.import("util/lib.k", None, Some(FileId(1)));
    let lib = b.name("lib");
    let version = b.selector(lib, "VERSION");
    let v = b.var_item("v", None, Some(version));
    let main = b.finish("main.k", vec![import, v]);

    let (program, _) = check(
        &[main, library_file(FileId(1), "util/lib.k")],
        CheckerOptions::default(),
    );
    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let v = program.lookup(FileId(0), "v").unwrap();
    assert_eq!(program.entity(v).ty, Some(TypeId::STRING));
}

#[test]
fn test_symbol_import_makes_names_visible() {
    let mut b = AstBuilder::new(FileId(0));
    let import = b.import_symbols("lib.k", Some(FileId(1)));
    let answer = b.name("answer");
    let one = b.int(1);
    let sum = b.binary(BinaryOp::Add, answer, one);
    let x = b.const_item("x", sum);
    let main = b.finish("main.k", vec![import, x]);

    let (program, _) = check(
        &[main, library_file(FileId(1), "lib.k")],
        CheckerOptions::default(),
    );
    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let x = program.lookup(FileId(0), "x").unwrap();
    assert_eq!(program.entity(x).constant, Some(ConstValue::Int(43)));
}

#[test]
fn test_ambiguous_symbol_import() {
    let mut b = AstBuilder::new(FileId(0));
    let first = b.import_symbols("a.k", Some(FileId(1)));
    let second = b.import_symbols("b.k", Some(FileId(2)));
    let main = b.finish("main.k", vec![first, second]);

    let (program, _) = check(
        &[
            main,
            library_file(FileId(1), "a.k"),
            library_file(FileId(2), "b.k"),
        ],
        CheckerOptions::default(),
    );
    let diagnostics = program.diagnostics(FileId(0)).as_slice();
    assert!(!diagnostics.is_empty());
    assert!(diagnostics.iter().all(|d| d.message.starts_with("ambiguous import of")));
    assert_eq!(diagnostics[0].notes[0].message, "also imported here");
}

#[test]
fn test_errors_land_in_their_own_file() {
    let mut b = AstBuilder::new(FileId(0));
    let import = b.import_symbols("lib.k", Some(FileId(1)));
    let answer = b.name("answer");
    let x = b.var_item("x", None, Some(answer));
    let main = b.finish("main.k", vec![import, x]);

    let mut b = AstBuilder::new(FileId(1));
    let one = b.int(1);
    let zero = b.int(0);
    let div = b.binary(BinaryOp::Div, one, zero);
    let answer = b.const_item("answer", div);
    let lib = b.finish("lib.k", vec![answer]);

    let (program, _) = check(&[main, lib], CheckerOptions::default());
    assert!(program.diagnostics(FileId(0)).is_empty());
    assert_eq!(program.diagnostics(FileId(1)).messages(), vec!["division by zero"]);
}

#[test]
fn test_unresolved_import() {
    let mut b = AstBuilder::new(FileId(0));
    let import = b.import("gone.k", Some("gone"), None);
    let main = b.finish("main.k", vec![import]);

    let (program, _) = check(&[main], CheckerOptions::default());
    assert_eq!(messages(&program), vec!["failed to resolve import 'gone.k'"]);
}

#[test]
fn test_fingerprint_is_deterministic_across_files() {
    let build = || {
        let mut b = AstBuilder::new(FileId(0));
        let import = b.import_symbols("lib.k", Some(FileId(1)));
        let answer = b.name("answer");
        let x = b.var_item("x", None, Some(answer));
        vec![
            b.finish("main.k", vec![import, x]),
            library_file(FileId(1), "lib.k"),
        ]
    };
    let (first, _) = check(&build(), CheckerOptions::default());
    let (second, _) = check(&build(), CheckerOptions::default());
    assert_eq!(first.fingerprint(), second.fingerprint());
}
