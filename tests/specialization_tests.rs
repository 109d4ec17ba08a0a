//! Integration tests for polymorphic functions and structs.

use std::thread;

use kestrel::prelude::*;

/// `id :: (x: $T) -> T { return x }`
fn identity(b: &mut AstBuilder) -> Item {
    let x = b.name("x");
    let ret = b.ret(vec![x]);
    let param = b.poly("T");
    let result = b.name("T");
    let func = b.func(vec![("x", param)], vec![result], vec![ret]);
    b.const_item("id", func)
}

/// `main :: () { a := id(1); c := id(2); d := id(1.5) }`
fn program_source() -> SourceFile {
    let mut b = AstBuilder::new(FileId(0));
    let id = identity(&mut b);

    let mut stmts = Vec::new();
    for (name, arg) in [("a", None), ("c", None), ("d", Some(1.5))] {
        let callee = b.name("id");
        let arg = match arg {
            Some(value) => b.float(value),
            None => b.int(1),
        };
        let call = b.call(callee, vec![arg]);
        stmts.push(b.var(name, None, Some(call)));
    }
    let main = b.func(vec![], vec![], stmts);
    let main = b.const_item("main", main);
    b.finish("main.k", vec![id, main])
}

#[test]
fn test_one_specialization_per_binding() {
    let (program, list) = check(&[program_source()], CheckerOptions::default());

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    assert_eq!(list.len(), 2);
    assert_eq!(list.mangled_names(), vec!["main.id$i64", "main.id$f64"]);
    assert_eq!(program.specializations().len(), 2);
    assert_eq!(program.generics().len(), 1);
}

#[test]
fn test_specialized_signatures() {
    let (program, _) = check(&[program_source()], CheckerOptions::default());

    let signatures: Vec<&str> = program
        .specializations()
        .iter()
        .map(|s| s.signature.as_str())
        .collect();
    assert_eq!(signatures, vec!["(i64) -> i64", "(f64) -> f64"]);
    let keys: Vec<Vec<String>> = program
        .specializations()
        .iter()
        .map(|s| s.key_names.clone())
        .collect();
    assert_eq!(keys, vec![vec!["i64".to_string()], vec!["f64".to_string()]]);
}

#[test]
fn test_mangle_root_option() {
    let options = CheckerOptions::default().with_mangle_root("app");
    let (_, list) = check(&[program_source()], options);
    assert_eq!(list.mangled_names(), vec!["app.id$i64", "app.id$f64"]);
}

#[test]
fn test_checking_is_deterministic() {
    let (first, _) = check(&[program_source()], CheckerOptions::default());
    let (second, _) = check(&[program_source()], CheckerOptions::default());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.render_diagnostics(), second.render_diagnostics());
}

#[test]
fn test_list_is_shared_across_threads() {
    let sources = [program_source()];
    let list = SpecializationList::new();
    let observer = list.clone();

    thread::scope(|scope| {
        scope.spawn(|| {
            let mut program = Program::new(CheckerOptions::default());
            program.check(&sources, &list);
        });
    });

    let drained = observer.drain();
    assert_eq!(drained.len(), 2);
    assert!(list.is_empty());
}

#[test]
fn test_unresolved_placeholder() {
    let mut b = AstBuilder::new(FileId(0));
    let zero = b.int(0);
    let ret = b.ret(vec![zero]);
    let result = b.poly("T");
    let func = b.func(vec![], vec![result], vec![ret]);
    let make = b.const_item("make", func);

    let callee = b.name("make");
    let call = b.call(callee, vec![]);
    let x = b.var("x", None, Some(call));
    let main = b.func(vec![], vec![], vec![x]);
    let main = b.const_item("main", main);
    let (program, list) = check(&[b.finish("main.k", vec![make, main])], CheckerOptions::default());

    assert_eq!(
        program.diagnostics(FileId(0)).messages(),
        vec!["cannot infer polymorphic type 'T' in call to 'make'"]
    );
    assert!(list.is_empty());
}

#[test]
fn test_errors_inside_specializations_note_the_call() {
    // add :: (x: $T) -> T { return x + "text" }
    let mut b = AstBuilder::new(FileId(0));
    let x = b.name("x");
    let text = b.string("text");
    let sum = b.binary(BinaryOp::Add, x, text);
    let ret = b.ret(vec![sum]);
    let param = b.poly("T");
    let result = b.name("T");
    let func = b.func(vec![("x", param)], vec![result], vec![ret]);
    let add = b.const_item("add", func);

    let callee = b.name("add");
    let one = b.int(1);
    let call = b.call(callee, vec![one]);
    let y = b.var("y", None, Some(call));
    let main = b.func(vec![], vec![], vec![y]);
    let main = b.const_item("main", main);
    let (program, _) = check(&[b.finish("main.k", vec![add, main])], CheckerOptions::default());

    let diagnostics = program.diagnostics(FileId(0)).as_slice();
    assert!(!diagnostics.is_empty(), "expected an error in the specialization");
    assert!(
        diagnostics[0]
            .notes
            .iter()
            .any(|note| note.message == "called from here")
    );
}

#[test]
fn test_poly_struct_instances() {
    // Pair :: struct($A, $B) { first: A, second: B }
    let mut b = AstBuilder::new(FileId(0));
    let first = b.name("A");
    let second = b.name("B");
    let pair = b.poly_struct_type(vec!["A", "B"], vec![("first", first), ("second", second)]);
    let pair = b.const_item("Pair", pair);

    let sizeof = b.name("sizeof");
    let pair_ty = b.name("Pair");
    let i32_a = b.name("i32");
    let i32_b = b.name("i32");
    let instance = b.call(pair_ty, vec![i32_a, i32_b]);
    let size_call = b.call(sizeof, vec![instance]);
    let size = b.const_item("size", size_call);
    let (program, _) = check(&[b.finish("main.k", vec![pair, size])], CheckerOptions::default());

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let size = program.lookup(FileId(0), "size").unwrap();
    assert_eq!(program.entity(size).constant, Some(ConstValue::Int(8)));
    assert_eq!(program.poly_structs().len(), 1);
    assert_eq!(program.poly_structs()[0].instances.len(), 1);
}

#[test]
fn test_poly_struct_arity() {
    let mut b = AstBuilder::new(FileId(0));
    let first = b.name("A");
    let boxed = b.poly_struct_type(vec!["A"], vec![("value", first)]);
    let boxed = b.const_item("Box", boxed);

    let box_ty = b.name("Box");
    let i32_ty = b.name("i32");
    let f64_ty = b.name("f64");
    let instance = b.call(box_ty, vec![i32_ty, f64_ty]);
    let x = b.var_item("x", Some(instance), None);
    let (program, _) = check(&[b.finish("main.k", vec![boxed, x])], CheckerOptions::default());

    assert!(
        program
            .diagnostics(FileId(0))
            .contains("polymorphic struct 'Box' expects 1 type arguments, found 2"),
        "{}",
        program.render_diagnostics()
    );
}
