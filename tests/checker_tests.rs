//! Integration tests for single-file checking through the public API.
//!
//! Programs are built with `AstBuilder`, checked with `kestrel::check`, and
//! inspected through `Program`.

use kestrel::prelude::*;

fn check_file(file: SourceFile) -> Program {
    let (program, _) = check(&[file], CheckerOptions::default());
    program
}

fn messages(program: &Program) -> Vec<String> {
    program.all_diagnostics().map(|d| d.message.clone()).collect()
}

fn type_of(program: &Program, name: &str) -> Option<TypeId> {
    let entity = program.lookup(FileId(0), name)?;
    program.entity(entity).ty
}

// =============================================================================
// Declarations and inference
// =============================================================================

#[test]
fn test_untyped_constants_and_defaulted_variables() {
    let mut b = AstBuilder::new(FileId(0));
    let seven = b.int(7);
    let c = b.const_item("c", seven);
    let five = b.int(5);
    let y = b.var_item("y", None, Some(five));
    let f32_ty = b.name("f32");
    let five = b.int(5);
    let z = b.var_item("z", Some(f32_ty), Some(five));
    let half = b.float(0.5);
    let h = b.var_item("h", None, Some(half));
    let program = check_file(b.finish("main.k", vec![c, y, z, h]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    assert_eq!(type_of(&program, "c"), Some(TypeId::UNTYPED_INT));
    assert_eq!(type_of(&program, "y"), Some(TypeId::I64));
    assert_eq!(type_of(&program, "z"), Some(TypeId::F32));
    assert_eq!(type_of(&program, "h"), Some(TypeId::F64));
}

#[test]
fn test_constant_folding_through_references() {
    let mut b = AstBuilder::new(FileId(0));
    let width = b.name("width");
    let two = b.int(2);
    let doubled = b.binary(BinaryOp::Mul, width, two);
    let area = b.const_item("area", doubled);
    let twenty_one = b.int(21);
    let width = b.const_item("width", twenty_one);
    let program = check_file(b.finish("main.k", vec![area, width]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let area = program.lookup(FileId(0), "area").unwrap();
    assert_eq!(program.entity(area).constant, Some(ConstValue::Int(42)));
}

#[test]
fn test_division_by_zero() {
    let mut b = AstBuilder::new(FileId(0));
    let one = b.int(1);
    let zero = b.int(0);
    let div = b.binary(BinaryOp::Div, one, zero);
    let item = b.const_item("bad", div);
    let five = b.int(5);
    let zero = b.int(0);
    let div = b.binary(BinaryOp::Div, five, zero);
    let a = b.var_item("a", None, Some(div));
    let program = check_file(b.finish("main.k", vec![item, a]));

    assert_eq!(messages(&program), vec!["division by zero", "division by zero"]);
    assert_eq!(type_of(&program, "a"), Some(TypeId::INVALID));
}

#[test]
fn test_float_division_by_constant_zero() {
    // f :: (x: f64) -> f64 { return x / 0.0 }
    let mut b = AstBuilder::new(FileId(0));
    let x = b.name("x");
    let zero = b.float(0.0);
    let div = b.binary(BinaryOp::Div, x, zero);
    let ret = b.ret(vec![div]);
    let param = b.name("f64");
    let result = b.name("f64");
    let func = b.func(vec![("x", param)], vec![result], vec![ret]);
    let f = b.const_item("f", func);
    let program = check_file(b.finish("main.k", vec![f]));

    assert_eq!(messages(&program), vec!["division by zero"]);
}

#[test]
fn test_negative_shift_amount() {
    let mut b = AstBuilder::new(FileId(0));
    let one = b.int(1);
    let minus = b.int(1);
    let minus = b.unary(UnaryOp::Neg, minus);
    let shift = b.binary(BinaryOp::ShiftLeft, one, minus);
    let c = b.const_item("c", shift);
    let program = check_file(b.finish("main.k", vec![c]));

    assert_eq!(messages(&program), vec!["invalid shift amount -1"]);
    assert_eq!(type_of(&program, "c"), Some(TypeId::INVALID));
}

#[test]
fn test_cyclic_constants() {
    let mut b = AstBuilder::new(FileId(0));
    let later = b.name("b");
    let a = b.const_item("a", later);
    let earlier = b.name("a");
    let second = b.const_item("b", earlier);
    let program = check_file(b.finish("main.k", vec![a, second]));

    assert!(program.has_errors());
    assert!(
        program
            .diagnostics(FileId(0))
            .contains("invalid recursive declaration of 'a'"),
        "{}",
        program.render_diagnostics()
    );
}

#[test]
fn test_redeclaration_carries_a_note() {
    let mut b = AstBuilder::new(FileId(0));
    let one = b.int(1);
    let first = b.var_item("x", None, Some(one));
    let two = b.int(2);
    let second = b.var_item("x", None, Some(two));
    let program = check_file(b.finish("main.k", vec![first, second]));

    let diagnostics = program.diagnostics(FileId(0)).as_slice();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "invalid redeclaration of 'x'");
    assert_eq!(diagnostics[0].notes[0].message, "previous declaration here");
}

#[test]
fn test_inner_blocks_may_shadow() {
    // main :: () { x := 1; { x := "inner"; y := x } z := x }
    let mut b = AstBuilder::new(FileId(0));
    let one = b.int(1);
    let outer = b.var("x", None, Some(one));
    let text = b.string("inner");
    let inner = b.var("x", None, Some(text));
    let inner_ref = b.name("x");
    let inner_id = inner_ref.id();
    let y = b.var("y", None, Some(inner_ref));
    let block = b.block_stmt(vec![inner, y]);
    let outer_ref = b.name("x");
    let outer_id = outer_ref.id();
    let z = b.var("z", None, Some(outer_ref));
    let func = b.func(vec![], vec![], vec![outer, block, z]);
    let main = b.const_item("main", func);
    let program = check_file(b.finish("main.k", vec![main]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let table = program.table(FileId(0));
    assert_eq!(table.type_of(inner_id), Some(TypeId::STRING));
    assert_eq!(table.type_of(outer_id), Some(TypeId::I64));
    let inner_entity = table.entity_of(inner_id).unwrap();
    let outer_entity = table.entity_of(outer_id).unwrap();
    assert_ne!(inner_entity, outer_entity);
    assert_eq!(program.entity(inner_entity).name, "x");
}

#[test]
fn test_undefined_identifier() {
    let mut b = AstBuilder::new(FileId(0));
    let missing = b.name("nowhere");
    let x = b.var_item("x", None, Some(missing));
    let program = check_file(b.finish("main.k", vec![x]));

    assert_eq!(messages(&program), vec!["use of undefined identifier 'nowhere'"]);
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_return_arity() {
    let mut b = AstBuilder::new(FileId(0));
    let i64_ty = b.name("i64");
    let one = b.int(1);
    let two = b.int(2);
    let ret = b.ret(vec![one, two]);
    let func = b.func(vec![], vec![i64_ty], vec![ret]);
    let f = b.const_item("f", func);
    let program = check_file(b.finish("main.k", vec![f]));

    assert_eq!(messages(&program), vec!["too many arguments to return"]);
}

#[test]
fn test_missing_return() {
    let mut b = AstBuilder::new(FileId(0));
    let i64_ty = b.name("i64");
    let x = b.name("x");
    let zero = b.int(0);
    let positive = b.binary(BinaryOp::Greater, x, zero);
    let one = b.int(1);
    let ret = b.ret(vec![one]);
    let branch = b.if_stmt(positive, vec![ret], None);
    let param_ty = b.name("i64");
    let func = b.func(vec![("x", param_ty)], vec![i64_ty], vec![branch]);
    let f = b.const_item("f", func);
    let program = check_file(b.finish("main.k", vec![f]));

    assert_eq!(messages(&program), vec!["missing return at end of 'f'"]);
}

#[test]
fn test_both_branches_return() {
    let mut b = AstBuilder::new(FileId(0));
    let i64_ty = b.name("i64");
    let x = b.name("x");
    let zero = b.int(0);
    let positive = b.binary(BinaryOp::Greater, x, zero);
    let one = b.int(1);
    let then = b.ret(vec![one]);
    let fallback = b.int(0);
    let els = b.ret(vec![fallback]);
    let branch = b.if_stmt(positive, vec![then], Some(vec![els]));
    let param_ty = b.name("i64");
    let func = b.func(vec![("x", param_ty)], vec![i64_ty], vec![branch]);
    let f = b.const_item("f", func);
    let program = check_file(b.finish("main.k", vec![f]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
}

#[test]
fn test_recursive_function() {
    let mut b = AstBuilder::new(FileId(0));
    let n = b.name("n");
    let one = b.int(1);
    let less = b.binary(BinaryOp::LessEqual, n, one);
    let base = b.int(1);
    let base = b.ret(vec![base]);
    let done = b.if_stmt(less, vec![base], None);

    let n = b.name("n");
    let fact = b.name("fact");
    let n_arg = b.name("n");
    let one = b.int(1);
    let minus = b.binary(BinaryOp::Sub, n_arg, one);
    let recurse = b.call(fact, vec![minus]);
    let product = b.binary(BinaryOp::Mul, n, recurse);
    let ret = b.ret(vec![product]);

    let param = b.name("i64");
    let result = b.name("i64");
    let func = b.func(vec![("n", param)], vec![result], vec![done, ret]);
    let fact = b.const_item("fact", func);
    let program = check_file(b.finish("main.k", vec![fact]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
}

#[test]
fn test_call_argument_count() {
    let mut b = AstBuilder::new(FileId(0));
    let param = b.name("i64");
    let func = b.func(vec![("x", param)], vec![], vec![]);
    let f = b.const_item("f", func);

    let callee = b.name("f");
    let call = b.call(callee, vec![]);
    let stmt = b.expr_stmt(call);
    let main = b.func(vec![], vec![], vec![stmt]);
    let main = b.const_item("main", main);
    let program = check_file(b.finish("main.k", vec![f, main]));

    assert_eq!(messages(&program), vec!["not enough arguments in call to 'f'"]);
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn test_labelled_break_and_fallthrough() {
    let mut b = AstBuilder::new(FileId(0));
    let brk = b.brk(Some("outer"));
    let inner = b.for_stmt(None, None, None, vec![brk]);
    let outer = b.for_stmt(None, None, None, vec![inner]);
    let outer = b.labeled("outer", outer);

    let subject = b.int(1);
    let one = b.int(1);
    let fall = b.fallthrough();
    let first = b.case(vec![one], vec![fall]);
    let default = b.case(vec![], vec![]);
    let switch = b.switch(Some(subject), None, vec![first, default]);

    let func = b.func(vec![], vec![], vec![outer, switch]);
    let main = b.const_item("main", func);
    let program = check_file(b.finish("main.k", vec![main]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
}

#[test]
fn test_break_outside_loop() {
    let mut b = AstBuilder::new(FileId(0));
    let brk = b.brk(None);
    let func = b.func(vec![], vec![], vec![brk]);
    let main = b.const_item("main", func);
    let program = check_file(b.finish("main.k", vec![main]));

    assert_eq!(messages(&program), vec!["break outside of a loop or switch"]);
}

// =============================================================================
// Builtins and test mode
// =============================================================================

#[test]
fn test_sizeof_is_constant() {
    let mut b = AstBuilder::new(FileId(0));
    let sizeof = b.name("sizeof");
    let i32_ty = b.name("i32");
    let call = b.call(sizeof, vec![i32_ty]);
    let size = b.const_item("size", call);
    let program = check_file(b.finish("main.k", vec![size]));

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let size = program.lookup(FileId(0), "size").unwrap();
    assert_eq!(program.entity(size).ty, Some(TypeId::U64));
    assert_eq!(program.entity(size).constant, Some(ConstValue::Int(4)));
}

fn always_bool(_: &mut Checker<'_>, _: &CallExpr) -> Operand {
    Operand::constant(TypeId::BOOL, ConstValue::Bool(true))
}

#[test]
fn test_registered_builtin_is_callable() {
    let mut b = AstBuilder::new(FileId(0));
    let callee = b.name("enabled");
    let call = b.call(callee, vec![]);
    let flag = b.const_item("flag", call);
    let sources = [b.finish("main.k", vec![flag])];

    let mut program = Program::new(CheckerOptions::default());
    program.register_builtin("enabled", always_bool).unwrap();
    program.check(&sources, &SpecializationList::new());

    assert!(!program.has_errors(), "{}", program.render_diagnostics());
    let flag = program.lookup(FileId(0), "flag").unwrap();
    assert_eq!(program.entity(flag).constant, Some(ConstValue::Bool(true)));
}

#[test]
fn test_test_blocks_only_in_test_mode() {
    let build = || {
        let mut b = AstBuilder::new(FileId(0));
        let one = b.int(1);
        let two = b.int(2);
        let ret = b.ret(vec![one, two]);
        let test = b.test_case("returns", vec![ret]);
        b.finish("main.k", vec![test])
    };

    let (normal, _) = check(&[build()], CheckerOptions::default());
    assert!(!normal.has_errors());

    let (testing, _) = check(&[build()], CheckerOptions::default().with_test_mode(true));
    assert_eq!(
        messages(&testing),
        vec!["void function should not return a value"]
    );
}
