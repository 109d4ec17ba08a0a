//! Performance benchmarks for checking generated Kestrel programs.
//!
//! - Size-based: programs of 10 to 1000 functions
//! - Specialization-heavy: many call sites of one polymorphic function
//! - Multi-file: declarations spread over files that import each other
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kestrel::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

// =============================================================================
// Program generators
// =============================================================================

/// `fN :: (x: i64) -> i64 { y := x * N; if y > 100 { return y - 1 } return y + fN-1(x) }`
fn function_item(b: &mut AstBuilder, index: usize) -> Item {
    let x = b.name("x");
    let factor = b.int(index as i64 + 1);
    let product = b.binary(BinaryOp::Mul, x, factor);
    let y_decl = b.var("y", None, Some(product));

    let y = b.name("y");
    let limit = b.int(100);
    let over = b.binary(BinaryOp::Greater, y, limit);
    let y = b.name("y");
    let one = b.int(1);
    let less = b.binary(BinaryOp::Sub, y, one);
    let early = b.ret(vec![less]);
    let branch = b.if_stmt(over, vec![early], None);

    let tail = if index == 0 {
        b.name("y")
    } else {
        let callee = b.name(&format!("f{}", index - 1));
        let x = b.name("x");
        let call = b.call(callee, vec![x]);
        let y = b.name("y");
        b.binary(BinaryOp::Add, y, call)
    };
    let ret = b.ret(vec![tail]);

    let param = b.name("i64");
    let result = b.name("i64");
    let func = b.func(vec![("x", param)], vec![result], vec![y_decl, branch, ret]);
    b.const_item(&format!("f{index}"), func)
}

fn sized_program(functions: usize) -> Vec<SourceFile> {
    let mut b = AstBuilder::new(FileId(0));
    let items = (0..functions)
        .map(|i| {
            b.line(i as u32 + 1);
            function_item(&mut b, i)
        })
        .collect();
    vec![b.finish("main.k", items)]
}

/// One polymorphic identity function called with `calls` arguments of
/// alternating types.
fn specialization_program(calls: usize) -> Vec<SourceFile> {
    let mut b = AstBuilder::new(FileId(0));
    let x = b.name("x");
    let ret = b.ret(vec![x]);
    let param = b.poly("T");
    let result = b.name("T");
    let func = b.func(vec![("x", param)], vec![result], vec![ret]);
    let id = b.const_item("id", func);

    let mut stmts = Vec::with_capacity(calls);
    for i in 0..calls {
        let callee = b.name("id");
        let arg = match i % 3 {
            0 => b.int(i as i64),
            1 => b.float(i as f64),
            _ => b.string("s"),
        };
        let call = b.call(callee, vec![arg]);
        stmts.push(b.var(&format!("v{i}"), None, Some(call)));
    }
    let main = b.func(vec![], vec![], stmts);
    let main = b.const_item("main", main);
    vec![b.finish("main.k", vec![id, main])]
}

/// `files` files, each importing the previous one's symbols.
fn multi_file_program(files: usize, per_file: usize) -> Vec<SourceFile> {
    (0..files)
        .map(|f| {
            let mut b = AstBuilder::new(FileId(f as u32));
            let mut items = Vec::with_capacity(per_file + 1);
            if f > 0 {
                let path = format!("file{}.k", f - 1);
                items.push(b.import_symbols(&path, Some(FileId(f as u32 - 1))));
            }
            for i in 0..per_file {
                let name = format!("c{f}_{i}");
                let value = if f > 0 {
                    let previous = b.name(&format!("c{}_{}", f - 1, i));
                    let one = b.int(1);
                    b.binary(BinaryOp::Add, previous, one)
                } else {
                    b.int(i as i64)
                };
                items.push(b.const_item(&name, value));
            }
            b.finish(&format!("file{f}.k"), items)
        })
        .collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn size_based_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("sized");
    for functions in [10, 100, 1000] {
        let sources = sized_program(functions);
        group.throughput(Throughput::Elements(functions as u64));
        group.bench_with_input(BenchmarkId::from_parameter(functions), &sources, |b, sources| {
            b.iter(|| {
                let (program, _) = check(black_box(sources), CheckerOptions::default());
                end_profiling_frame();
                black_box(program.has_errors())
            })
        });
    }
    group.finish();
}

fn specialization_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("specialization");
    for calls in [30, 300] {
        let sources = specialization_program(calls);
        group.throughput(Throughput::Elements(calls as u64));
        group.bench_with_input(BenchmarkId::from_parameter(calls), &sources, |b, sources| {
            b.iter(|| {
                let (_, list) = check(black_box(sources), CheckerOptions::default());
                end_profiling_frame();
                black_box(list.len())
            })
        });
    }
    group.finish();
}

fn multi_file_benchmarks(c: &mut Criterion) {
    let sources = multi_file_program(20, 50);
    c.bench_function("multi_file_20x50", |b| {
        b.iter(|| {
            let (program, _) = check(black_box(&sources), CheckerOptions::default());
            end_profiling_frame();
            black_box(program.fingerprint())
        })
    });
}

criterion_group!(
    benches,
    size_based_benchmarks,
    specialization_benchmarks,
    multi_file_benchmarks
);
criterion_main!(benches);
