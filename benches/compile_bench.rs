//! Benchmarks for filter compilation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use record_filter::prelude::*;
use record_filter::{Compiler, ModelId};

fn schema() -> (Schema, ModelId) {
    let mut schema = Schema::new();
    let blog = schema.register(ModelDescriptor::new("Blog", "blogs"));
    let post = schema.register(ModelDescriptor::new("Post", "posts"));
    let comment = schema.register(ModelDescriptor::new("Comment", "comments"));
    schema
        .add_relation(post, Relation::belongs_to("blog", blog))
        .add_relation(post, Relation::has_many("comments", comment));
    (schema, post)
}

/// A flat AND of `count` equality restrictions.
fn flat_scope(count: usize) -> Scope {
    let mut q = Scope::root();
    for i in 0..count {
        q.with(format!("field_{}", i)).equal_to(i as i64);
    }
    q
}

/// Alternating AND/OR groups nested `depth` levels deep.
fn nested_scope(depth: usize) -> Scope {
    fn nest(q: &mut Scope, depth: usize) -> FilterResult<()> {
        q.with("id").gt(depth as i64);
        if depth == 0 {
            return Ok(());
        }
        if depth % 2 == 0 {
            q.all_of(|g| nest(g, depth - 1))?;
        } else {
            q.any_of(|g| nest(g, depth - 1))?;
        }
        Ok(())
    }

    let mut q = Scope::root();
    let _ = nest(&mut q, depth);
    q
}

/// Repeated joins into the same collection, merged at compile time.
fn join_scope(count: usize) -> Scope {
    let mut q = Scope::root();
    for i in 0..count {
        let _ = q.having("comments", |c| {
            c.with("score").gte(i as i64);
            Ok(())
        });
    }
    let _ = q.having("blog", |b| {
        b.with("name").like("%rust%");
        Ok(())
    });
    q
}

fn bench_flat(c: &mut Criterion) {
    let (schema, post) = schema();
    let compiler = Compiler::new(&schema, CompilerConfig::default());
    let mut group = c.benchmark_group("compile_flat");

    for count in [1, 10, 100] {
        let scope = flat_scope(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &scope, |b, scope| {
            b.iter(|| compiler.compile(post, black_box(scope)))
        });
    }

    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let (schema, post) = schema();
    let compiler = Compiler::new(&schema, CompilerConfig::postgres());
    let mut group = c.benchmark_group("compile_nested");

    for depth in [2, 8, 32] {
        let scope = nested_scope(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &scope, |b, scope| {
            b.iter(|| compiler.compile(post, black_box(scope)))
        });
    }

    group.finish();
}

fn bench_joins(c: &mut Criterion) {
    let (schema, post) = schema();
    let compiler = Compiler::new(&schema, CompilerConfig::default());
    let scope = join_scope(20);

    c.bench_function("compile_merged_joins", |b| {
        b.iter(|| compiler.compile(post, black_box(&scope)))
    });
}

criterion_group!(benches, bench_flat, bench_nested, bench_joins);
criterion_main!(benches);
