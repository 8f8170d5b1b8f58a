//! Benchmarks for member resolution and observer re-resolution.
//!
//! Run with: cargo bench -p bindery-observe --bench resolver_bench

use std::hint::black_box;
use std::sync::Arc;

use bindery_core::{DynamicObject, MemberBuilder, TypeBuilder, TypeRef, Value, ValueType};
use bindery_observe::{MemberResolver, ObserverFlags, ObserverProvider};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

/// A class at the bottom of a base chain `depth` levels deep; every level
/// declares one property.
fn deep_type(depth: usize) -> TypeRef {
    let mut ty = TypeBuilder::class("Level0")
        .dynamic_property("P0", ValueType::Int)
        .build();
    for level in 1..depth {
        ty = TypeBuilder::class(format!("Level{level}"))
            .extends(&ty)
            .dynamic_property(&format!("P{level}"), ValueType::Int)
            .build();
    }
    ty
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver/resolve");

    for depth in [1usize, 8, 32] {
        let ty = deep_type(depth);
        let resolver = MemberResolver::default();
        // Deepest-declared member: the longest structural search.
        let _ = resolver.resolve(&ty, "P0", false, true);
        group.bench_with_input(BenchmarkId::new("cached", depth), &(), |b, _| {
            b.iter(|| black_box(resolver.resolve(&ty, "P0", false, true)))
        });
        group.bench_with_input(BenchmarkId::new("cold", depth), &(), |b, _| {
            b.iter(|| {
                resolver.clear_caches();
                black_box(resolver.resolve(&ty, "P0", false, true))
            })
        });
    }

    group.finish();
}

fn bench_overlay_churn(c: &mut Criterion) {
    let ty = deep_type(4);
    let resolver = MemberResolver::default();
    let attached = MemberBuilder::constant("X", Value::Int(1))
        .extension()
        .build_for(&ty);

    c.bench_function("resolver/register_then_resolve", |b| {
        b.iter(|| {
            let _ = resolver.register_member(&ty, "X", attached.clone(), true);
            black_box(resolver.resolve(&ty, "X", false, true))
        })
    });
}

fn chain(ty: &TypeRef, length: usize) -> (Arc<DynamicObject>, Arc<DynamicObject>, String) {
    let root = DynamicObject::new(ty);
    let mut current = Arc::clone(&root);
    for _ in 1..length {
        let next = DynamicObject::new(ty);
        current.set("Next", Value::object(Arc::clone(&next)));
        current = next;
    }
    current.set("Value", 0);
    let mut path = vec!["Next"; length - 1];
    path.push("Value");
    (root, current, path.join("."))
}

fn bench_observer_update(c: &mut Criterion) {
    let ty = TypeBuilder::class("Link")
        .dynamic_property("Next", ValueType::Any)
        .dynamic_property("Value", ValueType::Int)
        .build();
    let provider = ObserverProvider::default();
    let mut group = c.benchmark_group("observer/update");

    for length in [2usize, 8] {
        let (root, _leaf, text) = chain(&ty, length);
        let path = provider.parse_path(&text);
        let target = Value::object(Arc::clone(&root));
        for (name, flags) in [
            ("walk", ObserverFlags::OBSERVABLE),
            ("stable", ObserverFlags::OBSERVABLE | ObserverFlags::HAS_STABLE_PATH),
        ] {
            let observer = provider.create_observer(&target, &path, flags);
            let _ = observer.last_member();
            group.bench_with_input(BenchmarkId::new(name, length), &(), |b, _| {
                b.iter(|| {
                    observer.update();
                    black_box(observer.last_member().is_resolved())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_overlay_churn, bench_observer_update);
criterion_main!(benches);
