//! Role hierarchy optimizer benchmarks
//!
//! The deep-chain search and the common-subset search are exhaustive, so
//! these track how they scale with hierarchy shape.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roleaudit_hierarchy::{HierarchyConfig, HierarchyInputs, HierarchyOptimizer};

/// Single chain role_0 -> role_1 -> ... -> role_{len-1}
fn chain_inputs(len: usize) -> HierarchyInputs {
    (1..len).fold(HierarchyInputs::new(), |inputs, i| {
        inputs.with_edge(format!("role_{}", i - 1), format!("role_{}", i))
    })
}

/// Complete tree with the given fan-out and depth, every leaf assigned
fn tree_inputs(fan_out: usize, depth: usize) -> HierarchyInputs {
    let mut inputs = HierarchyInputs::new();
    let mut level = vec!["root".to_string()];

    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fan_out);
        for (p, parent) in level.iter().enumerate() {
            for c in 0..fan_out {
                let child = format!("r{}_{}_{}", d, p, c);
                inputs = inputs.with_edge(parent.clone(), child.clone());
                next.push(child);
            }
        }
        level = next;
    }

    for (i, leaf) in level.iter().enumerate() {
        inputs = inputs.with_assignment(format!("user{}", i), leaf.clone());
    }
    inputs
}

/// `roles` standalone roles sharing `shared` items plus one private item each
fn permission_inputs(roles: usize, shared: usize) -> HierarchyInputs {
    let mut inputs = HierarchyInputs::new();
    for r in 0..roles {
        let role = format!("role_{}", r);
        for s in 0..shared {
            inputs = inputs.with_permission(role.clone(), format!("Shared{}", s), "Read");
        }
        inputs = inputs.with_permission(role.clone(), format!("Private{}", r), "Write");
    }
    inputs
}

fn bench_deep_chains(c: &mut Criterion) {
    let optimizer = HierarchyOptimizer::default();
    let mut group = c.benchmark_group("deep_chain");

    for len in [10, 100, 500].iter() {
        let inputs = chain_inputs(*len);
        group.bench_with_input(BenchmarkId::new("roles", len), &inputs, |b, inputs| {
            b.iter(|| optimizer.analyze(black_box(inputs)))
        });
    }

    group.finish();
}

fn bench_wide_trees(c: &mut Criterion) {
    let optimizer = HierarchyOptimizer::default();
    let mut group = c.benchmark_group("tree");

    for (fan_out, depth) in [(3, 4), (4, 5), (2, 9)].iter() {
        let inputs = tree_inputs(*fan_out, *depth);
        let id = format!("fan{}_depth{}", fan_out, depth);
        group.bench_with_input(BenchmarkId::new("shape", id), &inputs, |b, inputs| {
            b.iter(|| optimizer.analyze(black_box(inputs)))
        });
    }

    group.finish();
}

fn bench_common_subsets(c: &mut Criterion) {
    let config = HierarchyConfig::default().with_min_common_permissions(5);
    let optimizer = HierarchyOptimizer::new(config).expect("valid config");
    let mut group = c.benchmark_group("common_subset");
    group.sample_size(10);

    for roles in [10, 40, 80].iter() {
        let inputs = permission_inputs(*roles, 6);
        group.bench_with_input(BenchmarkId::new("roles", roles), &inputs, |b, inputs| {
            b.iter(|| optimizer.analyze(black_box(inputs)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_deep_chains, bench_wide_trees, bench_common_subsets);
criterion_main!(benches);
