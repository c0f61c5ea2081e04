use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::num::NonZeroUsize;
use tagscout::search::search_with;
use tagscout::traversal::{paths, walk};
use tagscout::{CancelSignal, Node, SearchOptions, TreeNode};

fn create_tree(prefix: &str, width: usize, depth: usize) -> Node {
    let mut node = Node::new(prefix);
    if depth > 0 {
        for i in 0..width {
            node = node.child(create_tree(&format!("{}.{}", prefix, i), width, depth - 1));
        }
    }
    node
}

fn create_options(capacity: usize) -> SearchOptions {
    SearchOptions {
        pool_capacity: NonZeroUsize::new(capacity).unwrap(),
        ..SearchOptions::default()
    }
}

fn bench_tree_shape(c: &mut Criterion) {
    let shapes = [("narrow", 3, 8), ("wide", 12, 4), ("mixed", 10, 4)];
    let signal = CancelSignal::new();
    let options = create_options(4);

    let mut group = c.benchmark_group("Tree Shape");
    for (label, width, depth) in shapes {
        let tree = create_tree("r", width, depth);
        group.bench_function(format!("{}_miss", label), |b| {
            b.iter(|| black_box(search_with(&options, &signal, Some(&tree), "missing")));
        });
        group.bench_function(format!("{}_last_leaf", label), |b| {
            let last = walk(Some(&tree)).last().map(|n| n.name().to_string()).unwrap();
            b.iter(|| black_box(search_with(&options, &signal, Some(&tree), &last)));
        });
    }
    group.finish();
}

fn bench_pool_capacity(c: &mut Criterion) {
    let tree = create_tree("r", 12, 4);
    let signal = CancelSignal::new();

    let mut group = c.benchmark_group("Pool Capacity");
    for capacity in [1, 2, 4, 10, 16] {
        let options = create_options(capacity);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &options, |b, options| {
            b.iter(|| black_box(search_with(options, &signal, Some(&tree), "missing")));
        });
    }
    group.finish();
}

fn bench_sequential_walks(c: &mut Criterion) {
    let tree = create_tree("r", 10, 4);

    let mut group = c.benchmark_group("Sequential Walks");
    group.bench_function("walk", |b| b.iter(|| black_box(walk(Some(&tree)))));
    group.bench_function("paths", |b| b.iter(|| black_box(paths(Some(&tree)))));
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_tree_shape, bench_pool_capacity, bench_sequential_walks
}

criterion_main!(benches);
