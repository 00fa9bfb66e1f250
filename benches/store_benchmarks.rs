use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relgraph::{NodeId, RelationStore, TypeRegistry};

const NODE_SPACE: u64 = 10_000;

fn populated_store(relations: usize) -> RelationStore {
    let store = RelationStore::in_memory(TypeRegistry::shared());
    store.create_database("bench").unwrap();
    store.select_database("bench").unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..relations {
        let source = NodeId::new(rng.gen_range(0..NODE_SPACE));
        let target = NodeId::new(rng.gen_range(0..NODE_SPACE));
        store.insert(source, target, "access", 0.123).unwrap();
    }
    store
}

/// Benchmark bulk random insertion throughput
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("relation_insert");

    for size in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let store = RelationStore::in_memory(TypeRegistry::shared());
                store.create_database("bench").unwrap();
                store.select_database("bench").unwrap();

                let mut rng = StdRng::seed_from_u64(42);
                for _ in 0..size {
                    let source = NodeId::new(rng.gen_range(0..NODE_SPACE));
                    let target = NodeId::new(rng.gen_range(0..NODE_SPACE));
                    store.insert(source, target, "access", 0.123).unwrap();
                }
            });
        });
    }
    group.finish();
}

/// Benchmark per-node forward lookup throughput against random nodes
fn bench_forward_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_lookup");

    for size in [10_000usize, 100_000].iter() {
        let store = populated_store(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let mut rng = StdRng::seed_from_u64(99);
            b.iter(|| {
                let node = NodeId::new(rng.gen_range(0..NODE_SPACE));
                criterion::black_box(store.forward_edges(node).unwrap().len());
            });
        });
    }
    group.finish();
}

/// Benchmark type-filtered reachability over a long chain
fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");

    for length in [100u64, 1_000].iter() {
        let store = RelationStore::in_memory(TypeRegistry::shared());
        store.create_database("bench").unwrap();
        store.select_database("bench").unwrap();
        for i in 0..*length {
            store
                .insert(NodeId::new(i), NodeId::new(i + 1), "next", 1.0)
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, _| {
            b.iter(|| {
                let reachable = store.cursor(NodeId::new(0)).closure(&["next"], true).unwrap();
                criterion::black_box(reachable.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_forward_lookup, bench_closure);
criterion_main!(benches);
