//! Cursor throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docstream_bench::{populated_store, read_all};
use docstream_store::SessionSupport;

const RECORDS: u64 = 10_000;

/// Benchmark draining a collection at different batch sizes.
fn bench_batch_sizes(c: &mut Criterion) {
    let store = populated_store(RECORDS).unwrap();
    let mut group = c.benchmark_group("drain");
    group.throughput(Throughput::Elements(RECORDS));

    for batch_size in [1usize, 10, 100, 1000, 5000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    let total = read_all(black_box(&store), batch_size).unwrap();
                    black_box(total);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the cost of session negotiation on a small read.
fn bench_session_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("open");

    for (label, support) in [
        ("causal", SessionSupport::Supported),
        ("sessionless", SessionSupport::Unsupported),
    ] {
        let store = populated_store(10).unwrap();
        store.set_session_support(support);
        group.bench_function(label, |b| {
            b.iter(|| black_box(read_all(&store, 10).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_sizes, bench_session_modes);
criterion_main!(benches);
