//! Pool allocator benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use smallpool::SmallObjectAllocator;

fn bench_alloc_free_cycle(c: &mut Criterion) {
    let sizes: &[usize] = &[8, 16, 32, 64, 128, 256];
    let mut group = c.benchmark_group("alloc_free_cycle");

    for &size in sizes {
        group.bench_with_input(BenchmarkId::new("pool", size), &size, |b, &sz| {
            let mut pool = SmallObjectAllocator::with_defaults();
            b.iter(|| {
                let ptr = pool.allocate(sz).expect("pooled allocation");
                criterion::black_box(ptr);
                // SAFETY: ptr came from allocate(sz) just above.
                unsafe {
                    pool.deallocate(ptr, sz);
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("system", size), &size, |b, &sz| {
            b.iter(|| {
                let v = vec![0u8; sz];
                criterion::black_box(v);
            });
        });
    }
    group.finish();
}

fn bench_alloc_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_burst");

    group.bench_function("pool_1000x64B", |b| {
        let mut pool = SmallObjectAllocator::with_defaults();
        b.iter(|| {
            let ptrs: Vec<*mut u8> = (0..1000)
                .map(|_| pool.allocate(64).expect("pooled allocation"))
                .collect();
            for &ptr in &ptrs {
                // SAFETY: every ptr came from allocate(64) in this iteration.
                unsafe {
                    pool.deallocate(ptr, 64);
                }
            }
            criterion::black_box(ptrs);
        });
    });

    group.bench_function("system_1000x64B", |b| {
        b.iter(|| {
            let allocs: Vec<Vec<u8>> = (0..1000).map(|_| vec![0u8; 64]).collect();
            criterion::black_box(allocs);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_alloc_free_cycle, bench_alloc_burst);
criterion_main!(benches);
