use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use cuckoo_table::Table;

const N: u64 = 1_000_000;

fn bench_get(c: &mut Criterion) {
    let mut table: Table<u64, u64> = Table::with_capacity(1 << 21, 4);
    let mut rng = fastrand::Rng::with_seed(123);
    for _ in 0..N {
        table.put(rng.u64(..), 0);
    }

    c.bench_function("get/1e6", |b| {
        b.iter(|| {
            let key = rng.u64(..);
            black_box(table.get(black_box(&key)));
        })
    });
}

fn bench_put(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(123);

    c.bench_function("put/fresh_keys", |b| {
        b.iter_batched(
            || Table::<u64, u64>::with_capacity(1 << 12, 4),
            |mut table| {
                for _ in 0..1000 {
                    table.put(black_box(rng.u64(..)), 0);
                }
                black_box(table);
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_get, bench_put);
criterion_main!(benches);
