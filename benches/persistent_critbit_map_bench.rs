//! Benchmark for PersistentCritBitMap vs standard BTreeMap.
//!
//! Keys are zero-padded decimal strings, so every key shares a prefix with
//! many others and lookups walk several critical bits.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use critmap::persistent::PersistentCritBitMap;
use std::collections::BTreeMap;
use std::hint::black_box;

fn keys(size: usize) -> Vec<String> {
    (0..size).map(|index| format!("key-{index:08}")).collect()
}

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("insert");

    for size in [100, 1000, 10000] {
        let keys = keys(size);

        group.bench_with_input(
            BenchmarkId::new("PersistentCritBitMap", size),
            &keys,
            |bencher, keys| {
                bencher.iter(|| {
                    let mut map = PersistentCritBitMap::new();
                    for (index, key) in keys.iter().enumerate() {
                        map = map.insert(black_box(key.clone()), black_box(index));
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |bencher, keys| {
            bencher.iter(|| {
                let mut map = BTreeMap::new();
                for (index, key) in keys.iter().enumerate() {
                    map.insert(black_box(key.clone()), black_box(index));
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

// =============================================================================
// get Benchmark
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100, 1000, 10000] {
        let keys = keys(size);
        let persistent_map: PersistentCritBitMap<String, usize> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect();
        let standard_map: BTreeMap<String, usize> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentCritBitMap", size),
            &keys,
            |bencher, keys| {
                bencher.iter(|| {
                    let mut sum = 0;
                    for key in keys {
                        if let Some(&value) = persistent_map.get(black_box(key.as_str())) {
                            sum += value;
                        }
                    }
                    black_box(sum)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |bencher, keys| {
            bencher.iter(|| {
                let mut sum = 0;
                for key in keys {
                    if let Some(&value) = standard_map.get(black_box(key.as_str())) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// remove Benchmark
// =============================================================================

fn benchmark_remove(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("remove");

    for size in [100, 1000, 10000] {
        let keys = keys(size);
        let persistent_map: PersistentCritBitMap<String, usize> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect();
        let standard_map: BTreeMap<String, usize> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentCritBitMap", size),
            &keys,
            |bencher, keys| {
                bencher.iter(|| {
                    let mut map = persistent_map.clone();
                    for key in keys {
                        map = map.remove(black_box(key.as_str()));
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |bencher, keys| {
            bencher.iter(|| {
                let mut map = standard_map.clone();
                for key in keys {
                    map.remove(black_box(key.as_str()));
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

// =============================================================================
// iter Benchmark
// =============================================================================

fn benchmark_iter(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("iter");

    for size in [1000, 10000] {
        let persistent_map: PersistentCritBitMap<String, usize> = keys(size)
            .into_iter()
            .enumerate()
            .map(|(index, key)| (key, index))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentCritBitMap", size),
            &persistent_map,
            |bencher, map| {
                bencher.iter(|| black_box(map.iter().map(|(_, value)| *value).sum::<usize>()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_get,
    benchmark_remove,
    benchmark_iter
);
criterion_main!(benches);
