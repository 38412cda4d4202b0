//! Value-store micro-benchmarks over typical override counts, in id order and
//! in a seeded shuffled order, with and without the bulk-initialization path.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use propstore::{PropertyId, PropertyValueStore};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Override counts observed on typical UI objects.
const SIZES: &[usize] = &[2, 6, 10, 20, 30];

fn property_ids(count: usize, shuffled: bool) -> Vec<PropertyId> {
    let mut ids: Vec<PropertyId> = (0..count as u32).map(PropertyId::new).collect();
    if shuffled {
        let mut rng = SmallRng::seed_from_u64(42);
        ids.shuffle(&mut rng);
    }
    ids
}

fn order_label(shuffled: bool) -> &'static str {
    if shuffled {
        "shuffled"
    } else {
        "linear"
    }
}

fn lookup_benches(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("lookup");

    for &size in SIZES {
        for shuffled in [false, true] {
            let ids = property_ids(size, shuffled);
            let mut store = PropertyValueStore::new();
            for &id in &ids {
                store.add(id, 0u64);
            }

            group.bench_function(BenchmarkId::new(order_label(shuffled), size), |bencher| {
                bencher.iter(|| {
                    for &id in &ids {
                        black_box(store.get(black_box(id)));
                    }
                });
            });
        }
    }

    group.finish();
}

fn populate(ids: &[PropertyId], initializing: bool) -> PropertyValueStore<u64> {
    let mut store = PropertyValueStore::new();
    store.set_initializing(initializing);
    for &id in ids {
        store.add(id, 0u64);
    }
    store.set_initializing(false);
    store
}

fn add_remove_benches(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("add_remove");

    for &size in SIZES {
        for shuffled in [false, true] {
            let ids = property_ids(size, shuffled);
            let order = order_label(shuffled);

            for initializing in [false, true] {
                let label = if initializing {
                    format!("add/{order}/bulk_init")
                } else {
                    format!("add/{order}")
                };
                group.bench_function(BenchmarkId::new(label, size), |bencher| {
                    bencher.iter(|| black_box(populate(&ids, initializing)));
                });

                let label = if initializing {
                    format!("add_and_remove/{order}/bulk_init")
                } else {
                    format!("add_and_remove/{order}")
                };
                group.bench_function(BenchmarkId::new(label, size), |bencher| {
                    bencher.iter(|| {
                        let mut store = populate(&ids, initializing);
                        for &id in ids.iter().rev() {
                            black_box(store.remove(id));
                        }
                        black_box(store)
                    });
                });
            }

            group.bench_function(
                BenchmarkId::new(format!("add_and_remove_interleaved/{order}"), size),
                |bencher| {
                    bencher.iter(|| {
                        let mut store = PropertyValueStore::new();
                        for &id in &ids {
                            store.add(id, 0u64);
                            black_box(store.remove(id));
                        }
                        black_box(store)
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(value_store_benches, lookup_benches, add_remove_benches);
criterion_main!(value_store_benches);
