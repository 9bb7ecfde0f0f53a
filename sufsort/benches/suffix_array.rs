// Copyright 2025 The burrow developers
//
// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sufsort::DivSufSort;

const SIZES: [usize; 3] = [1 << 12, 1 << 16, 1 << 20];

/// Byte strings with a small effective alphabet stress the sorters far more
/// than uniform random data, so benchmark both.
fn test_data(len: usize, alphabet: u8) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..len).map(|_| rng.random_range(0..alphabet)).collect()
}

fn construct(c: &mut Criterion) {
    for (name, alphabet) in [("random", u8::MAX), ("dna", 4)] {
        let mut group = c.benchmark_group(format!("construct/{name}"));

        for size in SIZES {
            let data = test_data(size, alphabet);
            group.throughput(Throughput::Bytes(size as u64));

            group.bench_with_input(BenchmarkId::new("divsufsort", size), &data, |b, data| {
                let mut engine = DivSufSort::new();
                let mut sa = vec![0i32; data.len()];
                b.iter(|| engine.compute_suffix_array(data, &mut sa));
            });

            group.bench_with_input(BenchmarkId::new("sais", size), &data, |b, data| {
                let mut sa = vec![0i32; data.len() + 256];
                b.iter(|| sufsort::sais::suffix_array(data, &mut sa));
            });
        }

        group.finish();
    }
}

criterion_group!(benches, construct);
criterion_main!(benches);
