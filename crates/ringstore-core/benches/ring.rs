//! Hash ring benchmarks.
//!
//! Measures ring construction and replica lookup for growing clusters.
//!
//! Run with: `cargo bench --bench ring`

use std::net::SocketAddr;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ringstore_core::{ConsistencyLevel, Peer, PeerSet, Ring, RingHash, DEFAULT_PARTITIONS};

fn cluster(size: usize) -> PeerSet {
    (0..size)
        .map(|i| {
            Peer::new(
                format!("node{}", i + 1),
                SocketAddr::from(([10, 0, (i / 256) as u8, (i % 256) as u8], 9991)),
            )
        })
        .collect()
}

/// Ring construction from a peer snapshot.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_build");

    for size in [3usize, 16, 64] {
        let peers = cluster(size);
        group.throughput(Throughput::Elements(size as u64 * DEFAULT_PARTITIONS as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &peers, |b, peers| {
            b.iter(|| Ring::build(black_box(peers)).unwrap())
        });
    }

    group.finish();
}

/// Replica lookup on a prebuilt ring.
fn bench_hash_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_hash_nodes");
    group.throughput(Throughput::Elements(1));

    for size in [3usize, 16, 64] {
        let ring = Ring::build(&cluster(size)).unwrap();
        let copies = ConsistencyLevel::Quorum.copies(size);
        let mut n = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(size), &ring, |b, ring| {
            b.iter(|| {
                n += 1;
                let key = RingHash::of(&n.to_be_bytes());
                ring.hash_nodes(black_box(key), copies).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_hash_nodes);
criterion_main!(benches);
