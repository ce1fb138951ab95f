use criterion::{criterion_group, criterion_main, Criterion};
use hashchain_core::{mine::mine_block_parallel, Block, MiningLimit, Transfer};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_pow(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let block = Block::new(
        Transfer::new("alice", "bob", rng.gen_range(1.0..10.0)),
        hashchain_core::sha256_hex(b"tip"),
    );

    c.bench_function("mine_block_difficulty_4", |b| {
        b.iter(|| {
            let mut candidate = block.clone();
            candidate.mine(4);
            candidate
        });
    });

    c.bench_function("mine_block_parallel_difficulty_4", |b| {
        b.iter(|| mine_block_parallel(block.clone(), 4, &MiningLimit::unbounded()));
    });

    c.bench_function("calculate_digest", |b| b.iter(|| block.calculate_digest()));
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
