//! # Gravity Core Subsystem Benchmarks
//!
//! | Subsystem | Hot path | Runs |
//! |-----------|----------|------|
//! | gc-02 Ledger Store | block commit | once per ledger block |
//! | gc-03 Trust Score | score iteration | once per rotation |
//! | gc-04 Oracle Round | reveal aggregation | once per pulse per oracle |
//! | gc-06 Ledger App | signed tx decode + verify | once per transaction |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ed25519_dalek::SigningKey;
use gc_02_ledger_store::LedgerStore;
use gc_03_trust_score::{calculate, TrustConfig};
use gc_04_oracle_round::aggregate;
use rand::Rng;
use shared_types::{ChainType, ConsulPubKey, NebulaId, OraclesPubKey, Transaction, TxKind, Value, ValueType, Vote};

// ============================================================================
// GC-03: Trust Score
// ============================================================================

fn bench_trust_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("gc-03-trust-score");
    let config = TrustConfig::default();
    let mut rng = rand::thread_rng();

    for n in [5u32, 20, 50] {
        let keys: Vec<ConsulPubKey> = (0..n)
            .map(|i| {
                let mut key = [0u8; 32];
                key[..4].copy_from_slice(&i.to_be_bytes());
                ConsulPubKey(key)
            })
            .collect();
        let initial: Vec<_> = keys.iter().map(|k| (*k, rng.gen_range(1..=100))).collect();
        let votes: Vec<_> = keys
            .iter()
            .map(|voter| {
                let ballot = keys
                    .iter()
                    .filter(|t| *t != voter)
                    .map(|t| Vote {
                        target: *t,
                        score: rng.gen_range(0..=100),
                    })
                    .collect();
                (*voter, ballot)
            })
            .collect();

        group.throughput(Throughput::Elements(u64::from(n)));
        group.bench_with_input(BenchmarkId::new("calculate", n), &n, |b, _| {
            b.iter(|| black_box(calculate(&initial, &votes, &config).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// GC-04: Oracle Round
// ============================================================================

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("gc-04-oracle-round");
    let mut rng = rand::thread_rng();

    for n in [3usize, 21, 101] {
        let ints: Vec<Vec<u8>> = (0..n)
            .map(|_| Value::Int64(rng.gen_range(-1_000_000..1_000_000)).encode())
            .collect();
        let strings: Vec<Vec<u8>> = (0..n)
            .map(|i| Value::String(format!("price-{}", i % 3)).encode())
            .collect();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("aggregate_int64", n), &ints, |b, reveals| {
            b.iter(|| black_box(aggregate(ValueType::Int64, 1, reveals).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("aggregate_string", n), &strings, |b, reveals| {
            b.iter(|| black_box(aggregate(ValueType::String, 1, reveals).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// GC-02: Ledger Store
// ============================================================================

fn bench_block_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("gc-02-ledger-store");
    let nebula = NebulaId::new(vec![0xfe, 0xed]);

    for writes in [10u64, 100, 1_000] {
        group.throughput(Throughput::Elements(writes));
        group.bench_with_input(BenchmarkId::new("commit", writes), &writes, |b, &writes| {
            let mut store = LedgerStore::in_memory();
            let mut height = 0u64;
            b.iter(|| {
                height += 1;
                for i in 0..writes {
                    let mut oracle = [0u8; 33];
                    oracle[..8].copy_from_slice(&i.to_be_bytes());
                    store
                        .put_commit(
                            ChainType::ETHEREUM,
                            &nebula,
                            height,
                            &OraclesPubKey(oracle),
                            &[7u8; 32],
                        )
                        .unwrap();
                }
                black_box(store.commit().unwrap())
            })
        });
    }
    group.finish();
}

// ============================================================================
// GC-06: Ledger App
// ============================================================================

fn bench_tx_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("gc-06-ledger-app");
    let key = SigningKey::from_bytes(&[7; 32]);
    let tx = Transaction::new_signed(
        TxKind::Commit,
        vec![
            ChainType::ETHEREUM.code().into(),
            vec![0xfe, 0xed].into(),
            42u64.into(),
            vec![7u8; 32].into(),
            vec![2u8; 33].into(),
        ],
        &key,
    )
    .unwrap();
    let bytes = tx.to_bytes().unwrap();

    group.bench_function("decode_and_verify", |b| {
        b.iter(|| {
            let tx = Transaction::from_bytes(black_box(&bytes)).unwrap();
            black_box(tx.verify().is_ok())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_trust_calculation,
    bench_aggregation,
    bench_block_commit,
    bench_tx_verification
);
criterion_main!(benches);
