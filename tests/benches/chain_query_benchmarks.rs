//! # Chain Query Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | List blocks | One page of a full epoch | Dominated by root hashing |
//! | List blocks | Slot filter at a random slot | Independent of chain length |
//! | Stream cursor | Admission check per live event | Constant time |
//! | Weak subjectivity | Period computation | Constant time |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_18_chain_query::domain::weak_subjectivity::compute_period;
use qc_18_chain_query::domain::WeakSubjectivityConfig;
use qc_18_chain_query::test_utils::{make_block, TestChain};
use qc_18_chain_query::{BlockFilter, ChainQueryApi, ListBlocksRequest, StreamCursor};
use quantum_telemetry::TelemetryConfig;
use rand::Rng;
use std::time::Duration;

const GWEI: u64 = 1_000_000_000;

// ============================================================================
// LIST BLOCKS
// ============================================================================

fn bench_list_blocks(c: &mut Criterion) {
    // QC_LOG_LEVEL / QC_LOG_FORMAT apply to benchmark runs too
    if let Ok(config) = TelemetryConfig::from_env("qc-18-bench") {
        let _ = quantum_telemetry::init_logging(&config);
    }
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("qc-18-list-blocks");
    group.measurement_time(Duration::from_secs(5));

    for epochs in [1u64, 8, 32] {
        let chain = TestChain::new();
        chain.store.insert_genesis(make_block(0, 0));
        for slot in 1..epochs * 32 {
            chain.store.insert_canonical(make_block(slot, 0));
        }
        let service = chain.service();

        group.throughput(Throughput::Elements(32));
        group.bench_with_input(
            BenchmarkId::new("epoch_page", epochs),
            &epochs,
            |b, &epochs| {
                b.iter(|| {
                    let request = ListBlocksRequest::new(BlockFilter::Epoch(epochs - 1))
                        .with_page("", 32);
                    black_box(rt.block_on(service.list_blocks(request)).is_ok())
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("random_slot_page", epochs),
            &epochs,
            |b, &epochs| {
                let mut rng = rand::thread_rng();
                b.iter(|| {
                    let slot = rng.gen_range(1..epochs * 32);
                    let request = ListBlocksRequest::new(BlockFilter::Slot(slot));
                    black_box(rt.block_on(service.list_blocks(request)).is_ok())
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// STREAM CURSOR
// ============================================================================

fn bench_stream_cursor(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-stream-cursor");

    group.bench_function("admit_and_advance_10k", |b| {
        b.iter(|| {
            let mut cursor = StreamCursor::after(63);
            for slot in 64..10_064u64 {
                let root = [(slot % 251) as u8; 32];
                if cursor.admits(slot, &root) {
                    cursor.advance(slot, root);
                }
            }
            black_box(cursor.last_sent_slot())
        })
    });

    group.bench_function("reject_duplicates_10k", |b| {
        let mut cursor = StreamCursor::new();
        cursor.advance(100, [1u8; 32]);
        b.iter(|| {
            let mut admitted = 0;
            for slot in 0..10_000u64 {
                if cursor.admits(black_box(slot % 101), &[1u8; 32]) {
                    admitted += 1;
                }
            }
            black_box(admitted)
        })
    });

    group.finish();
}

// ============================================================================
// WEAK SUBJECTIVITY
// ============================================================================

fn bench_weak_subjectivity_period(c: &mut Criterion) {
    let cfg = WeakSubjectivityConfig::default();
    let mut group = c.benchmark_group("qc-18-weak-subjectivity");

    for validators in [1_024u64, 100_000, 1_000_000] {
        group.bench_with_input(
            BenchmarkId::new("compute_period", validators),
            &validators,
            |b, &n| b.iter(|| black_box(compute_period(n, n * 31 * GWEI, 32, &cfg))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_list_blocks,
    bench_stream_cursor,
    bench_weak_subjectivity_period,
);
criterion_main!(benches);
