//! # PAN Pipeline Benchmarks
//!
//! | Stage | Work per iteration |
//! |-------|--------------------|
//! | Luhn | one 16-digit checksum |
//! | Classification | one prefix lookup, 6-digit then 4-digit |
//! | Tokenization | one keystream derivation |
//! | Wide record | start + 16 digit cycles through `WideBus` |
//! | Narrow record | nonce load + 16 digit cycles + 8-byte drain |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use pan_crypto::{TokenKey, TokenNonce};
use pan_pipeline::{
    check_digit, luhn_valid, tokenize, BinClassifier, BinTableSource, BundledTableSource,
    DrainOrder, KeyWidth, NarrowBus, PanPipeline, PipelineConfigBuilder, WideBus,
};
use pan_types::IinPrefix;

const KNOWN_PAN: [u8; 16] = [4, 0, 2, 9, 1, 6, 3, 7, 7, 8, 2, 6, 5, 4, 1, 8];

fn random_valid_pan(rng: &mut impl Rng, len: usize) -> Vec<u8> {
    let mut pan: Vec<u8> = (0..len - 1).map(|_| rng.gen_range(0..10)).collect();
    pan.push(check_digit(&pan));
    pan
}

fn pipeline() -> PanPipeline {
    let config = PipelineConfigBuilder::new()
        .token_secret("bench")
        .build()
        .unwrap();
    let (table, _) = BundledTableSource.load().unwrap();
    PanPipeline::new(config, Arc::new(table)).unwrap()
}

fn bench_luhn(c: &mut Criterion) {
    let mut group = c.benchmark_group("luhn");
    let mut rng = rand::thread_rng();

    for len in [13usize, 16, 19] {
        let pan = random_valid_pan(&mut rng, len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("validate", len), &pan, |b, pan| {
            b.iter(|| black_box(luhn_valid(black_box(pan))))
        });
    }
    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    let (table, _) = BundledTableSource.load().unwrap();
    let table = Arc::new(table);

    let hit = IinPrefix::from_digits([4, 0, 2, 9, 1, 6]);
    let four_digit_hit = IinPrefix::from_digits([4, 5, 0, 0, 9, 8]);
    let miss = IinPrefix::from_digits([4, 9, 9, 9, 7, 1]);

    for width in [KeyWidth::Six, KeyWidth::Both] {
        let classifier = BinClassifier::new(table.clone(), width);
        for (name, prefix) in [("hit6", hit), ("hit4", four_digit_hit), ("miss", miss)] {
            group.bench_function(BenchmarkId::new(format!("{width:?}"), name), |b| {
                b.iter(|| black_box(classifier.classify_prefix(Some(black_box(prefix)), true)))
            });
        }
    }
    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    let key = TokenKey::generate();
    let nonce = TokenNonce::generate();

    group.bench_function("derive_16_digits", |b| {
        b.iter(|| black_box(tokenize(&key, &nonce, black_box(&KNOWN_PAN)).unwrap()))
    });
    group.finish();
}

fn bench_full_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(1));

    let nonce = TokenNonce::generate();

    group.bench_function("wide_16_digits", |b| {
        let mut bus = WideBus::new(pipeline());
        b.iter(|| {
            let out = bus.send_pan(black_box(&KNOWN_PAN), Some(&nonce));
            black_box(out.token64)
        })
    });

    group.bench_function("narrow_16_digits_with_drain", |b| {
        let mut bus = NarrowBus::new(pipeline(), DrainOrder::lsb_first());
        b.iter(|| {
            bus.send_pan(black_box(&KNOWN_PAN), Some(&nonce));
            black_box(bus.collect_token(16))
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_luhn,
    bench_classification,
    bench_tokenize,
    bench_full_record
);
criterion_main!(benches);
