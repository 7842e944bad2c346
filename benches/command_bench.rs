//! Benchmarks for supervisor command parsing and envelope framing.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench command_bench
//! ```

use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use doorlock_protocol::{Envelope, InboundCommand, SupervisorCodec, Topic};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

/// Benchmark parsing both command forms.
fn bench_parse_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_command");
    group.throughput(Throughput::Elements(1));

    group.bench_function("legacy_text", |b| {
        b.iter(|| InboundCommand::parse(black_box("change_password 0099")).unwrap());
    });

    group.bench_function("structured_json", |b| {
        b.iter(|| {
            InboundCommand::parse(black_box(
                r#"{"command":"change_password","password":"0099"}"#,
            ))
            .unwrap()
        });
    });

    group.finish();
}

/// Benchmark encoding then decoding a batch of envelopes.
fn bench_codec_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_batch");
    group.throughput(Throughput::Elements(100));

    group.bench_function("encode_decode_100", |b| {
        b.iter(|| {
            let mut codec = SupervisorCodec::new();
            let mut buffer = BytesMut::new();
            for _ in 0..100 {
                codec
                    .encode(Envelope::new(Topic::Status, "door_locked"), &mut buffer)
                    .unwrap();
            }
            let mut count = 0;
            while let Some(envelope) = codec.decode(&mut buffer).unwrap() {
                black_box(envelope);
                count += 1;
            }
            assert_eq!(count, 100);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse_command, bench_codec_batch);
criterion_main!(benches);
