use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use logfmt::{Decoder, Encoder, Value};

/// One line exercising every token shape: unquoted and quoted values,
/// an escape, a multi-byte key, a bare key, and trailing separators.
const LINE: &str = "a=1 b=\"bar\" ƒ=2h3s r=\"esc\\t\" d x=sf   \n";

fn decode_input(rows: usize) -> Vec<u8> {
    LINE.repeat(rows).into_bytes()
}

fn benchmark_decode(c: &mut Criterion) {
    let rows = 10_000;
    let data = decode_input(rows);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("scan_keyvals", |b| {
        b.iter(|| {
            let mut dec = Decoder::new(black_box(data.as_slice()));
            let mut records = 0usize;
            let mut pairs = 0usize;
            while dec.advance_record().unwrap() {
                records += 1;
                while dec.scan_key().is_some() {
                    if dec.scan_value().is_some() {
                        pairs += 1;
                    }
                }
            }
            assert!(dec.last_error().is_none());
            assert_eq!(records, rows);
            black_box(pairs)
        })
    });
    group.bench_function("read_records", |b| {
        b.iter(|| {
            let mut dec = Decoder::new(black_box(data.as_slice()));
            let mut records = 0usize;
            while let Some(record) = dec.read_record().unwrap() {
                records += record.len();
            }
            black_box(records)
        })
    });
    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.bench_function("keyvals", |b| {
        let mut buf = Vec::with_capacity(64 * 1024);
        b.iter(|| {
            buf.clear();
            let mut enc = Encoder::new(&mut buf);
            for _ in 0..1_000 {
                enc.encode_keyval("a", 1).unwrap();
                enc.encode_keyval("b", "bar").unwrap();
                enc.encode_keyval("r", "esc\t").unwrap();
                enc.encode_keyval("d", Value::Nil).unwrap();
                enc.end_record().unwrap();
            }
        })
    });
    group.finish();
}

fn benchmark_quote(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote");
    group.bench_function("escape_plain", |b| {
        b.iter(|| logfmt::escape(black_box(b"no-quoting-needed")))
    });
    group.bench_function("escape_quoted", |b| {
        b.iter(|| logfmt::escape(black_box("needs quoting \"here\" \t".as_bytes())))
    });
    group.bench_function("unescape", |b| {
        b.iter(|| logfmt::unescape(black_box(b"\"esc\\taped \\u0041 value\"")))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_encode,
    benchmark_quote
);
criterion_main!(benches);
