use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use uniconv::{convert_to_vec, Converter, Decoder, Encoding, ErrorPolicy};

fn sample_text(target_len: usize) -> String {
    let mixed = "The quick brown fox, zażółć gęślą jaźń, Ψυχή, 日本語テキスト, 🦀🚀. ";
    let mut text = String::with_capacity(target_len + mixed.len());
    while text.len() < target_len {
        text.push_str(mixed);
    }
    text
}

fn bench_pipeline(c: &mut Criterion) {
    let utf8 = sample_text(64 * 1024).into_bytes();
    let utf16le = convert_to_vec(&utf8, Encoding::UTF8, Encoding::UTF16LE, ErrorPolicy::Stop)
        .expect("sample text is valid");

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Bytes(utf8.len() as u64));
    group.bench_function("utf8_to_utf16le", |b| {
        let converter = Converter::new(Encoding::UTF8, Encoding::UTF16LE);
        let mut dst = vec![0u8; utf8.len() * 4];
        b.iter(|| black_box(converter.convert(black_box(&utf8), &mut dst).unwrap()));
    });
    group.throughput(Throughput::Bytes(utf16le.len() as u64));
    group.bench_function("utf16le_to_utf8", |b| {
        let converter = Converter::new(Encoding::UTF16LE, Encoding::UTF8);
        let mut dst = vec![0u8; utf16le.len() * 2];
        b.iter(|| black_box(converter.convert(black_box(&utf16le), &mut dst).unwrap()));
    });
    group.finish();
}

fn bench_fast_paths(c: &mut Criterion) {
    let utf8 = sample_text(64 * 1024).into_bytes();
    let utf16le = convert_to_vec(&utf8, Encoding::UTF8, Encoding::UTF16LE, ErrorPolicy::Stop)
        .expect("sample text is valid");

    let mut group = c.benchmark_group("fast_paths");
    group.throughput(Throughput::Bytes(utf8.len() as u64));
    group.bench_function("utf8_copy", |b| {
        let converter = Converter::new(Encoding::UTF8, Encoding::UTF8);
        let mut dst = vec![0u8; utf8.len()];
        b.iter(|| black_box(converter.convert(black_box(&utf8), &mut dst).unwrap()));
    });
    group.throughput(Throughput::Bytes(utf16le.len() as u64));
    group.bench_function("utf16_endian_swap", |b| {
        let converter = Converter::new(Encoding::UTF16LE, Encoding::UTF16BE);
        let mut dst = vec![0u8; utf16le.len()];
        b.iter(|| black_box(converter.convert(black_box(&utf16le), &mut dst).unwrap()));
    });
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let utf8 = sample_text(64 * 1024).into_bytes();

    let mut group = c.benchmark_group("validation");
    group.throughput(Throughput::Bytes(utf8.len() as u64));
    group.bench_function("utf8_check", |b| {
        let decoder = Decoder::new(Encoding::UTF8);
        b.iter(|| black_box(decoder.check(black_box(&utf8))));
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_fast_paths, bench_validation);
criterion_main!(benches);
