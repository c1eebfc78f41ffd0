//! Benchmark suite for PVR texture decoding
//!
//! Measures the pixel layouts with different access patterns: twiddled
//! (detwiddle table lookups), VQ (codebook expansion) and palettised.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dcasset_benches::{generate_pal8, generate_pvm, generate_twiddled, generate_vq, sizes};
use dcasset_types::file::{Palette, PvmFile, pvr::Decoder, twiddle::build_detwiddle_table};
use std::hint::black_box;

/// Benchmark twiddled decode with a fresh decoder and a reused one
fn bench_twiddled(c: &mut Criterion) {
	let mut group = c.benchmark_group("pvr_twiddled");

	for size in [sizes::TINY, sizes::SMALL, sizes::MEDIUM, sizes::LARGE] {
		let data = generate_twiddled(size);
		group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));

		group.bench_with_input(BenchmarkId::new("fresh", size), &data, |b, data| {
			b.iter(|| black_box(Decoder::new().decode(black_box(data), None)));
		});

		let mut decoder = Decoder::new();
		group.bench_with_input(BenchmarkId::new("reused", size), &data, |b, data| {
			b.iter(|| black_box(decoder.decode(black_box(data), None)));
		});
	}

	group.finish();
}

/// Benchmark VQ and palettised decode
fn bench_indexed(c: &mut Criterion) {
	let mut group = c.benchmark_group("pvr_indexed");
	let palette = Palette::grayscale(256);
	let mut decoder = Decoder::new();

	for size in [sizes::SMALL, sizes::MEDIUM] {
		group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));

		let vq = generate_vq(size);
		group.bench_with_input(BenchmarkId::new("vq", size), &vq, |b, data| {
			b.iter(|| black_box(decoder.decode(black_box(data), None)));
		});

		let pal8 = generate_pal8(size);
		group.bench_with_input(BenchmarkId::new("pal8", size), &pal8, |b, data| {
			b.iter(|| black_box(decoder.decode(black_box(data), Some(&palette))));
		});
	}

	group.finish();
}

/// Benchmark detwiddle table construction
fn bench_detwiddle_table(c: &mut Criterion) {
	let mut group = c.benchmark_group("twiddle_table");

	for size in [64u32, 256, 1024] {
		group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));
		group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
			b.iter(|| black_box(build_detwiddle_table(black_box(size))));
		});
	}

	group.finish();
}

/// Benchmark archive parsing and full extraction
fn bench_archive(c: &mut Criterion) {
	let mut group = c.benchmark_group("pvm");
	let data = generate_pvm(32, sizes::TINY);

	group.bench_function("parse", |b| {
		b.iter(|| black_box(PvmFile::from_bytes(black_box(&data))));
	});

	group.bench_function("decode_all", |b| {
		let archive = PvmFile::from_bytes(&data).unwrap();
		let mut decoder = Decoder::new();
		b.iter(|| {
			for index in 0..archive.len() {
				black_box(archive.decode_texture_with(&mut decoder, index, None)).ok();
			}
		});
	});

	group.finish();
}

criterion_group!(benches, bench_twiddled, bench_indexed, bench_detwiddle_table, bench_archive);
criterion_main!(benches);
