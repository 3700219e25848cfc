use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use optiga::protocol::crc16_ccitt;

fn bench_crc(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc16_ccitt");
    for &size in &[5usize, 16usize, 64usize, 1500usize] {
        let frame: Vec<u8> = (0..size).map(|i| (i & 0xff) as u8).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, f| {
            b.iter(|| {
                black_box(crc16_ccitt(black_box(f)));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crc);
criterion_main!(benches);
