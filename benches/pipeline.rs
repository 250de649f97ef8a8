use criterion::{black_box, criterion_group, criterion_main, Criterion};
use havoc::{
    BitExtractor, ComparisonDebiaser, MockSource, Running, Threshold, WordAssembler, WordWidth,
};

fn noise() -> Vec<u8> {
    (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect()
}

fn bench_debiaser(c: &mut Criterion) {
    let bytes = noise();
    let mut debiaser = ComparisonDebiaser::new(
        BitExtractor::new(MockSource::cycle(&bytes), Threshold::MIDPOINT),
        BitExtractor::new(MockSource::cycle(&bytes[7..]), Threshold::MIDPOINT),
    );

    c.bench_function("debiaser_next_bit", |b| {
        b.iter(|| black_box(debiaser.next_bit()))
    });
}

fn bench_assembly(c: &mut Criterion) {
    let bytes = noise();
    let mut running = Running::with_thresholds(
        MockSource::cycle(&bytes),
        MockSource::cycle(&bytes[7..]),
        Threshold::MIDPOINT,
        Threshold::MIDPOINT,
        WordWidth::Word32,
    );
    let mut assembler = WordAssembler::new(WordWidth::Byte);

    c.bench_function("next_word32", |b| {
        b.iter(|| loop {
            if let Some(word) = running.step() {
                break black_box(word);
            }
        })
    });

    c.bench_function("assemble_byte", |b| {
        b.iter(|| {
            for _ in 0..8 {
                if let Some(bit) = running.next_unbiased_bit() {
                    black_box(assembler.push(bit));
                }
            }
        })
    });
}

criterion_group!(benches, bench_debiaser, bench_assembly);
criterion_main!(benches);
