use bitplane::{BitTable, BitVec, BitsMut};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn xor_assign_vec(criterion: &mut Criterion) {
    let mut left = BitVec::ones(1 << 20);
    let right = BitVec::ones(1 << 20);
    criterion.bench_function("bitvec_xor_1m", |bencher| {
        bencher.iter(|| {
            left.xor_assign(black_box(&right));
        });
    });
}

fn xor_assign_table_rows(criterion: &mut Criterion) {
    let mut table = BitTable::zeros(64, 1 << 16);
    criterion.bench_function("bittable_row_xor_64x64k", |bencher| {
        bencher.iter(|| {
            for index in 1..64 {
                let (mut target, source) = table.rows2_mut(index, index - 1);
                target.xor_assign(&source);
            }
            black_box(&table);
        });
    });
}

criterion_group!(benches, xor_assign_vec, xor_assign_table_rows);
criterion_main!(benches);
