// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use st_hybrid::diagnostics::NullSink;
use st_hybrid::ops::{
    op_with_global_slot_to, op_with_global_to, simple_op_to, GlobalSlot, OpContext,
};
use st_hybrid::Value;
use st_tensor::Tensor;

fn row(width: usize) -> Value {
    Value::Tensor(Tensor::arange(0, width as i64).expect("non-empty range"))
}

fn bench_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("hybrid_ops");
    for width in [3usize, 1024, 65_536] {
        let input = row(width);
        let ctx = OpContext::new(row(width));
        let slot = GlobalSlot::bound(row(width));

        group.bench_with_input(BenchmarkId::new("simpleop", width), &input, |b, input| {
            b.iter(|| simple_op_to(&NullSink, black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("opwithglobal", width), &input, |b, input| {
            b.iter(|| op_with_global_to(&ctx, &NullSink, black_box(input)))
        });
        group.bench_with_input(
            BenchmarkId::new("opwithglobal_slot", width),
            &input,
            |b, input| b.iter(|| op_with_global_slot_to(&slot, &NullSink, black_box(input))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_ops);
criterion_main!(benches);
