// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::sync::Arc;

use st_hybrid::diagnostics::{CaptureSink, START_MARKER};
use st_hybrid::ops::{
    op_with_global_slot_to, op_with_global_to, register_builtin_ops, simple_op_to, GlobalSlot,
    OpContext, OperatorRegistry, OP_WITH_GLOBAL, SIMPLE_OP,
};
use st_hybrid::{OpError, Value};
use st_tensor::Tensor;

#[test]
fn simple_op_doubles_every_numeric_kind() {
    let sink = CaptureSink::new();
    for (input, expected) in [
        (Value::Int(0), Value::Int(0)),
        (Value::Int(-3), Value::Int(-6)),
        (Value::Float(2.5), Value::Float(5.0)),
        (Value::Int(21), Value::Int(42)),
    ] {
        assert_eq!(simple_op_to(&sink, &input).unwrap(), expected);
    }
}

#[test]
fn shared_value_changes_are_visible_between_calls() {
    let sink = CaptureSink::new();
    let slot = GlobalSlot::new();

    assert_eq!(
        op_with_global_slot_to(&slot, &sink, &Value::Int(5)).unwrap_err(),
        OpError::Uninitialized { name: "globalval" }
    );

    slot.set(10i64).unwrap();
    assert_eq!(
        op_with_global_slot_to(&slot, &sink, &Value::Int(5)).unwrap(),
        Value::Int(15)
    );
    slot.set(20i64).unwrap();
    assert_eq!(
        op_with_global_slot_to(&slot, &sink, &Value::Int(5)).unwrap(),
        Value::Int(25)
    );
}

#[test]
fn diagnostics_follow_documented_order() {
    let sink = CaptureSink::new();
    simple_op_to(&sink, &Value::Int(7)).unwrap();
    op_with_global_to(&OpContext::new(3i64), &sink, &Value::Int(4)).unwrap();
    assert_eq!(
        sink.lines(),
        vec![START_MARKER, "7", START_MARKER, "3", "4"]
    );
}

#[test]
fn concurrent_readers_never_see_a_torn_binding() {
    let slot = GlobalSlot::bound(Tensor::from_vec(1, 2, vec![0.0, 0.0]).unwrap());
    let writer = {
        let slot = slot.clone();
        std::thread::spawn(move || {
            for k in 1..200 {
                let v = k as f32;
                slot.set(Tensor::from_vec(1, 2, vec![v, v]).unwrap()).unwrap();
            }
        })
    };
    let sink = CaptureSink::new();
    for _ in 0..200 {
        let Value::Tensor(out) =
            op_with_global_slot_to(&slot, &sink, &Value::Int(0)).unwrap()
        else {
            panic!("expected tensor output");
        };
        assert_eq!(out.data()[0], out.data()[1]);
    }
    writer.join().unwrap();
}

#[test]
fn registry_exposes_both_ops_to_a_host() {
    let registry = OperatorRegistry::new();
    let slot = GlobalSlot::new();
    let sink = Arc::new(CaptureSink::new());
    register_builtin_ops(&registry, slot.clone(), sink.clone()).unwrap();

    let t = Value::Tensor(Tensor::arange(1, 4).unwrap());
    let Value::Tensor(doubled) = registry.call(SIMPLE_OP, &t).unwrap() else {
        panic!("expected tensor output");
    };
    assert_eq!(doubled.data(), &[2.0, 4.0, 6.0]);

    slot.set(Tensor::arange(0, 3).unwrap()).unwrap();
    let Value::Tensor(summed) = registry.call(OP_WITH_GLOBAL, &t).unwrap() else {
        panic!("expected tensor output");
    };
    assert_eq!(summed.data(), &[1.0, 3.0, 5.0]);

    let metadata = registry.get(OP_WITH_GLOBAL).unwrap().metadata().clone();
    assert_eq!(metadata.attributes.get("global").map(String::as_str), Some("globalval"));
    assert_eq!(sink.lines()[0], START_MARKER);
}
