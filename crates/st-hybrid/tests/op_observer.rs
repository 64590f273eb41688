// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::sync::{Arc, Mutex};

use st_hybrid::diagnostics::NullSink;
use st_hybrid::observability::{set_op_observer, OpEvent};
use st_hybrid::ops::{op_with_global_slot_to, simple_op_to, GlobalSlot};
use st_hybrid::Value;

// Single test: the observer is process-wide.
#[test]
fn observer_sees_successes_and_failures() {
    let seen: Arc<Mutex<Vec<OpEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    set_op_observer(Some(Arc::new(move |event: &OpEvent| {
        sink.lock().unwrap().push(event.clone());
        // Nested calls must not recurse into the observer.
        let _ = simple_op_to(&NullSink, &Value::Int(1));
    })));

    simple_op_to(&NullSink, &Value::Float(1.5)).unwrap();
    let _ = op_with_global_slot_to(&GlobalSlot::new(), &NullSink, &Value::Int(1));

    set_op_observer(Some(Arc::new(|_: &OpEvent| panic!("observer failure"))));
    assert_eq!(
        simple_op_to(&NullSink, &Value::Int(2)).unwrap(),
        Value::Int(4)
    );
    set_op_observer(None);

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].op_name, "simpleop");
    assert_eq!(events[0].input_kind, "float");
    assert_eq!(events[0].output_kind, Some("float"));
    assert!(events[0].ok);
    assert_eq!(events[1].op_name, "opwithglobal");
    assert!(!events[1].ok);
    assert_eq!(events[1].output_kind, None);
}
