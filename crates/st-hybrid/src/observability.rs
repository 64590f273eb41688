// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Lightweight hook for observing op invocations from the host side.

use crate::error::OpResult;
use crate::value::Value;
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};

/// Metadata about a completed op call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpEvent {
    pub op_name: &'static str,
    pub input_kind: &'static str,
    /// `None` when the call failed.
    pub output_kind: Option<&'static str>,
    pub ok: bool,
}

/// Observer callback invoked after an op returns.
pub type OpObserver = Arc<dyn Fn(&OpEvent) + Send + Sync + 'static>;

static OP_OBSERVER: OnceLock<RwLock<Option<OpObserver>>> = OnceLock::new();

thread_local! {
    static IN_OBSERVER_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// Install (or clear) the global op observer.
///
/// Returns the previously installed observer, if any.
pub fn set_op_observer(observer: Option<OpObserver>) -> Option<OpObserver> {
    let lock = OP_OBSERVER.get_or_init(|| RwLock::new(None));
    let mut slot = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    std::mem::replace(&mut *slot, observer)
}

/// Report an op outcome to the installed observer.
///
/// No-op without an observer. Calls made from inside the observer are
/// dropped, and a panicking observer does not unwind into the op.
pub fn emit_op_event(op_name: &'static str, input: &Value, output: &OpResult<Value>) {
    let Some(lock) = OP_OBSERVER.get() else {
        return;
    };
    let observer = lock
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    let Some(observer) = observer else {
        return;
    };

    let already_in_callback = IN_OBSERVER_CALLBACK.with(|flag| flag.replace(true));
    if already_in_callback {
        return;
    }

    let event = OpEvent {
        op_name,
        input_kind: input.kind(),
        output_kind: output.as_ref().ok().map(Value::kind),
        ok: output.is_ok(),
    };

    if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
        tracing::warn!(op = op_name, "op observer panicked");
    }

    IN_OBSERVER_CALLBACK.with(|flag| flag.set(false));
}
