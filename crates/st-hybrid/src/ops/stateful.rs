// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The shared-value op.
//!
//! [`OpContext`] carries the shared value explicitly and can only be built
//! with one, so [`op_with_global`] cannot observe a missing value. Hosts that
//! assign the value after loading bind it through a [`GlobalSlot`]; reading an
//! empty slot is the only way to hit [`OpError::Uninitialized`].

use crate::diagnostics::{self, DiagnosticSink, StdoutSink, START_MARKER};
use crate::error::{OpError, OpResult};
use crate::observability::emit_op_event;
use crate::value::Value;
use std::sync::{Arc, OnceLock, RwLock};

/// Registry name of the shared-value op.
pub const OP_WITH_GLOBAL: &str = "opwithglobal";

/// Name under which hosts bind the shared value.
pub const GLOBAL_NAME: &str = "globalval";

/// Immutable call context holding the shared value.
#[derive(Clone, Debug, PartialEq)]
pub struct OpContext {
    global: Value,
}

impl OpContext {
    pub fn new(global: impl Into<Value>) -> Self {
        Self {
            global: global.into(),
        }
    }

    pub fn global(&self) -> &Value {
        &self.global
    }
}

/// Late-bound shared value assigned by the host.
///
/// Clones share the same binding. Reads and writes go through an `RwLock`,
/// so a call sees either the old or the new value in full.
#[derive(Clone, Debug, Default)]
pub struct GlobalSlot {
    inner: Arc<RwLock<Option<Value>>>,
}

impl GlobalSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot already holding `value`.
    pub fn bound(value: impl Into<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(value.into()))),
        }
    }

    /// Binds `value`, returning the previous binding.
    pub fn set(&self, value: impl Into<Value>) -> OpResult<Option<Value>> {
        let mut slot = self
            .inner
            .write()
            .map_err(|_| OpError::LockPoisoned("global slot"))?;
        Ok(slot.replace(value.into()))
    }

    /// Removes the binding, returning it.
    pub fn clear(&self) -> OpResult<Option<Value>> {
        let mut slot = self
            .inner
            .write()
            .map_err(|_| OpError::LockPoisoned("global slot"))?;
        Ok(slot.take())
    }

    pub fn get(&self) -> OpResult<Option<Value>> {
        let slot = self
            .inner
            .read()
            .map_err(|_| OpError::LockPoisoned("global slot"))?;
        Ok(slot.clone())
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }

    /// Snapshot of the current binding as a call context.
    pub fn context(&self) -> OpResult<OpContext> {
        self.get()?
            .map(OpContext::new)
            .ok_or(OpError::Uninitialized { name: GLOBAL_NAME })
    }
}

/// Process-wide slot used by the global operator registry and the Python
/// module.
pub fn global_slot() -> &'static GlobalSlot {
    static SLOT: OnceLock<GlobalSlot> = OnceLock::new();
    SLOT.get_or_init(GlobalSlot::new)
}

/// Returns `ctx.global() + input`, printing diagnostics to stdout.
pub fn op_with_global(ctx: &OpContext, input: &Value) -> OpResult<Value> {
    op_with_global_to(ctx, &StdoutSink, input)
}

/// Returns `ctx.global() + input`. Writes the start marker, the shared value
/// and the input to `sink`, in that order, before adding.
pub fn op_with_global_to(
    ctx: &OpContext,
    sink: &dyn DiagnosticSink,
    input: &Value,
) -> OpResult<Value> {
    diagnostics::emit(sink, OP_WITH_GLOBAL, START_MARKER);
    add_to_global(ctx.global(), sink, input)
}

/// Late-binding variant of [`op_with_global`].
pub fn op_with_global_slot(slot: &GlobalSlot, input: &Value) -> OpResult<Value> {
    op_with_global_slot_to(slot, &StdoutSink, input)
}

/// Late-binding variant of [`op_with_global_to`]. With an empty slot only the
/// start marker is written before [`OpError::Uninitialized`] is returned.
pub fn op_with_global_slot_to(
    slot: &GlobalSlot,
    sink: &dyn DiagnosticSink,
    input: &Value,
) -> OpResult<Value> {
    diagnostics::emit(sink, OP_WITH_GLOBAL, START_MARKER);
    let ctx = match slot.context() {
        Ok(ctx) => ctx,
        Err(err) => {
            let failed = Err(err);
            emit_op_event(OP_WITH_GLOBAL, input, &failed);
            return failed;
        }
    };
    add_to_global(ctx.global(), sink, input)
}

fn add_to_global(global: &Value, sink: &dyn DiagnosticSink, input: &Value) -> OpResult<Value> {
    diagnostics::emit(sink, OP_WITH_GLOBAL, &global.to_string());
    diagnostics::emit(sink, OP_WITH_GLOBAL, &input.to_string());
    let output = global.try_add(input);
    emit_op_event(OP_WITH_GLOBAL, input, &output);
    output
}
