// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

pub mod operator_registry;
pub mod simple;
pub mod stateful;

pub use operator_registry::{
    global_operator_registry, register_builtin_ops, OperatorBuilder, OperatorFn,
    OperatorMetadata, OperatorRegistry, OperatorSignature, RegisteredOperator,
};
pub use simple::{simple_op, simple_op_to, SIMPLE_OP};
pub use stateful::{
    global_slot, op_with_global, op_with_global_slot, op_with_global_slot_to, op_with_global_to,
    GlobalSlot, OpContext, GLOBAL_NAME, OP_WITH_GLOBAL,
};
