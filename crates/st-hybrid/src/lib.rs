// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Hybrid ops that a host framework registers and calls by name.
//!
//! * [`ops::simple_op`] doubles its input.
//! * [`ops::op_with_global`] adds the value carried by an [`ops::OpContext`]
//!   to its input. Hosts that assign the shared value after loading use
//!   [`ops::GlobalSlot`] instead.
//!
//! Both ops write a start marker and the operand representations to a
//! [`diagnostics::DiagnosticSink`] before computing.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod observability;
pub mod ops;
pub mod runtime;
pub mod telemetry;
pub mod value;

pub use error::{OpError, OpResult};
pub use value::Value;
