// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use st_tensor::TensorError;
use thiserror::Error;

pub type OpResult<T> = std::result::Result<T, OpError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'")]
    Unsupported {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("shared value '{name}' is not initialised")]
    Uninitialized { name: &'static str },
    #[error(transparent)]
    Tensor(#[from] TensorError),
    #[error("integer overflow in '{op}'")]
    ArithmeticOverflow { op: &'static str },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("operator '{0}' not found")]
    UnknownOperator(String),
    #[error("operator '{0}' is already registered")]
    DuplicateOperator(String),
    #[error("operator '{name}' expects {expected} inputs, got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("operator '{name}' returned {got} outputs, expected {expected}")]
    OutputCount {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("operator '{0}' has no forward function")]
    MissingForward(String),
    #[error("{0} lock was poisoned")]
    LockPoisoned(&'static str),
    #[error("worker failed: {0}")]
    Worker(String),
}
