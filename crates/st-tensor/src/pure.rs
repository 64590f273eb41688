// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Dense row-major tensors that travel between the host loop and the hybrid
//! ops. The buffer is reference counted: cloning a tensor is cheap and every
//! arithmetic helper returns a fresh tensor, so a clone handed to a worker
//! thread can never observe later writes.

use core::fmt;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use spiral_config::determinism;
use std::error::Error;
use std::sync::Arc;

/// Result alias used throughout the tensor crate.
pub type PureResult<T> = Result<T, TensorError>;

/// Errors raised by tensor constructors and arithmetic.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// A tensor constructor received an invalid shape.
    InvalidDimensions { rows: usize, cols: usize },
    /// Data provided to a constructor does not match the tensor shape.
    DataLength { expected: usize, got: usize },
    /// An operator was asked to combine tensors of incompatible shapes.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Generic configuration violation.
    InvalidValue { label: &'static str },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "invalid tensor dimensions ({rows} x {cols}); axes must be non-zero with a representable element count"
                )
            }
            TensorError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            TensorError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: left={:?}, right={:?} cannot be combined",
                    left, right
                )
            }
            TensorError::InvalidValue { label } => write!(f, "invalid value: {label}"),
        }
    }
}

impl Error for TensorError {}

/// A 2D `f32` tensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorRepr", into = "TensorRepr")]
pub struct Tensor {
    rows: usize,
    cols: usize,
    data: Arc<Vec<f32>>,
}

/// Wire form of [`Tensor`]; deserialisation goes through [`Tensor::from_vec`].
#[derive(Serialize, Deserialize)]
struct TensorRepr {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<TensorRepr> for Tensor {
    type Error = TensorError;

    fn try_from(repr: TensorRepr) -> PureResult<Self> {
        Tensor::from_vec(repr.rows, repr.cols, repr.data)
    }
}

impl From<Tensor> for TensorRepr {
    fn from(tensor: Tensor) -> Self {
        let data = tensor.data().to_vec();
        TensorRepr {
            rows: tensor.rows,
            cols: tensor.cols,
            data,
        }
    }
}

/// Element count of a `rows x cols` tensor. Both axes must be non-zero and
/// the product must fit in `usize`.
fn element_count(rows: usize, cols: usize) -> PureResult<usize> {
    if rows == 0 || cols == 0 {
        return Err(TensorError::InvalidDimensions { rows, cols });
    }
    rows.checked_mul(cols).ok_or(TensorError::InvalidDimensions { rows, cols })
}

impl Tensor {
    /// Create a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> PureResult<Self> {
        let len = element_count(rows, cols)?;
        Self::from_vec(rows, cols, vec![0.0; len])
    }

    /// Create a tensor from raw data. The provided vector must match
    /// `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> PureResult<Self> {
        let expected = element_count(rows, cols)?;
        if expected != data.len() {
            return Err(TensorError::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            data: Arc::new(data),
        })
    }

    /// Single-row tensor holding `start, start + 1, .., end - 1`.
    pub fn arange(start: i64, end: i64) -> PureResult<Self> {
        if end <= start {
            return Err(TensorError::InvalidDimensions { rows: 1, cols: 0 });
        }
        let data: Vec<f32> = (start..end).map(|v| v as f32).collect();
        Self::from_vec(1, data.len(), data)
    }

    /// Construct a tensor by sampling a uniform distribution in `[min, max)`.
    ///
    /// When `seed` is provided the RNG becomes deterministic. Otherwise the
    /// process-wide determinism policy decides.
    pub fn random_uniform(
        rows: usize,
        cols: usize,
        min: f32,
        max: f32,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        let len = element_count(rows, cols)?;
        if !(min < max) {
            return Err(TensorError::InvalidValue {
                label: "random_uniform bounds must satisfy min < max",
            });
        }
        let mut rng = determinism::rng_from_optional(seed, "st-tensor/tensor/uniform");
        let distribution = Uniform::new(min, max);
        let data = (0..len)
            .map(|_| distribution.sample(&mut rng))
            .collect();
        Self::from_vec(rows, cols, data)
    }

    /// Returns the `(rows, cols)` pair of the tensor.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major view of the elements.
    pub fn data(&self) -> &[f32] {
        self.data.as_slice()
    }

    /// The only element of a 1x1 tensor.
    pub fn as_scalar(&self) -> Option<f32> {
        (self.shape() == (1, 1)).then(|| self.data[0])
    }

    /// Multiply every element by `factor`.
    pub fn scale(&self, factor: f32) -> PureResult<Tensor> {
        self.map(|v| v * factor)
    }

    /// Add `value` to every element.
    pub fn add_scalar(&self, value: f32) -> PureResult<Tensor> {
        self.map(|v| v + value)
    }

    /// Element-wise sum. Shapes must match unless one side is 1x1, in which
    /// case it is broadcast.
    pub fn add(&self, other: &Tensor) -> PureResult<Tensor> {
        if self.shape() == other.shape() {
            let data = self
                .data()
                .iter()
                .zip(other.data())
                .map(|(a, b)| a + b)
                .collect();
            return Tensor::from_vec(self.rows, self.cols, data);
        }
        if let Some(value) = other.as_scalar() {
            return self.add_scalar(value);
        }
        if let Some(value) = self.as_scalar() {
            return other.add_scalar(value);
        }
        Err(TensorError::ShapeMismatch {
            left: self.shape(),
            right: other.shape(),
        })
    }

    fn map(&self, f: impl Fn(f32) -> f32) -> PureResult<Tensor> {
        let data = self.data().iter().copied().map(f).collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (r, row) in self.data().chunks(self.cols).enumerate() {
            if r > 0 {
                write!(f, ",\n ")?;
            }
            write!(f, "[")?;
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
