// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Dynamically typed operand handed over by the host.

use crate::error::{OpError, OpResult};
use serde::{Deserialize, Serialize};
use st_tensor::Tensor;
use std::fmt;

/// A value supplied by, or returned to, the host.
///
/// `Text` stands for any non-numeric host object. It can be printed but
/// takes part in no arithmetic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Tensor(Tensor),
    Text(String),
}

impl Value {
    /// Short type name used in error messages and op events.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Tensor(_) => "tensor",
            Value::Text(_) => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Value::Text(_))
    }

    /// `factor * self`.
    pub fn scaled(&self, factor: i64) -> OpResult<Value> {
        match self {
            Value::Int(v) => factor
                .checked_mul(*v)
                .map(Value::Int)
                .ok_or(OpError::ArithmeticOverflow { op: "*" }),
            Value::Float(v) => Ok(Value::Float(factor as f64 * v)),
            Value::Tensor(t) => Ok(Value::Tensor(t.scale(factor as f32)?)),
            Value::Text(_) => Err(OpError::Unsupported {
                op: "*",
                lhs: "int",
                rhs: self.kind(),
            }),
        }
    }

    /// `self + rhs`. Ints widen to floats when mixed with floats; scalars
    /// broadcast over tensors.
    ///
    /// Tensors hold `f32`, so a scalar added to a tensor is rounded to `f32`
    /// first. Ints beyond `2^24` lose precision there, as in float32 torch.
    pub fn try_add(&self, rhs: &Value) -> OpResult<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or(OpError::ArithmeticOverflow { op: "+" }),
            (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
            (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            (Value::Tensor(t), Value::Tensor(u)) => Ok(Value::Tensor(t.add(u)?)),
            (Value::Tensor(t), scalar) | (scalar, Value::Tensor(t)) if scalar.is_numeric() => {
                let s = scalar.as_f32().unwrap_or_default();
                Ok(Value::Tensor(t.add_scalar(s)?))
            }
            _ => Err(OpError::Unsupported {
                op: "+",
                lhs: self.kind(),
                rhs: rhs.kind(),
            }),
        }
    }

    fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Int(v) => Some(*v as f32),
            Value::Float(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Parses host JSON. Besides the plain serde forms, a flat array of
    /// numbers is a one-row tensor and an array of equal-length arrays is a
    /// matrix.
    pub fn from_json(json: &serde_json::Value) -> OpResult<Value> {
        use serde_json::Value as Json;
        match json {
            Json::Number(n) => match n.as_i64() {
                Some(v) => Ok(Value::Int(v)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| OpError::InvalidInput(format!("number {n} is out of range"))),
            },
            Json::String(s) => Ok(Value::Text(s.clone())),
            Json::Array(items) if items.iter().all(Json::is_array) => {
                let mut rows = Vec::with_capacity(items.len());
                for item in items {
                    rows.push(json_numbers(item)?);
                }
                let cols = rows.first().map_or(0, Vec::len);
                if rows.iter().any(|row| row.len() != cols) {
                    return Err(OpError::InvalidInput(
                        "tensor rows must all have the same length".to_string(),
                    ));
                }
                let data: Vec<f32> = rows.into_iter().flatten().collect();
                let rows = items.len();
                Ok(Value::Tensor(Tensor::from_vec(rows, cols, data)?))
            }
            Json::Array(_) => {
                let data = json_numbers(json)?;
                Ok(Value::Tensor(Tensor::from_vec(1, data.len(), data)?))
            }
            Json::Object(_) => serde_json::from_value::<Tensor>(json.clone())
                .map(Value::Tensor)
                .map_err(|err| OpError::InvalidInput(err.to_string())),
            other => Err(OpError::InvalidInput(format!(
                "cannot interpret {other} as an op operand"
            ))),
        }
    }

    /// Parses a JSON literal such as `5`, `2.5`, `[1, 2, 3]` or `"abc"`.
    pub fn parse(text: &str) -> OpResult<Value> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|err| OpError::InvalidInput(err.to_string()))?;
        Value::from_json(&json)
    }
}

fn json_numbers(json: &serde_json::Value) -> OpResult<Vec<f32>> {
    let items = json
        .as_array()
        .ok_or_else(|| OpError::InvalidInput(format!("expected an array, got {json}")))?;
    items
        .iter()
        .map(|item| {
            item.as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| OpError::InvalidInput(format!("tensor element {item} is not a number")))
        })
        .collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Tensor(t) => write!(f, "{t}"),
            Value::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Tensor> for Value {
    fn from(value: Tensor) -> Self {
        Value::Tensor(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_tensor::TensorError;

    #[test]
    fn scaled_covers_numeric_kinds() {
        assert_eq!(Value::Int(-3).scaled(2).unwrap(), Value::Int(-6));
        assert_eq!(Value::Float(2.5).scaled(2).unwrap(), Value::Float(5.0));
        let t = Tensor::arange(0, 3).unwrap();
        let Value::Tensor(out) = Value::Tensor(t).scaled(2).unwrap() else {
            panic!("expected tensor");
        };
        assert_eq!(out.data(), &[0.0, 2.0, 4.0]);
    }

    #[test]
    fn scaled_reports_overflow() {
        assert_eq!(
            Value::Int(i64::MAX).scaled(2).unwrap_err(),
            OpError::ArithmeticOverflow { op: "*" }
        );
    }

    #[test]
    fn try_add_widens_and_broadcasts() {
        assert_eq!(
            Value::Int(1).try_add(&Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
        let t = Value::Tensor(Tensor::arange(0, 2).unwrap());
        let Value::Tensor(out) = Value::Int(10).try_add(&t).unwrap() else {
            panic!("expected tensor");
        };
        assert_eq!(out.data(), &[10.0, 11.0]);
    }

    #[test]
    fn try_add_rejects_text_and_bad_shapes() {
        assert_eq!(
            Value::Int(1).try_add(&Value::from("a")).unwrap_err(),
            OpError::Unsupported {
                op: "+",
                lhs: "int",
                rhs: "text"
            }
        );
        let a = Value::Tensor(Tensor::zeros(1, 2).unwrap());
        let b = Value::Tensor(Tensor::zeros(1, 3).unwrap());
        assert_eq!(
            a.try_add(&b).unwrap_err(),
            OpError::Tensor(TensorError::ShapeMismatch {
                left: (1, 2),
                right: (1, 3)
            })
        );
    }

    #[test]
    fn parse_accepts_host_literals() {
        assert_eq!(Value::parse("5").unwrap(), Value::Int(5));
        assert_eq!(Value::parse("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(Value::parse("\"x\"").unwrap(), Value::from("x"));
        let Value::Tensor(t) = Value::parse("[[1, 2], [3, 4]]").unwrap() else {
            panic!("expected tensor");
        };
        assert_eq!(t.shape(), (2, 2));
        assert!(Value::parse("[[1, 2], [3]]").is_err());
        assert!(Value::parse("null").is_err());
        assert!(Value::parse("[]").is_err());
    }

    #[test]
    fn parse_rejects_overflowing_tensor_shape() {
        let json = r#"{"rows": 4294967296, "cols": 4294967296, "data": []}"#;
        assert!(Value::parse(json).is_err());
    }

    #[test]
    fn tensor_broadcast_rounds_scalar_to_f32() {
        let t = Value::Tensor(Tensor::arange(0, 1).unwrap());
        let Value::Tensor(out) = Value::Int(16_777_217).try_add(&t).unwrap() else {
            panic!("expected tensor");
        };
        assert_eq!(out.data(), &[16_777_216.0]);
    }

    #[test]
    fn display_matches_kind() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
    }
}
