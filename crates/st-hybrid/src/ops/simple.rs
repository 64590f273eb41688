// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::diagnostics::{self, DiagnosticSink, StdoutSink, START_MARKER};
use crate::error::OpResult;
use crate::observability::emit_op_event;
use crate::value::Value;

/// Registry name of the doubling op.
pub const SIMPLE_OP: &str = "simpleop";

/// Returns `2 * input`, printing diagnostics to stdout.
pub fn simple_op(input: &Value) -> OpResult<Value> {
    simple_op_to(&StdoutSink, input)
}

/// Returns `2 * input`. The start marker and the input are written to `sink`
/// before the product is computed, so they appear on the error path too.
pub fn simple_op_to(sink: &dyn DiagnosticSink, input: &Value) -> OpResult<Value> {
    diagnostics::emit(sink, SIMPLE_OP, START_MARKER);
    diagnostics::emit(sink, SIMPLE_OP, &input.to_string());
    let output = input.scaled(2);
    emit_op_event(SIMPLE_OP, input, &output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CaptureSink;
    use crate::error::OpError;
    use st_tensor::Tensor;

    fn run(input: impl Into<Value>) -> OpResult<Value> {
        simple_op_to(&CaptureSink::new(), &input.into())
    }

    #[test]
    fn doubles_scalars() {
        assert_eq!(run(0i64).unwrap(), Value::Int(0));
        assert_eq!(run(-3i64).unwrap(), Value::Int(-6));
        assert_eq!(run(2.5f64).unwrap(), Value::Float(5.0));
    }

    #[test]
    fn doubles_tensors_elementwise() {
        let input = Tensor::from_vec(2, 2, vec![1.0, -1.0, 0.5, 3.0]).unwrap();
        let Value::Tensor(out) = run(input).unwrap() else {
            panic!("expected tensor output");
        };
        assert_eq!(out.shape(), (2, 2));
        assert_eq!(out.data(), &[2.0, -2.0, 1.0, 6.0]);
    }

    #[test]
    fn non_numeric_input_is_an_argument_error() {
        assert!(matches!(
            run("abc").unwrap_err(),
            OpError::Unsupported { op: "*", .. }
        ));
    }

    #[test]
    fn diagnostics_precede_result_even_on_error() {
        let sink = CaptureSink::new();
        let _ = simple_op_to(&sink, &Value::Int(4));
        assert_eq!(sink.take(), vec![START_MARKER, "4"]);

        let _ = simple_op_to(&sink, &Value::from("x"));
        assert_eq!(sink.take(), vec![START_MARKER, "\"x\""]);
    }
}
