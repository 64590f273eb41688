// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! `import spiraltorch_hybrid`
//!
//! The host binds the shared value with `set_globalval(v)` and then calls
//! `simpleop(x)` / `opwithglobal(x)`. Calling `opwithglobal` before binding
//! raises `NameError`, matching an unresolved module global.

use pyo3::exceptions::{PyNameError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyFloat, PyInt, PyList, PyString, PyTuple};
use pyo3::wrap_pyfunction;

use st_hybrid::ops::{global_operator_registry, global_slot, op_with_global_slot, simple_op};
use st_hybrid::{OpError, Value};
use st_tensor::Tensor;

fn op_err_to_py(err: OpError) -> PyErr {
    match err {
        OpError::Uninitialized { name } => {
            PyNameError::new_err(format!("name '{name}' is not defined"))
        }
        err @ OpError::Unsupported { .. } => PyTypeError::new_err(err.to_string()),
        err @ (OpError::Tensor(_)
        | OpError::InvalidInput(_)
        | OpError::Arity { .. }
        | OpError::UnknownOperator(_)) => PyValueError::new_err(err.to_string()),
        err => PyRuntimeError::new_err(err.to_string()),
    }
}

fn numbers(seq: &Bound<'_, PyAny>) -> PyResult<Vec<f32>> {
    seq.extract::<Vec<f32>>()
        .map_err(|_| PyTypeError::new_err("tensor rows must contain only numbers"))
}

fn value_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if let Ok(text) = obj.downcast::<PyString>() {
        return Ok(Value::Text(text.to_string_lossy().into_owned()));
    }
    if obj.is_instance_of::<PyInt>() {
        let v: i64 = obj
            .extract()
            .map_err(|_| PyValueError::new_err("integer does not fit in 64 bits"))?;
        return Ok(Value::Int(v));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Value::Float(obj.extract()?));
    }
    if obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>() {
        let items: Vec<Bound<'_, PyAny>> = obj.extract()?;
        let nested = items
            .iter()
            .any(|item| item.is_instance_of::<PyList>() || item.is_instance_of::<PyTuple>());
        let tensor = if nested {
            let mut rows = Vec::with_capacity(items.len());
            for item in &items {
                rows.push(numbers(item)?);
            }
            let cols = rows.first().map_or(0, Vec::len);
            if rows.iter().any(|row| row.len() != cols) {
                return Err(PyValueError::new_err("tensor rows must have equal length"));
            }
            Tensor::from_vec(rows.len(), cols, rows.concat())
        } else {
            let data = numbers(obj)?;
            Tensor::from_vec(1, data.len(), data)
        };
        return tensor
            .map(Value::Tensor)
            .map_err(|err| PyValueError::new_err(err.to_string()));
    }
    // Anything else is an opaque host object; the ops reject it with TypeError.
    Ok(Value::Text(obj.str()?.to_string_lossy().into_owned()))
}

fn value_to_py(py: Python<'_>, value: Value) -> PyObject {
    match value {
        Value::Int(v) => v.into_py(py),
        Value::Float(v) => v.into_py(py),
        Value::Text(s) => s.into_py(py),
        Value::Tensor(t) => {
            let (_, cols) = t.shape();
            let rows: Vec<Vec<f32>> = t.data().chunks(cols).map(<[f32]>::to_vec).collect();
            rows.into_py(py)
        }
    }
}

/// Returns `2 * inval`.
#[pyfunction]
fn simpleop(py: Python<'_>, inval: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let input = value_from_py(inval)?;
    let output = simple_op(&input).map_err(op_err_to_py)?;
    Ok(value_to_py(py, output))
}

/// Returns `globalval + inval`.
#[pyfunction]
fn opwithglobal(py: Python<'_>, inval: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let input = value_from_py(inval)?;
    let output = op_with_global_slot(global_slot(), &input).map_err(op_err_to_py)?;
    Ok(value_to_py(py, output))
}

/// Binds the shared value read by `opwithglobal`.
#[pyfunction]
fn set_globalval(value: &Bound<'_, PyAny>) -> PyResult<()> {
    let value = value_from_py(value)?;
    tracing::debug!(kind = value.kind(), "binding globalval");
    global_slot().set(value).map_err(op_err_to_py)?;
    Ok(())
}

#[pyfunction]
fn clear_globalval() -> PyResult<()> {
    global_slot().clear().map_err(op_err_to_py)?;
    Ok(())
}

/// Current shared value, or `None` when unbound.
#[pyfunction]
fn globalval(py: Python<'_>) -> PyResult<Option<PyObject>> {
    let value = global_slot().get().map_err(op_err_to_py)?;
    Ok(value.map(|v| value_to_py(py, v)))
}

/// Runs a registered op by name.
#[pyfunction]
fn execute(py: Python<'_>, name: &str, inval: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let input = value_from_py(inval)?;
    let output = global_operator_registry()
        .call(name, &input)
        .map_err(op_err_to_py)?;
    Ok(value_to_py(py, output))
}

#[pyfunction]
fn list_operators() -> Vec<String> {
    global_operator_registry().list_operators()
}

#[pymodule]
fn spiraltorch_hybrid(m: &Bound<'_, PyModule>) -> PyResult<()> {
    st_hybrid::telemetry::init_tracing();
    m.add_function(wrap_pyfunction!(simpleop, m)?)?;
    m.add_function(wrap_pyfunction!(opwithglobal, m)?)?;
    m.add_function(wrap_pyfunction!(set_globalval, m)?)?;
    m.add_function(wrap_pyfunction!(clear_globalval, m)?)?;
    m.add_function(wrap_pyfunction!(globalval, m)?)?;
    m.add_function(wrap_pyfunction!(execute, m)?)?;
    m.add_function(wrap_pyfunction!(list_operators, m)?)?;
    m.add("START_MARKER", st_hybrid::diagnostics::START_MARKER)?;
    m.add(
        "__all__",
        vec![
            "simpleop",
            "opwithglobal",
            "set_globalval",
            "clear_globalval",
            "globalval",
            "execute",
            "list_operators",
        ],
    )?;
    Ok(())
}
