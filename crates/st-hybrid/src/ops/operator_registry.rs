// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.

//! Name-keyed registry through which a host invokes the hybrid ops.

use super::simple::{simple_op_to, SIMPLE_OP};
use super::stateful::{global_slot, op_with_global_slot_to, GlobalSlot, OP_WITH_GLOBAL};
use crate::diagnostics::{DiagnosticSink, StdoutSink};
use crate::error::{OpError, OpResult};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Signature describing an operator's inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorSignature {
    /// Operator name
    pub name: String,
    /// Number of input values
    pub num_inputs: usize,
    /// Number of output values
    pub num_outputs: usize,
    /// Whether operator supports in-place execution
    pub supports_inplace: bool,
}

/// Metadata for a registered operator.
#[derive(Debug, Clone)]
pub struct OperatorMetadata {
    /// Operator signature
    pub signature: OperatorSignature,
    /// Human-readable description
    pub description: String,
    /// Supported backends
    pub backends: Vec<String>,
    /// Custom attributes
    pub attributes: HashMap<String, String>,
}

/// Type alias for operator execution function.
pub type OperatorFn = Arc<dyn Fn(&[&Value]) -> OpResult<Vec<Value>> + Send + Sync>;

/// A registered operator with its implementation.
pub struct RegisteredOperator {
    metadata: OperatorMetadata,
    forward_fn: OperatorFn,
}

impl RegisteredOperator {
    pub fn new(metadata: OperatorMetadata, forward_fn: OperatorFn) -> Self {
        Self {
            metadata,
            forward_fn,
        }
    }

    /// Execute the operator, checking input and output counts.
    pub fn execute(&self, inputs: &[&Value]) -> OpResult<Vec<Value>> {
        let signature = &self.metadata.signature;
        if inputs.len() != signature.num_inputs {
            return Err(OpError::Arity {
                name: signature.name.clone(),
                expected: signature.num_inputs,
                got: inputs.len(),
            });
        }

        let outputs = (self.forward_fn)(inputs)?;
        if outputs.len() != signature.num_outputs {
            return Err(OpError::OutputCount {
                name: signature.name.clone(),
                expected: signature.num_outputs,
                got: outputs.len(),
            });
        }
        Ok(outputs)
    }

    pub fn metadata(&self) -> &OperatorMetadata {
        &self.metadata
    }
}

/// Registry of host-callable operators.
pub struct OperatorRegistry {
    operators: RwLock<HashMap<String, Arc<RegisteredOperator>>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            operators: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new operator. Names are unique.
    pub fn register(&self, operator: RegisteredOperator) -> OpResult<()> {
        let name = operator.metadata.signature.name.clone();
        let mut operators = self
            .operators
            .write()
            .map_err(|_| OpError::LockPoisoned("operator registry"))?;

        if operators.contains_key(&name) {
            return Err(OpError::DuplicateOperator(name));
        }

        tracing::debug!(operator = %name, "registered operator");
        operators.insert(name, Arc::new(operator));
        Ok(())
    }

    /// Get a registered operator by name.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredOperator>> {
        self.operators.read().ok()?.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn list_operators(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .operators
            .read()
            .map(|ops| ops.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Find operators by backend support.
    pub fn find_by_backend(&self, backend: &str) -> Vec<Arc<RegisteredOperator>> {
        let Ok(operators) = self.operators.read() else {
            return Vec::new();
        };
        operators
            .values()
            .filter(|op| op.metadata.backends.iter().any(|b| b == backend))
            .cloned()
            .collect()
    }

    /// Execute an operator by name.
    pub fn execute(&self, name: &str, inputs: &[&Value]) -> OpResult<Vec<Value>> {
        let operator = self
            .get(name)
            .ok_or_else(|| OpError::UnknownOperator(name.to_string()))?;

        operator.execute(inputs)
    }

    /// Execute a single-input, single-output operator.
    pub fn call(&self, name: &str, input: &Value) -> OpResult<Value> {
        let mut outputs = self.execute(name, &[input])?;
        outputs.pop().ok_or_else(|| OpError::OutputCount {
            name: name.to_string(),
            expected: 1,
            got: 0,
        })
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating registered operators.
pub struct OperatorBuilder {
    signature: OperatorSignature,
    description: String,
    backends: Vec<String>,
    attributes: HashMap<String, String>,
    forward_fn: Option<OperatorFn>,
}

impl OperatorBuilder {
    pub fn new(name: impl Into<String>, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            signature: OperatorSignature {
                name: name.into(),
                num_inputs,
                num_outputs,
                supports_inplace: false,
            },
            description: String::new(),
            backends: Vec::new(),
            attributes: HashMap::new(),
            forward_fn: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backends.push(backend.into());
        self
    }

    pub fn with_inplace(mut self, inplace: bool) -> Self {
        self.signature.supports_inplace = inplace;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_forward(mut self, forward_fn: OperatorFn) -> Self {
        self.forward_fn = Some(forward_fn);
        self
    }

    /// Build the registered operator. A forward function is required.
    pub fn build(self) -> OpResult<RegisteredOperator> {
        let forward_fn = self
            .forward_fn
            .ok_or_else(|| OpError::MissingForward(self.signature.name.clone()))?;

        let metadata = OperatorMetadata {
            signature: self.signature,
            description: self.description,
            backends: self.backends,
            attributes: self.attributes,
        };

        Ok(RegisteredOperator::new(metadata, forward_fn))
    }
}

/// Registers `simpleop` and `opwithglobal` (bound to `slot`) on `registry`.
/// Diagnostics of both go to `sink`.
pub fn register_builtin_ops(
    registry: &OperatorRegistry,
    slot: GlobalSlot,
    sink: Arc<dyn DiagnosticSink>,
) -> OpResult<()> {
    let simple_sink = Arc::clone(&sink);
    let simple = OperatorBuilder::new(SIMPLE_OP, 1, 1)
        .with_description("Returns twice the input")
        .with_backend("cpu")
        .with_forward(Arc::new(move |inputs: &[&Value]| {
            Ok(vec![simple_op_to(simple_sink.as_ref(), inputs[0])?])
        }))
        .build()?;

    let stateful = OperatorBuilder::new(OP_WITH_GLOBAL, 1, 1)
        .with_description("Returns the bound shared value plus the input")
        .with_backend("cpu")
        .with_attribute("global", super::stateful::GLOBAL_NAME)
        .with_forward(Arc::new(move |inputs: &[&Value]| {
            Ok(vec![op_with_global_slot_to(&slot, sink.as_ref(), inputs[0])?])
        }))
        .build()?;

    registry.register(simple)?;
    registry.register(stateful)?;
    Ok(())
}

static GLOBAL_OPERATOR_REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

/// Process-wide registry preloaded with the builtin ops. `opwithglobal`
/// reads [`global_slot`] and diagnostics go to stdout.
pub fn global_operator_registry() -> &'static OperatorRegistry {
    GLOBAL_OPERATOR_REGISTRY.get_or_init(|| {
        let registry = OperatorRegistry::new();
        if let Err(err) =
            register_builtin_ops(&registry, global_slot().clone(), Arc::new(StdoutSink))
        {
            tracing::error!(error = %err, "failed to register builtin ops");
        }
        registry
    })
}
