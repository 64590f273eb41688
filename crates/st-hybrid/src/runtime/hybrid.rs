// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Fast host loop feeding a single slow op worker.
//!
//! Every iteration produces a tensor. When the worker is idle the tensor is
//! cloned and handed over; when it is still running the iteration is skipped.
//! At most one worker thread exists at any time.

use crate::config::{LayeredConfig, LayeredConfigError};
use crate::diagnostics::{DiagnosticSink, StdoutSink};
use crate::error::{OpError, OpResult};
use crate::ops::{register_builtin_ops, GlobalSlot, OperatorRegistry, OP_WITH_GLOBAL};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use st_tensor::Tensor;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Knobs of the hybrid loop, read from the `[hybrid]` config section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridSettings {
    pub iterations: usize,
    /// Simulated host work per iteration.
    pub fast_step_ms: u64,
    /// Simulated op latency inside the worker.
    pub op_latency_ms: u64,
    /// Length of the global and per-iteration tensors.
    pub width: usize,
    /// Registry name of the op run by the worker.
    pub op: String,
}

impl Default for HybridSettings {
    fn default() -> Self {
        Self {
            iterations: 100,
            fast_step_ms: 5,
            op_latency_ms: 50,
            width: 3,
            op: OP_WITH_GLOBAL.to_string(),
        }
    }
}

impl HybridSettings {
    /// Settings from the `[hybrid]` section, defaults for missing keys.
    pub fn from_config(config: &LayeredConfig) -> Result<Self, LayeredConfigError> {
        config
            .section::<HybridSettings>(&["hybrid"])
            .map(Option::unwrap_or_default)
            .map_err(|source| LayeredConfigError::Section {
                section: "hybrid".to_string(),
                source,
            })
    }
}

/// What happened during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HybridReport {
    /// Iterations that handed a tensor to the worker.
    pub launched: Vec<usize>,
    /// Iterations skipped because the worker was busy.
    pub busy: Vec<usize>,
    /// Worker results keyed by launching iteration, in launch order.
    pub outputs: Vec<(usize, Value)>,
}

type Worker = (usize, JoinHandle<OpResult<Value>>);

pub struct HybridLoop {
    settings: HybridSettings,
    registry: Arc<OperatorRegistry>,
    slot: GlobalSlot,
}

impl HybridLoop {
    /// Loop with its own registry holding the builtin ops, printing op
    /// diagnostics to stdout.
    pub fn new(settings: HybridSettings) -> OpResult<Self> {
        Self::with_sink(settings, Arc::new(StdoutSink))
    }

    /// Loop with its own registry whose op diagnostics go to `sink`.
    pub fn with_sink(settings: HybridSettings, sink: Arc<dyn DiagnosticSink>) -> OpResult<Self> {
        let registry = OperatorRegistry::new();
        let slot = GlobalSlot::new();
        register_builtin_ops(&registry, slot.clone(), sink)?;
        Ok(Self::with_registry(settings, Arc::new(registry), slot))
    }

    /// Loop over an existing registry. The global tensor is bound into
    /// `slot`, which should be the slot the registry's ops read.
    pub fn with_registry(
        settings: HybridSettings,
        registry: Arc<OperatorRegistry>,
        slot: GlobalSlot,
    ) -> Self {
        Self {
            settings,
            registry,
            slot,
        }
    }

    /// Runs the loop to completion and joins the last worker.
    pub fn run(&self) -> OpResult<HybridReport> {
        let settings = &self.settings;
        if settings.width == 0 {
            return Err(OpError::InvalidInput(
                "hybrid width must be at least 1".to_string(),
            ));
        }
        if !self.registry.contains(&settings.op) {
            return Err(OpError::UnknownOperator(settings.op.clone()));
        }

        let width = settings.width as i64;
        let global = Tensor::arange(0, width)?;
        info!(op = %settings.op, global = %global, "starting hybrid loop");
        self.slot.set(global)?;

        let fast_step = Duration::from_millis(settings.fast_step_ms);
        let mut report = HybridReport::default();
        let mut worker: Option<Worker> = None;

        for i in 0..settings.iterations {
            let start = i as i64;
            let local = Tensor::arange(start, start + width)?;
            thread::sleep(fast_step);

            let ready = worker
                .as_ref()
                .map_or(true, |(_, handle)| handle.is_finished());
            if !ready {
                debug!(iteration = i, "worker busy");
                report.busy.push(i);
                continue;
            }

            if let Some(done) = worker.take() {
                report.outputs.push(join_worker(done)?);
            }
            debug!(iteration = i, input = %local, "launching worker");
            worker = Some((i, self.spawn_worker(i, local.clone())?));
            report.launched.push(i);
        }

        if let Some(done) = worker.take() {
            report.outputs.push(join_worker(done)?);
        }

        info!(
            launched = report.launched.len(),
            busy = report.busy.len(),
            "hybrid loop finished"
        );
        Ok(report)
    }

    fn spawn_worker(&self, iteration: usize, input: Tensor) -> OpResult<JoinHandle<OpResult<Value>>> {
        let registry = Arc::clone(&self.registry);
        let op = self.settings.op.clone();
        let latency = Duration::from_millis(self.settings.op_latency_ms);
        thread::Builder::new()
            .name(format!("hybrid-op-{iteration}"))
            .spawn(move || {
                let output = registry.call(&op, &Value::Tensor(input))?;
                thread::sleep(latency);
                info!(iteration, output = %output, "op returned");
                Ok(output)
            })
            .map_err(|err| OpError::Worker(err.to_string()))
    }
}

fn join_worker((iteration, handle): Worker) -> OpResult<(usize, Value)> {
    let output = handle
        .join()
        .map_err(|_| OpError::Worker(format!("worker for iteration {iteration} panicked")))??;
    Ok((iteration, output))
}
