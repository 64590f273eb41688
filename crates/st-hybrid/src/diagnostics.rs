// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Human-readable op diagnostics. Not meant for machine parsing.

use std::io::Write;
use std::sync::Mutex;

/// First line written by every op invocation.
pub const START_MARKER: &str = "Start hybrid op";

/// Receives diagnostic lines from the ops.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Writes each line to the process stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn emit(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{line}");
    }
}

/// Drops every line.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _line: &str) {}
}

/// Keeps lines in memory so callers can inspect them.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns and forgets the captured lines.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .lines
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl DiagnosticSink for CaptureSink {
    fn emit(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}

/// Writes `line` to `sink` and mirrors it as a debug event.
pub(crate) fn emit(sink: &dyn DiagnosticSink, op: &'static str, line: &str) {
    tracing::debug!(target: "st_hybrid::diagnostics", op, "{line}");
    sink.emit(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_sink_keeps_order_and_drains() {
        let sink = CaptureSink::new();
        emit(&sink, "t", "a");
        emit(&sink, "t", "b");
        assert_eq!(sink.lines(), vec!["a", "b"]);
        assert_eq!(sink.take(), vec!["a", "b"]);
        assert!(sink.lines().is_empty());
    }
}
