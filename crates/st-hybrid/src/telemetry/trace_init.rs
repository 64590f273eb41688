// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::sync::OnceLock;

use spiral_config::tracing::{self as config_tracing, InitError};

static INIT_OUTCOME: OnceLock<Result<(), String>> = OnceLock::new();

/// Installs the hybrid subscriber once per process. Returns `true` when a
/// subscriber is active, including one installed by the embedding host.
pub fn init_tracing() -> bool {
    let outcome = INIT_OUTCOME.get_or_init(|| match config_tracing::init_tracing() {
        Ok(()) | Err(InitError::AlreadyInitialised) => Ok(()),
        // `try_init` only fails when a global default is already set.
        Err(InitError::Install(_)) => Ok(()),
        Err(err) => Err(err.to_string()),
    });

    match outcome {
        Ok(()) => true,
        Err(message) => {
            eprintln!("st-hybrid: tracing disabled: {message}");
            false
        }
    }
}

/// Flushes trace sinks that buffer until shutdown (the Chrome trace file).
pub fn shutdown_tracing() {
    tracing::debug!("flushing trace sinks");
    config_tracing::flush_chrome_trace();
}
