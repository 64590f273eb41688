// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use st_tensor::{PureResult, Tensor};

/// Random 2x3 tensor in `[0, 1)` used to check that the tensor stack links
/// and prints. Honours `SPIRAL_DETERMINISTIC` when `seed` is `None`.
pub fn random_smoke_tensor(seed: Option<u64>) -> PureResult<Tensor> {
    Tensor::random_uniform(2, 3, 0.0, 1.0, seed)
}
