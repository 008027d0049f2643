use anyhow::{anyhow, Result};
use candle_core::{Tensor, D};

/// Global average pool over the spatial dimensions.
///
/// `[B, C, H, W]` becomes `[B, C]`; an already pooled `[B, C]` map passes
/// through unchanged.
pub fn global_avg_pool(features: &Tensor) -> Result<Tensor> {
    match features.dims().len() {
        4 => Ok(features.mean(D::Minus1)?.mean(D::Minus1)?),
        2 => Ok(features.clone()),
        rank => Err(anyhow!("features must be [B,C,H,W] or [B,C], got rank {}", rank)),
    }
}
