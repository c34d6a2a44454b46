//! Single-threaded reference strategy.

use convo_core::{Kernel, PixelBuffer};
use tracing::trace;

use super::ConvolutionStrategy;
use crate::ComputeResult;
use crate::stencil::convolve_row;

/// Row by row on the calling thread.
///
/// Baseline every other strategy must match byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Sequential {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl ConvolutionStrategy for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn apply(&self, source: &PixelBuffer, kernel: &Kernel) -> ComputeResult<PixelBuffer> {
        let rows = source.interior_rows(kernel.margin());
        if rows.is_empty() {
            return Ok(source.clone());
        }

        trace!(size = kernel.size(), rows = rows.len(), "sequential convolve");

        let (width, height, channels) = source.dimensions();
        let mut data = source.data().to_vec();
        for (y, row) in data
            .chunks_mut(source.row_stride())
            .enumerate()
            .skip(rows.start)
            .take(rows.len())
        {
            convolve_row(source, kernel, y, row);
        }

        Ok(PixelBuffer::from_raw(width, height, channels, data)?)
    }
}
